//! Command-line interface definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

const AFTER_HELP: &str = "\
EXAMPLES:
    # Configure a profile
    nimbusctl profile set prod --api-url https://api.nimbus.example \\
        --subscription-id 11111111 --access-token $TOKEN

    # Create a peering and wait for it to settle
    nimbusctl network peering create hub-to-spoke \\
        --resource-group rg1 --virtual-network hub \\
        --remote-network-id /subscriptions/11111111/resourceGroups/rg1/providers/Nimbus.Network/virtualNetworks/spoke

    # Fire and forget, then resume waiting later
    nimbusctl events subscription create audit --resource-group rg1 --topic billing \\
        --webhook-endpoint https://hooks.example/audit --no-wait
    nimbusctl operation wait https://api.nimbus.example/operations/abc123
";

/// Nimbus Resource Manager CLI
#[derive(Parser, Debug)]
#[command(name = "nimbusctl", version, about = "Nimbus Resource Manager CLI", after_help = AFTER_HELP)]
pub struct Cli {
    /// Profile to use (defaults to the configured default profile)
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Use an explicit config file instead of the platform default
    /// (disables NIMBUS_* environment overrides)
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Profile management
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Network resources
    #[command(subcommand)]
    Network(NetworkCommands),

    /// Eventing resources
    #[command(subcommand)]
    Events(EventsCommands),

    /// Inspect or wait on raw asynchronous operations
    #[command(subcommand)]
    Operation(OperationCommands),
}

/// Common arguments for commands that start asynchronous operations
#[derive(Args, Debug, Clone, Copy)]
pub struct WaitArgs {
    /// Do not wait for completion; print the operation URL and exit
    #[arg(long)]
    pub no_wait: bool,

    /// Maximum time to wait, in seconds (defaults to the profile setting)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Seconds between status polls (defaults to the profile setting)
    #[arg(long, value_name = "SECONDS")]
    pub poll_interval: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Create or update a profile
    Set {
        /// Profile name
        name: String,
        /// Base URL of the Resource Manager endpoint
        #[arg(long, value_name = "URL")]
        api_url: String,
        /// Subscription to operate on
        #[arg(long, value_name = "ID")]
        subscription_id: String,
        /// Bearer token (can also come from NIMBUS_ACCESS_TOKEN)
        #[arg(long, value_name = "TOKEN")]
        access_token: Option<String>,
        /// Seconds between status polls for this profile
        #[arg(long, value_name = "SECONDS")]
        poll_interval: Option<u64>,
        /// Seconds to wait for operations before giving up
        #[arg(long, value_name = "SECONDS")]
        poll_timeout: Option<u64>,
        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },
    /// List configured profiles
    List,
    /// Show one profile (token masked)
    Show {
        /// Profile name (defaults to the default profile)
        name: Option<String>,
    },
    /// Remove a profile
    Remove {
        /// Profile name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum NetworkCommands {
    /// Peerings between virtual networks
    #[command(subcommand)]
    Peering(PeeringCommands),
}

#[derive(Subcommand, Debug)]
pub enum PeeringCommands {
    /// Create a peering (fails if it already exists)
    Create {
        /// Peering name
        name: String,
        #[command(flatten)]
        scope: PeeringScope,
        /// Resource ID of the remote virtual network
        #[arg(long, value_name = "ID")]
        remote_network_id: String,
        #[command(flatten)]
        access: PeeringAccessArgs,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Update settings on an existing peering
    Update {
        /// Peering name
        name: String,
        #[command(flatten)]
        scope: PeeringScope,
        #[command(flatten)]
        access: PeeringAccessArgs,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Show a peering
    Show {
        /// Peering name
        name: String,
        #[command(flatten)]
        scope: PeeringScope,
    },
    /// Delete a peering
    Delete {
        /// Peering name
        name: String,
        #[command(flatten)]
        scope: PeeringScope,
        #[command(flatten)]
        wait: WaitArgs,
    },
}

/// Where a peering lives
#[derive(Args, Debug, Clone)]
pub struct PeeringScope {
    /// Resource group of the local virtual network
    #[arg(short = 'g', long, value_name = "NAME")]
    pub resource_group: String,

    /// Name of the local virtual network
    #[arg(long, value_name = "NAME")]
    pub virtual_network: String,
}

/// Traffic settings for a peering; unset flags keep the remote defaults
#[derive(Args, Debug, Clone, Copy)]
pub struct PeeringAccessArgs {
    /// Allow direct access between the peered networks
    #[arg(long, value_name = "BOOL")]
    pub allow_network_access: Option<bool>,

    /// Allow traffic forwarded from outside the remote network
    #[arg(long, value_name = "BOOL")]
    pub allow_forwarded_traffic: Option<bool>,

    /// Let the remote network use this network's gateway
    #[arg(long, value_name = "BOOL")]
    pub allow_gateway_transit: Option<bool>,

    /// Route through the remote network's gateway
    #[arg(long, value_name = "BOOL")]
    pub use_remote_gateways: Option<bool>,
}

#[derive(Subcommand, Debug)]
pub enum EventsCommands {
    /// Event subscriptions on a topic
    #[command(subcommand)]
    Subscription(SubscriptionCommands),
}

#[derive(Subcommand, Debug)]
pub enum SubscriptionCommands {
    /// Create or update an event subscription
    Create {
        /// Event subscription name
        name: String,
        #[command(flatten)]
        scope: TopicScope,
        /// Deliver events to a webhook endpoint
        #[arg(long, value_name = "URL", conflicts_with = "storage_queue")]
        webhook_endpoint: Option<String>,
        /// Deliver events to a storage queue, as RESOURCE_ID:QUEUE_NAME
        #[arg(long, value_name = "ID:QUEUE")]
        storage_queue: Option<String>,
        /// Advanced filter as JSON, e.g.
        /// '{"operatorType":"StringContains","key":"subject","values":["audit"]}';
        /// repeatable
        #[arg(long = "advanced-filter", value_name = "JSON")]
        advanced_filters: Vec<String>,
        /// Only deliver these event types; repeatable
        #[arg(long = "included-event-type", value_name = "TYPE")]
        included_event_types: Vec<String>,
        /// Only deliver events whose subject starts with this prefix
        #[arg(long, value_name = "PREFIX")]
        subject_begins_with: Option<String>,
        /// Only deliver events whose subject ends with this suffix
        #[arg(long, value_name = "SUFFIX")]
        subject_ends_with: Option<String>,
        /// Delivery attribute as JSON, e.g.
        /// '{"type":"Static","name":"env","properties":{"value":"prod"}}';
        /// repeatable, webhook destinations only
        #[arg(long = "delivery-attribute", value_name = "JSON")]
        delivery_attributes: Vec<String>,
        /// Dead-letter undeliverable events to a storage blob container, as
        /// RESOURCE_ID:CONTAINER
        #[arg(long, value_name = "ID:CONTAINER")]
        dead_letter_blob: Option<String>,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Show an event subscription
    Show {
        /// Event subscription name
        name: String,
        #[command(flatten)]
        scope: TopicScope,
    },
    /// Delete an event subscription
    Delete {
        /// Event subscription name
        name: String,
        #[command(flatten)]
        scope: TopicScope,
        #[command(flatten)]
        wait: WaitArgs,
    },
}

/// Which topic an event subscription belongs to
#[derive(Args, Debug, Clone)]
pub struct TopicScope {
    /// Resource group of the topic
    #[arg(short = 'g', long, value_name = "NAME")]
    pub resource_group: String,

    /// Topic name
    #[arg(long, value_name = "NAME")]
    pub topic: String,
}

#[derive(Subcommand, Debug)]
pub enum OperationCommands {
    /// Poll an operation-status URL until it reaches a terminal state
    Wait {
        /// Operation-status URL, as printed by a --no-wait invocation
        url: String,
        /// Maximum time to wait, in seconds
        #[arg(long, value_name = "SECONDS", default_value_t = 1800)]
        timeout: u64,
        /// Seconds between status polls
        #[arg(long, value_name = "SECONDS", default_value_t = 10)]
        poll_interval: u64,
    },
    /// Fetch an operation-status document once
    Status {
        /// Operation-status URL
        url: String,
    },
}
