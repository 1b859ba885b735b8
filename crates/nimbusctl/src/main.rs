//! nimbusctl - CLI for the Nimbus Resource Manager

mod cli;
mod commands;
mod connection;
mod error;
mod output;
mod resources;

use clap::Parser;
use nimbus_core::Config;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    Cli, Commands, EventsCommands, NetworkCommands, OperationCommands, PeeringCommands,
    ProfileCommands, SubscriptionCommands,
};
use crate::connection::ConnectionManager;
use crate::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        err.print_diagnostic();
        std::process::exit(1);
    }
}

/// Verbosity flags set the floor; RUST_LOG can always say more
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nimbusctl={default_level},nimbus_core={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config_file {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let mut conn = ConnectionManager::new(config, cli.config_file.clone());
    let profile = cli.profile.as_deref();
    let format = cli.output;

    match cli.command {
        Commands::Profile(command) => match command {
            ProfileCommands::Set {
                name,
                api_url,
                subscription_id,
                access_token,
                poll_interval,
                poll_timeout,
                default,
            } => commands::profile::set(
                &mut conn,
                name,
                api_url,
                subscription_id,
                access_token,
                poll_interval,
                poll_timeout,
                default,
            ),
            ProfileCommands::List => commands::profile::list(&conn, format),
            ProfileCommands::Show { name } => commands::profile::show(&conn, name, format),
            ProfileCommands::Remove { name } => commands::profile::remove(&mut conn, name),
        },

        Commands::Network(NetworkCommands::Peering(command)) => match command {
            PeeringCommands::Create {
                name,
                scope,
                remote_network_id,
                access,
                wait,
            } => {
                commands::network::create(
                    &conn,
                    profile,
                    name,
                    scope,
                    remote_network_id,
                    access,
                    wait,
                    format,
                )
                .await
            }
            PeeringCommands::Update {
                name,
                scope,
                access,
                wait,
            } => commands::network::update(&conn, profile, name, scope, access, wait, format).await,
            PeeringCommands::Show { name, scope } => {
                commands::network::show(&conn, profile, name, scope, format).await
            }
            PeeringCommands::Delete { name, scope, wait } => {
                commands::network::delete(&conn, profile, name, scope, wait).await
            }
        },

        Commands::Events(EventsCommands::Subscription(command)) => match command {
            SubscriptionCommands::Create {
                name,
                scope,
                webhook_endpoint,
                storage_queue,
                advanced_filters,
                included_event_types,
                subject_begins_with,
                subject_ends_with,
                delivery_attributes,
                dead_letter_blob,
                wait,
            } => {
                let args = commands::events::CreateArgs {
                    webhook_endpoint,
                    storage_queue,
                    advanced_filters,
                    included_event_types,
                    subject_begins_with,
                    subject_ends_with,
                    delivery_attributes,
                    dead_letter_blob,
                };
                commands::events::create(&conn, profile, name, scope, args, wait, format).await
            }
            SubscriptionCommands::Show { name, scope } => {
                commands::events::show(&conn, profile, name, scope, format).await
            }
            SubscriptionCommands::Delete { name, scope, wait } => {
                commands::events::delete(&conn, profile, name, scope, wait).await
            }
        },

        Commands::Operation(command) => match command {
            OperationCommands::Wait {
                url,
                timeout,
                poll_interval,
            } => {
                commands::operation::wait(&conn, profile, url, timeout, poll_interval, format)
                    .await
            }
            OperationCommands::Status { url } => {
                commands::operation::status(&conn, profile, url, format).await
            }
        },
    }
}
