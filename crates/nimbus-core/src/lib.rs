//! # nimbus-core
//!
//! Engine library for the Nimbus Resource Manager API. The Resource Manager
//! answers most mutations asynchronously: a PUT or DELETE is *accepted* and
//! the caller is handed an operation to poll until it settles. This crate
//! owns that machinery so every consumer (the CLI, automation built on top)
//! shares one implementation:
//!
//! - [`client`] - authenticated HTTP transport and response decoding
//! - [`operation`] / [`poller`] - operation handles and the poll-until-done
//!   loop, with deadline and retry semantics
//! - [`wait`] - explicit target-state waits for resources whose only
//!   completion signal is a status field settling
//! - [`locks`] - per-resource-family mutual exclusion for families the API
//!   models non-atomically
//! - [`resource_id`] - typed, segment-based resource identifiers
//! - [`workflows`] - submit-poll-refetch compositions
//! - [`config`] - profile configuration

pub mod client;
pub mod config;
pub mod error;
pub mod locks;
pub mod operation;
pub mod poller;
pub mod resource_id;
pub mod wait;
pub mod workflows;

pub use client::{ApiResponse, RestClient, OPERATION_LOCATION};
pub use config::{Config, ConfigError, PollSettings, Profile};
pub use error::{CoreError, Result};
pub use locks::{FamilyLock, LockRegistry};
pub use operation::{Operation, PollState};
pub use poller::{poll_until_done, PollOptions, ProgressCallback, ProgressEvent};
pub use resource_id::{EventSubscriptionId, TopicId, VirtualNetworkId, VirtualNetworkPeeringId};
pub use wait::StateWait;
pub use workflows::{create_or_update_and_wait, delete_and_wait};
