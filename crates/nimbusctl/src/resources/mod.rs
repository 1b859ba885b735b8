//! Wire models for the resource families the CLI exposes

pub mod events;
pub mod network;
