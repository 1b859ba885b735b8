//! Error types for nimbusctl
//!
//! Wraps engine and configuration errors with CLI-facing variants, and
//! renders them cargo-style with a `tip:` line where we have something
//! actionable to say.

use colored::Colorize;
use nimbus_core::{ConfigError, CoreError};
use thiserror::Error;

/// Main error type for the nimbusctl application
#[derive(Error, Debug)]
pub enum CtlError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("output error: {0}")]
    Output(#[from] anyhow::Error),
}

/// Result type for nimbusctl operations
pub type Result<T> = std::result::Result<T, CtlError>;

impl CtlError {
    /// Actionable follow-ups for this error, if any
    pub fn tips(&self) -> Vec<String> {
        match self {
            CtlError::Core(err) if err.is_timeout() => vec![
                "the operation may still be running remotely".to_string(),
                "re-check later with: nimbusctl operation wait <url>".to_string(),
            ],
            CtlError::Core(CoreError::Api { status: 401, .. })
            | CtlError::Core(CoreError::Api { status: 403, .. }) => vec![
                "check the access token in your profile: nimbusctl profile show".to_string(),
                "or supply one via the NIMBUS_ACCESS_TOKEN environment variable".to_string(),
            ],
            CtlError::Config(ConfigError::NoProfileConfigured) => vec![
                "create a profile: nimbusctl profile set <name> --api-url <url> --subscription-id <id>"
                    .to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr
    pub fn print_diagnostic(&self) {
        eprintln!("{}{} {}", "error".red().bold(), ":".bold(), self);
        for tip in self.tips() {
            eprintln!("  {}{} {}", "tip".yellow().bold(), ":".bold(), tip);
        }
    }
}

impl From<serde_json::Error> for CtlError {
    fn from(err: serde_json::Error) -> Self {
        CtlError::InvalidInput {
            message: format!("JSON error: {err}"),
        }
    }
}
