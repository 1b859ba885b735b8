//! Connection management: profiles and environment to authenticated clients

use std::path::PathBuf;

use nimbus_core::{Config, LockRegistry, PollOptions, RestClient};
use tracing::{debug, info};

use crate::cli::WaitArgs;
use crate::error::{CtlError, Result};

/// Resolved connection context for one command invocation
pub struct ApiContext {
    pub client: RestClient,
    pub subscription_id: String,
    /// Polling defaults from the profile; per-command flags override these
    pub poll: PollOptions,
}

impl ApiContext {
    /// Apply command-line wait flags on top of the profile's poll settings
    pub fn poll_options(&self, wait: &WaitArgs) -> PollOptions {
        let mut options = self.poll;
        if let Some(timeout) = wait.timeout {
            options.timeout = std::time::Duration::from_secs(timeout);
        }
        if let Some(interval) = wait.poll_interval {
            options.interval = std::time::Duration::from_secs(interval);
        }
        options
    }
}

/// Creates authenticated clients from profile configuration, and owns the
/// process-wide lock registry for resource families that need serialized
/// mutations
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub locks: LockRegistry,
}

impl ConnectionManager {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            locks: LockRegistry::new(),
        }
    }

    /// Save the configuration back to where it was loaded from
    pub fn save_config(&self) -> Result<()> {
        match &self.config_path {
            Some(path) => self.config.save_to_path(path)?,
            None => self.config.save()?,
        }
        Ok(())
    }

    /// Resolve a profile (plus environment overrides) into an API context.
    ///
    /// When --config-file is given explicitly, environment variables are
    /// ignored: explicit configuration wins, and tests get true isolation.
    pub fn context(&self, profile_name: Option<&str>) -> Result<ApiContext> {
        let use_env = self.config_path.is_none();
        if !use_env {
            debug!("--config-file specified, ignoring NIMBUS_* environment variables");
        }

        let env_api_url = env_var(use_env, "NIMBUS_API_URL");
        let env_token = env_var(use_env, "NIMBUS_ACCESS_TOKEN");
        let env_subscription = env_var(use_env, "NIMBUS_SUBSCRIPTION_ID");

        // A complete set of environment variables stands on its own, with no
        // profile needed.
        if let (Some(api_url), Some(token), Some(subscription_id)) =
            (&env_api_url, &env_token, &env_subscription)
        {
            info!("using Nimbus credentials from environment variables");
            return Ok(ApiContext {
                client: RestClient::new(api_url, token)?,
                subscription_id: subscription_id.clone(),
                poll: PollOptions::default(),
            });
        }

        let (name, profile) = self.config.resolve_profile(profile_name)?;
        info!(profile = %name, "using profile");

        let token = profile
            .access_token
            .clone()
            .or(env_token)
            .ok_or_else(|| CtlError::InvalidInput {
                message: format!(
                    "profile '{name}' has no access token; set one or export NIMBUS_ACCESS_TOKEN"
                ),
            })?;

        Ok(ApiContext {
            client: RestClient::new(&profile.api_url, &token)?,
            subscription_id: profile.subscription_id.clone(),
            poll: profile.poll.into(),
        })
    }
}

fn env_var(enabled: bool, name: &str) -> Option<String> {
    if !enabled {
        return None;
    }
    let value = std::env::var(name).ok()?;
    debug!("found {name} environment variable");
    Some(value)
}
