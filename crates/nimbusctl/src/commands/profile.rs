//! Profile management commands

use nimbus_core::{PollSettings, Profile};
use serde_json::json;

use crate::connection::ConnectionManager;
use crate::error::{CtlError, Result};
use crate::output::{print_output, OutputFormat};

#[allow(clippy::too_many_arguments)]
pub fn set(
    conn: &mut ConnectionManager,
    name: String,
    api_url: String,
    subscription_id: String,
    access_token: Option<String>,
    poll_interval: Option<u64>,
    poll_timeout: Option<u64>,
    default: bool,
) -> Result<()> {
    let mut profile = Profile {
        api_url,
        subscription_id,
        access_token,
        poll: PollSettings::default(),
    };

    // Re-running `set` keeps what the flags do not replace.
    if let Some(existing) = conn.config.profiles.get(&name) {
        if profile.access_token.is_none() {
            profile.access_token = existing.access_token.clone();
        }
        profile.poll = existing.poll;
    }
    if let Some(interval) = poll_interval {
        profile.poll.interval_secs = interval;
    }
    if let Some(timeout) = poll_timeout {
        profile.poll.timeout_secs = timeout;
    }

    conn.config.profiles.insert(name.clone(), profile);
    if default || conn.config.default_profile.is_none() {
        conn.config.default_profile = Some(name.clone());
    }
    conn.save_config()?;

    println!("Profile '{name}' saved");
    Ok(())
}

pub fn list(conn: &ConnectionManager, format: OutputFormat) -> Result<()> {
    let mut names: Vec<&String> = conn.config.profiles.keys().collect();
    names.sort();

    let rows: Vec<_> = names
        .into_iter()
        .map(|name| {
            let profile = &conn.config.profiles[name];
            json!({
                "name": name,
                "api_url": profile.api_url,
                "subscription_id": profile.subscription_id,
                "default": conn.config.default_profile.as_deref() == Some(name.as_str()),
            })
        })
        .collect();

    print_output(rows, format)?;
    Ok(())
}

pub fn show(conn: &ConnectionManager, name: Option<String>, format: OutputFormat) -> Result<()> {
    let (name, profile) = conn.config.resolve_profile(name.as_deref())?;

    print_output(
        json!({
            "name": name,
            "api_url": profile.api_url,
            "subscription_id": profile.subscription_id,
            "access_token": profile.access_token.as_ref().map(|_| "****"),
            "poll_interval_secs": profile.poll.interval_secs,
            "poll_timeout_secs": profile.poll.timeout_secs,
        }),
        format,
    )?;
    Ok(())
}

pub fn remove(conn: &mut ConnectionManager, name: String) -> Result<()> {
    if conn.config.profiles.remove(&name).is_none() {
        return Err(CtlError::InvalidInput {
            message: format!("profile '{name}' does not exist"),
        });
    }
    if conn.config.default_profile.as_deref() == Some(name.as_str()) {
        conn.config.default_profile = None;
    }
    conn.save_config()?;

    println!("Profile '{name}' removed");
    Ok(())
}
