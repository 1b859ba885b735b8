//! Raw operation handling
//!
//! `--no-wait` invocations print an operation URL; these commands resume
//! waiting on (or inspect) such an operation later, possibly from a
//! different process.

use std::time::Duration;

use nimbus_core::{poll_until_done, CoreError, Operation, PollOptions};
use url::Url;

use crate::commands::progress_spinner;
use crate::connection::ConnectionManager;
use crate::error::{CtlError, Result};
use crate::output::{print_output, OutputFormat};

pub async fn wait(
    conn: &ConnectionManager,
    profile: Option<&str>,
    url: String,
    timeout: u64,
    poll_interval: u64,
    format: OutputFormat,
) -> Result<()> {
    let ctx = conn.context(profile)?;
    let status_url = Url::parse(&url).map_err(CoreError::from)?;
    let operation = Operation::from_status_url(status_url);
    let options = PollOptions::new(
        Duration::from_secs(timeout),
        Duration::from_secs(poll_interval),
    );

    let (pb, callback) = progress_spinner("Waiting for operation");
    let result = poll_until_done(&ctx.client, operation, &options, Some(callback)).await;
    pb.finish_and_clear();

    match result? {
        Some(payload) => print_output(payload, format)?,
        None => println!("Operation completed."),
    }
    Ok(())
}

pub async fn status(
    conn: &ConnectionManager,
    profile: Option<&str>,
    url: String,
    format: OutputFormat,
) -> Result<()> {
    let ctx = conn.context(profile)?;
    let status_url = Url::parse(&url).map_err(CoreError::from)?;

    let response = ctx.client.get_url(&status_url).await?;
    match response.body_value().map_err(CtlError::from)? {
        Some(body) => print_output(body, format)?,
        None => println!("(no status document)"),
    }
    Ok(())
}
