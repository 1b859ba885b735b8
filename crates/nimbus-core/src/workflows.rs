//! CRUD-and-wait workflows
//!
//! These compose a mutating request with operation polling and a final
//! re-fetch, so callers get the settled resource back in one call.

use serde_json::Value;
use tracing::debug;

use crate::client::RestClient;
use crate::error::Result;
use crate::operation::Operation;
use crate::poller::{poll_until_done, PollOptions, ProgressCallback};

/// PUT a resource and wait for the operation to settle.
///
/// 1. Submit the PUT (returns synchronously or with an operation to poll)
/// 2. Poll until terminal
/// 3. Fetch and return the resource in its final form
pub async fn create_or_update_and_wait(
    client: &RestClient,
    path: &str,
    body: &Value,
    options: &PollOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Value> {
    let response = client.put(path, body).await?;
    let operation = Operation::from_response(client.resolve(path)?, &response)?;
    poll_until_done(client, operation, options, on_progress).await?;

    debug!(path, "operation settled, fetching final resource");
    let settled = client.get(path).await?;
    settled.json()
}

/// DELETE a resource and wait for the operation to settle.
///
/// A 404 on the initial DELETE means the resource is already gone, which is
/// success for this workflow.
pub async fn delete_and_wait(
    client: &RestClient,
    path: &str,
    options: &PollOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<()> {
    let response = match client.delete(path).await {
        Ok(response) => response,
        Err(err) if err.is_not_found() => {
            debug!(path, "resource already absent");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let operation = Operation::from_response(client.resolve(path)?, &response)?;
    poll_until_done(client, operation, options, on_progress).await?;
    Ok(())
}
