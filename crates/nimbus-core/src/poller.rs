//! Polling for asynchronous Resource Manager operations
//!
//! Mutations that the API accepts asynchronously must be polled until they
//! reach a terminal state. This module provides that polling with optional
//! progress callbacks for UI updates.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::client::RestClient;
use crate::error::{CoreError, Result};
use crate::operation::{failure_message, status_marker, Operation, PollState, PollTarget};

/// Deadline and pacing for a single poll loop
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Maximum total time to wait for a terminal state
    pub timeout: Duration,
    /// Floor on the delay between polls; never zero, and stretched by any
    /// server-provided `Retry-After` hint
    pub interval: Duration,
}

impl PollOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1800),
            interval: Duration::from_secs(10),
        }
    }
}

/// Progress events emitted while waiting on an operation
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Polling has started against the given URL
    Started { url: String },
    /// Polling iteration with the remote-reported status
    Polling { status: String, elapsed: Duration },
    /// Operation reached terminal success
    Completed { elapsed: Duration },
    /// Operation failed or the deadline passed
    Failed { error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive spinners; library consumers typically pass
/// `None`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}

/// Poll an operation until it reaches a terminal state.
///
/// Returns the terminal payload: the embedded `result` document when polling
/// an operation-status endpoint, the final resource document when polling
/// the resource itself, or `None` when the operation finished without one
/// (deletes, typically).
///
/// Classification per iteration:
/// - transport errors, 5xx and 429 are retried, bounded only by the deadline
/// - any other 4xx aborts immediately
/// - a `Failed` or `Cancelled` status marker aborts with the remote message
/// - a 200 response with no status marker is terminal success
///
/// The deadline is checked before and after every sleep, so no status
/// request is issued once it has passed; expiry is reported as
/// [`CoreError::Timeout`], distinct from remote failure.
pub async fn poll_until_done(
    client: &RestClient,
    operation: Operation,
    options: &PollOptions,
    on_progress: Option<ProgressCallback>,
) -> Result<Option<Value>> {
    let start = Instant::now();

    // Short-circuit: the mutating response already carried a terminal state.
    match operation.state() {
        PollState::Succeeded => return Ok(operation.into_payload()),
        PollState::Failed | PollState::Cancelled => {
            let message = operation
                .payload()
                .map(|body| failure_message(body, "Failed"))
                .unwrap_or_else(|| "operation failed".to_string());
            return Err(CoreError::OperationFailed { message });
        }
        PollState::InProgress => {}
    }

    let target = operation
        .target
        .clone()
        .ok_or(CoreError::MissingOperationUrl)?;
    let (poll_url, polling_resource) = match &target {
        PollTarget::StatusEndpoint(url) => (url.clone(), false),
        PollTarget::Resource(url) => (url.clone(), true),
    };

    emit(
        &on_progress,
        ProgressEvent::Started {
            url: poll_url.to_string(),
        },
    );

    // The interval is a floor, never zero: rate limits apply to status
    // endpoints too.
    let floor = options.interval.max(Duration::from_millis(1));
    let mut delay = operation.retry_after().unwrap_or(floor).max(floor);

    loop {
        let elapsed = start.elapsed();
        if elapsed >= options.timeout {
            emit(
                &on_progress,
                ProgressEvent::Failed {
                    error: "deadline exceeded".to_string(),
                },
            );
            return Err(CoreError::Timeout(options.timeout));
        }

        // Never sleep past the deadline; if we wake at or beyond it, report
        // timeout instead of issuing another request.
        let remaining = options.timeout - elapsed;
        tokio::time::sleep(delay.min(remaining)).await;
        if start.elapsed() >= options.timeout {
            emit(
                &on_progress,
                ProgressEvent::Failed {
                    error: "deadline exceeded".to_string(),
                },
            );
            return Err(CoreError::Timeout(options.timeout));
        }

        let response = match client.get_url(&poll_url).await {
            Ok(response) => response,
            Err(err) if polling_resource && err.is_not_found() => {
                // Deleting a resource and the resource is gone: done.
                emit(
                    &on_progress,
                    ProgressEvent::Completed {
                        elapsed: start.elapsed(),
                    },
                );
                return Ok(None);
            }
            Err(err) if err.is_retryable() => {
                debug!(%poll_url, error = %err, "transient poll failure, retrying");
                delay = floor;
                continue;
            }
            Err(err) => {
                emit(
                    &on_progress,
                    ProgressEvent::Failed {
                        error: err.to_string(),
                    },
                );
                return Err(err);
            }
        };

        delay = response
            .retry_after()
            .map(|hint| hint.max(floor))
            .unwrap_or(floor);

        let Some(body) = response.body_value()? else {
            // 200 with no body and no marker: nothing left to wait for.
            emit(
                &on_progress,
                ProgressEvent::Completed {
                    elapsed: start.elapsed(),
                },
            );
            return Ok(None);
        };

        let Some(marker) = status_marker(&body).map(str::to_string) else {
            emit(
                &on_progress,
                ProgressEvent::Completed {
                    elapsed: start.elapsed(),
                },
            );
            return Ok(Some(body));
        };

        match PollState::parse(&marker) {
            PollState::Succeeded => {
                emit(
                    &on_progress,
                    ProgressEvent::Completed {
                        elapsed: start.elapsed(),
                    },
                );
                let payload = if polling_resource {
                    Some(body)
                } else {
                    body.get("result").cloned()
                };
                return Ok(payload);
            }
            PollState::Failed => {
                let message = failure_message(&body, &marker);
                emit(
                    &on_progress,
                    ProgressEvent::Failed {
                        error: message.clone(),
                    },
                );
                return Err(CoreError::OperationFailed { message });
            }
            PollState::Cancelled => {
                let message = "operation was cancelled".to_string();
                emit(
                    &on_progress,
                    ProgressEvent::Failed {
                        error: message.clone(),
                    },
                );
                return Err(CoreError::OperationFailed { message });
            }
            PollState::InProgress => {
                debug!(%poll_url, status = %marker, "operation still in progress");
                emit(
                    &on_progress,
                    ProgressEvent::Polling {
                        status: marker,
                        elapsed: start.elapsed(),
                    },
                );
            }
        }
    }
}
