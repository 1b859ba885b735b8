//! Operation handles for asynchronous mutations
//!
//! A mutating call against the Resource Manager either completes
//! synchronously (200/201 with a body) or is accepted asynchronously, in
//! which case the response names an operation-status endpoint to poll.
//! [`Operation::from_response`] classifies the acceptance response into an
//! [`Operation`] handle; [`crate::poller::poll_until_done`] drives the handle
//! to a terminal state.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::client::ApiResponse;
use crate::error::{CoreError, Result};

/// Lifecycle state of a remote operation.
///
/// `Succeeded`, `Failed` and `Cancelled` are terminal: once observed, no
/// further polling happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    InProgress,
    Succeeded,
    Failed,
    Cancelled,
}

impl PollState {
    /// Classify a status marker from an operation-status document or a
    /// resource's `provisioningState`. Unrecognised markers mean the remote
    /// side is still working.
    pub fn parse(marker: &str) -> Self {
        match marker.to_ascii_lowercase().as_str() {
            "succeeded" => PollState::Succeeded,
            "failed" => PollState::Failed,
            "canceled" | "cancelled" => PollState::Cancelled,
            _ => PollState::InProgress,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::InProgress)
    }
}

/// What the poller should re-query to observe progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PollTarget {
    /// A dedicated operation-status endpoint
    StatusEndpoint(Url),
    /// The resource itself, watching its status marker
    Resource(Url),
}

/// Handle for an in-flight (or already-terminal) remote mutation
#[derive(Debug, Clone)]
pub struct Operation {
    pub(crate) target: Option<PollTarget>,
    state: PollState,
    payload: Option<Value>,
    retry_after: Option<Duration>,
}

impl Operation {
    /// Classify the response to a mutating request.
    ///
    /// - 202 Accepted must name an operation URL (`Operation-Location` or
    ///   `Location`); a 202 without one is malformed.
    /// - 200/201 with an `Operation-Location` header polls that endpoint.
    /// - 200/201 whose body carries a non-terminal status marker polls the
    ///   resource URL itself until the marker settles.
    /// - 200/201 without a status marker is already terminal; the body is
    ///   the final payload and no polling happens.
    pub fn from_response(resource_url: Url, response: &ApiResponse) -> Result<Self> {
        if response.status().as_u16() == 202 {
            let url = response
                .operation_url()
                .ok_or(CoreError::MissingOperationUrl)?;
            return Ok(Self {
                target: Some(PollTarget::StatusEndpoint(url)),
                state: PollState::InProgress,
                payload: None,
                retry_after: response.retry_after(),
            });
        }

        if let Some(url) = response.operation_location() {
            return Ok(Self {
                target: Some(PollTarget::StatusEndpoint(url)),
                state: PollState::InProgress,
                payload: None,
                retry_after: response.retry_after(),
            });
        }

        let body = response.body_value()?;
        let state = body
            .as_ref()
            .and_then(status_marker)
            .map(PollState::parse)
            // No explicit marker on a success response means there is
            // nothing left to wait for.
            .unwrap_or(PollState::Succeeded);

        if state.is_terminal() {
            return Ok(Self {
                target: None,
                state,
                payload: body,
                retry_after: None,
            });
        }

        Ok(Self {
            target: Some(PollTarget::Resource(resource_url)),
            state: PollState::InProgress,
            payload: None,
            retry_after: response.retry_after(),
        })
    }

    /// Build a handle for a known operation-status URL, e.g. one printed by
    /// a `--no-wait` invocation and resumed later
    pub fn from_status_url(url: Url) -> Self {
        Self {
            target: Some(PollTarget::StatusEndpoint(url)),
            state: PollState::InProgress,
            payload: None,
            retry_after: None,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Terminal payload captured at acceptance time, for operations that
    /// completed synchronously
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Consume the handle, yielding the terminal payload if any
    pub fn into_payload(self) -> Option<Value> {
        self.payload
    }

    /// The URL the poller will query, if polling is needed
    pub fn poll_url(&self) -> Option<&Url> {
        match &self.target {
            Some(PollTarget::StatusEndpoint(url)) | Some(PollTarget::Resource(url)) => Some(url),
            None => None,
        }
    }

    /// Server-suggested delay before the first poll
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}

/// Find the explicit status marker in a polled document: the `status` field
/// of an operation-status payload, or a resource's
/// `properties.provisioningState`.
pub(crate) fn status_marker(value: &Value) -> Option<&str> {
    value
        .get("status")
        .and_then(Value::as_str)
        .or_else(|| {
            value
                .pointer("/properties/provisioningState")
                .and_then(Value::as_str)
        })
        .or_else(|| value.get("provisioningState").and_then(Value::as_str))
}

/// Extract the remote-provided failure message from a terminal document,
/// falling back to the raw marker
pub(crate) fn failure_message(value: &Value, marker: &str) -> String {
    value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("operation finished with status {marker:?}"))
}
