//! Explicit target-state waits
//!
//! Some resource families have no operation-status endpoint worth trusting:
//! the only reliable completion signal is a discriminator field on the
//! resource itself (or on a re-submitted request) settling on a target
//! value. [`StateWait`] captures the pending/target state sets and drives a
//! caller-supplied refresh closure until the target is observed, the state
//! goes somewhere unexpected, or the deadline passes.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{CoreError, Result};

/// Configuration for a target-state wait
#[derive(Debug, Clone)]
pub struct StateWait {
    /// States that mean "keep waiting"
    pub pending: Vec<String>,
    /// States that mean "done"
    pub target: Vec<String>,
    /// Floor on the delay between refreshes
    pub min_interval: Duration,
    /// Maximum total time to wait
    pub timeout: Duration,
}

impl StateWait {
    /// Refresh until a target state is observed.
    ///
    /// The closure returns the current payload and state. A state in
    /// `target` finishes the wait with that payload; a state in `pending`
    /// sleeps and refreshes again; anything else is fatal. Retryable errors
    /// from the closure (transport, 5xx, 429) count as pending; other
    /// errors are fatal immediately. State comparison is case-insensitive,
    /// since the API does not report casing consistently.
    pub async fn wait_for_state<T, F, Fut>(&self, mut refresh: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(T, String)>>,
    {
        let start = Instant::now();
        let interval = self.min_interval.max(Duration::from_millis(1));

        loop {
            match refresh().await {
                Ok((payload, state)) => {
                    if matches_state(&self.target, &state) {
                        return Ok(payload);
                    }
                    if !matches_state(&self.pending, &state) {
                        return Err(CoreError::UnexpectedState {
                            state,
                            target: self.target.join(", "),
                        });
                    }
                    debug!(%state, "still pending");
                }
                Err(err) if err.is_retryable() => {
                    debug!(error = %err, "retryable refresh failure, still pending");
                }
                Err(err) => return Err(err),
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(CoreError::Timeout(self.timeout));
            }
            let remaining = self.timeout - elapsed;
            tokio::time::sleep(interval.min(remaining)).await;
            if start.elapsed() >= self.timeout {
                return Err(CoreError::Timeout(self.timeout));
            }
        }
    }
}

fn matches_state(candidates: &[String], state: &str) -> bool {
    candidates.iter().any(|c| c.eq_ignore_ascii_case(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_matching_ignores_case() {
        let states = vec!["Succeeded".to_string()];
        assert!(matches_state(&states, "succeeded"));
        assert!(matches_state(&states, "SUCCEEDED"));
        assert!(!matches_state(&states, "Failed"));
    }
}
