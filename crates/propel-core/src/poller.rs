//! Agent state polling
//!
//! Each iteration fetches the agent once and lands in one of three outcomes:
//!
//! - `Matched`: the state equals the target, return without sleeping
//! - `Unmatched`: sleep one period and poll again; a `null` state never
//!   matches and is reported as `None`
//! - `Unreachable`: the server could not be reached, same as `Unmatched`
//!
//! Any other failure (error status, malformed body) ends the wait right away.
//! The loop runs while `elapsed < timeout`, so a poll that starts just before
//! the deadline is still allowed to finish.

use std::time::Duration;

use tokio::time::Instant;

use crate::api::AgentApi;
use crate::error::{PropelError, Result};

/// Default wait budget
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Stand-in reported for an agent without a state
pub const NO_STATE: &str = "None";

/// Default pause between polls
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(3);

/// Timing of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Wall-clock budget for the whole wait
    pub timeout: Duration,
    /// Pause after every poll that did not match
    pub period: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            period: DEFAULT_PERIOD,
        }
    }
}

impl WaitOptions {
    /// Wait up to `timeout`, polling every `period`
    pub fn new(timeout: Duration, period: Duration) -> Self {
        Self { timeout, period }
    }
}

enum Poll {
    Matched,
    Unmatched,
    Unreachable,
}

async fn poll_once<A, F>(api: &A, agent: &str, target: &str, on_state: &mut F) -> Result<Poll>
where
    A: AgentApi + ?Sized,
    F: FnMut(&str) + Send,
{
    match api.agents_get(agent).await {
        Ok(observed) => {
            on_state(observed.state().unwrap_or(NO_STATE));
            if observed.state() == Some(target) {
                Ok(Poll::Matched)
            } else {
                Ok(Poll::Unmatched)
            }
        }
        Err(e) if e.is_connectivity() => {
            tracing::warn!(agent, "Agent state unavailable: {}", e);
            Ok(Poll::Unreachable)
        }
        Err(e) => Err(e),
    }
}

/// Wait for `agent` to report `target`, pushing every observed state to `on_state`
///
/// The final matching state is reported too. Returns
/// [`PropelError::Timeout`] once the budget is spent, never the connectivity
/// errors swallowed along the way.
pub async fn wait_for_state_with<A, F>(
    api: &A,
    agent: &str,
    target: &str,
    options: WaitOptions,
    mut on_state: F,
) -> Result<()>
where
    A: AgentApi + ?Sized,
    F: FnMut(&str) + Send,
{
    let start = Instant::now();

    while start.elapsed() < options.timeout {
        match poll_once(api, agent, target, &mut on_state).await? {
            Poll::Matched => {
                tracing::debug!(agent, state = target, "Agent reached state");
                return Ok(());
            }
            Poll::Unmatched | Poll::Unreachable => tokio::time::sleep(options.period).await,
        }
    }

    Err(PropelError::Timeout {
        agent: agent.to_string(),
        waiting_for: format!("state: {}", target),
    })
}

/// Wait for `agent` to report `target`
pub async fn wait_for_state<A>(
    api: &A,
    agent: &str,
    target: &str,
    options: WaitOptions,
) -> Result<()>
where
    A: AgentApi + ?Sized,
{
    wait_for_state_with(api, agent, target, options, |_| {}).await
}
