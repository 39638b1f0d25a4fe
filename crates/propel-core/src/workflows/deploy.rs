//! Single-agent deployment

use std::time::Duration;

use super::{ensure_deleted, Progress, WorkflowEvent};
use crate::api::AgentApi;
use crate::error::{PropelError, Result};
use crate::poller::{wait_for_state_with, WaitOptions, DEFAULT_PERIOD, DEFAULT_TIMEOUT};
use crate::types::{NewAgent, STATE_DEPLOYED, STATE_STARTED};

/// Knobs of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployOptions {
    /// Budget of each wait (and of the clean-up)
    pub timeout: Duration,
    /// Pause between state polls
    pub period: Duration,
    /// Remove a previous agent of the same name first
    pub delete_existing: bool,
    /// Restart after the first deployment so the agent actually runs
    pub restart: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            period: DEFAULT_PERIOD,
            delete_existing: true,
            restart: true,
        }
    }
}

impl DeployOptions {
    fn wait(&self) -> WaitOptions {
        WaitOptions::new(self.timeout, self.period)
    }
}

async fn wait_reporting<A>(
    api: &A,
    agent: &str,
    target: &str,
    options: &DeployOptions,
    progress: &dyn Progress,
) -> Result<()>
where
    A: AgentApi + ?Sized,
{
    wait_for_state_with(api, agent, target, options.wait(), |state| {
        progress.report(WorkflowEvent::StateObserved {
            agent: agent.to_string(),
            state: state.to_string(),
            waiting_for: target.to_string(),
        })
    })
    .await
}

/// Restart an agent and wait until it reports `STARTED`
pub async fn restart_and_wait<A>(
    api: &A,
    agent: &str,
    options: &DeployOptions,
    progress: &dyn Progress,
) -> Result<()>
where
    A: AgentApi + ?Sized,
{
    progress.report(WorkflowEvent::Restarting {
        agent: agent.to_string(),
    });
    api.agents_restart(agent).await?;

    wait_reporting(api, agent, STATE_STARTED, options, progress).await?;
    progress.report(WorkflowEvent::Started {
        agent: agent.to_string(),
    });
    Ok(())
}

/// Deploy `template` as agent `name` and bring it to `STARTED`
///
/// Steps run strictly in order and the first failure aborts:
/// seat check, [`ensure_deleted`], create, wait for `DEPLOYED`, restart,
/// wait for `STARTED`. Re-running after a failure starts from a clean slate.
pub async fn deploy<A>(
    api: &A,
    name: &str,
    template: &NewAgent,
    options: &DeployOptions,
    progress: &dyn Progress,
) -> Result<()>
where
    A: AgentApi + ?Sized,
{
    let seats = api.seats().await?;
    if seats.n_available < 1 {
        return Err(PropelError::NoSeats);
    }
    tracing::debug!(agent = name, available = seats.n_available, "Seats are ok");

    if options.delete_existing {
        ensure_deleted(api, name, options.timeout, progress).await?;
    }

    progress.report(WorkflowEvent::Creating {
        agent: name.to_string(),
    });
    let agent = NewAgent {
        name: Some(name.to_string()),
        ..template.clone()
    };
    api.agents_create(&agent).await?;

    wait_reporting(api, name, STATE_DEPLOYED, options, progress).await?;
    progress.report(WorkflowEvent::Deployed {
        agent: name.to_string(),
    });

    if options.restart {
        restart_and_wait(api, name, options, progress).await?;
    }

    tracing::info!(agent = name, "Agent deployed");
    Ok(())
}
