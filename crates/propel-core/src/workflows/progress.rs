//! Workflow progress reporting

use std::fmt;

/// Something a workflow did or observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// A poll observed an agent state
    StateObserved {
        agent: String,
        state: String,
        waiting_for: String,
    },
    /// The agent was gone before any step ran
    AlreadyDeleted { agent: String },
    /// A stop was requested
    Stopping { agent: String },
    /// A deletion was requested
    Deleting { agent: String },
    /// The agent is confirmed gone
    Deleted { agent: String },
    /// A creation was requested
    Creating { agent: String },
    /// The new agent reported `DEPLOYED`
    Deployed { agent: String },
    /// A restart was requested
    Restarting { agent: String },
    /// The agent reported `STARTED`
    Started { agent: String },
    /// A service variable was created or updated; `value` is `None` when masked
    VariableCreated {
        name: String,
        key: String,
        value: Option<String>,
    },
    /// A service deploy task was launched for an agent
    AgentLaunched { agent: String, key: u64 },
}

impl fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowEvent::StateObserved {
                agent,
                state,
                waiting_for,
            } => write!(f, "[Agent: {}] state: {}, waiting for {}", agent, state, waiting_for),
            WorkflowEvent::AlreadyDeleted { agent } => write!(f, "[Agent: {}] already deleted", agent),
            WorkflowEvent::Stopping { agent } => write!(f, "[Agent: {}] stopping", agent),
            WorkflowEvent::Deleting { agent } => write!(f, "[Agent: {}] deleting", agent),
            WorkflowEvent::Deleted { agent } => write!(f, "[Agent: {}] Agent was deleted", agent),
            WorkflowEvent::Creating { agent } => write!(f, "[Agent: {}] create agent", agent),
            WorkflowEvent::Deployed { agent } => write!(f, "[Agent: {}] agent deployed", agent),
            WorkflowEvent::Restarting { agent } => write!(f, "[Agent: {}] agent restarting", agent),
            WorkflowEvent::Started { agent } => write!(f, "[Agent: {}] agent started", agent),
            WorkflowEvent::VariableCreated { name, key, value } => write!(
                f,
                "Create/update variable: {}: {}={}",
                name,
                key,
                value.as_deref().unwrap_or("******")
            ),
            WorkflowEvent::AgentLaunched { agent, key } => {
                write!(f, "[Agent: {}] Deploying with key id {}", agent, key)
            }
        }
    }
}

/// Receives workflow events as they happen
pub trait Progress: Send + Sync {
    /// Handle one event; must not block
    fn report(&self, event: WorkflowEvent);
}

impl<F> Progress for F
where
    F: Fn(WorkflowEvent) + Send + Sync,
{
    fn report(&self, event: WorkflowEvent) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Progress for Silent {
    fn report(&self, _event: WorkflowEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_variable_value() {
        let masked = WorkflowEvent::VariableCreated {
            name: "SVC_RPC".into(),
            key: "RPC".into(),
            value: None,
        };
        assert_eq!(masked.to_string(), "Create/update variable: SVC_RPC: RPC=******");
    }

    #[test]
    fn test_state_line() {
        let event = WorkflowEvent::StateObserved {
            agent: "a".into(),
            state: "CREATING".into(),
            waiting_for: "DEPLOYED".into(),
        };
        assert_eq!(event.to_string(), "[Agent: a] state: CREATING, waiting for DEPLOYED");
    }
}
