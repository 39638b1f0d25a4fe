//! Multi-step agent workflows
//!
//! - [`ensure_deleted`]: stop and delete an agent, no-op when already gone
//! - [`deploy`]: seat check, clean slate, create, wait, restart, wait
//! - [`service_deploy`]: variables from a service descriptor, then one
//!   concurrent [`deploy`] per key
//!
//! Workflows report what they are doing through a [`Progress`] sink and
//! never print on their own.

mod deploy;
mod ensure_deleted;
mod progress;
mod service;

pub use deploy::{deploy, restart_and_wait, DeployOptions};
pub use ensure_deleted::{ensure_deleted, is_absent, DeleteOutcome, DELETE_CHECK_PERIOD, NOT_FOUND_BODY};
pub use progress::{Progress, Silent, WorkflowEvent};
pub use service::{
    agent_name, service_deploy, variable_name, AgentOutcome, ServiceDeployReport,
    ServiceDeployRequest,
};
