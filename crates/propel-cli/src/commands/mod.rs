//! CLI command implementations

mod agents;
mod auth;
mod config;
mod keys;
mod seats;
mod service;
mod variables;

pub use agents::{
    agents_create, agents_delete, agents_deploy, agents_ensure_deleted, agents_get, agents_list,
    agents_restart, agents_stop, agents_variables_add, agents_variables_remove, agents_wait,
    AgentOptions,
};
pub use auth::{call_command, login_command, logout_command, parse_payload};
pub use config::{config_path, config_show};
pub use keys::{keys_create, keys_list};
pub use seats::seats_ensure;
pub use service::{parse_keys, service_deploy_command, ServiceDeployArgs};
pub use variables::{variables_create, variables_list};

use propel_core::workflows::WorkflowEvent;

/// Print workflow progress lines on stdout
pub(crate) fn print_event(event: WorkflowEvent) {
    println!("{}", event);
}
