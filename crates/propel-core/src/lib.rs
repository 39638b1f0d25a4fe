//! propel-core: API client and deployment workflows for Propel
//!
//! This crate provides the HTTP transport, the credential store, the typed
//! API client, the agent state poller and the deploy workflows used by the
//! `pcli` command-line tool.

pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod descriptor;
pub mod error;
pub mod poller;
pub mod transport;
pub mod types;
pub mod workflows;

#[cfg(test)]
pub(crate) mod testing;

pub use api::AgentApi;
pub use client::PropelClient;
pub use error::{PropelError, Result};
