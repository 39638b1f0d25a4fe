//! Remote operations the poller and workflows depend on

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{Agent, NewAgent, NewVariable, Seats};

/// Agent lifecycle operations of the Propel service
///
/// Implemented by [`crate::PropelClient`]; workflows are written against this
/// trait so they can be driven by an in-memory service in tests.
#[async_trait]
pub trait AgentApi: Send + Sync {
    /// Current seat allocation
    async fn seats(&self) -> Result<Seats>;

    /// Fetch one agent by name or id
    async fn agents_get(&self, agent: &str) -> Result<Agent>;

    /// Create an agent
    async fn agents_create(&self, agent: &NewAgent) -> Result<Value>;

    /// Trigger a restart
    async fn agents_restart(&self, agent: &str) -> Result<Value>;

    /// Trigger a stop
    async fn agents_stop(&self, agent: &str) -> Result<Value>;

    /// Trigger deletion
    async fn agents_delete(&self, agent: &str) -> Result<Value>;

    /// Create or update a variable
    async fn variables_create(&self, variable: &NewVariable) -> Result<Value>;
}
