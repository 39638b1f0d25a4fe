//! Agent commands

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use propel_core::poller::{wait_for_state_with, WaitOptions};
use propel_core::types::{split_list, NewAgent};
use propel_core::workflows::{deploy, ensure_deleted, DeployOptions};
use propel_core::AgentApi;

use super::print_event;
use crate::output::{format_agents, print_json};
use crate::session::Session;

/// Agent creation options shared by `create`, `deploy` and `service deploy`
#[derive(Debug, Clone, Default, Args)]
pub struct AgentOptions {
    /// IPFS hash of the service package
    #[arg(long)]
    pub service_ipfs_hash: Option<String>,

    #[arg(long)]
    pub chain_id: Option<u64>,

    #[arg(long)]
    pub token_id: Option<u64>,

    /// Expose the agent over HTTP
    #[arg(
        long,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub ingress_enabled: bool,

    /// Expose the tendermint node
    #[arg(
        long,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub tendermint_ingress_enabled: bool,
}

impl AgentOptions {
    /// Creation request for one agent
    pub fn to_new_agent(&self, key: u64, name: Option<String>, variables: Vec<String>) -> NewAgent {
        NewAgent {
            key,
            name,
            service_ipfs_hash: self.service_ipfs_hash.clone(),
            chain_id: self.chain_id,
            token_id: self.token_id,
            ingress_enabled: self.ingress_enabled,
            variables,
            tendermint_ingress_enabled: self.tendermint_ingress_enabled,
        }
    }
}

pub async fn agents_list(session: &Session, table: bool) -> Result<()> {
    let agents = session.client.agents_list().await?;
    if table {
        println!("{}", format_agents(&agents));
    } else {
        print_json(&agents)?;
    }
    Ok(())
}

pub async fn agents_get(session: &Session, agent: &str) -> Result<()> {
    let agent = session.client.agents_get(agent).await?;
    print_json(&agent)?;
    Ok(())
}

pub async fn agents_create(
    session: &Session,
    key: u64,
    name: Option<String>,
    variables: Option<&str>,
    options: &AgentOptions,
) -> Result<()> {
    let agent = options.to_new_agent(key, name, split_list(variables));
    let created = session.client.agents_create(&agent).await?;
    print_json(&created)?;
    Ok(())
}

/// Poll until the agent reports `state`, printing every observation
pub async fn agents_wait(
    session: &Session,
    agent: &str,
    state: &str,
    timeout: Duration,
    period: Duration,
) -> Result<()> {
    let secs = period.as_secs();
    wait_for_state_with(
        &session.client,
        agent,
        state,
        WaitOptions::new(timeout, period),
        |current| {
            println!(
                "[Agent: {}] state: {}, waiting for {} for next {} seconds",
                agent, current, state, secs
            )
        },
    )
    .await?;
    Ok(())
}

pub async fn agents_restart(session: &Session, agent: &str) -> Result<()> {
    let reply = session.client.agents_restart(agent).await?;
    println!("[Agent: {}] restart triggered.", agent);
    print_json(&reply)?;
    Ok(())
}

pub async fn agents_stop(session: &Session, agent: &str) -> Result<()> {
    let reply = session.client.agents_stop(agent).await?;
    println!("[Agent: {}] stop triggered.", agent);
    print_json(&reply)?;
    Ok(())
}

pub async fn agents_delete(session: &Session, agent: &str) -> Result<()> {
    let reply = session.client.agents_delete(agent).await?;
    println!("[Agent: {}] delete triggered.", agent);
    print_json(&reply)?;
    Ok(())
}

pub async fn agents_ensure_deleted(session: &Session, agent: &str, timeout: Duration) -> Result<()> {
    ensure_deleted(&session.client, agent, timeout, &print_event).await?;
    Ok(())
}

pub async fn agents_variables_add(
    session: &Session,
    agent: &str,
    variables: Option<&str>,
) -> Result<()> {
    let variables = split_list(variables);
    session.client.agents_variables_add(agent, &variables).await?;
    println!("[Agent: {}] variables added {:?}.", agent, variables);
    Ok(())
}

pub async fn agents_variables_remove(
    session: &Session,
    agent: &str,
    variables: Option<&str>,
) -> Result<()> {
    let variables = split_list(variables);
    session
        .client
        .agents_variables_remove(agent, &variables)
        .await?;
    println!("[Agent: {}] variables removed {:?}.", agent, variables);
    Ok(())
}

/// Seat check, clean slate, create, wait, restart, wait
pub async fn agents_deploy(
    session: &Session,
    key: u64,
    name: &str,
    variables: Option<&str>,
    agent_options: &AgentOptions,
    timeout: Duration,
) -> Result<()> {
    let template = agent_options.to_new_agent(key, None, split_list(variables));
    let options = DeployOptions {
        timeout,
        ..DeployOptions::default()
    };

    deploy(&session.client, name, &template, &options, &print_event).await?;
    Ok(())
}
