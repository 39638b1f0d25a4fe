//! Service deployment command

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;

use propel_core::descriptor::YamlServiceDescriptor;
use propel_core::workflows::{service_deploy, DeployOptions, Progress, ServiceDeployRequest};

use super::{print_event, AgentOptions};
use crate::output::{print_error, print_success};
use crate::session::Session;

#[derive(Debug, Clone, Args)]
pub struct ServiceDeployArgs {
    /// Comma separated key ids, one agent per key
    #[arg(long)]
    pub keys: String,

    /// Service directory (or service.yaml)
    #[arg(long)]
    pub service_dir: PathBuf,

    /// Service name, prefix of agent and variable names
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub agent: AgentOptions,

    /// Timeout in seconds for every wait
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Print variable values instead of masking them
    #[arg(
        long,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub show_variable_value: bool,
}

/// Parse `1,2,3` into key ids
pub fn parse_keys(raw: &str) -> Result<Vec<u64>> {
    let keys = raw
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| k.parse::<u64>().with_context(|| format!("Invalid key id: {}", k)))
        .collect::<Result<Vec<_>>>()?;

    if keys.is_empty() {
        bail!("No keys given");
    }
    Ok(keys)
}

/// Process environment, skipping entries that are not valid UTF-8
pub fn environment_snapshot() -> HashMap<String, String> {
    utf8_entries(std::env::vars_os())
}

fn utf8_entries(vars: impl IntoIterator<Item = (OsString, OsString)>) -> HashMap<String, String> {
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (Ok(key), Err(_)) => {
                tracing::warn!("Skipping environment variable {} with a non UTF-8 value", key);
                None
            }
            (Err(key), _) => {
                tracing::warn!("Skipping environment variable {:?} with a non UTF-8 name", key);
                None
            }
        })
        .collect()
}

/// Create the service variables and deploy one agent per key
pub async fn service_deploy_command(session: &Session, args: ServiceDeployArgs) -> Result<()> {
    let keys = parse_keys(&args.keys)?;
    let environment = environment_snapshot();

    let request = ServiceDeployRequest {
        name: args.name.clone(),
        service_path: args.service_dir.clone(),
        keys,
        template: args.agent.to_new_agent(0, None, Vec::new()),
        options: DeployOptions {
            timeout: Duration::from_secs(args.timeout),
            ..DeployOptions::default()
        },
        show_variable_value: args.show_variable_value,
    };

    let progress: Arc<dyn Progress> = Arc::new(print_event);
    let report = service_deploy(
        Arc::new(session.client.clone()),
        &YamlServiceDescriptor,
        &environment,
        request,
        progress,
    )
    .await?;

    for failure in report.failures() {
        if let Err(e) = &failure.result {
            print_error(&format!("[Agent {}]: {}", failure.agent, e));
        }
    }
    if !report.is_success() {
        bail!("Agent errors!");
    }

    print_success("All agents deployed");
    Ok(())
}
