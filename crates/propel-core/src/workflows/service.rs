//! Multi-agent service deployment

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;

use super::{deploy, DeployOptions, Progress, WorkflowEvent};
use crate::api::AgentApi;
use crate::descriptor::ServiceDescriptor;
use crate::error::Result;
use crate::types::{NewAgent, NewVariable};

/// Remote variable holding `env_name` for service `service`
pub fn variable_name(service: &str, env_name: &str) -> String {
    format!("{}_{}", service.to_uppercase(), env_name)
}

/// Name of the `index`-th agent of `service`
pub fn agent_name(service: &str, index: usize) -> String {
    format!("{}_agent_{}", service, index)
}

/// Inputs of [`service_deploy`]
#[derive(Debug, Clone)]
pub struct ServiceDeployRequest {
    /// Service name, prefix of agent and variable names
    pub name: String,
    /// Service directory (or descriptor file)
    pub service_path: PathBuf,
    /// One agent per key
    pub keys: Vec<u64>,
    /// Creation fields shared by every agent; `key`, `name` and `variables`
    /// are filled in per agent
    pub template: NewAgent,
    pub options: DeployOptions,
    /// Show variable values in progress events instead of masking them
    pub show_variable_value: bool,
}

/// Result of one agent's deployment
#[derive(Debug)]
pub struct AgentOutcome {
    /// Position of the key in the request
    pub index: usize,
    /// Agent name, see [`agent_name`]
    pub agent: String,
    /// Key the agent was created with
    pub key: u64,
    /// `Ok` once the agent reached `STARTED`
    pub result: Result<()>,
}

/// Everything [`service_deploy`] did
#[derive(Debug)]
pub struct ServiceDeployReport {
    /// Variables created, in creation order
    pub variables: Vec<String>,
    /// One outcome per key, in key order
    pub agents: Vec<AgentOutcome>,
}

impl ServiceDeployReport {
    /// Outcomes whose deploy failed, in key order
    pub fn failures(&self) -> impl Iterator<Item = &AgentOutcome> {
        self.agents.iter().filter(|o| o.result.is_err())
    }

    /// True when every agent deployed
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Deploy one agent per key for a service
///
/// Every environment variable the descriptor references and `environment`
/// defines becomes a remote variable `{SERVICE}_{ENV_NAME}`. Then one
/// [`deploy`] per key runs concurrently; a failing agent does not stop its
/// siblings and every outcome is collected in the report.
pub async fn service_deploy<A>(
    api: Arc<A>,
    descriptor: &dyn ServiceDescriptor,
    environment: &HashMap<String, String>,
    request: ServiceDeployRequest,
    progress: Arc<dyn Progress>,
) -> Result<ServiceDeployReport>
where
    A: AgentApi + 'static,
{
    let referenced = descriptor.env_vars_for_service(&request.service_path)?;

    let mut present: Vec<&str> = referenced
        .iter()
        .map(|var| var.name.as_str())
        .filter(|name| environment.contains_key(*name))
        .collect();
    present.sort_unstable();
    present.dedup();

    let mut variables = Vec::with_capacity(present.len());
    for env_name in present {
        let value = environment.get(env_name).cloned().unwrap_or_default();
        let name = variable_name(&request.name, env_name);

        progress.report(WorkflowEvent::VariableCreated {
            name: name.clone(),
            key: env_name.to_string(),
            value: request.show_variable_value.then(|| value.clone()),
        });
        api.variables_create(&NewVariable::new(&name, env_name, value))
            .await?;
        variables.push(name);
    }

    tracing::info!(
        "Deploying {} agents for service {} with variables [{}]",
        request.keys.len(),
        request.name,
        variables.join(",")
    );

    let mut tasks = JoinSet::new();
    for (index, key) in request.keys.iter().copied().enumerate() {
        let api = Arc::clone(&api);
        let progress = Arc::clone(&progress);
        let agent = agent_name(&request.name, index);
        let template = NewAgent {
            key,
            name: None,
            variables: variables.clone(),
            ..request.template.clone()
        };
        let options = request.options;

        progress.report(WorkflowEvent::AgentLaunched {
            agent: agent.clone(),
            key,
        });
        tasks.spawn(async move {
            let result = deploy(&*api, &agent, &template, &options, &*progress).await;
            if let Err(e) = &result {
                tracing::warn!(agent = %agent, "Deploy failed: {}", e);
            }
            AgentOutcome {
                index,
                agent,
                key,
                result,
            }
        });
    }

    let mut agents = Vec::with_capacity(request.keys.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => agents.push(outcome),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => tracing::error!("Deploy task cancelled: {}", e),
        }
    }
    agents.sort_by_key(|o| o.index);

    Ok(ServiceDeployReport { variables, agents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::EnvVarRef;
    use crate::error::PropelError;
    use crate::testing::{FakeService, Step};
    use crate::workflows::Silent;
    use std::collections::BTreeSet;
    use std::path::Path;

    struct StaticDescriptor(Vec<&'static str>);

    impl ServiceDescriptor for StaticDescriptor {
        fn env_vars_for_service(&self, _path: &Path) -> Result<BTreeSet<EnvVarRef>> {
            Ok(self
                .0
                .iter()
                .map(|name| EnvVarRef {
                    name: name.to_string(),
                    default: None,
                })
                .collect())
        }
    }

    fn request(keys: Vec<u64>) -> ServiceDeployRequest {
        ServiceDeployRequest {
            name: "svc".to_string(),
            service_path: PathBuf::from("service"),
            keys,
            template: NewAgent {
                chain_id: Some(100),
                ..NewAgent::default()
            },
            options: DeployOptions::default(),
            show_variable_value: false,
        }
    }

    fn environment() -> HashMap<String, String> {
        HashMap::from([
            ("RPC".to_string(), "http://rpc".to_string()),
            ("API_KEY".to_string(), "secret".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ])
    }

    #[test]
    fn test_names() {
        assert_eq!(variable_name("svc", "RPC"), "SVC_RPC");
        assert_eq!(agent_name("svc", 2), "svc_agent_2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_keys_three_independent_deploys() {
        let service = Arc::new(FakeService::new().with_seats(3));
        let descriptor = StaticDescriptor(vec!["RPC", "API_KEY", "NOT_SET"]);

        let report = service_deploy(
            Arc::clone(&service),
            &descriptor,
            &environment(),
            request(vec![11, 12, 13]),
            Arc::new(Silent),
        )
        .await
        .unwrap();

        assert!(report.is_success());
        assert_eq!(report.variables, vec!["SVC_API_KEY", "SVC_RPC"]);

        let names: Vec<&str> = report.agents.iter().map(|o| o.agent.as_str()).collect();
        assert_eq!(names, vec!["svc_agent_0", "svc_agent_1", "svc_agent_2"]);

        let mut created = service.created();
        created.sort_by_key(|a| a.key);
        assert_eq!(created.len(), 3);
        for (agent, (index, key)) in created.iter().zip([(0, 11), (1, 12), (2, 13)]) {
            assert_eq!(agent.name.as_deref(), Some(agent_name("svc", index).as_str()));
            assert_eq!(agent.key, key);
            assert_eq!(agent.chain_id, Some(100));
            assert_eq!(agent.variables, report.variables);
        }

        let variables = service.variables();
        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0].key, "API_KEY");
        assert_eq!(variables[0].value, "secret");
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_does_not_cancel_siblings() {
        let service = Arc::new(FakeService::new());
        // svc_agent_1 exists and answers with an unexpected payload
        service.script("svc_agent_1", [Step::Fail(500, "boom".into())]);

        let report = service_deploy(
            Arc::clone(&service),
            &StaticDescriptor(vec![]),
            &environment(),
            request(vec![1, 2, 3]),
            Arc::new(Silent),
        )
        .await
        .unwrap();

        assert!(!report.is_success());
        let failed: Vec<&str> = report.failures().map(|o| o.agent.as_str()).collect();
        assert_eq!(failed, vec!["svc_agent_1"]);
        assert!(matches!(
            report.agents[1].result,
            Err(PropelError::DataIntegrity(_))
        ));
        assert_eq!(service.count("restart", "svc_agent_0"), 1);
        assert_eq!(service.count("restart", "svc_agent_2"), 1);
        assert!(report.variables.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_variable_values_masked_unless_requested() {
        let service = Arc::new(FakeService::new());
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let progress: Arc<dyn Progress> =
            Arc::new(move |e: WorkflowEvent| sink.lock().unwrap().push(e.to_string()));

        service_deploy(
            Arc::clone(&service),
            &StaticDescriptor(vec!["API_KEY"]),
            &environment(),
            request(vec![]),
            progress,
        )
        .await
        .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            events.as_slice(),
            ["Create/update variable: SVC_API_KEY: API_KEY=******"]
        );
    }
}
