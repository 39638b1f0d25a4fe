//! In-memory Propel service for poller and workflow tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::api::AgentApi;
use crate::error::{PropelError, Result, TransportError};
use crate::types::{Agent, NewAgent, NewVariable, Seats};
use crate::workflows::NOT_FOUND_BODY;

/// What one `agents_get` answers
#[derive(Debug, Clone)]
pub(crate) enum Step {
    State(Option<String>),
    Unreachable,
    NotFound,
    Fail(u16, String),
}

impl Step {
    pub(crate) fn state(state: &str) -> Self {
        Step::State(Some(state.to_string()))
    }

    /// Agent exists but reports `null` as its state
    pub(crate) fn no_state() -> Self {
        Step::State(None)
    }
}

struct Inner {
    seats: i64,
    /// Remaining answers per agent; the last one repeats forever
    agents: HashMap<String, VecDeque<Step>>,
    on_create: Vec<Step>,
    on_stop: Vec<Step>,
    on_restart: Vec<Step>,
    on_delete: Vec<Step>,
    calls: Vec<(String, String)>,
    created: Vec<NewAgent>,
    variables: Vec<NewVariable>,
}

/// Scripted agent service
///
/// Unknown agents answer with the not-found sentinel. Lifecycle calls replace
/// the agent's script: create -> `DEPLOYED`, stop -> `DEPLOYED`,
/// restart -> `STARTED`, delete -> not found, unless overridden.
pub(crate) struct FakeService {
    inner: Mutex<Inner>,
}

impl FakeService {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                seats: 1,
                agents: HashMap::new(),
                on_create: vec![Step::state("DEPLOYED")],
                on_stop: vec![Step::state("DEPLOYED")],
                on_restart: vec![Step::state("STARTED")],
                on_delete: vec![Step::NotFound],
                calls: Vec::new(),
                created: Vec::new(),
                variables: Vec::new(),
            }),
        }
    }

    pub(crate) fn with_seats(self, seats: i64) -> Self {
        self.inner.lock().unwrap().seats = seats;
        self
    }

    pub(crate) fn script(&self, agent: &str, steps: impl IntoIterator<Item = Step>) {
        self.inner
            .lock()
            .unwrap()
            .agents
            .insert(agent.to_string(), steps.into_iter().collect());
    }

    pub(crate) fn on_stop(&self, steps: impl IntoIterator<Item = Step>) {
        self.inner.lock().unwrap().on_stop = steps.into_iter().collect();
    }

    pub(crate) fn on_delete(&self, steps: impl IntoIterator<Item = Step>) {
        self.inner.lock().unwrap().on_delete = steps.into_iter().collect();
    }

    pub(crate) fn on_restart(&self, steps: impl IntoIterator<Item = Step>) {
        self.inner.lock().unwrap().on_restart = steps.into_iter().collect();
    }

    /// Number of `op` calls made for `agent`
    pub(crate) fn count(&self, op: &str, agent: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(o, a)| o == op && a == agent)
            .count()
    }

    /// Operations made for `agent`, in order, with consecutive gets collapsed
    pub(crate) fn ops_for(&self, agent: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        let mut ops: Vec<String> = Vec::new();
        for (op, a) in &inner.calls {
            if a != agent && op != "seats" {
                continue;
            }
            if op == "get" && ops.last().map(String::as_str) == Some("get") {
                continue;
            }
            ops.push(op.clone());
        }
        ops
    }

    pub(crate) fn created(&self) -> Vec<NewAgent> {
        self.inner.lock().unwrap().created.clone()
    }

    pub(crate) fn variables(&self) -> Vec<NewVariable> {
        self.inner.lock().unwrap().variables.clone()
    }

    fn record(&self, op: &str, agent: &str) {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push((op.to_string(), agent.to_string()));
    }

    fn replace_script(&self, agent: &str, pick: impl Fn(&Inner) -> Vec<Step>) {
        let mut inner = self.inner.lock().unwrap();
        let steps = pick(&inner);
        inner.agents.insert(agent.to_string(), steps.into());
    }

    fn next_step(&self, agent: &str) -> Step {
        let mut inner = self.inner.lock().unwrap();
        match inner.agents.get_mut(agent) {
            Some(steps) if steps.len() > 1 => steps.pop_front().unwrap_or(Step::NotFound),
            Some(steps) => steps.front().cloned().unwrap_or(Step::NotFound),
            None => Step::NotFound,
        }
    }
}

fn ack(agent: &str) -> Value {
    json!({ "name": agent })
}

#[async_trait]
impl AgentApi for FakeService {
    async fn seats(&self) -> Result<Seats> {
        self.record("seats", "");
        Ok(Seats {
            n_available: self.inner.lock().unwrap().seats,
            extra: Map::new(),
        })
    }

    async fn agents_get(&self, agent: &str) -> Result<Agent> {
        self.record("get", agent);
        match self.next_step(agent) {
            Step::State(state) => Ok(Agent {
                id: None,
                name: Some(agent.to_string()),
                agent_state: state,
                extra: Map::new(),
            }),
            Step::Unreachable => Err(TransportError::Connect("connection refused".into()).into()),
            Step::NotFound => Err(PropelError::Http {
                code: 404,
                body: NOT_FOUND_BODY.to_string(),
            }),
            Step::Fail(code, body) => Err(PropelError::Http { code, body }),
        }
    }

    async fn agents_create(&self, agent: &NewAgent) -> Result<Value> {
        let name = agent.name.clone().unwrap_or_default();
        self.record("create", &name);
        self.inner.lock().unwrap().created.push(agent.clone());
        self.replace_script(&name, |i| i.on_create.clone());
        Ok(ack(&name))
    }

    async fn agents_restart(&self, agent: &str) -> Result<Value> {
        self.record("restart", agent);
        self.replace_script(agent, |i| i.on_restart.clone());
        Ok(ack(agent))
    }

    async fn agents_stop(&self, agent: &str) -> Result<Value> {
        self.record("stop", agent);
        self.replace_script(agent, |i| i.on_stop.clone());
        Ok(ack(agent))
    }

    async fn agents_delete(&self, agent: &str) -> Result<Value> {
        self.record("delete", agent);
        self.replace_script(agent, |i| i.on_delete.clone());
        Ok(ack(agent))
    }

    async fn variables_create(&self, variable: &NewVariable) -> Result<Value> {
        self.record("variable", &variable.name);
        self.inner.lock().unwrap().variables.push(variable.clone());
        Ok(json!({ "name": variable.name }))
    }
}
