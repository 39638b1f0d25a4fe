//! Typed client for the Propel HTTP API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::api::AgentApi;
use crate::config::ClientConfig;
use crate::credentials::{Credential, CredentialStore, FileCredentialStore};
use crate::error::{PropelError, Result};
use crate::poller::{self, WaitOptions};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, RequestBody, Transport};
use crate::types::{Agent, NewAgent, NewVariable, Seats, Variable};

/// Endpoint paths, relative to the base URL
pub mod endpoints {
    pub const LOGIN: &str = "/api2/token-auth/";
    pub const LOGOUT: &str = "/api2/token-auth/logout";
    pub const KEYS: &str = "/api2/keys";
    pub const SEATS: &str = "/api2/seats";
    pub const AGENTS: &str = "/api2/agents";
    pub const VARIABLES: &str = "/api2/variables";
    pub const OPENAI: &str = "/openai/";
}

const OK: &[u16] = &[200];
const CREATED: &[u16] = &[201];

/// Client for the Propel service
///
/// Cheap to share: the transport and credential store sit behind `Arc`s and
/// every call reads the credential afresh.
#[derive(Clone)]
pub struct PropelClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
}

impl PropelClient {
    /// Create a client over an explicit transport and credential store
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            credentials,
        }
    }

    /// Client over HTTP with the file credential store
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        let store = match &config.credentials_path {
            Some(path) => FileCredentialStore::new(path),
            None => FileCredentialStore::default_location()?,
        };

        Ok(Self::new(
            config.normalized_base_url(),
            Arc::new(transport),
            Arc::new(store),
        ))
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn credential(&self) -> Result<Credential> {
        self.credentials.load()?.ok_or(PropelError::NoCredentials)
    }

    async fn authenticated(&self, request: HttpRequest, expected: &[u16]) -> Result<HttpResponse> {
        let credential = self.credential()?;
        let request = credential
            .headers()
            .fold(request, |req, (name, value)| req.header(name, value));

        let response = self.transport.send(request).await?;
        check_response(response, expected)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .authenticated(HttpRequest::get(self.url(path)), OK)
            .await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: RequestBody,
        expected: &[u16],
    ) -> Result<T> {
        let response = self
            .authenticated(HttpRequest::post(self.url(path), body), expected)
            .await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Log in and persist the returned token
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential> {
        let request = HttpRequest::post(
            self.url(endpoints::LOGIN),
            RequestBody::Form(vec![
                ("username".to_string(), username.to_string()),
                ("password".to_string(), password.to_string()),
            ]),
        );

        let response = self.transport.send(request).await?;
        if response.status != 200 {
            return Err(PropelError::Login(format!(
                "Bad status code: {}. Content: {}",
                response.status, response.body
            )));
        }

        let token = serde_json::from_str::<Value>(&response.body)
            .ok()
            .and_then(|v| v.get("token").and_then(Value::as_str).map(String::from))
            .ok_or_else(|| PropelError::Login("no token in server response".to_string()))?;

        let credential = Credential::from_token(&token);
        self.credentials.store(&credential)?;
        tracing::info!("Logged in as {}", username);
        Ok(credential)
    }

    /// Invalidate the token server-side and forget it locally
    pub async fn logout(&self) -> Result<()> {
        self.authenticated(HttpRequest::get(self.url(endpoints::LOGOUT)), OK)
            .await?;
        self.credentials.clear()?;
        Ok(())
    }

    /// Forward a call to the OpenAI proxy and return the raw response body
    pub async fn openai(&self, path: &str, payload: Option<Value>) -> Result<String> {
        let body = json!({ "endpoint_path": path, "payload": payload });
        let response = self
            .authenticated(
                HttpRequest::post(self.url(endpoints::OPENAI), RequestBody::Json(body)),
                OK,
            )
            .await?;
        Ok(response.body)
    }

    /// List API keys as the service returns them
    pub async fn keys_list(&self) -> Result<Vec<Value>> {
        self.get_json(endpoints::KEYS).await
    }

    /// Create an API key
    pub async fn keys_create(&self) -> Result<Value> {
        self.post_json(&format!("{}/", endpoints::KEYS), RequestBody::Empty, CREATED)
            .await
    }

    /// List the user's agents
    pub async fn agents_list(&self) -> Result<Vec<Agent>> {
        self.get_json(endpoints::AGENTS).await
    }

    /// Attach variables (by name) to an agent
    pub async fn agents_variables_add(&self, agent: &str, variables: &[String]) -> Result<Value> {
        self.post_json(
            &format!("{}/{}/variables_add/", endpoints::AGENTS, agent),
            RequestBody::Json(json!({ "variables": variables })),
            OK,
        )
        .await
    }

    /// Detach variables (by name) from an agent
    pub async fn agents_variables_remove(
        &self,
        agent: &str,
        variables: &[String],
    ) -> Result<Value> {
        self.post_json(
            &format!("{}/{}/variables_remove/", endpoints::AGENTS, agent),
            RequestBody::Json(json!({ "variables": variables })),
            OK,
        )
        .await
    }

    /// List the user's variables
    pub async fn variables_list(&self) -> Result<Vec<Variable>> {
        self.get_json(&format!("{}/", endpoints::VARIABLES)).await
    }

    /// Wait until an agent reports `state`, see [`poller::wait_for_state`]
    pub async fn agents_wait_for_state(
        &self,
        agent: &str,
        state: &str,
        timeout: Duration,
        period: Duration,
    ) -> Result<()> {
        poller::wait_for_state(self, agent, state, WaitOptions { timeout, period }).await
    }
}

#[async_trait]
impl AgentApi for PropelClient {
    async fn seats(&self) -> Result<Seats> {
        self.get_json(endpoints::SEATS).await
    }

    async fn agents_get(&self, agent: &str) -> Result<Agent> {
        self.get_json(&format!("{}/{}", endpoints::AGENTS, agent))
            .await
    }

    async fn agents_create(&self, agent: &NewAgent) -> Result<Value> {
        self.post_json(
            &format!("{}/", endpoints::AGENTS),
            RequestBody::Json(serde_json::to_value(agent)?),
            CREATED,
        )
        .await
    }

    async fn agents_restart(&self, agent: &str) -> Result<Value> {
        self.get_json(&format!("{}/{}/restart", endpoints::AGENTS, agent))
            .await
    }

    async fn agents_stop(&self, agent: &str) -> Result<Value> {
        self.get_json(&format!("{}/{}/stop", endpoints::AGENTS, agent))
            .await
    }

    async fn agents_delete(&self, agent: &str) -> Result<Value> {
        self.get_json(&format!("{}/{}/delete", endpoints::AGENTS, agent))
            .await
    }

    async fn variables_create(&self, variable: &NewVariable) -> Result<Value> {
        self.post_json(
            &format!("{}/", endpoints::VARIABLES),
            RequestBody::Json(serde_json::to_value(variable)?),
            CREATED,
        )
        .await
    }
}

fn check_response(response: HttpResponse, expected: &[u16]) -> Result<HttpResponse> {
    if expected.contains(&response.status) {
        Ok(response)
    } else {
        Err(PropelError::Http {
            code: response.status,
            body: response.body,
        })
    }
}
