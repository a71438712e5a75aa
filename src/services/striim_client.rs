// src/services/striim_client.rs
// DOCUMENTATION: Striim REST API client
// PURPOSE: Authenticate against Striim and run console commands for OJET sources

use crate::errors::OjetError;
use crate::models::{CommandOutcome, MetricMap};
use crate::services::metric_shapes::CommandOutput;
use crate::services::table_renderer::render_table;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{redirect, Client};
use serde::Deserialize;
use serde_json::Value;
use std::error::Error as StdError;
use std::time::Duration;
use uuid::Uuid;

const AUTHENTICATE_PATH: &str = "/security/authenticate";
const TUNGSTEN_PATH: &str = "/api/v2/tungsten";

/// Per-call timeouts for the three kinds of remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StriimTimeouts {
    pub reachability: Duration,
    pub auth: Duration,
    pub command: Duration,
}

impl Default for StriimTimeouts {
    fn default() -> Self {
        Self {
            reachability: Duration::from_secs(5),
            auth: Duration::from_secs(10),
            command: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: Option<String>,
}

/// Striim REST API client
/// DOCUMENTATION: Stateless apart from the base URL. Tokens are never cached;
/// callers pass the token back into every command call.
pub struct StriimClient {
    client: Client,
    base_url: String,
    timeouts: StriimTimeouts,
}

impl StriimClient {
    /// Create a client for `base_url`, which is normalized first
    pub fn new(base_url: &str, timeouts: StriimTimeouts) -> Result<Self, OjetError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| OjetError::InternalError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            timeouts,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Best-effort reachability check
    /// DOCUMENTATION: Only a refused connection or an unknown host is fatal;
    /// any other failure is logged and authentication is still attempted.
    pub async fn check_reachable(&self) -> Result<(), OjetError> {
        match self
            .client
            .get(&self.base_url)
            .timeout(self.timeouts.reachability)
            .send()
            .await
        {
            Ok(response) => {
                log::debug!("Striim server {} answered {}", self.base_url, response.status());
                Ok(())
            }
            Err(e) => match classify_transport_error(&self.base_url, &e) {
                fatal @ (OjetError::ConnectionRefused(_) | OjetError::HostNotFound(_)) => {
                    log::error!("Striim server unreachable: {}", fatal);
                    Err(fatal)
                }
                other => {
                    log::warn!("Striim reachability check inconclusive, trying authentication anyway: {}", other);
                    Ok(())
                }
            },
        }
    }

    /// Exchange credentials for a Striim token
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, OjetError> {
        self.check_reachable().await?;

        let url = format!("{}{}", self.base_url, AUTHENTICATE_PATH);
        log::debug!("Striim authentication: url={}, user={}", url, username);

        let response = self
            .client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .timeout(self.timeouts.auth)
            .send()
            .await
            .map_err(|e| classify_transport_error(&self.base_url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Striim authentication rejected {}: {}", status, body);
            return Err(OjetError::AuthenticationFailed(format!(
                "HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let auth: AuthResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse Striim authentication response: {}", e);
            OjetError::AuthenticationFailed(format!("unreadable response: {}", e))
        })?;

        match auth.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(OjetError::AuthenticationFailed(
                "no token in authentication response".to_string(),
            )),
        }
    }

    /// Run one console command and reshape its reply
    pub async fn run_command(&self, token: &str, command: &str) -> Result<CommandOutcome, OjetError> {
        let url = format!("{}{}", self.base_url, TUNGSTEN_PATH);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("STRIIM-TOKEN {}", token))
            .header(CONTENT_TYPE, "text/plain")
            .body(command.to_string())
            .timeout(self.timeouts.command)
            .send()
            .await
            .map_err(|e| classify_transport_error(&self.base_url, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OjetError::ExternalApiError(format!("Failed to read reply: {}", e)))?;

        if !status.is_success() {
            return Err(OjetError::ExternalApiError(format!(
                "API error {}: {}",
                status,
                body.trim()
            )));
        }

        Ok(reshape_reply(command, &body))
    }

    /// Run every command in order; failures are recorded per item
    pub async fn run_commands(&self, token: &str, commands: &[String]) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::with_capacity(commands.len());

        for command in commands {
            match self.run_command(token, command).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    log::warn!("Striim command '{}' failed: {}", command, e);
                    outcomes.push(CommandOutcome::failed(command, e.to_string()));
                }
            }
        }

        outcomes
    }
}

/// Phases of one monitor operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    Unauthenticated,
    Authenticating,
    Authenticated,
    ExecutingCommand(usize),
    Done,
    Failed,
}

/// One authenticate-then-run-commands operation
pub struct MonitorSession {
    id: Uuid,
    client: StriimClient,
    phase: MonitorPhase,
    token: Option<String>,
}

impl MonitorSession {
    pub fn new(client: StriimClient) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            phase: MonitorPhase::Unauthenticated,
            token: None,
        }
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    fn transition(&mut self, next: MonitorPhase) {
        log::debug!("monitor {}: {:?} -> {:?}", self.id, self.phase, next);
        self.phase = next;
    }

    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), OjetError> {
        self.transition(MonitorPhase::Authenticating);

        match self.client.authenticate(username, password).await {
            Ok(token) => {
                self.token = Some(token);
                self.transition(MonitorPhase::Authenticated);
                Ok(())
            }
            Err(e) => {
                self.transition(MonitorPhase::Failed);
                Err(e)
            }
        }
    }

    /// Run `commands` sequentially; requires a successful `authenticate`
    pub async fn run(&mut self, commands: &[String]) -> Result<Vec<CommandOutcome>, OjetError> {
        let token = match (&self.phase, &self.token) {
            (MonitorPhase::Authenticated, Some(token)) => token.clone(),
            _ => {
                return Err(OjetError::AuthenticationFailed(
                    "monitor session is not authenticated".to_string(),
                ))
            }
        };

        let mut outcomes = Vec::with_capacity(commands.len());
        for (index, command) in commands.iter().enumerate() {
            self.transition(MonitorPhase::ExecutingCommand(index));
            outcomes.extend(
                self.client
                    .run_commands(&token, std::slice::from_ref(command))
                    .await,
            );
        }

        self.transition(MonitorPhase::Done);
        Ok(outcomes)
    }
}

/// Commands the monitor page runs for one OJET source
pub fn monitor_commands(namespace: &str, source: &str) -> Vec<String> {
    let target = format!("{}.{}", namespace.trim(), source.trim());
    vec![
        format!("show {} status;", target),
        format!("show {} memory;", target),
        format!("mon {};", target),
    ]
}

/// Strip trailing slashes and default to http:// when no scheme is given
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// Turn a tungsten reply body into an outcome
/// DOCUMENTATION: The body is a JSON array of `{output: ...}` items. Recognized
/// shapes become a metric map rendered as a table; anything else is passed
/// through as text.
fn reshape_reply(command: &str, body: &str) -> CommandOutcome {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            return CommandOutcome {
                command: command.to_string(),
                output: body.to_string(),
                success: true,
                metrics: None,
            }
        }
    };

    let outputs: Vec<Value> = match parsed {
        Value::Array(items) => items
            .into_iter()
            .map(|mut item| match item.get_mut("output") {
                Some(output) => output.take(),
                None => item,
            })
            .collect(),
        other => vec![other],
    };

    let mut metrics: Option<MetricMap> = None;
    let mut passthrough = Vec::new();
    for output in outputs {
        let classified = CommandOutput::classify(output);
        match classified.metrics() {
            Some(found) => metrics.get_or_insert_with(MetricMap::new).extend(found),
            None => {
                if let CommandOutput::Other(value) = classified {
                    passthrough.push(value);
                }
            }
        }
    }

    let output = match &metrics {
        Some(found) => render_table(found),
        None => match passthrough.as_slice() {
            [] => String::new(),
            [Value::String(text)] => text.clone(),
            [single] => serde_json::to_string_pretty(single).unwrap_or_default(),
            many => serde_json::to_string_pretty(many).unwrap_or_default(),
        },
    };

    CommandOutcome {
        command: command.to_string(),
        output,
        success: true,
        metrics,
    }
}

/// Map a transport failure to the error kinds the dashboard distinguishes
fn classify_transport_error(base_url: &str, error: &reqwest::Error) -> OjetError {
    let mut source: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return OjetError::ConnectionRefused(base_url.to_string());
            }
        }
        let text = current.to_string().to_lowercase();
        if text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
            || text.contains("no such host")
        {
            return OjetError::HostNotFound(base_url.to_string());
        }
        source = current.source();
    }

    if error.is_timeout() {
        return OjetError::ExternalApiError(format!("Request to {} timed out", base_url));
    }
    OjetError::ExternalApiError(format!("Request failed: {}", error))
}
