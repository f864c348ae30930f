//! Skill transport abstraction.
//!
//! The [`SkillClient`] trait decouples sweep and material orchestration from
//! the actual editor connection (currently the editor's REST skill server).
//! Tests use scripted clients that return predetermined responses without
//! touching the network.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::io::config::ClientConfig;

/// Arguments for a single skill call.
pub type SkillArgs = Map<String, Value>;

/// Abstraction over the remote skill API.
///
/// Calls are blocking and strictly sequential. Implementations own
/// connection-level concerns (timeouts, addressing); callers only see the
/// raw response value or a transport error.
pub trait SkillClient {
    /// Invoke `skill` with `args` and return the raw response.
    fn invoke(&self, skill: &str, args: &SkillArgs) -> Result<Value>;

    /// Whether the remote is reachable. Consulted once before a run.
    fn probe_availability(&self) -> bool;

    /// Human-readable location of the remote, used in reports.
    fn endpoint(&self) -> String;
}

impl<C: SkillClient + ?Sized> SkillClient for &C {
    fn invoke(&self, skill: &str, args: &SkillArgs) -> Result<Value> {
        (**self).invoke(skill, args)
    }

    fn probe_availability(&self) -> bool {
        (**self).probe_availability()
    }

    fn endpoint(&self) -> String {
        (**self).endpoint()
    }
}

/// Client for the editor's REST skill server.
///
/// `POST {endpoint}/skill/{name}` with a JSON body runs a skill;
/// `GET {endpoint}/health` answers 200 when the server is ready.
pub struct HttpSkillClient {
    endpoint: String,
    client: Client,
    probe_timeout: Duration,
}

impl HttpSkillClient {
    pub fn new(endpoint: &str, request_timeout: Duration, probe_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            probe_timeout,
        })
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self> {
        Self::new(
            &cfg.endpoint,
            Duration::from_secs(cfg.request_timeout_secs),
            Duration::from_secs(cfg.probe_timeout_secs),
        )
    }

    fn skill_url(&self, skill: &str) -> String {
        format!("{}/skill/{}", self.endpoint, skill)
    }
}

impl SkillClient for HttpSkillClient {
    #[instrument(skip_all, fields(skill = %skill))]
    fn invoke(&self, skill: &str, args: &SkillArgs) -> Result<Value> {
        let url = self.skill_url(skill);
        debug!(%url, "invoking skill");
        let resp = self
            .client
            .post(&url)
            .json(args)
            .send()
            .with_context(|| format!("reach skill server at {url} (is the editor running?)"))?;

        let status = resp.status();
        let body = resp
            .text()
            .with_context(|| format!("read response body from {url}"))?;
        // The server reports skill-level errors in the body, sometimes with a
        // non-2xx status; the body is still the response to normalize.
        if !status.is_success() {
            warn!(%status, skill, "skill server returned non-success status");
        }
        serde_json::from_str(&body).map_err(|err| {
            anyhow!("skill server returned invalid JSON for {skill} (status {status}): {err}")
        })
    }

    fn probe_availability(&self) -> bool {
        let url = format!("{}/health", self.endpoint);
        match self.client.get(&url).timeout(self.probe_timeout).send() {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(err) => {
                debug!(%url, error = %err, "health probe failed");
                false
            }
        }
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::normalize;
    use crate::test_support::ScriptedClient;
    use serde_json::json;

    #[test]
    fn skill_url_strips_trailing_slash() {
        let client = HttpSkillClient::new(
            "http://localhost:8090/",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .expect("client");
        assert_eq!(
            client.skill_url("gameobject_delete"),
            "http://localhost:8090/skill/gameobject_delete"
        );
        assert_eq!(client.endpoint(), "http://localhost:8090");
    }

    /// Nothing listens on port 9 locally, so the probe must report unavailable
    /// rather than erroring out.
    #[test]
    fn probe_reports_false_when_unreachable() {
        let client = HttpSkillClient::new(
            "http://127.0.0.1:9",
            Duration::from_millis(200),
            Duration::from_millis(200),
        )
        .expect("client");
        assert!(!client.probe_availability());
    }

    #[test]
    fn invoke_surfaces_connection_errors() {
        let client = HttpSkillClient::new(
            "http://127.0.0.1:9",
            Duration::from_millis(200),
            Duration::from_millis(200),
        )
        .expect("client");
        let err = client
            .invoke("gameobject_delete", &SkillArgs::new())
            .unwrap_err();
        assert!(format!("{err:#}").contains("reach skill server"));
    }

    fn delete_through<C: SkillClient>(client: C) -> Result<Value> {
        client.invoke("gameobject_delete", &SkillArgs::new())
    }

    #[test]
    fn reference_forwarding_delegates_to_inner_client() {
        let scripted = ScriptedClient::new(vec![json!({"success": true})]);
        let response = delete_through(&scripted).expect("invoke");
        assert!(normalize(&response));
        assert_eq!(scripted.calls().len(), 1);
    }
}
