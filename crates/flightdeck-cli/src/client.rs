//! HTTP client for a running flightdeck server.

use anyhow::Result;
use flightdeck_core::{PlaybackSnapshot, Timecode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Client for one flightdeck server.
pub struct FlightdeckClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<Timecode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub flight_id: String,
    pub drone_id: String,
    pub duration: Timecode,
}

impl FlightdeckClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn playback_url(&self, session_id: &str, action: &str) -> String {
        format!("{}/v1/sessions/{}/playback/{}", self.base_url, session_id, action)
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body["error"].as_str().unwrap_or("no error body");
            anyhow::bail!("Server returned {}: {}", status, message);
        }
        Ok(response.json().await?)
    }

    /// Ask the server to host a generated flight.
    pub async fn create_mock_session(&self, seed: Option<u64>, duration: Option<Timecode>) -> Result<SessionCreated> {
        let url = format!("{}/v1/sessions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&CreateSessionRequest { seed, duration })
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn list_sessions(&self) -> Result<Value> {
        let url = format!("{}/v1/sessions", self.base_url);
        Self::read(self.client.get(&url).send().await?).await
    }

    pub async fn playback(&self, session_id: &str) -> Result<PlaybackSnapshot> {
        let url = format!("{}/v1/sessions/{}/playback", self.base_url, session_id);
        Self::read(self.client.get(&url).send().await?).await
    }

    async fn post_action(&self, session_id: &str, action: &str, body: Value) -> Result<PlaybackSnapshot> {
        let response = self
            .client
            .post(self.playback_url(session_id, action))
            .json(&body)
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn toggle(&self, session_id: &str) -> Result<PlaybackSnapshot> {
        self.post_action(session_id, "toggle", json!({})).await
    }

    /// Seek to an `HH:MM:SS` position. The server rejects malformed values.
    pub async fn seek(&self, session_id: &str, position: &str) -> Result<PlaybackSnapshot> {
        self.post_action(session_id, "seek", json!({ "position": position }))
            .await
    }

    pub async fn skip_forward(&self, session_id: &str) -> Result<PlaybackSnapshot> {
        self.post_action(session_id, "skip-forward", json!({})).await
    }

    pub async fn skip_backward(&self, session_id: &str) -> Result<PlaybackSnapshot> {
        self.post_action(session_id, "skip-backward", json!({})).await
    }

    pub async fn next_event(&self, session_id: &str) -> Result<PlaybackSnapshot> {
        self.post_action(session_id, "next-event", json!({})).await
    }

    pub async fn previous_event(&self, session_id: &str) -> Result<PlaybackSnapshot> {
        self.post_action(session_id, "previous-event", json!({})).await
    }

    pub async fn set_speed(&self, session_id: &str, speed: f64) -> Result<PlaybackSnapshot> {
        self.post_action(session_id, "speed", json!({ "speed": speed })).await
    }
}
