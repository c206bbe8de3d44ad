//! Remote agent engine over HTTP + SSE.

use anyhow::Result;
use futures_util::StreamExt;
use hail_types::{SessionId, TurnInput};

use super::{AgentEngine, EngineError, EngineErrorKind, SnapshotStream};
use crate::engine::sse::SnapshotSseParser;

/// Standard User-Agent header for hail engine requests.
const USER_AGENT: &str = concat!("hail/", env!("CARGO_PKG_VERSION"));

/// Configuration for the remote engine client.
#[derive(Debug, Clone)]
pub struct RemoteEngineConfig {
    /// Engine base URL, without a trailing slash.
    pub base_url: String,
    /// Optional bearer token for the engine.
    pub api_key: Option<String>,
}

impl RemoteEngineConfig {
    /// Creates a config, validating the base URL.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|err| anyhow::anyhow!("Invalid engine base URL '{base_url}': {err}"))?;
        Ok(Self { base_url, api_key })
    }
}

/// HTTP client for an agent engine server.
///
/// Opens one stream per call: `POST {base_url}/v1/sessions/{id}/streams`
/// with the turn input as JSON body, answered with `text/event-stream`.
/// No retries; a failed request or broken stream is the caller's to report.
pub struct RemoteEngine {
    config: RemoteEngineConfig,
    http: reqwest::Client,
}

impl RemoteEngine {
    pub fn new(config: RemoteEngineConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

impl AgentEngine for RemoteEngine {
    async fn open_stream(&self, session: &SessionId, input: TurnInput) -> Result<SnapshotStream> {
        let url = format!(
            "{}/v1/sessions/{}/streams",
            self.config.base_url,
            session.as_str()
        );
        tracing::debug!(%url, "opening engine stream");

        let mut builder = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .header("user-agent", USER_AGENT);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .json(&input)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(EngineError::http_status(status.as_u16(), &error_body).into());
        }

        Ok(SnapshotSseParser::new(response.bytes_stream().boxed()).boxed())
    }
}

fn classify_reqwest_error(e: &reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        EngineError::timeout(format!("Connection failed: {e}"))
    } else {
        EngineError::new(EngineErrorKind::HttpStatus, format!("Network error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn sse_response(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/event-stream")
            .set_body_string(body)
    }

    #[tokio::test]
    async fn test_open_stream_yields_snapshots() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/sessions/s-1/streams"))
            .and(body_partial_json(serde_json::json!({"message": "hi"})))
            .respond_with(sse_response(
                "event: snapshot\ndata: {\"content\": \"H\"}\n\n\
                 event: snapshot\ndata: {\"content\": \"Hi\"}\n\n",
            ))
            .mount(&server)
            .await;

        let engine = RemoteEngine::new(RemoteEngineConfig::new(server.uri(), None).unwrap());
        let session = SessionId::from("s-1");

        let stream = engine
            .open_stream(&session, TurnInput::message("hi"))
            .await
            .unwrap();
        let snapshots: Vec<_> = stream.collect().await;

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].as_ref().unwrap().full_text(), "Hi");
    }

    #[tokio::test]
    async fn test_open_stream_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let engine = RemoteEngine::new(RemoteEngineConfig::new(server.uri(), None).unwrap());
        let session = SessionId::from("s-1");

        let err = engine
            .open_stream(&session, TurnInput::message("hi"))
            .await
            .err()
            .unwrap();
        let engine_err = err.downcast_ref::<EngineError>().unwrap();
        assert_eq!(engine_err.kind, EngineErrorKind::HttpStatus);
        assert_eq!(engine_err.details.as_deref(), Some("overloaded"));
    }

    #[tokio::test]
    async fn test_resume_body_is_tagged() {
        use hail_types::{Decision, ResumeCommand};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "resume": {"decisions": [{"type": "approve"}]}
            })))
            .respond_with(sse_response("event: snapshot\ndata: {}\n\n"))
            .expect(1)
            .mount(&server)
            .await;

        let engine = RemoteEngine::new(RemoteEngineConfig::new(server.uri(), None).unwrap());
        let session = SessionId::from("s-1");

        let stream = engine
            .open_stream(
                &session,
                TurnInput::Resume(ResumeCommand::new(vec![Decision::approve()])),
            )
            .await
            .unwrap();
        let snapshots: Vec<_> = stream.collect().await;
        assert_eq!(snapshots.len(), 1);
    }

    #[test]
    fn test_config_rejects_invalid_url() {
        assert!(RemoteEngineConfig::new("not a url", None).is_err());
    }
}
