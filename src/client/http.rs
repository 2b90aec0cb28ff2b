// src/client/http.rs

use reqwest::{Client, Url};
use std::time::Instant;

use crate::client::NeuronClient;
use crate::config::NeuronConfig;
use crate::errors::{Result, SandboxError};
use crate::models::{ApiErrorBody, ExecutionRequest, ExecutionResponse, NeuronCall};

/// Calls neurons over HTTP on the configured execution host.
pub struct HttpNeuronClient {
    client: Client,
    config: NeuronConfig,
}

impl HttpNeuronClient {
    pub fn new(client: Client, config: NeuronConfig) -> Self {
        Self { client, config }
    }

    /// Builds a client honoring the configured timeout.
    pub fn from_config(config: NeuronConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build()?, config))
    }

    pub fn api_base(&self) -> &str {
        &self.config.api_base
    }

    /// `<api_base>/<organization>/<slug>`, with each segment percent-encoded.
    pub fn endpoint_url(&self, call: &NeuronCall) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| SandboxError::Config(format!("Invalid execution host: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SandboxError::Config("Execution host cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(&call.path.organization)
            .push(&call.path.slug);
        if call.bypass_cache {
            url.query_pairs_mut().append_pair("bypassCache", "true");
        }
        Ok(url)
    }
}

impl NeuronClient for HttpNeuronClient {
    async fn execute(&self, call: &NeuronCall) -> Result<ExecutionResponse> {
        let url = self.endpoint_url(call)?;

        log::info!(
            "📡 Calling neuron {} (bypass_cache={}, authenticated={})",
            call.path,
            call.bypass_cache,
            call.credential.is_some()
        );

        let body = ExecutionRequest {
            input: &call.input,
            bypass_cache: call.bypass_cache,
            raw_output: false,
        };

        let mut request = self.client.post(url).json(&body);
        if let Some(token) = &call.credential {
            request = request.bearer_auth(token);
        }

        let start = Instant::now();
        let resp = request.send().await?;
        let status = resp.status();
        let latency_ms = start.elapsed().as_millis() as u64;

        log::info!("📥 Neuron {} responded {} ({}ms)", call.path, status, latency_ms);

        if !status.is_success() {
            let error_body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("⚠️  Could not read error body from {}: {}", call.path, e);
                    String::new()
                }
            };
            return Err(api_error(status, &error_body));
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Prefers the service's `{statusCode, error}` body; falls back to the raw text.
fn api_error(status: reqwest::StatusCode, body: &str) -> SandboxError {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return SandboxError::Api {
            status_code: parsed.status_code,
            message: parsed.error,
        };
    }
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("Unknown status").to_string()
    } else {
        body.trim().to_string()
    };
    SandboxError::Api {
        status_code: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EndpointPath, NeuronOutput};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpNeuronClient {
        HttpNeuronClient::new(
            Client::new(),
            NeuronConfig {
                api_base: server.uri(),
                timeout: None,
            },
        )
    }

    fn sample_call() -> NeuronCall {
        NeuronCall {
            path: EndpointPath::parse("acme/summarize").unwrap(),
            input: "Hello there".to_string(),
            bypass_cache: false,
            credential: None,
        }
    }

    #[tokio::test]
    async fn posts_input_to_neuron_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/acme/summarize"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "input": "Hello there",
                "bypassCache": false,
                "rawOutput": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": "General Kenobi",
                "fromCache": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client_for(&server).execute(&sample_call()).await.unwrap();
        assert_eq!(resp.output, Some(NeuronOutput::Text("General Kenobi".to_string())));
        assert!(resp.from_cache);
        assert!(!resp.execution_stopped);
    }

    #[tokio::test]
    async fn sends_bypass_flag_and_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/acme/summarize"))
            .and(query_param("bypassCache", "true"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": {"summary": "short"},
                "executionStopped": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut call = sample_call();
        call.bypass_cache = true;
        call.credential = Some("sk-test".to_string());

        let resp = client_for(&server).execute(&call).await.unwrap();
        assert_eq!(
            resp.output,
            Some(NeuronOutput::Structured(json!({"summary": "short"})))
        );
    }

    #[tokio::test]
    async fn structured_error_body_becomes_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "statusCode": 403,
                "error": "forbidden"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).execute(&sample_call()).await.unwrap_err();
        assert_eq!(err.display_error(), "Error: API Error 403: forbidden");
    }

    #[tokio::test]
    async fn plain_error_body_keeps_http_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server).execute(&sample_call()).await.unwrap_err();
        assert!(matches!(
            err,
            SandboxError::Api { status_code: 502, ref message } if message == "bad gateway"
        ));
    }

    #[test]
    fn unreadable_error_body_falls_back_to_status_reason() {
        let err = api_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.display_error(), "Error: API Error 503: Service Unavailable");
    }

    #[tokio::test]
    async fn undecodable_success_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).execute(&sample_call()).await.unwrap_err();
        assert!(matches!(err, SandboxError::JsonParse(_)));
    }

    #[test]
    fn endpoint_url_encodes_segments() {
        let client = HttpNeuronClient::new(
            Client::new(),
            NeuronConfig {
                api_base: "https://run.example.com/v1".to_string(),
                timeout: None,
            },
        );
        let mut call = sample_call();
        call.path = EndpointPath::parse("my org/slug?x").unwrap();
        call.bypass_cache = true;

        let url = client.endpoint_url(&call).unwrap();
        assert_eq!(
            url.as_str(),
            "https://run.example.com/v1/my%20org/slug%3Fx?bypassCache=true"
        );
    }
}
