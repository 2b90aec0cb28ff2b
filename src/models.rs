// src/models.rs
use crate::errors::{Result, SandboxError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A neuron address, `organization/neuron-slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPath {
    pub organization: String,
    pub slug: String,
}

impl EndpointPath {
    /// Splits `raw` on `/`. Exactly two non-empty segments are accepted.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(organization), Some(slug), None)
                if !organization.is_empty() && !slug.is_empty() =>
            {
                Ok(Self {
                    organization: organization.to_string(),
                    slug: slug.to_string(),
                })
            }
            _ => Err(SandboxError::InvalidPath(raw.to_string())),
        }
    }
}

impl fmt::Display for EndpointPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.slug)
    }
}

/// The payload a neuron returns: plain text or arbitrary JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NeuronOutput {
    Text(String),
    Structured(serde_json::Value),
}

impl NeuronOutput {
    pub fn is_empty(&self) -> bool {
        match self {
            NeuronOutput::Text(text) => text.is_empty(),
            NeuronOutput::Structured(value) => value.is_null(),
        }
    }

    /// Text for the output pane. Structured values are pretty-printed.
    pub fn render(&self) -> String {
        match self {
            NeuronOutput::Text(text) => text.clone(),
            NeuronOutput::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

impl Default for NeuronOutput {
    fn default() -> Self {
        NeuronOutput::Text(String::new())
    }
}

/// Everything needed for one execution call.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronCall {
    pub path: EndpointPath,
    pub input: String,
    pub bypass_cache: bool,
    pub credential: Option<String>,
}

/// Request body sent to the execution service.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest<'a> {
    pub input: &'a str,
    pub bypass_cache: bool,
    pub raw_output: bool,
}

/// Successful response of the execution service.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    #[serde(default)]
    pub output: Option<NeuronOutput>,
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default)]
    pub execution_stopped: bool,
}

/// Error body returned by the execution service on non-2xx responses.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub status_code: u16,
    pub error: String,
}
