// src/client/mod.rs

use crate::errors::Result;
use crate::models::{ExecutionResponse, NeuronCall};

pub mod http;

pub use http::HttpNeuronClient;

/// The execution service as seen by the sandbox.
///
/// Implementations perform exactly one round trip per call. Retries and
/// timeouts beyond the transport's own are not their concern.
pub trait NeuronClient: Send + Sync {
    /// Executes a neuron with the given input.
    ///
    /// # Returns
    /// The decoded response on success, `SandboxError::Api` when the service
    /// answered with an error status, any other variant for transport or
    /// decoding failures.
    fn execute(&self, call: &NeuronCall) -> impl std::future::Future<Output = Result<ExecutionResponse>> + Send;
}
