//! Generation client — the single point of contact with the remote
//! generation endpoint.
//!
//! The client sends the full state snapshot opaquely; prompt construction and
//! the extension-vs-manual branching live on the endpoint. One attempt per
//! user action, no retry, no client-side timeout (the endpoint's own latency
//! bound is accepted, and the controller refuses a second start while a call
//! is in flight).

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::model::{GeneratedResult, LetterState};

/// Substituted when the endpoint answers with an empty string, so a stored
/// result is never blank.
pub const EMPTY_RESULT_PLACEHOLDER: &str = "Failed to generate content.";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    state: &'a LetterState,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    endpoint: String,
}

impl GenerationClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Sends one generation request for the given snapshot.
    pub async fn generate(&self, snapshot: &LetterState) -> Result<GeneratedResult, GenerateError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest { state: snapshot })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_default();
            return Err(GenerateError::Endpoint {
                status: status.as_u16(),
                message,
            });
        }

        let mut result: GeneratedResult = response
            .json()
            .await
            .map_err(|_| GenerateError::BadResponse)?;
        if result.text.is_empty() {
            result.text = EMPTY_RESULT_PLACEHOLDER.to_string();
        }
        Ok(result)
    }
}
