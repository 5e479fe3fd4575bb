//! Letter generation endpoint.
//!
//! Accepts a JSON-encoded state snapshot from any surface, assembles the
//! prompt (the extension-vs-manual branching lives here, not in the clients),
//! calls the model through llm_client, and answers `{text, sources}`.

pub mod prompts;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::{ContentPart, LlmClient};
use crate::state::AppState;

/// Substituted when the model returns no usable text, so the response `text`
/// field is never empty.
pub const EMPTY_CONTENT_FALLBACK: &str = "Failed to generate content.";

/// The state snapshot as the surfaces send it. Every field is optional on
/// the wire; prompt assembly applies extraction fallbacks for the blanks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LetterSnapshot {
    pub full_name: String,
    pub company_name: String,
    pub job_title: String,
    pub job_link: String,
    pub job_description: String,
    pub resume_text: String,
    /// Base64-encoded binary resume, passed to the model inline.
    pub resume_data: Option<String>,
    pub resume_mime_type: Option<String>,
    pub tone: String,
    pub length: String,
    pub language: String,
    pub additional_instructions: String,
    pub page_content: Option<String>,
    pub page_url: Option<String>,
    pub page_title: Option<String>,
}

impl LetterSnapshot {
    /// Extension-style requests carry captured page content; everything else
    /// takes the manual/link shape.
    pub fn is_extension_request(&self) -> bool {
        self.page_content.as_deref().is_some_and(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub text: String,
    pub sources: Vec<Citation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

/// POST /api/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<GenerateResponse>, AppError> {
    let snapshot: LetterSnapshot = match body.get("state") {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone())
            .map_err(|e| AppError::Validation(format!("invalid state payload: {e}")))?,
        _ => return Err(AppError::Validation("state is required".to_string())),
    };

    let response = generate_letter(&state.llm, &snapshot).await?;
    Ok(Json(response))
}

/// Assembles the prompt for the snapshot and runs one model call.
pub async fn generate_letter(
    llm: &LlmClient,
    snapshot: &LetterSnapshot,
) -> Result<GenerateResponse, AppError> {
    let extension = snapshot.is_extension_request();
    info!(extension, "assembling generation prompt");

    let system = prompts::system_instruction(snapshot, extension);
    let prompt = prompts::user_prompt(snapshot, extension);

    let mut content = vec![ContentPart::text(&prompt)];
    if let Some(data) = snapshot.resume_data.as_deref() {
        let media_type = snapshot
            .resume_mime_type
            .as_deref()
            .unwrap_or("application/pdf");
        content.push(ContentPart::document(media_type, data));
    }

    let response = llm
        .call(&system, &content)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let text = response
        .text()
        .map(str::to_string)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| EMPTY_CONTENT_FALLBACK.to_string());

    // The model provides no grounding metadata today; the contract still
    // carries an ordered source list.
    Ok(GenerateResponse {
        text,
        sources: Vec::new(),
    })
}
