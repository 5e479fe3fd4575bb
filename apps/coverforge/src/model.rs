//! Core data model shared by every surface.
//!
//! The serialized labels and camelCase field names are part of the wire
//! contract with the generation endpoint — the endpoint interpolates the
//! labels straight into its prompt assembly, so the `serde` renames here are
//! load-bearing, not cosmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ingest::IngestedResume;

/// Writing tone requested for the letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    #[serde(rename = "Professional")]
    Professional,
    #[serde(rename = "Enthusiastic")]
    Enthusiastic,
    #[serde(rename = "Confident")]
    Confident,
    #[serde(rename = "Casual/Startup")]
    Casual,
    #[serde(rename = "Academic")]
    Academic,
}

/// Target length of the generated letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LetterLength {
    #[serde(rename = "Concise (200 words)")]
    Short,
    #[default]
    #[serde(rename = "Standard (350 words)")]
    Medium,
    #[serde(rename = "Detailed (500 words)")]
    Long,
}

/// Output language of the generated letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "English")]
    English,
    #[serde(rename = "Spanish")]
    Spanish,
    #[serde(rename = "French")]
    French,
    #[serde(rename = "German")]
    German,
    #[serde(rename = "Mandarin Chinese")]
    Mandarin,
}

/// The single mutable record driving generation.
///
/// Exactly one resume representation is authoritative at a time: setting the
/// binary payload clears the text and vice versa (last-write-wins, not a
/// merge). Use [`LetterState::set_resume_text`] /
/// [`LetterState::set_resume_attachment`] rather than poking the fields to
/// keep that invariant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LetterState {
    pub full_name: String,
    pub company_name: String,
    pub job_title: String,
    pub job_link: String,
    pub job_description: String,
    pub resume_text: String,
    /// Base64-encoded binary resume payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_mime_type: Option<String>,
    pub tone: Tone,
    pub length: LetterLength,
    pub language: Language,
    pub additional_instructions: String,
    /// Captured page text — populated on extension surfaces only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
}

impl LetterState {
    /// Makes plain text the authoritative resume representation, dropping any
    /// binary attachment.
    pub fn set_resume_text(&mut self, text: impl Into<String>) {
        self.resume_text = text.into();
        self.resume_data = None;
        self.resume_mime_type = None;
    }

    /// Makes a binary payload the authoritative resume representation,
    /// clearing the text override.
    pub fn set_resume_attachment(&mut self, data: impl Into<String>, media_type: impl Into<String>) {
        self.resume_data = Some(data.into());
        self.resume_mime_type = Some(media_type.into());
        self.resume_text.clear();
    }

    /// Applies an ingestion outcome through the mutual-exclusion setters.
    pub fn apply_ingested(&mut self, ingested: IngestedResume) {
        match ingested {
            IngestedResume::Text(text) => self.set_resume_text(text),
            IngestedResume::Attachment { data, media_type } => {
                self.set_resume_attachment(data, media_type)
            }
        }
    }

    /// A resume is present when either representation holds content.
    pub fn has_resume(&self) -> bool {
        !self.resume_text.is_empty() || self.resume_data.is_some()
    }
}

/// Output of a generation call. `text` stays mutable after creation — the
/// user may hand-edit it in the preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResult {
    pub text: String,
    #[serde(default)]
    pub sources: Vec<Citation>,
}

/// A source citation attached to a generated result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

/// The preference subset persisted independently of the rest of the state.
/// Survives across sessions; saved on every change to one of its fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub language: Language,
    pub tone: Tone,
    pub length: LetterLength,
}

/// The draft subset persisted (debounced) on the web surface so unsaved work
/// survives reloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftState {
    pub job_description: String,
    pub company_name: String,
    pub job_title: String,
    pub job_link: String,
    pub additional_instructions: String,
}

impl DraftState {
    /// Snapshot of the draft fields of a state record.
    pub fn of(state: &LetterState) -> Self {
        Self {
            job_description: state.job_description.clone(),
            company_name: state.company_name.clone(),
            job_title: state.job_title.clone(),
            job_link: state.job_link.clone(),
            additional_instructions: state.additional_instructions.clone(),
        }
    }
}

/// One retained generated letter. The history sequence is bounded; see
/// [`crate::store::HISTORY_CAP`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub company_name: String,
    pub job_title: String,
    pub content: String,
}

/// Job data written into the shared store by the external page-scan
/// collaborator; the side panel reads it reactively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedJobData {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub job_url: String,
    pub source: String,
}
