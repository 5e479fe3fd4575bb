//! Document ingestion — turns an uploaded resume file into either plain text
//! or an inline binary attachment.
//!
//! The branch taken depends on the detected document kind and on the hosting
//! surface: the web page defers PDF understanding to the generation endpoint
//! (inline attachment), while the extension surfaces extract the text layer
//! locally. Every failing branch leaves previously held resume state
//! untouched; the caller only applies a successful outcome.

use std::io::{Cursor, Read};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::IngestError;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// How a surface wants binary documents handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Keep PDF bytes as a base64 attachment for the endpoint to read inline.
    Attach,
    /// Extract the text layer locally (extension surfaces).
    Extract,
}

/// Document kind resolved from the declared media type, falling back to the
/// file extension when the type is absent or non-committal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Docx,
    LegacyWord,
}

impl DocumentKind {
    pub fn detect(media_type: Option<&str>, file_name: &str) -> Self {
        match media_type {
            Some("application/pdf") => return Self::Pdf,
            Some(DOCX_MIME) => return Self::Docx,
            Some("application/msword") => return Self::LegacyWord,
            Some(t) if t.starts_with("text/") => return Self::PlainText,
            _ => {}
        }
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "doc" => Self::LegacyWord,
            // Everything else is read as text, matching the upload filter
            // (.txt/.md plus anything the user forces through).
            _ => Self::PlainText,
        }
    }
}

/// Successful ingestion outcome. Applying it to a state record clears the
/// other resume representation — never both authoritative at once.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestedResume {
    Text(String),
    Attachment { data: String, media_type: String },
}

/// Ingests an uploaded file.
///
/// Extraction of binary formats runs on the blocking pool; this is one of the
/// controller's suspension points.
pub async fn ingest_resume(
    file_name: &str,
    media_type: Option<&str>,
    data: Bytes,
    mode: IngestMode,
) -> Result<IngestedResume, IngestError> {
    match DocumentKind::detect(media_type, file_name) {
        DocumentKind::PlainText => {
            let text = String::from_utf8(data.to_vec())
                .map_err(|_| IngestError::Parse("file is not valid UTF-8 text".to_string()))?;
            Ok(IngestedResume::Text(text))
        }
        DocumentKind::Pdf => match mode {
            IngestMode::Attach => Ok(IngestedResume::Attachment {
                data: BASE64.encode(&data),
                media_type: "application/pdf".to_string(),
            }),
            IngestMode::Extract => {
                let extracted = tokio::task::spawn_blocking(move || {
                    pdf_extract::extract_text_from_mem(&data)
                })
                .await
                .map_err(|e| IngestError::Parse(format!("extraction task failed: {e}")))?
                .map_err(|e| IngestError::Parse(format!("could not parse PDF: {e}")))?;
                Ok(IngestedResume::Text(extracted.trim().to_string()))
            }
        },
        DocumentKind::Docx => {
            let extracted =
                tokio::task::spawn_blocking(move || extract_docx_text(data.as_ref()))
                    .await
                    .map_err(|e| IngestError::Parse(format!("extraction task failed: {e}")))??;
            Ok(IngestedResume::Text(extracted))
        }
        DocumentKind::LegacyWord => Err(IngestError::UnsupportedFormat(
            ".doc files are not supported; convert to .docx or .pdf".to_string(),
        )),
    }
}

/// Pulls the document text out of a `.docx` container: `w:t` runs
/// concatenated, paragraphs separated by newlines.
fn extract_docx_text(data: &[u8]) -> Result<String, IngestError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| IngestError::Parse(format!("could not parse DOCX container: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| IngestError::Parse(format!("DOCX is missing its document part: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| IngestError::Parse(format!("could not read DOCX document part: {e}")))?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let text = t
                    .unescape()
                    .map_err(|e| IngestError::Parse(format!("malformed DOCX text: {e}")))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(IngestError::Parse(format!("malformed DOCX XML: {e}")));
            }
        }
    }
    Ok(out.trim().to_string())
}
