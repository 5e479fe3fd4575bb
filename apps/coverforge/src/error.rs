use thiserror::Error;

/// Errors raised while turning an uploaded file into resume content.
///
/// All ingestion errors are non-fatal: the caller reports them and leaves the
/// previously held resume state untouched.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("could not extract text: {0}")]
    Parse(String),

    #[error("file read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a persistent store backend.
///
/// Preference and draft persistence is best-effort: callers log these and
/// continue rather than blocking the user flow.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors raised while capturing the active page (extension surfaces only).
#[derive(Debug, Error)]
pub enum PageExtractError {
    #[error("no active tab found")]
    NoActiveTab,

    #[error("page capture is not available on this surface")]
    Unavailable,

    #[error("could not scrape page content: {0}")]
    Failed(String),
}

/// Errors raised by a generation call. Network failure, a non-success status
/// and a malformed response all end the attempt the same way; there is no
/// retry on the client side.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation endpoint returned status {status}: {message}")]
    Endpoint { status: u16, message: String },

    #[error("generation endpoint returned a malformed response")]
    BadResponse,
}
