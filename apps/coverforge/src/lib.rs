//! Session and request-orchestration core for the cover-letter generator.
//!
//! Three UI surfaces (full web page, extension popup, extension side panel)
//! share one [`session::SessionController`] contract; they differ only in the
//! collaborators they wire in. This crate owns everything beneath the
//! presentation layer: the persistent store adapter, document ingestion, page
//! content capture, the generation client, and the controller itself.

pub mod client;
pub mod error;
pub mod ingest;
pub mod model;
pub mod page;
pub mod session;
pub mod store;
pub mod surface;

pub use client::GenerationClient;
pub use model::{GeneratedResult, LetterState};
pub use session::SessionController;
pub use surface::SurfaceKind;
