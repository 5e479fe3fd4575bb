//! Surface wiring — one-time host capability detection and per-surface
//! controller assembly.
//!
//! Capability branching lives here and only here: it is computed once at
//! startup and handed down as configuration, never re-detected inside a
//! component. The three surfaces are thin parameterizations of the shared
//! [`SessionController`].

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::client::GenerationClient;
use crate::ingest::IngestMode;
use crate::model::ExtractedJobData;
use crate::page::PageExtractor;
use crate::session::{JobTargetRule, SessionController, SurfaceProfile};
use crate::store::{keys, FileBackend, MemoryBackend, Store};

/// The three UI hosts sharing the session-controller contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    WebPage,
    Popup,
    SidePanel,
}

impl SurfaceKind {
    /// The capability set this surface hands to its controller.
    pub fn profile(self) -> SurfaceProfile {
        match self {
            SurfaceKind::WebPage => SurfaceProfile {
                autosave: true,
                ingest_mode: IngestMode::Attach,
                job_target: JobTargetRule::CompanyOrLink,
            },
            SurfaceKind::Popup => SurfaceProfile {
                autosave: false,
                ingest_mode: IngestMode::Extract,
                job_target: JobTargetRule::CapturedPage,
            },
            SurfaceKind::SidePanel => SurfaceProfile {
                autosave: false,
                ingest_mode: IngestMode::Extract,
                job_target: JobTargetRule::DetectedOrManual,
            },
        }
    }
}

/// What the host environment offers, determined once at startup.
#[derive(Debug, Clone)]
pub struct HostCapabilities {
    /// Extension host: surfaces share one in-process store and may receive a
    /// page extractor. Otherwise the page-local file store is used.
    pub extension_host: bool,
    /// Where the page-local store file lives (non-extension hosts).
    pub profile_path: PathBuf,
    /// Generation endpoint URL.
    pub generate_endpoint: String,
}

impl HostCapabilities {
    pub fn extension(generate_endpoint: impl Into<String>) -> Self {
        Self {
            extension_host: true,
            profile_path: PathBuf::new(),
            generate_endpoint: generate_endpoint.into(),
        }
    }

    pub fn web(profile_path: impl Into<PathBuf>, generate_endpoint: impl Into<String>) -> Self {
        Self {
            extension_host: false,
            profile_path: profile_path.into(),
            generate_endpoint: generate_endpoint.into(),
        }
    }

    /// Selects the storage backend once. Call this a single time per process
    /// and hand the (cheaply clonable) store to every surface, so extension
    /// surfaces observe each other's writes.
    pub fn open_store(&self) -> Store {
        if self.extension_host {
            info!("using shared in-process store");
            Store::new(Arc::new(MemoryBackend::new()))
        } else {
            info!(path = %self.profile_path.display(), "using local file store");
            Store::new(Arc::new(FileBackend::new(self.profile_path.clone())))
        }
    }
}

/// Assembles the controller for one surface over an already-selected store.
/// `page_extractor` is wired on extension surfaces only; passing one to the
/// web page is ignored by the readiness rules but harmless.
pub fn build_controller(
    kind: SurfaceKind,
    caps: &HostCapabilities,
    store: Store,
    page_extractor: Option<Arc<dyn PageExtractor>>,
) -> Arc<SessionController> {
    Arc::new(SessionController::new(
        kind.profile(),
        store,
        GenerationClient::new(caps.generate_endpoint.clone()),
        page_extractor,
    ))
}

/// Side panel: follow `extractedJob` writes from the page-scan collaborator
/// and merge them into the form with fill-if-empty semantics. Runs until the
/// store's change feed closes.
pub fn spawn_detection_listener(
    controller: Arc<SessionController>,
) -> JoinHandle<()> {
    let mut changes = controller.store().subscribe();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) if change.key == keys::EXTRACTED_JOB => {
                    match serde_json::from_value::<ExtractedJobData>(change.value) {
                        Ok(job) => {
                            info!(source = %job.source, "merging detected job data");
                            controller.merge_detected(&job).await;
                        }
                        Err(e) => warn!("ignoring malformed extracted job payload: {e}"),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "detection feed lagged; continuing");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
