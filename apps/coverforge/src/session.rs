//! Form/session controller — the one state machine behind all three
//! surfaces.
//!
//! Owns the mutable input state, the idle/generating phase, preference
//! persistence, debounced draft autosave, the fill-if-empty merge of
//! externally detected job data, and the single in-flight generation call.
//! Surfaces are thin parameterizations over this contract via
//! [`SurfaceProfile`]; they never touch the store or the client directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::GenerationClient;
use crate::error::{GenerateError, IngestError, PageExtractError};
use crate::ingest::{ingest_resume, IngestMode};
use crate::model::{
    DraftState, ExtractedJobData, GeneratedResult, HistoryEntry, Language, LetterLength,
    LetterState, Preferences, Tone,
};
use crate::page::PageExtractor;
use crate::store::Store;

/// Debounce window for draft autosave; rapid edits coalesce into one write.
pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Controller phase. There is no cancellation: a second generate request is
/// refused while one is in flight, never raced against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Generating,
}

/// Which inputs satisfy the job-target half of the readiness guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTargetRule {
    /// Manual company name or a job posting link (web page).
    CompanyOrLink,
    /// Detected or manually entered company/title/description (side panel).
    DetectedOrManual,
    /// A captured page snapshot (popup).
    CapturedPage,
}

/// Capability set a surface hands to its controller.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceProfile {
    pub autosave: bool,
    pub ingest_mode: IngestMode,
    pub job_target: JobTargetRule,
}

/// Outcome of a generate request that did not error: either a call completed,
/// or the guard refused to start one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    Completed,
    Skipped,
}

struct FormState {
    state: LetterState,
    result: Option<GeneratedResult>,
    last_updated: Option<DateTime<Utc>>,
    ingesting: bool,
}

pub struct SessionController {
    profile: SurfaceProfile,
    store: Store,
    client: GenerationClient,
    page_extractor: Option<Arc<dyn PageExtractor>>,
    form: Mutex<FormState>,
    /// Single-flight gate; flipped with compare-exchange so only one caller
    /// can enter the generating phase.
    generating: AtomicBool,
    autosave_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(
        profile: SurfaceProfile,
        store: Store,
        client: GenerationClient,
        page_extractor: Option<Arc<dyn PageExtractor>>,
    ) -> Self {
        Self {
            profile,
            store,
            client,
            page_extractor,
            form: Mutex::new(FormState {
                state: LetterState::default(),
                result: None,
                last_updated: None,
                ingesting: false,
            }),
            generating: AtomicBool::new(false),
            autosave_task: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn phase(&self) -> Phase {
        if self.generating.load(Ordering::SeqCst) {
            Phase::Generating
        } else {
            Phase::Idle
        }
    }

    /// Mount-time hydration: preferences always, the saved draft on autosave
    /// surfaces, previously detected job data on surfaces that receive it.
    /// Every load is best-effort.
    pub async fn mount(&self) {
        match self.store.load_preferences().await {
            Ok(prefs) => {
                let mut form = self.form.lock().await;
                form.state.language = prefs.language;
                form.state.tone = prefs.tone;
                form.state.length = prefs.length;
            }
            Err(e) => warn!("failed to load preferences: {e}"),
        }

        if self.profile.autosave {
            match self.store.load_draft().await {
                Ok(draft) => {
                    let mut form = self.form.lock().await;
                    form.state.job_description = draft.job_description;
                    form.state.company_name = draft.company_name;
                    form.state.job_title = draft.job_title;
                    form.state.job_link = draft.job_link;
                    form.state.additional_instructions = draft.additional_instructions;
                }
                Err(e) => warn!("failed to load draft: {e}"),
            }
        }

        if self.profile.job_target == JobTargetRule::DetectedOrManual {
            match self.store.extracted_job().await {
                Ok(Some(job)) => self.merge_detected(&job).await,
                Ok(None) => {}
                Err(e) => warn!("failed to load detected job data: {e}"),
            }
        }
    }

    // ── Field mutation ──────────────────────────────────────────────────

    pub async fn set_full_name(&self, value: impl Into<String>) {
        self.form.lock().await.state.full_name = value.into();
    }

    pub async fn set_company_name(&self, value: impl Into<String>) {
        self.form.lock().await.state.company_name = value.into();
        self.after_draft_change().await;
    }

    pub async fn set_job_title(&self, value: impl Into<String>) {
        self.form.lock().await.state.job_title = value.into();
        self.after_draft_change().await;
    }

    pub async fn set_job_link(&self, value: impl Into<String>) {
        self.form.lock().await.state.job_link = value.into();
        self.after_draft_change().await;
    }

    pub async fn set_job_description(&self, value: impl Into<String>) {
        self.form.lock().await.state.job_description = value.into();
        self.after_draft_change().await;
    }

    pub async fn set_additional_instructions(&self, value: impl Into<String>) {
        self.form.lock().await.state.additional_instructions = value.into();
        self.after_draft_change().await;
    }

    pub async fn set_resume_text(&self, value: impl Into<String>) {
        self.form.lock().await.state.set_resume_text(value);
    }

    pub async fn set_tone(&self, tone: Tone) {
        self.form.lock().await.state.tone = tone;
        self.persist_preferences().await;
    }

    pub async fn set_length(&self, length: LetterLength) {
        self.form.lock().await.state.length = length;
        self.persist_preferences().await;
    }

    pub async fn set_language(&self, language: Language) {
        self.form.lock().await.state.language = language;
        self.persist_preferences().await;
    }

    // ── Collaborator input ──────────────────────────────────────────────

    /// Ingests an uploaded resume file. On failure the previously held
    /// resume state is untouched and the error is returned for display.
    pub async fn ingest_file(
        &self,
        file_name: &str,
        media_type: Option<&str>,
        data: Bytes,
    ) -> Result<(), IngestError> {
        self.form.lock().await.ingesting = true;
        let outcome = ingest_resume(file_name, media_type, data, self.profile.ingest_mode).await;

        let mut form = self.form.lock().await;
        form.ingesting = false;
        match outcome {
            Ok(ingested) => {
                form.state.apply_ingested(ingested);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Captures the active tab through the wired extractor and stashes the
    /// snapshot on the state (popup mount path).
    pub async fn capture_page(&self) -> Result<(), PageExtractError> {
        let extractor = self
            .page_extractor
            .as_ref()
            .ok_or(PageExtractError::Unavailable)?;
        let snapshot = extractor.capture().await?;

        let mut form = self.form.lock().await;
        form.state.page_content = Some(snapshot.content);
        form.state.page_url = Some(snapshot.url);
        form.state.page_title = Some(snapshot.title);
        Ok(())
    }

    /// Fill-if-empty merge of externally detected job data: a detected value
    /// lands only in a field the user has not filled.
    pub async fn merge_detected(&self, job: &ExtractedJobData) {
        let mut form = self.form.lock().await;
        let state = &mut form.state;
        fill_if_empty(&mut state.company_name, &job.company_name);
        fill_if_empty(&mut state.job_title, &job.job_title);
        fill_if_empty(&mut state.job_link, &job.job_url);
        fill_if_empty(&mut state.job_description, &job.job_description);
    }

    // ── Generation ──────────────────────────────────────────────────────

    /// Whether the generate action is currently allowed: a resume, a job
    /// target per the surface rule, no ingestion in progress, and no call
    /// already in flight.
    pub async fn can_generate(&self) -> bool {
        if self.generating.load(Ordering::SeqCst) {
            return false;
        }
        let form = self.form.lock().await;
        !form.ingesting && is_ready(&self.profile, &form.state)
    }

    /// Runs one generation call against a snapshot of the current state.
    ///
    /// A failed guard (missing inputs, ingestion in progress, or another call
    /// in flight) is a refusal, not an error. On success the result is
    /// stored, timestamped, and appended to the history (best-effort); on
    /// failure the phase reverts to idle and any prior result is untouched.
    pub async fn generate(&self) -> Result<GenerateOutcome, GenerateError> {
        if self
            .generating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(GenerateOutcome::Skipped);
        }

        let snapshot = {
            let form = self.form.lock().await;
            if form.ingesting || !is_ready(&self.profile, &form.state) {
                drop(form);
                self.generating.store(false, Ordering::SeqCst);
                return Ok(GenerateOutcome::Skipped);
            }
            form.state.clone()
        };

        info!(company = %snapshot.company_name, "starting generation");
        match self.client.generate(&snapshot).await {
            Ok(result) => {
                {
                    let mut form = self.form.lock().await;
                    form.result = Some(result.clone());
                    form.last_updated = Some(Utc::now());
                }
                let entry = HistoryEntry {
                    id: Uuid::new_v4(),
                    timestamp: Utc::now(),
                    company_name: snapshot.company_name.clone(),
                    job_title: snapshot.job_title.clone(),
                    content: result.text.clone(),
                };
                if let Err(e) = self.store.push_history(entry).await {
                    warn!("failed to record letter history: {e}");
                }
                self.generating.store(false, Ordering::SeqCst);
                info!("generation completed");
                Ok(GenerateOutcome::Completed)
            }
            Err(e) => {
                self.generating.store(false, Ordering::SeqCst);
                warn!("generation failed: {e}");
                Err(e)
            }
        }
    }

    // ── Result access & lifecycle ───────────────────────────────────────

    /// Replaces the generated text with the user's hand edit. Citations are
    /// kept; a missing result makes this a no-op.
    pub async fn set_result_text(&self, text: impl Into<String>) {
        let mut form = self.form.lock().await;
        if let Some(result) = form.result.as_mut() {
            result.text = text.into();
        }
    }

    pub async fn result(&self) -> Option<GeneratedResult> {
        self.form.lock().await.result.clone()
    }

    pub async fn state(&self) -> LetterState {
        self.form.lock().await.state.clone()
    }

    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.form.lock().await.last_updated
    }

    /// The persisted history, newest first; unreadable history is empty.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        match self.store.history().await {
            Ok(history) => history,
            Err(e) => {
                warn!("failed to load letter history: {e}");
                Vec::new()
            }
        }
    }

    /// Back to defaults. The persistent store is left alone.
    pub async fn reset(&self) {
        let mut form = self.form.lock().await;
        form.state = LetterState::default();
        form.result = None;
        form.last_updated = None;
    }

    // ── Persistence plumbing ────────────────────────────────────────────

    async fn persist_preferences(&self) {
        let prefs = {
            let form = self.form.lock().await;
            Preferences {
                language: form.state.language,
                tone: form.state.tone,
                length: form.state.length,
            }
        };
        if let Err(e) = self.store.save_preferences(&prefs).await {
            warn!("failed to persist preferences: {e}");
        }
    }

    async fn after_draft_change(&self) {
        if self.profile.autosave {
            self.arm_autosave().await;
        }
    }

    /// (Re)arms the debounce timer with a snapshot of the current draft.
    /// Each edit replaces the pending write, so a burst of edits persists
    /// exactly once, with the final state.
    async fn arm_autosave(&self) {
        let draft = DraftState::of(&self.form.lock().await.state);
        let store = self.store.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(AUTOSAVE_DEBOUNCE).await;
            if let Err(e) = store.save_draft(&draft).await {
                warn!("draft autosave failed: {e}");
            }
        });

        let mut slot = self.autosave_task.lock().await;
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }
}

fn is_ready(profile: &SurfaceProfile, state: &LetterState) -> bool {
    if !state.has_resume() {
        return false;
    }
    match profile.job_target {
        JobTargetRule::CompanyOrLink => {
            !state.company_name.is_empty() || !state.job_link.is_empty()
        }
        JobTargetRule::DetectedOrManual => {
            !state.company_name.is_empty()
                || !state.job_title.is_empty()
                || !state.job_description.is_empty()
        }
        JobTargetRule::CapturedPage => state.page_content.is_some(),
    }
}

fn fill_if_empty(field: &mut String, incoming: &str) {
    if field.is_empty() && !incoming.is_empty() {
        *field = incoming.to_string();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::broadcast;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::StoreError;
    use crate::store::{keys, MemoryBackend, StoreBackend, StoreChange};

    /// Wraps the in-memory backend and counts draft writes.
    struct CountingBackend {
        inner: MemoryBackend,
        draft_saves: AtomicUsize,
    }

    impl CountingBackend {
        fn new() -> Self {
            Self {
                inner: MemoryBackend::new(),
                draft_saves: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StoreBackend for CountingBackend {
        async fn save(&self, entries: HashMap<String, Value>) -> Result<(), StoreError> {
            if entries.keys().any(|k| k.starts_with("draft")) {
                self.draft_saves.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.save(entries).await
        }

        async fn load(&self, keys: Option<&[&str]>) -> Result<HashMap<String, Value>, StoreError> {
            self.inner.load(keys).await
        }

        async fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
            self.inner.remove(keys).await
        }

        async fn clear(&self) -> Result<(), StoreError> {
            self.inner.clear().await
        }

        fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
            self.inner.subscribe()
        }
    }

    fn web_profile() -> SurfaceProfile {
        SurfaceProfile {
            autosave: true,
            ingest_mode: IngestMode::Attach,
            job_target: JobTargetRule::CompanyOrLink,
        }
    }

    fn side_panel_profile() -> SurfaceProfile {
        SurfaceProfile {
            autosave: false,
            ingest_mode: IngestMode::Extract,
            job_target: JobTargetRule::DetectedOrManual,
        }
    }

    fn controller_with(
        profile: SurfaceProfile,
        backend: Arc<dyn StoreBackend>,
        endpoint: String,
    ) -> SessionController {
        SessionController::new(
            profile,
            Store::new(backend),
            GenerationClient::new(endpoint),
            None,
        )
    }

    fn controller(profile: SurfaceProfile, endpoint: String) -> SessionController {
        controller_with(profile, Arc::new(MemoryBackend::new()), endpoint)
    }

    async fn mount_success_mock(server: &MockServer, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"text": "Dear Hiring Manager,", "sources": []})),
            )
            .expect(expected)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_generate_is_a_noop_without_inputs() {
        let server = MockServer::start().await;
        mount_success_mock(&server, 0).await;

        let controller = controller(web_profile(), format!("{}/api/generate", server.uri()));
        assert!(!controller.can_generate().await);
        let outcome = controller.generate().await.unwrap();
        assert_eq!(outcome, GenerateOutcome::Skipped);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_successful_generation_stores_result_and_history() {
        let server = MockServer::start().await;
        mount_success_mock(&server, 1).await;

        let controller = controller(web_profile(), format!("{}/api/generate", server.uri()));
        controller.set_resume_text("Jane Doe, engineer").await;
        controller.set_company_name("Acme").await;

        assert!(controller.can_generate().await);
        let outcome = controller.generate().await.unwrap();
        assert_eq!(outcome, GenerateOutcome::Completed);
        assert_eq!(controller.phase(), Phase::Idle);

        let result = controller.result().await.unwrap();
        assert_eq!(result.text, "Dear Hiring Manager,");
        assert!(result.sources.is_empty());
        assert!(controller.last_updated().await.is_some());

        let history = controller.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].company_name, "Acme");
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_prior_result_and_history() {
        let server = MockServer::start().await;
        mount_success_mock(&server, 1).await;

        let controller = controller(web_profile(), format!("{}/api/generate", server.uri()));
        controller.set_resume_text("Jane Doe, engineer").await;
        controller.set_company_name("Acme").await;
        controller.generate().await.unwrap();
        let prior = controller.result().await.unwrap();

        // Endpoint starts failing.
        server.reset().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .mount(&server)
            .await;

        let err = controller.generate().await.unwrap_err();
        assert!(matches!(err, GenerateError::Endpoint { status: 500, .. }));
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(controller.result().await.unwrap(), prior);
        assert_eq!(controller.history().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_double_trigger_issues_exactly_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"text": "Dear Hiring Manager,", "sources": []}))
                    .set_delay(std::time::Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let controller = Arc::new(controller(
            web_profile(),
            format!("{}/api/generate", server.uri()),
        ));
        controller.set_resume_text("Jane Doe, engineer").await;
        controller.set_company_name("Acme").await;

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.generate().await.unwrap() }
        });
        // Give the first call time to win the gate before triggering again.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let second = controller.generate().await.unwrap();

        assert_eq!(second, GenerateOutcome::Skipped);
        assert_eq!(first.await.unwrap(), GenerateOutcome::Completed);
        assert_eq!(controller.history().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_coalesce_into_one_draft_write() {
        let backend = Arc::new(CountingBackend::new());
        let server_uri = "http://127.0.0.1:9".to_string(); // never contacted
        let controller = controller_with(web_profile(), backend.clone(), server_uri);

        controller.set_company_name("A").await;
        controller.set_company_name("Ac").await;
        controller.set_company_name("Acm").await;
        controller.set_company_name("Acme").await;
        controller.set_job_title("Engineer").await;

        // Let the debounce window elapse; paused time advances on sleep.
        tokio::time::sleep(AUTOSAVE_DEBOUNCE + Duration::from_millis(100)).await;

        assert_eq!(backend.draft_saves.load(Ordering::SeqCst), 1);
        let draft = controller.store().load_draft().await.unwrap();
        assert_eq!(draft.company_name, "Acme");
        assert_eq!(draft.job_title, "Engineer");
    }

    #[tokio::test]
    async fn test_non_autosave_surface_never_writes_drafts() {
        let backend = Arc::new(CountingBackend::new());
        let controller = controller_with(
            side_panel_profile(),
            backend.clone(),
            "http://127.0.0.1:9".to_string(),
        );

        controller.set_company_name("Acme").await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(backend.draft_saves.load(Ordering::SeqCst), 0);
    }

    struct FixedPageExtractor;

    #[async_trait]
    impl crate::page::PageExtractor for FixedPageExtractor {
        async fn capture(&self) -> Result<crate::page::PageSnapshot, PageExtractError> {
            Ok(crate::page::PageSnapshot {
                url: "https://jobs.example/1".to_string(),
                title: "Engineer - Acme".to_string(),
                content: "Acme is hiring an engineer.".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_popup_requires_a_captured_page() {
        let profile = SurfaceProfile {
            autosave: false,
            ingest_mode: IngestMode::Extract,
            job_target: JobTargetRule::CapturedPage,
        };
        let controller = SessionController::new(
            profile,
            Store::new(Arc::new(MemoryBackend::new())),
            GenerationClient::new("http://127.0.0.1:9"),
            Some(Arc::new(FixedPageExtractor)),
        );
        controller.set_resume_text("Jane Doe, engineer").await;
        assert!(!controller.can_generate().await, "no page captured yet");

        controller.capture_page().await.unwrap();
        assert!(controller.can_generate().await);

        let state = controller.state().await;
        assert_eq!(state.page_url.as_deref(), Some("https://jobs.example/1"));
        assert_eq!(state.page_content.as_deref(), Some("Acme is hiring an engineer."));
    }

    #[tokio::test]
    async fn test_capture_page_without_extractor_is_unavailable() {
        let controller = controller(web_profile(), "http://127.0.0.1:9".to_string());
        let err = controller.capture_page().await.unwrap_err();
        assert!(matches!(err, PageExtractError::Unavailable));
    }

    #[tokio::test]
    async fn test_merge_detected_fills_only_empty_fields() {
        let controller = controller(side_panel_profile(), "http://127.0.0.1:9".to_string());
        controller.set_company_name("Acme").await;

        let detected = ExtractedJobData {
            company_name: "Other Corp".to_string(),
            job_title: "Staff Engineer".to_string(),
            job_url: "https://jobs.example/1".to_string(),
            ..Default::default()
        };
        controller.merge_detected(&detected).await;

        let state = controller.state().await;
        assert_eq!(state.company_name, "Acme");
        assert_eq!(state.job_title, "Staff Engineer");
        assert_eq!(state.job_link, "https://jobs.example/1");
    }

    #[tokio::test]
    async fn test_merge_detected_fills_empty_company() {
        let controller = controller(side_panel_profile(), "http://127.0.0.1:9".to_string());
        let detected = ExtractedJobData {
            company_name: "Other Corp".to_string(),
            ..Default::default()
        };
        controller.merge_detected(&detected).await;
        assert_eq!(controller.state().await.company_name, "Other Corp");
    }

    #[tokio::test]
    async fn test_doc_upload_reports_error_and_keeps_prior_resume() {
        let controller = controller(web_profile(), "http://127.0.0.1:9".to_string());
        controller.set_resume_text("prior resume").await;

        let err = controller
            .ingest_file("resume.doc", Some("application/msword"), Bytes::from_static(b"junk"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(_)));

        let state = controller.state().await;
        assert_eq!(state.resume_text, "prior resume");
        assert!(state.resume_data.is_none());
    }

    #[tokio::test]
    async fn test_ingested_attachment_replaces_resume_text() {
        let controller = controller(web_profile(), "http://127.0.0.1:9".to_string());
        controller.set_resume_text("typed text").await;

        controller
            .ingest_file("resume.pdf", Some("application/pdf"), Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap();

        let state = controller.state().await;
        assert!(state.resume_text.is_empty());
        assert!(state.resume_data.is_some());
        assert_eq!(state.resume_mime_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_mount_hydrates_preferences_and_detected_job() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Store::new(backend.clone());
        store
            .save_preferences(&Preferences {
                language: Language::French,
                tone: Tone::Confident,
                length: LetterLength::Short,
            })
            .await
            .unwrap();
        let mut entries = HashMap::new();
        entries.insert(
            keys::EXTRACTED_JOB.to_string(),
            serde_json::to_value(ExtractedJobData {
                company_name: "Acme".to_string(),
                job_title: "Engineer".to_string(),
                source: "jobs.example".to_string(),
                ..Default::default()
            })
            .unwrap(),
        );
        store.save(entries).await.unwrap();

        let controller = controller_with(
            side_panel_profile(),
            backend,
            "http://127.0.0.1:9".to_string(),
        );
        controller.mount().await;

        let state = controller.state().await;
        assert_eq!(state.language, Language::French);
        assert_eq!(state.tone, Tone::Confident);
        assert_eq!(state.length, LetterLength::Short);
        assert_eq!(state.company_name, "Acme");
        assert_eq!(state.job_title, "Engineer");
    }

    #[tokio::test]
    async fn test_preference_change_persists_immediately() {
        let backend = Arc::new(MemoryBackend::new());
        let controller = controller_with(
            side_panel_profile(),
            backend.clone(),
            "http://127.0.0.1:9".to_string(),
        );

        controller.set_language(Language::Spanish).await;
        let prefs = Store::new(backend).load_preferences().await.unwrap();
        assert_eq!(prefs.language, Language::Spanish);
    }

    #[tokio::test]
    async fn test_result_text_edit_keeps_sources() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "Dear Hiring Manager,",
                "sources": [{"title": "Acme", "uri": "https://acme.example"}]
            })))
            .mount(&server)
            .await;

        let controller = controller(web_profile(), format!("{}/api/generate", server.uri()));
        controller.set_resume_text("Jane Doe").await;
        controller.set_job_link("https://jobs.example/1").await;
        controller.generate().await.unwrap();

        controller.set_result_text("Dear Acme team,").await;
        let result = controller.result().await.unwrap();
        assert_eq!(result.text, "Dear Acme team,");
        assert_eq!(result.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_returns_to_defaults() {
        let controller = controller(web_profile(), "http://127.0.0.1:9".to_string());
        controller.set_company_name("Acme").await;
        controller.set_resume_text("Jane Doe").await;

        controller.reset().await;
        assert_eq!(controller.state().await, LetterState::default());
        assert!(controller.result().await.is_none());
    }
}
