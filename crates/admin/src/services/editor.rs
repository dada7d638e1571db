//! Per-admin lesson editor sessions and the autosave loop.
//!
//! Each signed-in admin has one [`EditorSession`] holding an in-memory
//! draft. Manual save, publish and autosave all go through a single saving
//! lock, so one admin never has two writes to the same lesson in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use proglearn_backend::{BackendError, LessonGateway};
use proglearn_core::editor::{DraftError, ImportError, LessonDraft, MarkdownAction, TextSelection};
use proglearn_core::{CategoryId, Lesson, LessonId, LessonPatch, LessonStatus, UserId};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Errors from editor and lesson-manager operations.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Category name is required.")]
    EmptyCategoryName,

    #[error("{0}")]
    Backend(#[from] BackendError),
}

/// Which kind of save is being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Keep the draft's status.
    Save,
    /// Force the status to published.
    Publish,
    /// Timer-driven save; keeps the draft's status.
    Autosave,
}

impl SaveMode {
    const fn notice(self) -> &'static str {
        match self {
            Self::Save => "Lesson saved.",
            Self::Publish => "Lesson published.",
            Self::Autosave => "Draft autosaved.",
        }
    }
}

/// Snapshot of an editor for rendering and the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EditorStatus {
    pub editing_id: Option<LessonId>,
    pub saving: bool,
    pub unsaved: bool,
    pub last_saved: Option<DateTime<Utc>>,
    pub last_autosave: Option<DateTime<Utc>>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct EditorState {
    draft: LessonDraft,
    editing_id: Option<LessonId>,
    unsaved: bool,
    last_saved: Option<DateTime<Utc>>,
    last_autosave: Option<DateTime<Utc>>,
    notice: Option<String>,
    error: Option<String>,
    /// Bumped on every draft change.
    revision: u64,
    /// Bumped whenever a different lesson is loaded or the editor resets.
    generation: u64,
    /// Set when a save of the current revision failed. Autosave stays off
    /// until the draft changes again.
    autosave_held: bool,
}

impl EditorState {
    fn load(&mut self, draft: LessonDraft, editing_id: Option<LessonId>) {
        self.draft = draft;
        self.editing_id = editing_id;
        self.unsaved = false;
        self.notice = None;
        self.error = None;
        self.revision += 1;
        self.generation += 1;
        self.autosave_held = false;
    }

    fn touch(&mut self) {
        self.unsaved = true;
        self.revision += 1;
        self.autosave_held = false;
    }
}

/// What a save works from, taken under the state lock.
struct SaveSnapshot {
    draft: LessonDraft,
    editing_id: Option<LessonId>,
    revision: u64,
    generation: u64,
}

/// One admin's editor.
pub struct EditorSession<G: ?Sized> {
    gateway: RwLock<Arc<G>>,
    state: Mutex<EditorState>,
    save_lock: tokio::sync::Mutex<()>,
    saving: AtomicBool,
}

impl<G> EditorSession<G>
where
    G: LessonGateway + ?Sized,
{
    /// A fresh editor holding the new-lesson template.
    #[must_use]
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway: RwLock::new(gateway),
            state: Mutex::new(EditorState::default()),
            save_lock: tokio::sync::Mutex::new(()),
            saving: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gateway(&self) -> Arc<G> {
        Arc::clone(&self.gateway.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swap in a gateway carrying the admin's latest token.
    pub fn set_gateway(&self, gateway: Arc<G>) {
        *self.gateway.write().unwrap_or_else(PoisonError::into_inner) = gateway;
    }

    #[must_use]
    pub fn draft(&self) -> LessonDraft {
        self.state().draft.clone()
    }

    #[must_use]
    pub fn editing_id(&self) -> Option<LessonId> {
        self.state().editing_id
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn status(&self) -> EditorStatus {
        let state = self.state();
        EditorStatus {
            editing_id: state.editing_id,
            saving: self.is_saving(),
            unsaved: state.unsaved,
            last_saved: state.last_saved,
            last_autosave: state.last_autosave,
            notice: state.notice.clone(),
            error: state.error.clone(),
        }
    }

    /// Replace the draft with edited fields and mark it unsaved.
    pub fn update(&self, draft: LessonDraft) {
        let mut state = self.state();
        if state.draft != draft {
            state.draft = draft;
            state.touch();
        }
    }

    /// Apply a markdown action to the draft content.
    pub fn format(&self, action: &MarkdownAction, selection: TextSelection) -> (String, TextSelection) {
        let mut state = self.state();
        let selection = state.draft.format(action, selection);
        state.touch();
        (state.draft.content.clone(), selection)
    }

    /// Pick the draft's category.
    pub fn select_category(&self, category_id: Option<CategoryId>) {
        let mut state = self.state();
        if state.draft.category_id != category_id {
            state.draft.category_id = category_id;
            state.touch();
        }
    }

    /// Open an existing lesson.
    pub fn edit(&self, lesson: &Lesson) {
        self.state()
            .load(LessonDraft::from_lesson(lesson), Some(lesson.id));
    }

    /// Start a new draft copied from `lesson`.
    pub fn duplicate(&self, lesson: &Lesson) {
        let mut state = self.state();
        state.load(LessonDraft::duplicate_of(lesson), None);
        state.unsaved = true;
    }

    /// Back to the new-lesson template.
    pub fn reset(&self) {
        self.state().load(LessonDraft::default(), None);
    }

    /// React to a lesson having been deleted elsewhere.
    pub fn on_deleted(&self, id: LessonId) {
        let mut state = self.state();
        if state.editing_id == Some(id) {
            state.load(LessonDraft::default(), None);
            state.notice = Some("The lesson you were editing was deleted.".to_string());
        }
    }

    /// Report a message next to the editor.
    pub fn set_notice(&self, notice: impl Into<String>) {
        let mut state = self.state();
        state.notice = Some(notice.into());
        state.error = None;
    }

    /// Report an error next to the editor.
    pub fn set_error(&self, error: impl Into<String>) {
        self.state().error = Some(error.into());
    }

    /// Save the draft, creating the lesson if it has no id yet.
    ///
    /// # Errors
    ///
    /// Returns a validation error without contacting the backend when the
    /// title or content is blank, or the backend error. Either way the
    /// message is kept for display and the draft is retained.
    pub async fn save(&self) -> Result<Lesson, EditorError> {
        self.run_save(SaveMode::Save).await
    }

    /// Save the draft with status published.
    ///
    /// # Errors
    ///
    /// Same as [`save`](Self::save).
    pub async fn publish(&self) -> Result<Lesson, EditorError> {
        self.run_save(SaveMode::Publish).await
    }

    /// Save if the draft has a title, is not being saved and has unsaved
    /// changes.
    ///
    /// After a failed save nothing is sent again until the draft is edited
    /// or the admin saves by hand.
    ///
    /// An autosave arriving while a save is in flight waits for it and then
    /// checks again, so it usually finds nothing left to do.
    ///
    /// # Errors
    ///
    /// Returns the backend error; validation never fails here because a
    /// title is required to start.
    pub async fn autosave(&self) -> Result<Option<Lesson>, EditorError> {
        if !self.wants_autosave() {
            return Ok(None);
        }

        let _guard = self.save_lock.lock().await;
        if !self.wants_autosave() {
            debug!("Autosave skipped: nothing left to save");
            return Ok(None);
        }
        self.persist(SaveMode::Autosave).await.map(Some)
    }

    fn wants_autosave(&self) -> bool {
        let state = self.state();
        state.unsaved && !state.autosave_held && state.draft.has_title()
    }

    async fn run_save(&self, mode: SaveMode) -> Result<Lesson, EditorError> {
        let _guard = self.save_lock.lock().await;
        self.persist(mode).await
    }

    /// Write the draft. Callers hold the saving lock.
    #[instrument(skip(self))]
    async fn persist(&self, mode: SaveMode) -> Result<Lesson, EditorError> {
        let snapshot = {
            let state = self.state();
            SaveSnapshot {
                draft: state.draft.clone(),
                editing_id: state.editing_id,
                revision: state.revision,
                generation: state.generation,
            }
        };

        if let Err(err) = snapshot.draft.validate() {
            let mut state = self.state();
            state.error = Some(err.to_string());
            state.autosave_held = state.revision == snapshot.revision;
            return Err(err.into());
        }

        let status = match mode {
            SaveMode::Publish => LessonStatus::Published,
            SaveMode::Save | SaveMode::Autosave => snapshot.draft.status,
        };
        let payload = snapshot.draft.to_payload(status);
        let gateway = self.gateway();

        self.saving.store(true, Ordering::SeqCst);
        let result = match snapshot.editing_id {
            Some(id) => gateway.update_lesson(id, &LessonPatch::from(payload)).await,
            None => gateway.create_lesson(&payload).await,
        };
        self.saving.store(false, Ordering::SeqCst);

        let mut state = self.state();
        match result {
            Ok(lesson) => {
                if state.generation == snapshot.generation {
                    state.editing_id = Some(lesson.id);
                    state.draft.status = status;
                    if state.revision == snapshot.revision {
                        state.unsaved = false;
                    }
                    let now = Utc::now();
                    if mode == SaveMode::Autosave {
                        state.last_autosave = Some(now);
                    } else {
                        state.last_saved = Some(now);
                    }
                    state.notice = Some(mode.notice().to_string());
                    state.error = None;
                    state.autosave_held = false;
                }
                info!(lesson_id = %lesson.id, ?mode, "Lesson saved");
                Ok(lesson)
            }
            Err(err) => {
                warn!(error = %err, ?mode, "Failed to save lesson");
                state.error = Some(err.to_string());
                if state.generation == snapshot.generation && state.revision == snapshot.revision {
                    state.autosave_held = true;
                }
                Err(err.into())
            }
        }
    }
}

/// How long an editor survives without its admin making a request.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

struct RegistryEntry<G: ?Sized> {
    session: Arc<EditorSession<G>>,
    last_seen: Instant,
}

/// Editor sessions of every signed-in admin.
pub struct EditorRegistry<G: ?Sized> {
    sessions: Mutex<HashMap<UserId, RegistryEntry<G>>>,
    idle_timeout: Duration,
}

impl<G: ?Sized> Default for EditorRegistry<G> {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl<G: ?Sized> EditorRegistry<G> {
    /// A registry that drops editors idle for longer than `idle_timeout`.
    #[must_use]
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }
}

impl<G> EditorRegistry<G>
where
    G: LessonGateway + ?Sized + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<UserId, RegistryEntry<G>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The admin's editor, created on first use. `gateway` replaces the
    /// one the editor saves through.
    pub fn session(&self, user: UserId, gateway: Arc<G>) -> Arc<EditorSession<G>> {
        let mut sessions = self.sessions();
        let now = Instant::now();
        if let Some(existing) = sessions.get_mut(&user) {
            existing.session.set_gateway(gateway);
            existing.last_seen = now;
            return Arc::clone(&existing.session);
        }
        let session = Arc::new(EditorSession::new(gateway));
        sessions.insert(
            user,
            RegistryEntry {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        session
    }

    /// Drop an admin's editor (on sign-out or a lost session).
    pub fn remove(&self, user: UserId) {
        if self.sessions().remove(&user).is_some() {
            debug!(%user, "Editor closed");
        }
    }

    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.sessions().contains_key(&user)
    }

    /// Drop editors whose admin has not made a request within the idle
    /// timeout. Returns how many were dropped.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|user, entry| {
            let keep = now.saturating_duration_since(entry.last_seen) <= self.idle_timeout;
            if !keep {
                info!(%user, "Closing idle editor");
            }
            keep
        });
        before - sessions.len()
    }

    /// Close idle editors, then autosave the rest one after another.
    pub async fn autosave_all(&self) {
        self.evict_idle(Instant::now());
        let sessions: Vec<(UserId, Arc<EditorSession<G>>)> = self
            .sessions()
            .iter()
            .map(|(user, entry)| (*user, Arc::clone(&entry.session)))
            .collect();

        for (user, session) in sessions {
            match session.autosave().await {
                Ok(Some(lesson)) => debug!(%user, lesson_id = %lesson.id, "Autosaved"),
                Ok(None) => {}
                Err(err) => warn!(%user, error = %err, "Autosave failed"),
            }
        }
    }

    /// Start the autosave loop. Abort the handle to stop it.
    pub fn spawn_autosave(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.autosave_all().await;
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use proglearn_backend::ErrorKind;
    use proglearn_core::{Category, CategoryPayload, LessonPayload};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// In-memory lesson store recording every write.
    #[derive(Default)]
    pub struct FakeLessons {
        pub lessons: Mutex<Vec<Lesson>>,
        pub writes: Mutex<Vec<String>>,
        pub patches: Mutex<Vec<LessonPatch>>,
        pub fail_writes: AtomicBool,
        /// Writes currently running, and the most ever seen at once.
        in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
        /// When set, writes wait for a notification before finishing.
        pub gate: Option<Arc<Notify>>,
    }

    impl FakeLessons {
        pub fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::default()
            }
        }

        pub fn writes(&self) -> Vec<String> {
            self.writes.lock().unwrap().clone()
        }

        async fn write<T>(&self, label: String, result: impl FnOnce() -> T) -> Result<T, BackendError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.writes.lock().unwrap().push(label);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(BackendError {
                    kind: ErrorKind::PermissionDenied,
                    status: Some(403),
                    code: Some("42501".to_string()),
                    message: "new row violates row-level security policy".to_string(),
                });
            }
            Ok(result())
        }
    }

    pub fn lesson(id: i64, title: &str, status: LessonStatus) -> Lesson {
        Lesson {
            id: LessonId::new(id),
            title: title.to_string(),
            content: format!("# {title}\n\nBody"),
            featured_image: None,
            status,
            category_id: None,
            category: None,
            views_count: 0,
            created_at: Utc::now(),
            updated_at: None,
            excerpt: None,
            meta_description: None,
            code_snippets: Vec::new(),
        }
    }

    #[async_trait]
    impl LessonGateway for FakeLessons {
        async fn list_all_lessons(&self) -> Result<Vec<Lesson>, BackendError> {
            Ok(self.lessons.lock().unwrap().clone())
        }

        async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
            Ok(Vec::new())
        }

        async fn create_lesson(&self, payload: &LessonPayload) -> Result<Lesson, BackendError> {
            let created = self
                .write(format!("create:{}", payload.title), || {
                    let mut lessons = self.lessons.lock().unwrap();
                    let id = i64::try_from(lessons.len()).unwrap() + 100;
                    let mut row = lesson(id, &payload.title, payload.status);
                    row.content.clone_from(&payload.content);
                    lessons.push(row.clone());
                    row
                })
                .await?;
            Ok(created)
        }

        async fn update_lesson(
            &self,
            id: LessonId,
            patch: &LessonPatch,
        ) -> Result<Lesson, BackendError> {
            self.patches.lock().unwrap().push(patch.clone());
            self.write(format!("update:{id}"), || {
                let mut row = lesson(id.as_i64(), patch.title.as_deref().unwrap_or("x"), LessonStatus::Draft);
                if let Some(status) = patch.status {
                    row.status = status;
                }
                row
            })
            .await
        }

        async fn delete_lesson(&self, id: LessonId) -> Result<(), BackendError> {
            self.write(format!("delete:{id}"), || ()).await
        }

        async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, BackendError> {
            self.write(format!("category:{}", payload.name), || Category {
                id: CategoryId::new(9),
                name: payload.name.clone(),
                difficulty: payload.difficulty,
                lesson_count: 0,
            })
            .await
        }
    }

    fn titled(title: &str) -> LessonDraft {
        LessonDraft {
            title: title.to_string(),
            ..LessonDraft::default()
        }
    }

    #[tokio::test]
    async fn test_save_creates_then_updates() {
        let gateway = Arc::new(FakeLessons::default());
        let editor = EditorSession::new(Arc::clone(&gateway));

        editor.update(titled("Loops"));
        let created = editor.save().await.unwrap();
        assert_eq!(editor.editing_id(), Some(created.id));
        assert!(!editor.status().unsaved);
        assert_eq!(created.status, LessonStatus::Draft);

        editor.update(titled("Loops in C"));
        editor.save().await.unwrap();

        assert_eq!(
            gateway.writes(),
            vec!["create:Loops".to_string(), format!("update:{}", created.id)]
        );
    }

    #[tokio::test]
    async fn test_publish_forces_published_status() {
        let gateway = Arc::new(FakeLessons::default());
        let editor = EditorSession::new(Arc::clone(&gateway));
        editor.update(titled("Arrays"));

        let lesson = editor.publish().await.unwrap();
        assert_eq!(lesson.status, LessonStatus::Published);
        assert_eq!(editor.draft().status, LessonStatus::Published);
        assert_eq!(editor.status().notice.as_deref(), Some("Lesson published."));
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected_without_a_request() {
        let gateway = Arc::new(FakeLessons::default());
        let editor = EditorSession::new(Arc::clone(&gateway));

        let err = editor.save().await.unwrap_err();
        assert!(matches!(err, EditorError::Draft(DraftError::MissingTitleOrContent)));
        assert_eq!(
            editor.status().error.as_deref(),
            Some("Title and content are required.")
        );
        assert!(gateway.writes().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_draft_and_reports() {
        let gateway = Arc::new(FakeLessons::default());
        gateway.fail_writes.store(true, Ordering::SeqCst);
        let editor = EditorSession::new(Arc::clone(&gateway));
        editor.update(titled("Pointers"));

        assert!(editor.save().await.is_err());
        let status = editor.status();
        assert!(status.unsaved);
        assert!(status.error.unwrap().contains("row-level security"));
        assert_eq!(editor.draft().title, "Pointers");
    }

    #[tokio::test]
    async fn test_autosave_requires_title_and_changes() {
        let gateway = Arc::new(FakeLessons::default());
        let editor = EditorSession::new(Arc::clone(&gateway));

        // Template content but no title.
        editor.update(LessonDraft {
            content: "changed".to_string(),
            ..LessonDraft::default()
        });
        assert!(editor.autosave().await.unwrap().is_none());

        editor.update(titled("Strings"));
        assert!(editor.autosave().await.unwrap().is_some());
        assert!(editor.status().last_autosave.is_some());

        // Nothing changed since.
        assert!(editor.autosave().await.unwrap().is_none());
        assert_eq!(gateway.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_autosave_waits_for_in_flight_save() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(FakeLessons::gated(Arc::clone(&gate)));
        let editor = Arc::new(EditorSession::new(Arc::clone(&gateway)));
        editor.update(titled("Functions"));

        let saving = {
            let editor = Arc::clone(&editor);
            tokio::spawn(async move { editor.save().await })
        };
        while !editor.is_saving() {
            tokio::task::yield_now().await;
        }

        let autosaving = {
            let editor = Arc::clone(&editor);
            tokio::spawn(async move { editor.autosave().await })
        };
        tokio::task::yield_now().await;
        assert_eq!(gateway.writes().len(), 1);

        gate.notify_one();
        saving.await.unwrap().unwrap();
        let autosaved = autosaving.await.unwrap().unwrap();

        assert!(autosaved.is_none(), "save already persisted the draft");
        assert_eq!(gateway.writes().len(), 1);
        assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deleting_open_lesson_resets_editor() {
        let gateway = Arc::new(FakeLessons::default());
        let editor = EditorSession::new(gateway);
        let open = lesson(5, "Recursion", LessonStatus::Published);

        editor.edit(&open);
        editor.on_deleted(LessonId::new(6));
        assert_eq!(editor.editing_id(), Some(open.id));

        editor.on_deleted(open.id);
        assert_eq!(editor.editing_id(), None);
        assert_eq!(editor.draft(), LessonDraft::default());
    }

    #[tokio::test]
    async fn test_duplicate_starts_unsaved_copy() {
        let gateway = Arc::new(FakeLessons::default());
        let editor = EditorSession::new(gateway);
        editor.duplicate(&lesson(5, "Recursion", LessonStatus::Published));

        let draft = editor.draft();
        assert_eq!(draft.title, "Recursion (Copy)");
        assert_eq!(draft.status, LessonStatus::Draft);
        assert_eq!(editor.editing_id(), None);
        assert!(editor.status().unsaved);
    }

    #[tokio::test]
    async fn test_format_marks_unsaved() {
        let gateway = Arc::new(FakeLessons::default());
        let editor = EditorSession::new(gateway);
        editor.update(LessonDraft {
            content: "hello".to_string(),
            ..LessonDraft::default()
        });

        let (content, selection) = editor.format(&MarkdownAction::Bold, TextSelection::new(0, 5));
        assert_eq!(content, "**hello**");
        assert_eq!(selection, TextSelection::new(2, 7));
        assert!(editor.status().unsaved);
    }

    #[tokio::test]
    async fn test_registry_reuses_sessions_and_autosaves_all() {
        let gateway = Arc::new(FakeLessons::default());
        let registry = EditorRegistry::new();
        let user = UserId::new(uuid::Uuid::nil());

        let first = registry.session(user, Arc::clone(&gateway));
        let again = registry.session(user, Arc::clone(&gateway));
        assert!(Arc::ptr_eq(&first, &again));

        first.update(titled("Queues"));
        registry.autosave_all().await;
        assert_eq!(gateway.writes(), vec!["create:Queues".to_string()]);

        registry.remove(user);
        let fresh = registry.session(user, gateway);
        assert!(!Arc::ptr_eq(&first, &fresh));
    }

    #[tokio::test]
    async fn test_failed_autosave_is_not_retried_on_later_ticks() {
        let gateway = Arc::new(FakeLessons::default());
        gateway.fail_writes.store(true, Ordering::SeqCst);
        let registry = EditorRegistry::new();
        let user = UserId::new(uuid::Uuid::nil());
        let editor = registry.session(user, Arc::clone(&gateway));
        editor.update(titled("Stale tab"));

        for _ in 0..5 {
            registry.autosave_all().await;
        }

        assert_eq!(gateway.writes(), vec!["create:Stale tab".to_string()]);
        let status = editor.status();
        assert!(status.unsaved);
        assert!(status.error.is_some());
    }

    #[tokio::test]
    async fn test_editing_after_failed_autosave_allows_another_attempt() {
        let gateway = Arc::new(FakeLessons::default());
        gateway.fail_writes.store(true, Ordering::SeqCst);
        let editor = EditorSession::new(Arc::clone(&gateway));
        editor.update(titled("Queues"));

        assert!(editor.autosave().await.is_err());
        assert!(editor.autosave().await.unwrap().is_none());

        gateway.fail_writes.store(false, Ordering::SeqCst);
        editor.update(titled("Queues in C"));
        assert!(editor.autosave().await.unwrap().is_some());
        assert_eq!(gateway.writes().len(), 2);
        assert!(editor.status().error.is_none());
    }

    #[tokio::test]
    async fn test_failed_manual_save_is_not_repeated_by_autosave() {
        let gateway = Arc::new(FakeLessons::default());
        gateway.fail_writes.store(true, Ordering::SeqCst);
        let editor = EditorSession::new(Arc::clone(&gateway));
        editor.update(titled("Heaps"));

        assert!(editor.save().await.is_err());
        assert!(editor.autosave().await.unwrap().is_none());

        // Saving by hand is still allowed.
        assert!(editor.save().await.is_err());
        assert_eq!(gateway.writes().len(), 2);
    }

    #[test]
    fn test_idle_editors_are_evicted() {
        let registry: EditorRegistry<FakeLessons> =
            EditorRegistry::with_idle_timeout(Duration::from_secs(60));
        let idle = UserId::new(uuid::Uuid::nil());
        let active = UserId::new(uuid::Uuid::from_u128(7));
        registry.session(idle, Arc::new(FakeLessons::default()));
        registry.session(active, Arc::new(FakeLessons::default()));

        let later = Instant::now() + Duration::from_secs(30);
        assert_eq!(registry.evict_idle(later), 0);
        assert!(registry.contains(idle) && registry.contains(active));

        let much_later = Instant::now() + Duration::from_secs(120);
        registry.sessions().get_mut(&active).unwrap().last_seen = much_later;
        assert_eq!(registry.evict_idle(much_later), 1);
        assert!(!registry.contains(idle));
        assert!(registry.contains(active));
    }
}
