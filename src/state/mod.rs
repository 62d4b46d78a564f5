pub mod quiz;
mod sse;
pub mod state_machine;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use tokio::{
    sync::{Mutex, RwLock, watch},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{config::AppConfig, dao::quiz_store::QuizStore, engine::SessionEngine, error::ServiceError};

pub use self::sse::SseHub;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Capacity of each session's SSE broadcast channel.
const SESSION_EVENTS_CAPACITY: usize = 32;

/// Everything attached to one live quiz session.
pub struct SessionHandle {
    quiz_id: Uuid,
    engine: Mutex<SessionEngine>,
    events: SseHub,
    clock_task: std::sync::Mutex<Option<JoinHandle<()>>>,
    // Set under the engine lock once the quiz is deleted.
    closed: AtomicBool,
}

impl SessionHandle {
    /// Wrap an engine so it can be shared between requests and the clock task.
    pub fn new(engine: SessionEngine) -> Self {
        Self {
            quiz_id: engine.quiz_id(),
            engine: Mutex::new(engine),
            events: SseHub::new(SESSION_EVENTS_CAPACITY),
            clock_task: std::sync::Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Quiz played in this session.
    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    /// The engine, behind the per-session single-writer lock.
    pub fn engine(&self) -> &Mutex<SessionEngine> {
        &self.engine
    }

    /// Broadcast hub for this session's SSE stream.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Retire the session. Callers must hold the engine lock so no command
    /// or tick observes a half-deleted quiz.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.stop_clock();
    }

    /// Whether the session was retired; its engine must no longer be used.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Remember the clock task so it can be stopped with the session.
    pub fn attach_clock(&self, task: JoinHandle<()>) {
        let mut slot = self
            .clock_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    /// Stop the clock task, if any.
    pub fn stop_clock(&self) {
        let mut slot = self
            .clock_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop_clock();
    }
}

/// Central application state: storage handle, live sessions and config.
pub struct AppState {
    quiz_store: RwLock<Option<Arc<dyn QuizStore>>>,
    sessions: DashMap<Uuid, Arc<SessionHandle>>,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            quiz_store: RwLock::new(None),
            sessions: DashMap::new(),
            config,
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current quiz store, if one is installed.
    pub async fn quiz_store(&self) -> Option<Arc<dyn QuizStore>> {
        let guard = self.quiz_store.read().await;
        guard.as_ref().cloned()
    }

    /// Quiz store, or [`ServiceError::Degraded`] when none is usable.
    pub async fn require_quiz_store(&self) -> Result<Arc<dyn QuizStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.quiz_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new quiz store implementation and leave degraded mode.
    pub async fn set_quiz_store(&self, store: Arc<dyn QuizStore>) {
        {
            let mut guard = self.quiz_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current quiz store and enter degraded mode.
    pub async fn clear_quiz_store(&self) -> Option<Arc<dyn QuizStore>> {
        let previous = {
            let mut guard = self.quiz_store.write().await;
            guard.take()
        };
        self.update_degraded(true);
        previous
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Registry of live sessions keyed by quiz id.
    pub fn sessions(&self) -> &DashMap<Uuid, Arc<SessionHandle>> {
        &self.sessions
    }

    /// Live session for `quiz_id`, if one is open.
    pub fn session(&self, quiz_id: Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.get(&quiz_id).map(|entry| entry.value().clone())
    }

    /// Drop a live session and stop its clock.
    pub fn remove_session(&self, quiz_id: Uuid) -> Option<Arc<SessionHandle>> {
        let (_, handle) = self.sessions.remove(&quiz_id)?;
        handle.stop_clock();
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::quiz_store::memory::MemoryQuizStore;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_quiz_store().await,
            Err(ServiceError::Degraded)
        ));

        state.set_quiz_store(Arc::new(MemoryQuizStore::new())).await;
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
        assert!(state.require_quiz_store().await.is_ok());

        state.clear_quiz_store().await;
        assert!(state.is_degraded());
    }

    #[test]
    fn unchanged_degraded_flag_does_not_notify() {
        let state = AppState::new(AppConfig::default());
        let watcher = state.degraded_watcher();
        state.update_degraded(true);
        assert!(!watcher.has_changed().unwrap());
    }
}
