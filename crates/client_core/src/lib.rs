//! Client-side orchestration of the resume screening workflow: session gate,
//! screening configuration, job-description upload, screening runs and the
//! cached results snapshot.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::{sync::broadcast, task::JoinHandle};
use tracing::debug;

pub mod error;
mod orchestrator;
mod results;
mod screening_config;
mod selection;
mod session;
pub mod state;
pub mod transport;
pub mod upload;

pub use error::{
    classify, ClassifiedError, ErrorKind, OperationError, SideEffect, TransportError,
    ValidationError,
};
pub use orchestrator::{
    ClearConfirmation, ClearOutcome, CLEAR_PROMPT, RESULTS_REFRESHED_SUFFIX,
    SCREENING_REDIRECTING, SCREENING_STARTING,
};
pub use screening_config::{CONFIG_SAVED, CONFIG_SAVING, JOB_DESCRIPTION_AVAILABLE};
pub use session::{LOGOUT_COMPLETED, LOGOUT_SUCCEEDED};
pub use state::{
    AppState, BusyFlag, BusyFlags, EmailSubjects, ResultsSnapshot, ResultsSummary, RunState,
    ScreeningConfig, Session, UploadStatus,
};
pub use transport::{HttpBackend, ScreeningBackend};
pub use upload::{ArtifactSource, UploadArtifact, REQUIRED_EXTENSION};

use state::NoticeSlot;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub upload_timeout: Duration,
    pub run_timeout: Duration,
    pub refresh_delay: Duration,
    pub redirect_delay: Duration,
    pub logout_notice: Duration,
    pub config_notice: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            upload_timeout: Duration::from_secs(30),
            run_timeout: Duration::from_secs(120),
            refresh_delay: Duration::from_secs(2),
            redirect_delay: Duration::from_secs(2),
            logout_notice: Duration::from_secs(3),
            config_notice: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub timings: Timings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    SessionChanged { authenticated: bool },
    ConfigChanged,
    ResultsReplaced { count: usize },
    NavigateToLogin { url: String },
}

pub struct ScreeningClient {
    backend: Arc<dyn ScreeningBackend>,
    options: ClientOptions,
    state: Mutex<AppState>,
    pending_refresh: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<ClientEvent>,
}

impl ScreeningClient {
    pub fn new(backend: Arc<dyn ScreeningBackend>, options: ClientOptions) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            backend,
            options,
            state: Mutex::new(AppState::default()),
            pending_refresh: Mutex::new(None),
            events,
        })
    }

    pub fn connect(server_url: &str, options: ClientOptions) -> Result<Arc<Self>, url::ParseError> {
        let backend = HttpBackend::new(server_url)?;
        Ok(Self::new(Arc::new(backend), options))
    }

    pub fn state(&self) -> AppState {
        self.lock_state().clone()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn login_url(&self) -> String {
        self.backend.login_url()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut guard = self.lock_state();
        f(&mut guard)
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.lock_state().epoch
    }

    /// Runs `f` only if no logout happened since `epoch` was captured.
    pub(crate) fn apply_if_current(&self, epoch: u64, f: impl FnOnce(&mut AppState)) -> bool {
        self.with_state(|state| {
            if state.epoch != epoch {
                debug!(
                    captured = epoch,
                    current = state.epoch,
                    "discarding result from previous session"
                );
                return false;
            }
            f(state);
            true
        })
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn enter(&self, flag: BusyFlag) -> BusyGuard<'_> {
        let epoch = self.with_state(|state| {
            state.mark_busy(flag);
            state.epoch
        });
        BusyGuard::new(self, flag, Some(epoch))
    }

    pub(crate) fn apply_side_effect(state: &mut AppState, classified: &ClassifiedError) -> bool {
        match classified.side_effect {
            SideEffect::ForceUnauthenticated => {
                state.session.authenticated = false;
                true
            }
            SideEffect::None => false,
        }
    }

    pub(crate) fn arm_notice_expiry(self: &Arc<Self>, slot: NoticeSlot, generation: u64, after: Duration) {
        let client: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(client) = client.upgrade() {
                client.with_state(|state| state.expire_notice(slot, generation));
            }
        });
    }

    pub(crate) fn track_refresh(&self, handle: JoinHandle<()>) {
        let mut pending = self
            .pending_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // A refresh still waiting from an earlier run keeps going on its own.
        *pending = Some(handle);
    }

    pub(crate) fn abort_pending_refresh(&self) {
        let handle = self
            .pending_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Releases a busy flag on drop. An epoch-bound guard leaves the flag alone
/// once a logout has started a new session.
pub(crate) struct BusyGuard<'a> {
    client: &'a ScreeningClient,
    flag: BusyFlag,
    epoch: Option<u64>,
}

impl<'a> BusyGuard<'a> {
    pub(crate) fn new(client: &'a ScreeningClient, flag: BusyFlag, epoch: Option<u64>) -> Self {
        Self {
            client,
            flag,
            epoch,
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let flag = self.flag;
        let epoch = self.epoch;
        self.client.with_state(|state| {
            if epoch.map_or(true, |epoch| epoch == state.epoch) {
                state.release(flag);
            }
        });
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
