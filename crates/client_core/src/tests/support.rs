//! Scripted in-memory backend shared by the controller tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::CandidateRecord,
    error::ErrorBody,
    protocol::{
        AuthStatusResponse, MessageResponse, ResultsResponse, ScreeningConfigResponse,
        SetScreeningConfigRequest, SetScreeningConfigResponse,
    },
};

use crate::{
    error::TransportError, transport::ScreeningBackend, upload::UploadArtifact, ClientEvent,
    ClientOptions, ScreeningClient,
};

pub(crate) const LOGIN_URL: &str = "http://backend.test/api/login";

/// Outcomes for one endpoint: queued ones first, then the fallback.
pub(crate) struct Script<T> {
    queue: Mutex<VecDeque<Result<T, TransportError>>>,
    fallback: Mutex<Option<Result<T, TransportError>>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T: Clone + Send> Script<T> {
    pub(crate) fn push(&self, outcome: Result<T, TransportError>) {
        self.queue.lock().expect("queue").push_back(outcome);
    }

    pub(crate) fn always(&self, outcome: Result<T, TransportError>) {
        *self.fallback.lock().expect("fallback") = Some(outcome);
    }

    pub(crate) fn delay(&self, delay: Duration) {
        *self.delay.lock().expect("delay") = Some(delay);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self) -> Result<T, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().expect("delay");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self.queue.lock().expect("queue").pop_front();
        if let Some(outcome) = queued {
            return outcome;
        }
        self.fallback
            .lock()
            .expect("fallback")
            .clone()
            .unwrap_or_else(|| {
                Err(TransportError::NoResponse {
                    message: "unscripted call".into(),
                })
            })
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub auth: Script<AuthStatusResponse>,
    pub config: Script<ScreeningConfigResponse>,
    pub save: Script<SetScreeningConfigResponse>,
    pub results: Script<ResultsResponse>,
    pub upload: Script<MessageResponse>,
    pub run: Script<MessageResponse>,
    pub clear: Script<MessageResponse>,
    pub logout: Script<()>,
    pub health: Script<()>,
    pub saved_requests: Mutex<Vec<SetScreeningConfigRequest>>,
    pub uploaded_files: Mutex<Vec<String>>,
    pub call_log: Mutex<Vec<&'static str>>,
}

impl FakeBackend {
    /// Signed in, no persisted configuration yet, empty results.
    pub(crate) fn signed_in() -> Arc<Self> {
        let backend = Self::default();
        backend.auth.always(Ok(AuthStatusResponse {
            authenticated: true,
        }));
        backend.config.always(Err(status_error(404, None)));
        backend.results.always(Ok(Self::results_of(Vec::new())));
        backend.logout.always(Ok(()));
        backend.health.always(Ok(()));
        Arc::new(backend)
    }

    pub(crate) fn signed_out() -> Arc<Self> {
        let backend = Self::signed_in();
        backend.auth.always(Ok(AuthStatusResponse {
            authenticated: false,
        }));
        backend
    }

    /// Signed in with a saved configuration and an uploaded job description.
    pub(crate) fn ready_to_run() -> Arc<Self> {
        let backend = Self::signed_in();
        backend.config.always(Ok(ScreeningConfigResponse {
            job_position: "UI/UX Designer".into(),
            email_subjects: vec!["cv-ui/ux".into()],
            spreadsheet_name: "Analisis Resume AI - UI/UX Designer".into(),
            spreadsheet_url: None,
            has_job_description: true,
        }));
        backend
    }

    pub(crate) fn results_of(records: Vec<CandidateRecord>) -> ResultsResponse {
        ResultsResponse {
            results: records,
            spreadsheet_name: "Analisis Resume AI".into(),
        }
    }

    pub(crate) fn calls_in_order(&self) -> Vec<&'static str> {
        self.call_log.lock().expect("call log").clone()
    }

    fn log(&self, call: &'static str) {
        self.call_log.lock().expect("call log").push(call);
    }
}

#[async_trait]
impl ScreeningBackend for FakeBackend {
    async fn auth_status(&self) -> Result<AuthStatusResponse, TransportError> {
        self.log("auth_status");
        self.auth.next().await
    }

    async fn screening_config(&self) -> Result<ScreeningConfigResponse, TransportError> {
        self.log("screening_config");
        self.config.next().await
    }

    async fn set_screening_config(
        &self,
        request: &SetScreeningConfigRequest,
    ) -> Result<SetScreeningConfigResponse, TransportError> {
        self.log("set_screening_config");
        self.saved_requests
            .lock()
            .expect("saved requests")
            .push(request.clone());
        self.save.next().await
    }

    async fn results(&self) -> Result<ResultsResponse, TransportError> {
        self.log("results");
        self.results.next().await
    }

    async fn upload_job_description(
        &self,
        artifact: &UploadArtifact,
    ) -> Result<MessageResponse, TransportError> {
        self.log("upload_job_description");
        self.uploaded_files
            .lock()
            .expect("uploaded files")
            .push(artifact.name().to_string());
        self.upload.next().await
    }

    async fn start_screening(&self) -> Result<MessageResponse, TransportError> {
        self.log("start_screening");
        self.run.next().await
    }

    async fn clear_results(&self) -> Result<MessageResponse, TransportError> {
        self.log("clear_results");
        self.clear.next().await
    }

    async fn logout(&self) -> Result<(), TransportError> {
        self.log("logout");
        self.logout.next().await
    }

    async fn health(&self) -> Result<(), TransportError> {
        self.log("health");
        self.health.next().await
    }

    fn login_url(&self) -> String {
        LOGIN_URL.to_string()
    }
}

pub(crate) fn client_with(backend: &Arc<FakeBackend>) -> Arc<ScreeningClient> {
    let backend: Arc<dyn ScreeningBackend> = backend.clone();
    ScreeningClient::new(backend, ClientOptions::default())
}

pub(crate) fn record(name: &str, overall_fit: u8) -> CandidateRecord {
    CandidateRecord {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        overall_fit,
        timestamp: "2024-05-01 09:30:15".into(),
        ..CandidateRecord::default()
    }
}

pub(crate) fn message(text: &str) -> MessageResponse {
    MessageResponse {
        message: text.to_string(),
    }
}

pub(crate) fn status_error(status: u16, body: Option<ErrorBody>) -> TransportError {
    TransportError::status(status, body)
}

pub(crate) fn detail(text: &str) -> Option<ErrorBody> {
    Some(ErrorBody {
        detail: Some(serde_json::Value::String(text.to_string())),
        failure_reason: None,
    })
}

pub(crate) fn pdf(name: &str) -> UploadArtifact {
    UploadArtifact::new(name, b"%PDF-1.4 job description".to_vec())
}

pub(crate) fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
