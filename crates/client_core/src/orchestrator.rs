use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::{classify, OperationError, TransportError, ValidationError},
    state::{BusyFlag, NoticeSlot},
    BusyGuard, ClientEvent, ScreeningClient,
};

pub const SCREENING_STARTING: &str = "Starting screening...";
pub const SCREENING_REDIRECTING: &str = "Session expired, redirecting to login...";
pub const RESULTS_REFRESHED_SUFFIX: &str = " Results refreshed!";
pub const CLEAR_PROMPT: &str = "Delete all screening results? This cannot be undone.";

pub trait ClearConfirmation: Send + Sync {
    fn confirm_clear(&self, prompt: &str) -> bool;
}

impl<F> ClearConfirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm_clear(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    Cancelled,
    Cleared { message: String },
}

impl ScreeningClient {
    pub async fn start_screening(self: &Arc<Self>) -> Result<String, OperationError> {
        let epoch = self.with_state(|state| {
            if state.is_busy(BusyFlag::Running) {
                return Err(ValidationError::RunInProgress);
            }
            if !state.upload_status.is_success() {
                return Err(ValidationError::JobDescriptionMissing);
            }
            if !state.config.saved {
                return Err(ValidationError::ConfigNotSaved);
            }
            state.mark_busy(BusyFlag::Running);
            state.page_error = None;
            state.set_notice(NoticeSlot::Screening, SCREENING_STARTING);
            Ok(state.epoch)
        })?;
        let _running = BusyGuard::new(self, BusyFlag::Running, Some(epoch));
        info!("screening run started");

        let timeout = self.options.timings.run_timeout;
        let outcome = tokio::time::timeout(timeout, self.backend.start_screening())
            .await
            .unwrap_or_else(|_| Err(TransportError::timed_out(timeout)));

        match outcome {
            Ok(response) => {
                info!(message = %response.message, "screening run finished");
                if self.apply_if_current(epoch, |state| {
                    state.set_notice(NoticeSlot::Screening, response.message.clone());
                }) {
                    self.schedule_refresh(epoch);
                }
                Ok(response.message)
            }
            Err(err) => {
                let classified = classify(&err, "Screening failed");
                warn!(error = %err, kind = ?classified.kind, "screening run failed");
                if classified.is_unauthorized() {
                    let applied = self.apply_if_current(epoch, |state| {
                        Self::apply_side_effect(state, &classified);
                        state.set_notice(NoticeSlot::Screening, SCREENING_REDIRECTING);
                    });
                    if applied {
                        self.emit(ClientEvent::SessionChanged {
                            authenticated: false,
                        });
                        self.schedule_login_redirect(epoch);
                    }
                } else {
                    self.apply_if_current(epoch, |state| {
                        state.set_notice(NoticeSlot::Screening, classified.message.clone());
                    });
                }
                Err(classified.into())
            }
        }
    }

    pub async fn clear_results(
        &self,
        confirmation: &dyn ClearConfirmation,
    ) -> Result<ClearOutcome, OperationError> {
        if !confirmation.confirm_clear(CLEAR_PROMPT) {
            info!("clearing results cancelled by user");
            return Ok(ClearOutcome::Cancelled);
        }

        let _clearing = self.enter(BusyFlag::Clearing);
        let epoch = self.epoch();

        match self.backend.clear_results().await {
            Ok(response) => {
                info!(message = %response.message, "results cleared");
                if self.apply_if_current(epoch, |state| {
                    state.results.records.clear();
                    state.set_notice(NoticeSlot::Screening, response.message.clone());
                }) {
                    self.emit(ClientEvent::ResultsReplaced { count: 0 });
                }
                Ok(ClearOutcome::Cleared {
                    message: response.message,
                })
            }
            Err(err) => {
                let classified = classify(&err, "Failed to delete results");
                warn!(error = %err, kind = ?classified.kind, "clearing results failed");
                let mut signed_out = false;
                self.apply_if_current(epoch, |state| {
                    signed_out = Self::apply_side_effect(state, &classified);
                    state.page_error = Some(classified.message.clone());
                });
                if signed_out {
                    self.emit(ClientEvent::SessionChanged {
                        authenticated: false,
                    });
                }
                Err(classified.into())
            }
        }
    }

    fn schedule_refresh(self: &Arc<Self>, epoch: u64) {
        let client = Arc::clone(self);
        let delay = self.options.timings.refresh_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if client.epoch() != epoch {
                return;
            }
            client.load_results_in(epoch).await;
            client.apply_if_current(epoch, |state| {
                state.append_screening_status(RESULTS_REFRESHED_SUFFIX);
            });
        });
        self.track_refresh(handle);
    }

    fn schedule_login_redirect(self: &Arc<Self>, epoch: u64) {
        let client = Arc::clone(self);
        let delay = self.options.timings.redirect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if client.epoch() != epoch {
                return;
            }
            let url = client.login_url();
            info!(%url, "redirecting to login");
            client.emit(ClientEvent::NavigateToLogin { url });
        });
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
