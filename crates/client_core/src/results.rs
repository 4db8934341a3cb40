use tracing::{debug, info, warn};

use crate::{error::classify, state::ResultsSnapshot, ClientEvent, ScreeningClient};

impl ScreeningClient {
    pub async fn load_results(&self) {
        let epoch = self.epoch();
        self.load_results_in(epoch).await;
    }

    /// Loads results on behalf of work started in session `epoch`; the
    /// response is dropped if a logout happened in between.
    pub(crate) async fn load_results_in(&self, epoch: u64) {
        let proceed = self.with_state(|state| {
            if state.epoch != epoch || !state.session.authenticated {
                return false;
            }
            state.page_error = None;
            true
        });
        if !proceed {
            debug!("skipping results load without an authenticated session");
            return;
        }

        match self.backend.results().await {
            Ok(response) => {
                let count = response.results.len();
                if self.apply_if_current(epoch, |state| state.adopt_results(response)) {
                    info!(count, "results snapshot replaced");
                    self.emit(ClientEvent::ResultsReplaced { count });
                }
            }
            Err(err) => {
                let classified = classify(&err, "Failed to fetch results");
                warn!(error = %err, kind = ?classified.kind, "results load failed");
                let mut signed_out = false;
                self.apply_if_current(epoch, |state| {
                    if classified.is_unauthorized() {
                        signed_out = Self::apply_side_effect(state, &classified);
                        state.results = ResultsSnapshot::default();
                    } else {
                        // Keep the last good snapshot on transient faults.
                        state.page_error = Some(classified.message.clone());
                    }
                });
                if signed_out {
                    self.emit(ClientEvent::SessionChanged {
                        authenticated: false,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/results_tests.rs"]
mod tests;
