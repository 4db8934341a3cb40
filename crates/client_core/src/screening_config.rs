use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    error::{classify, OperationError},
    state::{BusyFlag, NoticeSlot, UploadStatus},
    BusyGuard, ClientEvent, ScreeningClient,
};

pub const CONFIG_SAVING: &str = "Saving configuration...";
pub const CONFIG_SAVED: &str = "Configuration saved!";
pub const JOB_DESCRIPTION_AVAILABLE: &str = "Job description already available";

impl ScreeningClient {
    /// Loads the persisted configuration into the draft. A failure here is the
    /// normal first-use state and is not reported.
    pub async fn load_config(&self) {
        let epoch = self.epoch();
        match self.backend.screening_config().await {
            Ok(loaded) => {
                let has_job_description = loaded.has_job_description;
                let applied = self.apply_if_current(epoch, |state| {
                    state.config.adopt_loaded(loaded);
                    if has_job_description {
                        state.upload_status =
                            UploadStatus::Succeeded(JOB_DESCRIPTION_AVAILABLE.to_string());
                    }
                });
                if applied {
                    debug!(has_job_description, "screening config loaded");
                    self.emit(ClientEvent::ConfigChanged);
                }
            }
            Err(err) => debug!(error = %err, "no screening config available"),
        }
    }

    pub async fn save_config(self: &Arc<Self>) -> Result<(), OperationError> {
        let (request, epoch) = self.with_state(|state| {
            let request = state.config.to_request()?;
            state.mark_busy(BusyFlag::SavingConfig);
            state.set_notice(NoticeSlot::Config, CONFIG_SAVING);
            Ok::<_, OperationError>((request, state.epoch))
        })?;
        let _saving = BusyGuard::new(self, BusyFlag::SavingConfig, Some(epoch));

        match self.backend.set_screening_config(&request).await {
            Ok(saved) => {
                info!(
                    job_position = %request.job_position,
                    subjects = request.email_subjects.len(),
                    spreadsheet = %saved.spreadsheet_name,
                    "screening config saved"
                );
                let mut generation = None;
                self.apply_if_current(epoch, |state| {
                    state.config.adopt_saved(saved);
                    generation = Some(state.set_notice(NoticeSlot::Config, CONFIG_SAVED));
                });
                if let Some(generation) = generation {
                    self.arm_notice_expiry(
                        NoticeSlot::Config,
                        generation,
                        self.options.timings.config_notice,
                    );
                    self.emit(ClientEvent::ConfigChanged);
                }
                Ok(())
            }
            Err(err) => {
                let classified = classify(&err, "Failed to save configuration");
                warn!(error = %err, kind = ?classified.kind, "saving screening config failed");
                let mut signed_out = false;
                self.apply_if_current(epoch, |state| {
                    signed_out = Self::apply_side_effect(state, &classified);
                    state.set_notice(NoticeSlot::Config, format!("Error: {}", classified.message));
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

    pub fn set_job_position(&self, value: impl Into<String>) {
        let value = value.into();
        self.with_state(|state| state.config.job_position = value);
    }

    pub fn add_subject(&self) {
        self.with_state(|state| {
            state.config.email_subjects = state.config.email_subjects.with_added();
        });
    }

    pub fn remove_subject(&self, index: usize) -> bool {
        self.with_state(|state| match state.config.email_subjects.without(index) {
            Some(next) => {
                state.config.email_subjects = next;
                true
            }
            None => false,
        })
    }

    pub fn update_subject(&self, index: usize, value: impl Into<String>) -> bool {
        let value = value.into();
        self.with_state(|state| match state.config.email_subjects.with_updated(index, value) {
            Some(next) => {
                state.config.email_subjects = next;
                true
            }
            None => false,
        })
    }
}

#[cfg(test)]
#[path = "tests/screening_config_tests.rs"]
mod tests;
