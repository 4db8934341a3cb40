use std::path::Path;

use tracing::{info, warn};

use crate::{
    error::{classify, OperationError, TransportError, ValidationError},
    state::{BusyFlag, UploadStatus},
    BusyGuard, ClientEvent, ScreeningClient,
};

pub const REQUIRED_EXTENSION: &str = ".pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    Picker,
    DragDrop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadArtifact {
    name: String,
    size_bytes: u64,
    contents: Vec<u8>,
    extension_validated: bool,
}

impl UploadArtifact {
    pub fn new(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: contents.len() as u64,
            contents,
            extension_validated: false,
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let contents = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, contents))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn extension_validated(&self) -> bool {
        self.extension_validated
    }

    pub fn has_required_extension(&self) -> bool {
        self.name.to_lowercase().ends_with(REQUIRED_EXTENSION)
    }
}

impl ScreeningClient {
    /// A file without the PDF extension is discarded along with any earlier
    /// selection and reported on the page error channel.
    pub fn select_artifact(
        &self,
        source: ArtifactSource,
        mut artifact: UploadArtifact,
    ) -> Result<(), ValidationError> {
        if !artifact.has_required_extension() {
            let err = ValidationError::InvalidArtifactType {
                name: artifact.name.clone(),
            };
            warn!(?source, file = %artifact.name, "rejected job description selection");
            self.with_state(|state| {
                state.artifact = None;
                state.upload_status = UploadStatus::Idle;
                state.page_error = Some(err.to_string());
            });
            return Err(err);
        }

        artifact.extension_validated = true;
        info!(?source, file = %artifact.name, size_bytes = artifact.size_bytes, "job description selected");
        self.with_state(|state| {
            state.artifact = Some(artifact);
            state.upload_status = UploadStatus::Idle;
            state.page_error = None;
        });
        Ok(())
    }

    pub async fn upload_job_description(&self) -> Result<String, OperationError> {
        let (artifact, epoch) = self.with_state(|state| {
            let artifact = state.artifact.clone().ok_or(ValidationError::NoArtifact)?;
            if !state.config.saved {
                return Err(ValidationError::ConfigNotSaved);
            }
            if state.is_busy(BusyFlag::Uploading) {
                return Err(ValidationError::UploadInProgress);
            }
            state.mark_busy(BusyFlag::Uploading);
            state.page_error = None;
            Ok((artifact, state.epoch))
        })?;
        let _uploading = BusyGuard::new(self, BusyFlag::Uploading, Some(epoch));

        let timeout = self.options.timings.upload_timeout;
        let outcome = tokio::time::timeout(timeout, self.backend.upload_job_description(&artifact))
            .await
            .unwrap_or_else(|_| Err(TransportError::timed_out(timeout)));

        match outcome {
            Ok(response) => {
                info!(file = artifact.name(), "job description uploaded");
                self.apply_if_current(epoch, |state| {
                    state.upload_status = UploadStatus::Succeeded(response.message.clone());
                });
                Ok(response.message)
            }
            Err(err) => {
                let classified = classify(&err, "Failed to upload file");
                warn!(error = %err, kind = ?classified.kind, "job description upload failed");
                let mut signed_out = false;
                self.apply_if_current(epoch, |state| {
                    signed_out = Self::apply_side_effect(state, &classified);
                    state.upload_status = UploadStatus::Failed(classified.message.clone());
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
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
