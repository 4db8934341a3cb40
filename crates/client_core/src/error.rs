use shared::error::ErrorBody;
use thiserror::Error;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again.";
pub const NOT_FOUND_MESSAGE: &str =
    "Resource not found. The spreadsheet may not have been created yet.";
pub const UNREACHABLE_MESSAGE: &str = "Cannot reach the server. Make sure it is running.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("{message}")]
    Status {
        status: u16,
        body: Option<ErrorBody>,
        message: String,
    },
    /// Nothing came back: connect failure, reset, or timeout.
    #[error("no response received: {message}")]
    NoResponse { message: String },
    #[error("{message}")]
    Local { message: String },
}

impl TransportError {
    pub fn status(status: u16, body: Option<ErrorBody>) -> Self {
        Self::Status {
            status,
            body,
            message: format!("Request failed with status code {status}"),
        }
    }

    pub fn timed_out(after: std::time::Duration) -> Self {
        Self::NoResponse {
            message: format!("timeout of {}ms exceeded", after.as_millis()),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return Self::NoResponse {
                message: err.to_string(),
            };
        }
        if let Some(status) = err.status() {
            return Self::status(status.as_u16(), None);
        }
        Self::Local {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    ServerFault,
    OtherStatus,
    NoResponse,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    None,
    ForceUnauthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub side_effect: SideEffect,
}

impl ClassifiedError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let side_effect = if kind == ErrorKind::Unauthorized {
            SideEffect::ForceUnauthenticated
        } else {
            SideEffect::None
        };
        Self {
            kind,
            message: message.into(),
            side_effect,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

pub fn classify(outcome: &TransportError, default_message: &str) -> ClassifiedError {
    match outcome {
        TransportError::Status {
            status,
            body,
            message,
        } => match *status {
            401 => ClassifiedError::new(ErrorKind::Unauthorized, SESSION_EXPIRED_MESSAGE),
            404 => ClassifiedError::new(ErrorKind::NotFound, NOT_FOUND_MESSAGE),
            500..=u16::MAX => {
                let reason = body
                    .as_ref()
                    .and_then(|body| body.failure_reason_text().or_else(|| body.detail_text()))
                    .unwrap_or_else(|| message.clone());
                ClassifiedError::new(ErrorKind::ServerFault, format!("Server error: {reason}"))
            }
            other => {
                let detail = body
                    .as_ref()
                    .and_then(|body| body.detail_text().or_else(|| body.failure_reason_text()))
                    .unwrap_or_else(|| message.clone());
                ClassifiedError::new(ErrorKind::OtherStatus, format!("Error {other}: {detail}"))
            }
        },
        TransportError::NoResponse { .. } => {
            ClassifiedError::new(ErrorKind::NoResponse, UNREACHABLE_MESSAGE)
        }
        TransportError::Local { .. } => ClassifiedError::new(ErrorKind::Unknown, default_message),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("job position must not be empty")]
    EmptyJobPosition,
    #[error("at least one email subject must be filled in")]
    NoEmailSubjects,
    #[error("select a PDF file first")]
    NoArtifact,
    #[error("file '{name}' must be a PDF")]
    InvalidArtifactType { name: String },
    #[error("save the screening configuration first")]
    ConfigNotSaved,
    #[error("upload the job description first")]
    JobDescriptionMissing,
    #[error("an upload is already in progress")]
    UploadInProgress,
    #[error("a screening run is already in progress")]
    RunInProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] ClassifiedError),
}

impl OperationError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Validation(_) => None,
            Self::Transport(err) => Some(err.kind),
        }
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
