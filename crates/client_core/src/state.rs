use std::sync::Arc;

use shared::{
    domain::{CandidateRecord, FitBand},
    protocol::{
        ResultsResponse, ScreeningConfigResponse, SetScreeningConfigRequest,
        SetScreeningConfigResponse,
    },
};

use crate::{error::ValidationError, upload::UploadArtifact};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
}

/// Never empty; every edit returns a new list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSubjects(Arc<[String]>);

impl Default for EmailSubjects {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl EmailSubjects {
    pub fn placeholder() -> Self {
        Self(Arc::from(vec![String::new()]))
    }

    pub fn from_loaded(subjects: Vec<String>) -> Self {
        if subjects.is_empty() {
            Self::placeholder()
        } else {
            Self(Arc::from(subjects))
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn with_added(&self) -> Self {
        let mut next = self.0.to_vec();
        next.push(String::new());
        Self(Arc::from(next))
    }

    pub fn without(&self, index: usize) -> Option<Self> {
        if self.0.len() <= 1 || index >= self.0.len() {
            return None;
        }
        let next: Vec<String> = self
            .0
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, subject)| subject.clone())
            .collect();
        Some(Self(Arc::from(next)))
    }

    pub fn with_updated(&self, index: usize, value: impl Into<String>) -> Option<Self> {
        if index >= self.0.len() {
            return None;
        }
        let mut next = self.0.to_vec();
        next[index] = value.into();
        Some(Self(Arc::from(next)))
    }

    pub fn persistable(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|subject| subject.trim())
            .filter(|subject| !subject.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreeningConfig {
    pub job_position: String,
    pub email_subjects: EmailSubjects,
    pub spreadsheet_name: String,
    pub spreadsheet_url: String,
    pub saved: bool,
}

impl ScreeningConfig {
    pub fn to_request(&self) -> Result<SetScreeningConfigRequest, ValidationError> {
        let job_position = self.job_position.trim();
        if job_position.is_empty() {
            return Err(ValidationError::EmptyJobPosition);
        }
        let email_subjects = self.email_subjects.persistable();
        if email_subjects.is_empty() {
            return Err(ValidationError::NoEmailSubjects);
        }
        Ok(SetScreeningConfigRequest {
            job_position: job_position.to_string(),
            email_subjects,
        })
    }

    pub(crate) fn adopt_loaded(&mut self, loaded: ScreeningConfigResponse) {
        self.saved = !loaded.job_position.is_empty() && !loaded.email_subjects.is_empty();
        self.job_position = loaded.job_position;
        self.email_subjects = EmailSubjects::from_loaded(loaded.email_subjects);
        self.spreadsheet_name = loaded.spreadsheet_name;
        self.spreadsheet_url = loaded.spreadsheet_url.unwrap_or_default();
    }

    pub(crate) fn adopt_saved(&mut self, saved: SetScreeningConfigResponse) {
        self.saved = true;
        self.spreadsheet_name = saved.spreadsheet_name;
        self.spreadsheet_url = saved.spreadsheet_url;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Succeeded(String),
    Failed(String),
}

impl UploadStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Succeeded(message) | Self::Failed(message) => Some(message),
            Self::Idle | Self::Uploading => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsSnapshot {
    pub records: Vec<CandidateRecord>,
    pub spreadsheet_name: String,
}

impl From<ResultsResponse> for ResultsSnapshot {
    fn from(response: ResultsResponse) -> Self {
        Self {
            records: response.results,
            spreadsheet_name: response.spreadsheet_name,
        }
    }
}

impl ResultsSnapshot {
    pub fn summary(&self) -> ResultsSummary {
        ResultsSummary::from_records(&self.records)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultsSummary {
    pub count: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub average_fit: u32,
}

impl ResultsSummary {
    pub fn from_records(records: &[CandidateRecord]) -> Self {
        let mut summary = Self {
            count: records.len(),
            ..Self::default()
        };
        if records.is_empty() {
            return summary;
        }

        let mut total: u64 = 0;
        for record in records {
            total += u64::from(record.overall_fit);
            match record.fit_band() {
                FitBand::Low => summary.low += 1,
                FitBand::Medium => summary.medium += 1,
                FitBand::High => summary.high += 1,
            }
        }
        summary.average_fit = (total as f64 / records.len() as f64).round() as u32;
        summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusyFlag {
    CheckingAuth,
    SavingConfig,
    Uploading,
    Running,
    Clearing,
    LoggingOut,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusyFlags {
    pub checking_auth: bool,
    pub saving_config: bool,
    pub clearing: bool,
    pub logging_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoticeSlot {
    Config,
    Screening,
}

/// Write counters for the transient text channels. An expiry timer only clears
/// its channel if nothing was written there after it was armed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NoticeGenerations {
    config: u64,
    screening: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub session: Session,
    pub epoch: u64,
    pub config: ScreeningConfig,
    pub artifact: Option<UploadArtifact>,
    pub upload_status: UploadStatus,
    pub run_state: RunState,
    pub results: ResultsSnapshot,
    pub focused: Option<CandidateRecord>,
    pub page_error: Option<String>,
    pub config_status: Option<String>,
    pub screening_status: Option<String>,
    pub busy: BusyFlags,
    pub(crate) notices: NoticeGenerations,
}

impl AppState {
    pub fn is_busy(&self, flag: BusyFlag) -> bool {
        match flag {
            BusyFlag::CheckingAuth => self.busy.checking_auth,
            BusyFlag::SavingConfig => self.busy.saving_config,
            BusyFlag::Uploading => self.upload_status == UploadStatus::Uploading,
            BusyFlag::Running => self.run_state == RunState::Running,
            BusyFlag::Clearing => self.busy.clearing,
            BusyFlag::LoggingOut => self.busy.logging_out,
        }
    }

    pub fn spreadsheet_name(&self) -> &str {
        if self.results.spreadsheet_name.is_empty() {
            &self.config.spreadsheet_name
        } else {
            &self.results.spreadsheet_name
        }
    }

    pub fn summary(&self) -> ResultsSummary {
        self.results.summary()
    }

    pub(crate) fn mark_busy(&mut self, flag: BusyFlag) {
        match flag {
            BusyFlag::CheckingAuth => self.busy.checking_auth = true,
            BusyFlag::SavingConfig => self.busy.saving_config = true,
            BusyFlag::Uploading => self.upload_status = UploadStatus::Uploading,
            BusyFlag::Running => self.run_state = RunState::Running,
            BusyFlag::Clearing => self.busy.clearing = true,
            BusyFlag::LoggingOut => self.busy.logging_out = true,
        }
    }

    pub(crate) fn release(&mut self, flag: BusyFlag) {
        match flag {
            BusyFlag::CheckingAuth => self.busy.checking_auth = false,
            BusyFlag::SavingConfig => self.busy.saving_config = false,
            BusyFlag::Uploading => {
                if self.upload_status == UploadStatus::Uploading {
                    self.upload_status = UploadStatus::Idle;
                }
            }
            BusyFlag::Running => self.run_state = RunState::Idle,
            BusyFlag::Clearing => self.busy.clearing = false,
            BusyFlag::LoggingOut => self.busy.logging_out = false,
        }
    }

    pub(crate) fn set_notice(&mut self, slot: NoticeSlot, text: impl Into<String>) -> u64 {
        let text = Some(text.into());
        match slot {
            NoticeSlot::Config => {
                self.notices.config += 1;
                self.config_status = text;
                self.notices.config
            }
            NoticeSlot::Screening => {
                self.notices.screening += 1;
                self.screening_status = text;
                self.notices.screening
            }
        }
    }

    pub(crate) fn append_screening_status(&mut self, suffix: &str) {
        let text = match self.screening_status.take() {
            Some(current) => format!("{current}{suffix}"),
            None => suffix.trim_start().to_string(),
        };
        self.set_notice(NoticeSlot::Screening, text);
    }

    pub(crate) fn expire_notice(&mut self, slot: NoticeSlot, generation: u64) -> bool {
        let (current, text) = match slot {
            NoticeSlot::Config => (self.notices.config, &mut self.config_status),
            NoticeSlot::Screening => (self.notices.screening, &mut self.screening_status),
        };
        if current != generation {
            return false;
        }
        *text = None;
        true
    }

    pub(crate) fn adopt_results(&mut self, response: ResultsResponse) {
        self.results = ResultsSnapshot::from(response);
    }

    // Notice counters keep counting so earlier timers stay void; `logging_out`
    // belongs to the logout doing the reset.
    pub(crate) fn reset(&mut self) {
        let epoch = self.epoch + 1;
        let mut notices = self.notices;
        notices.config += 1;
        notices.screening += 1;
        let logging_out = self.busy.logging_out;

        *self = Self {
            epoch,
            notices,
            busy: BusyFlags {
                logging_out,
                ..BusyFlags::default()
            },
            ..Self::default()
        };
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
