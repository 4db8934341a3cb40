use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::CandidateRecord;

pub mod paths {
    pub const AUTH_STATUS: &str = "/api/auth-status";
    pub const GET_SCREENING_CONFIG: &str = "/api/get-screening-config";
    pub const SET_SCREENING_CONFIG: &str = "/api/set-screening-config";
    pub const GET_RESULTS: &str = "/api/get-results";
    pub const UPLOAD_JOB_DESCRIPTION: &str = "/api/upload-job-description";
    pub const START_SCREENING: &str = "/api/start-screening";
    pub const CLEAR_RESULTS: &str = "/api/clear-results";
    pub const LOGOUT: &str = "/api/logout";
    pub const LOGIN: &str = "/api/login";
    pub const HEALTH: &str = "/api/health";
}

/// Multipart field name the upload endpoint reads the file from.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub authenticated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningConfigResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub job_position: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email_subjects: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub spreadsheet_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub has_job_description: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScreeningConfigRequest {
    pub job_position: String,
    pub email_subjects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScreeningConfigResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub spreadsheet_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub spreadsheet_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub results: Vec<CandidateRecord>,
    #[serde(default, deserialize_with = "nullable")]
    pub spreadsheet_name: String,
}

/// Shared shape of upload, start-screening and clear-results replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StartScreeningRequest {}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
