use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder,
};
use serde::de::DeserializeOwned;
use shared::{
    error::ErrorBody,
    protocol::{
        paths, AuthStatusResponse, MessageResponse, ResultsResponse, ScreeningConfigResponse,
        SetScreeningConfigRequest, SetScreeningConfigResponse, StartScreeningRequest,
        UPLOAD_FIELD,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{error::TransportError, upload::UploadArtifact};

const PDF_MIME: &str = "application/pdf";

#[async_trait]
pub trait ScreeningBackend: Send + Sync {
    async fn auth_status(&self) -> Result<AuthStatusResponse, TransportError>;
    async fn screening_config(&self) -> Result<ScreeningConfigResponse, TransportError>;
    async fn set_screening_config(
        &self,
        request: &SetScreeningConfigRequest,
    ) -> Result<SetScreeningConfigResponse, TransportError>;
    async fn results(&self) -> Result<ResultsResponse, TransportError>;
    async fn upload_job_description(
        &self,
        artifact: &UploadArtifact,
    ) -> Result<MessageResponse, TransportError>;
    async fn start_screening(&self) -> Result<MessageResponse, TransportError>;
    async fn clear_results(&self) -> Result<MessageResponse, TransportError>;
    async fn logout(&self) -> Result<(), TransportError>;
    async fn health(&self) -> Result<(), TransportError>;
    /// Navigation target that starts the remote sign-in flow.
    fn login_url(&self) -> String;
}

pub struct HttpBackend {
    http: Client,
    server_url: String,
}

impl HttpBackend {
    pub fn new(server_url: &str) -> Result<Self, url::ParseError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(server_url.trim())?;
        Ok(Self {
            http,
            server_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, TransportError> {
        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "screening api request failed");
            TransportError::from(err)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let raw = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&raw).ok();
        warn!(status = status.as_u16(), path = %url, "screening api returned error status");
        Err(TransportError::status(status.as_u16(), body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| TransportError::Local {
                message: format!("failed to decode response body: {err}"),
            })
    }
}

#[async_trait]
impl ScreeningBackend for HttpBackend {
    async fn auth_status(&self) -> Result<AuthStatusResponse, TransportError> {
        self.send_json(self.http.get(self.endpoint(paths::AUTH_STATUS)))
            .await
    }

    async fn screening_config(&self) -> Result<ScreeningConfigResponse, TransportError> {
        self.send_json(self.http.get(self.endpoint(paths::GET_SCREENING_CONFIG)))
            .await
    }

    async fn set_screening_config(
        &self,
        request: &SetScreeningConfigRequest,
    ) -> Result<SetScreeningConfigResponse, TransportError> {
        self.send_json(
            self.http
                .post(self.endpoint(paths::SET_SCREENING_CONFIG))
                .json(request),
        )
        .await
    }

    async fn results(&self) -> Result<ResultsResponse, TransportError> {
        self.send_json(self.http.get(self.endpoint(paths::GET_RESULTS)))
            .await
    }

    async fn upload_job_description(
        &self,
        artifact: &UploadArtifact,
    ) -> Result<MessageResponse, TransportError> {
        let part = Part::bytes(artifact.contents().to_vec())
            .file_name(artifact.name().to_string())
            .mime_str(PDF_MIME)
            .map_err(|err| TransportError::Local {
                message: format!("failed to build multipart body: {err}"),
            })?;
        let form = Form::new().part(UPLOAD_FIELD, part);
        debug!(
            file = artifact.name(),
            size_bytes = artifact.size_bytes(),
            "uploading job description"
        );
        self.send_json(
            self.http
                .post(self.endpoint(paths::UPLOAD_JOB_DESCRIPTION))
                .multipart(form),
        )
        .await
    }

    async fn start_screening(&self) -> Result<MessageResponse, TransportError> {
        self.send_json(
            self.http
                .post(self.endpoint(paths::START_SCREENING))
                .json(&StartScreeningRequest::default()),
        )
        .await
    }

    async fn clear_results(&self) -> Result<MessageResponse, TransportError> {
        self.send_json(self.http.delete(self.endpoint(paths::CLEAR_RESULTS)))
            .await
    }

    async fn logout(&self) -> Result<(), TransportError> {
        self.send(self.http.post(self.endpoint(paths::LOGOUT)))
            .await
            .map(|_| ())
    }

    async fn health(&self) -> Result<(), TransportError> {
        self.send(self.http.get(self.endpoint(paths::HEALTH)))
            .await
            .map(|_| ())
    }

    fn login_url(&self) -> String {
        self.endpoint(paths::LOGIN)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
