//! HTTP transcription service adapter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    TranscriptionError, TranscriptionJobRequest, TranscriptionService, TranscriptionStatus,
};

// Request types

#[derive(Debug, Serialize)]
struct StartJobRequest<'a> {
    job_name: &'a str,
    media_uri: &'a str,
    media_format: &'a str,
    language_code: &'a str,
    output_location: &'a str,
}

impl<'a> From<&'a TranscriptionJobRequest> for StartJobRequest<'a> {
    fn from(req: &'a TranscriptionJobRequest) -> Self {
        Self {
            job_name: &req.job_name,
            media_uri: &req.media_uri,
            media_format: &req.media_format,
            language_code: &req.language_code,
            output_location: &req.output_location,
        }
    }
}

// Response types

#[derive(Debug, Deserialize)]
struct JobResponse {
    #[serde(default)]
    job_name: Option<String>,
    status: TranscriptionStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Client for a transcription service exposing
/// `POST {endpoint}/jobs` and `GET {endpoint}/jobs/{name}`
pub struct HttpTranscriptionService {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpTranscriptionService {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    /// Send `Authorization: Bearer <key>` with every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn jobs_url(&self) -> String {
        format!("{}/jobs", self.endpoint)
    }

    fn job_url(&self, job_name: &str) -> String {
        format!("{}/jobs/{}", self.endpoint, job_name)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Turn a non-success response into an error, preferring the
    /// service's own message
    async fn error_from(response: reqwest::Response) -> TranscriptionError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        TranscriptionError::ApiError { status, message }
    }

    async fn parse_job(response: reqwest::Response) -> Result<JobResponse, TranscriptionError> {
        response
            .json()
            .await
            .map_err(|e| TranscriptionError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl TranscriptionService for HttpTranscriptionService {
    async fn start(&self, request: &TranscriptionJobRequest) -> Result<String, TranscriptionError> {
        let response = self
            .authorize(self.client.post(self.jobs_url()))
            .json(&StartJobRequest::from(request))
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let job = Self::parse_job(response).await?;
        tracing::debug!(job_name = ?job.job_name, status = %job.status, "Transcription job created");
        Ok(job.job_name.unwrap_or_else(|| request.job_name.clone()))
    }

    async fn describe(&self, job_name: &str) -> Result<TranscriptionStatus, TranscriptionError> {
        let response = self
            .authorize(self.client.get(self.job_url(job_name)))
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TranscriptionError::JobNotFound(job_name.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Ok(Self::parse_job(response).await?.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let service = HttpTranscriptionService::new("http://localhost:9000/");
        assert_eq!(service.jobs_url(), "http://localhost:9000/jobs");
        assert_eq!(service.job_url("abc"), "http://localhost:9000/jobs/abc");
    }

    #[test]
    fn start_body_uses_snake_case_fields() {
        let request = TranscriptionJobRequest {
            job_name: "j".to_string(),
            media_uri: "file:///in/a.mp4".to_string(),
            media_format: "mp4".to_string(),
            language_code: "ja-JP".to_string(),
            output_location: "out".to_string(),
        };
        let body = serde_json::to_value(StartJobRequest::from(&request)).unwrap();
        assert_eq!(body["job_name"], "j");
        assert_eq!(body["media_uri"], "file:///in/a.mp4");
        assert_eq!(body["output_location"], "out");
    }

    #[test]
    fn job_response_status_parses() {
        let job: JobResponse = serde_json::from_str(r#"{"status": "IN_PROGRESS"}"#).unwrap();
        assert_eq!(job.status, TranscriptionStatus::InProgress);
        assert!(job.job_name.is_none());
    }
}
