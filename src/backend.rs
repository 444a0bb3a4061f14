//! Backend API client.
//!
//! The backend service owns all survey data and is the authority on survey
//! state at submission time. This client covers the two collaborator
//! endpoints the gateway needs: fetching a survey by its public token and
//! submitting a response. Fetches are idempotent reads and retry on
//! transient failures; submissions are sent exactly once per attempt.

use crate::config::Config;
use crate::i18n::{BundleValidator, Locale};
use crate::retry::{with_retry_if, RetryConfig};
use crate::survey::{Answer, Survey};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Reference returned by the backend for a stored response.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionReceipt {
    pub reference: String,
}

/// Submission payload sent to the backend.
#[derive(Debug, Serialize)]
struct SubmissionRequest<'a> {
    locale: &'a str,
    answers: &'a [Answer],
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BackendClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.backend_api_url.trim_end_matches('/').to_string(),
            api_key: config.backend_api_key.clone(),
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    /// Fetch the survey published under `token`.
    ///
    /// Returns `Ok(None)` when the backend does not know the token. The
    /// result is never cached; availability is re-evaluated against a
    /// fresh copy on every page load. Transient backend failures are
    /// retried; a fetched survey has its translation coverage audited and
    /// logged.
    pub async fn fetch_survey(&self, token: &str) -> Result<Option<Survey>> {
        let survey = with_retry_if(
            &RetryConfig::survey_fetch(),
            &format!("Survey fetch '{}'", token),
            || self.fetch_survey_once(token),
            is_retryable_error,
        )
        .await?;

        if let Some(survey) = &survey {
            let report = BundleValidator::validate(survey);
            if report.has_errors() {
                warn!(
                    "Survey '{}' translation errors: {:?}",
                    survey.id, report.errors
                );
            }
            if report.has_warnings() {
                warn!(
                    "Survey '{}' translation warnings: {:?}",
                    survey.id, report.warnings
                );
            }
        }

        Ok(survey)
    }

    async fn fetch_survey_once(&self, token: &str) -> Result<Option<Survey>> {
        let url = format!("{}/surveys/public/{}", self.base_url, token);
        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .context("Failed to send survey fetch request to backend API")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Backend API error during survey fetch ({}): {}", status, body);
        }

        let survey: Survey = response
            .json()
            .await
            .context("Failed to parse backend survey response")?;

        Ok(Some(survey))
    }

    /// Submit a response for `survey_id`.
    ///
    /// Exactly one attempt: a failure here is surfaced to the visitor,
    /// and any resubmission is visitor-initiated. The backend re-checks
    /// survey availability itself, so a survey that expired between page
    /// load and submit is rejected here with whatever status it returns.
    pub async fn submit_response(
        &self,
        survey_id: &str,
        locale: Locale,
        answers: &[Answer],
    ) -> Result<SubmissionReceipt> {
        let url = format!("{}/surveys/{}/responses", self.base_url, survey_id);
        let request = SubmissionRequest {
            locale: locale.code(),
            answers,
        };

        let response = self
            .authorized(self.http.post(&url))
            .json(&request)
            .send()
            .await
            .context("Failed to send submission request to backend API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Backend API error during submission ({}): {}", status, body);
        }

        let receipt: SubmissionReceipt = response
            .json()
            .await
            .context("Failed to parse backend submission response")?;

        Ok(receipt)
    }
}

/// Determine if an error is retryable (5xx errors, 429 rate limit, network
/// errors). Other 4xx client errors should not be retried.
fn is_retryable_error(error: &anyhow::Error) -> bool {
    let error_str = error.to_string();

    // Backend errors carry their status: "Backend API error during ... (502 Bad Gateway): ..."
    if error_str.contains("Backend API error") {
        if let Some(start) = error_str.find('(') {
            if let Some(end) = error_str[start..].find(')') {
                let status_str = &error_str[start + 1..start + end];
                let status_num = status_str.split_whitespace().next().unwrap_or("");
                if let Ok(status) = status_num.parse::<u16>() {
                    return status == 429 || status >= 500;
                }
            }
        }
    }

    // Network errors, timeouts, and parse failures may be transient
    true
}
