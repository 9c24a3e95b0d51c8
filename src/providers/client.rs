//! Generic provider client: one call path for every vendor.

use super::descriptor::ProviderDescriptor;
use super::{FailureKind, GenerationRequest, GenerationResult, ProviderId};
use crate::error::Result;
use anyhow::Context as _;
use std::time::Duration;

/// Per-request ceiling for a single provider call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transient failures get up to this many attempts in total.
const MAX_ATTEMPTS: u32 = 3;
/// Backoff floor and ceiling between attempts.
const RETRY_FLOOR_SECS: u64 = 4;
const RETRY_CEILING_SECS: u64 = 10;

/// One failed attempt, classified. `retriable` marks transient transport
/// signals; parsing failures are never retried since the payload shape will
/// not change on a second request.
struct AttemptError {
    kind: FailureKind,
    message: String,
    retriable: bool,
}

/// A client bound to one provider and one credential.
///
/// Stateless between calls; every call is independently retryable. Each
/// request may use a different credential, so clients are constructed fresh
/// per dispatch rather than held as singletons.
#[derive(Debug)]
pub struct ProviderClient {
    descriptor: ProviderDescriptor,
    api_key: String,
    http: reqwest::Client,
}

impl ProviderClient {
    pub fn new(descriptor: ProviderDescriptor, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .with_context(|| "failed to build HTTP client")?;

        Ok(Self {
            descriptor,
            api_key: api_key.into(),
            http,
        })
    }

    pub fn provider(&self) -> ProviderId {
        self.descriptor.id
    }

    /// Run one generation request against the provider.
    ///
    /// Never returns an error across this boundary: every failure path is
    /// folded into a `Failure` variant with the most specific kind the
    /// transport signal allows.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let provider = self.descriptor.id;
        let mut last_error: Option<AttemptError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay_secs =
                    (RETRY_FLOOR_SECS << (attempt - 1)).min(RETRY_CEILING_SECS);
                tracing::debug!(
                    %provider,
                    attempt = attempt + 1,
                    delay_secs,
                    "retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            }

            match self.attempt(request).await {
                Ok(text) => {
                    tracing::info!(%provider, "provider call succeeded");
                    return GenerationResult::Success { provider, text };
                }
                Err(error) => {
                    if !error.retriable {
                        tracing::warn!(
                            %provider,
                            kind = %error.kind,
                            message = %error.message,
                            "provider call failed"
                        );
                        return GenerationResult::Failure {
                            provider,
                            kind: error.kind,
                            message: error.message,
                        };
                    }
                    tracing::warn!(
                        %provider,
                        attempt = attempt + 1,
                        kind = %error.kind,
                        message = %error.message,
                        "retriable provider error"
                    );
                    last_error = Some(error);
                }
            }
        }

        let error = last_error.unwrap_or_else(|| AttemptError {
            kind: FailureKind::Transport,
            message: "retries exhausted".into(),
            retriable: false,
        });
        GenerationResult::Failure {
            provider,
            kind: error.kind,
            message: format!("{} (after {MAX_ATTEMPTS} attempts)", error.message),
        }
    }

    /// Probe the credential with a minimal-cost request.
    ///
    /// True only on a successful, well-formed reply; every failure,
    /// transport errors included, returns false. Never errors.
    pub async fn validate_credential(&self) -> bool {
        let probe = GenerationRequest::new("Test").with_max_tokens(5);

        match self.attempt(&probe).await {
            Ok(_) => {
                tracing::info!(provider = %self.descriptor.id, "credential validated");
                true
            }
            Err(error) => {
                tracing::warn!(
                    provider = %self.descriptor.id,
                    kind = %error.kind,
                    message = %error.message,
                    "credential validation failed"
                );
                false
            }
        }
    }

    /// One HTTP round trip: post, branch on status, extract the answer.
    async fn attempt(&self, request: &GenerationRequest) -> std::result::Result<String, AttemptError> {
        let endpoint = self.descriptor.endpoint(&self.api_key);
        let body = self.descriptor.build_body(request);

        let mut http_request = self
            .http
            .post(&endpoint)
            .header("content-type", "application/json");

        if matches!(self.descriptor.wire, super::WireFormat::OpenAiChat) {
            http_request =
                http_request.header("authorization", format!("Bearer {}", self.api_key));
        }

        let response = http_request
            .json(&body)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        let response_text = response.text().await.map_err(|error| AttemptError {
            kind: FailureKind::Transport,
            message: format!("failed to read response body: {error}"),
            retriable: false,
        })?;

        if !status.is_success() {
            return Err(self.classify_status(status, &response_text));
        }

        let response_body: serde_json::Value =
            serde_json::from_str(&response_text).map_err(|error| AttemptError {
                kind: FailureKind::MalformedResponse,
                message: format!(
                    "response is not valid JSON: {error}; body: {}",
                    truncate_body(&response_text)
                ),
                retriable: false,
            })?;

        self.descriptor
            .extract_answer(&response_body)
            .ok_or_else(|| AttemptError {
                kind: FailureKind::MalformedResponse,
                message: "answer field missing or empty in response".into(),
                retriable: false,
            })
    }

    /// Map a non-2xx status to the most specific failure kind.
    fn classify_status(&self, status: reqwest::StatusCode, body_text: &str) -> AttemptError {
        let detail = serde_json::from_str::<serde_json::Value>(body_text)
            .ok()
            .and_then(|body| self.descriptor.extract_error_message(&body))
            .unwrap_or_else(|| truncate_body(body_text).to_string());

        let (kind, retriable) = classify_status_code(status.as_u16());

        AttemptError {
            kind,
            message: format!("API request failed with status {status}: {detail}"),
            retriable,
        }
    }
}

/// Status → (kind, retriable). 429 and gateway errors are transient; auth
/// failures and other 4xx are not.
fn classify_status_code(status: u16) -> (FailureKind, bool) {
    match status {
        401 | 403 => (FailureKind::Auth, false),
        429 => (FailureKind::RateLimited, true),
        502 | 503 | 504 => (FailureKind::Upstream, true),
        _ => (FailureKind::Upstream, false),
    }
}

fn classify_request_error(error: reqwest::Error) -> AttemptError {
    if error.is_timeout() {
        AttemptError {
            kind: FailureKind::Timeout,
            message: "request timed out".into(),
            retriable: true,
        }
    } else if error.is_connect() {
        AttemptError {
            kind: FailureKind::Transport,
            message: format!("connection failed: {error}"),
            retriable: true,
        }
    } else {
        AttemptError {
            kind: FailureKind::Transport,
            message: error.to_string(),
            retriable: false,
        }
    }
}

/// Truncate a response body for error messages to avoid dumping megabytes
/// of HTML.
fn truncate_body(body: &str) -> &str {
    let limit = 500;
    if body.len() <= limit {
        body
    } else {
        &body[..limit]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_are_terminal() {
        assert_eq!(classify_status_code(401), (FailureKind::Auth, false));
        assert_eq!(classify_status_code(403), (FailureKind::Auth, false));
    }

    #[test]
    fn transient_statuses_are_retriable() {
        assert_eq!(classify_status_code(429), (FailureKind::RateLimited, true));
        for status in [502, 503, 504] {
            assert_eq!(classify_status_code(status), (FailureKind::Upstream, true));
        }
    }

    #[test]
    fn other_failures_are_upstream_and_terminal() {
        assert_eq!(classify_status_code(400), (FailureKind::Upstream, false));
        assert_eq!(classify_status_code(500), (FailureKind::Upstream, false));
    }

    #[test]
    fn backoff_is_floored_and_capped() {
        let delays: Vec<u64> = (1..MAX_ATTEMPTS)
            .map(|attempt| (RETRY_FLOOR_SECS << (attempt - 1)).min(RETRY_CEILING_SECS))
            .collect();
        assert_eq!(delays, vec![4, 8]);
    }
}
