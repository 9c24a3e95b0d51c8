//! Secondary analysis: ask a judge model to summarize and rank the
//! aggregated answers.

pub mod parser;

use crate::config::JudgeConfig;
use crate::dispatch::AggregatedAnswerSet;
use crate::error::{AnalysisError, Result};
use crate::prompts;
use crate::providers::ProviderId;
use anyhow::Context as _;
use std::time::Duration;

const JUDGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one analysis pass. Derived from an answer set, consumed once
/// by the caller; on any judge or parse failure the caller sees an explicit
/// degraded envelope, never a raised error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisVerdict {
    Verdict {
        summary: String,
        best_provider: ProviderId,
        explanation: String,
    },
    Failed {
        error: String,
    },
}

impl AnalysisVerdict {
    /// Wire shape shared by the API and the store. The failure envelope
    /// keeps the summary/bestModel fields populated with sentinels so
    /// consumers never need to handle their absence.
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            AnalysisVerdict::Verdict {
                summary,
                best_provider,
                explanation,
            } => serde_json::json!({
                "summary": summary,
                "bestModel": best_provider.as_str(),
                "explanation": explanation,
            }),
            AnalysisVerdict::Failed { error } => serde_json::json!({
                "error": error,
                "summary": "Analysis failed",
                "bestModel": "unknown",
            }),
        }
    }
}

/// Judge-model caller and verdict parser.
pub struct Analyzer {
    judge: JudgeConfig,
    http: reqwest::Client,
}

impl Analyzer {
    pub fn new(judge: JudgeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(JUDGE_TIMEOUT)
            .build()
            .with_context(|| "failed to build judge HTTP client")?;

        Ok(Self { judge, http })
    }

    /// Summarize and rank an answer set.
    ///
    /// Borrows the set read-only; failed providers contribute a "No
    /// response" placeholder to the judge prompt. Judge transport failures
    /// and parse failures both collapse into the generic failure envelope;
    /// the distinction is logged here and not surfaced, since callers
    /// cannot act differently on either.
    pub async fn analyze(
        &self,
        question: &str,
        answers: &AggregatedAnswerSet,
    ) -> AnalysisVerdict {
        match self.run(question, answers).await {
            Ok(verdict) => verdict,
            Err(error) => {
                tracing::warn!(%error, "analysis failed");
                AnalysisVerdict::Failed {
                    error: "analysis failed".into(),
                }
            }
        }
    }

    async fn run(
        &self,
        question: &str,
        answers: &AggregatedAnswerSet,
    ) -> std::result::Result<AnalysisVerdict, AnalysisError> {
        let api_key = self
            .judge
            .api_key
            .as_deref()
            .ok_or_else(|| AnalysisError::JudgeRequest("no judge credential configured".into()))?;

        let prompt = prompts::judge_prompt(question, answers);
        let body = serde_json::json!({
            "model": self.judge.model,
            "messages": [
                { "role": "system", "content": prompts::judge_system_prompt() },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.judge.temperature,
            "max_tokens": self.judge.max_tokens,
        });

        let endpoint = format!(
            "{}/v1/chat/completions",
            self.judge.base_url.trim_end_matches('/')
        );

        // One shot, no retry wrapper: parse failures are not transient, and
        // the transport timeout already bounds the call.
        let response = self
            .http
            .post(&endpoint)
            .header("authorization", format!("Bearer {api_key}"))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|error| AnalysisError::JudgeRequest(error.to_string()))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|error| {
            AnalysisError::JudgeRequest(format!("failed to read judge response: {error}"))
        })?;

        if !status.is_success() {
            return Err(AnalysisError::JudgeRequest(format!(
                "judge request failed with status {status}"
            )));
        }

        let response_body: serde_json::Value = serde_json::from_str(&response_text)
            .map_err(|error| {
                AnalysisError::JudgeRequest(format!("judge response is not valid JSON: {error}"))
            })?;

        let content = response_body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                AnalysisError::JudgeRequest("judge reply missing content field".into())
            })?;

        let parsed = parser::parse_verdict(content)?;

        tracing::info!(best_provider = %parsed.best_provider, "analysis complete");

        Ok(AnalysisVerdict::Verdict {
            summary: parsed.summary,
            best_provider: parsed.best_provider,
            explanation: parsed.explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn missing_judge_credential_degrades_to_the_failure_envelope() {
        let analyzer = Analyzer::new(JudgeConfig::default())
            .expect("analyzer should build without a credential");

        let verdict = analyzer
            .analyze("What is 2+2?", &BTreeMap::new())
            .await;

        assert_eq!(
            verdict,
            AnalysisVerdict::Failed {
                error: "analysis failed".into()
            }
        );
    }

    #[test]
    fn verdict_wire_shape_matches_the_contract() {
        let verdict = AnalysisVerdict::Verdict {
            summary: "All agree: 4.".into(),
            best_provider: ProviderId::Gemini,
            explanation: "Most complete.".into(),
        };

        let wire = verdict.to_wire();
        assert_eq!(wire["summary"], "All agree: 4.");
        assert_eq!(wire["bestModel"], "gemini");
        assert_eq!(wire["explanation"], "Most complete.");
        assert!(wire.get("error").is_none());
    }

    #[test]
    fn failure_wire_shape_keeps_sentinel_fields() {
        let verdict = AnalysisVerdict::Failed {
            error: "analysis failed".into(),
        };

        let wire = verdict.to_wire();
        assert_eq!(wire["error"], "analysis failed");
        assert_eq!(wire["summary"], "Analysis failed");
        assert_eq!(wire["bestModel"], "unknown");
    }
}
