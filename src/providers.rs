//! Provider identities, request/result envelopes, and the generic client.

pub mod client;
pub mod descriptor;
pub mod registry;

pub use client::ProviderClient;
pub use descriptor::{ProviderDescriptor, WireFormat};
pub use registry::ProviderRegistry;

use serde::{Deserialize, Serialize};

/// The closed set of dispatchable providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Gemini,
    Grok,
    Deepseek,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::OpenAi,
        ProviderId::Gemini,
        ProviderId::Grok,
        ProviderId::Deepseek,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Gemini => "gemini",
            ProviderId::Grok => "grok",
            ProviderId::Deepseek => "deepseek",
        }
    }

    /// Case-insensitive lookup; whitespace around the name is ignored.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(ProviderId::OpenAi),
            "gemini" => Some(ProviderId::Gemini),
            "grok" => Some(ProviderId::Grok),
            "deepseek" => Some(ProviderId::Deepseek),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One chat-completion request as seen by a provider client.
///
/// Constructed per call; each provider may apply its own default system
/// preamble, but temperature and token budget always come from here.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Overrides the provider's default system preamble when set.
    pub system: Option<String>,
}

impl GenerationRequest {
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;

    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            system: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }
}

/// Failure classification for a provider call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Auth,
    RateLimited,
    Timeout,
    MalformedResponse,
    Transport,
    Upstream,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Auth => "auth_error",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Timeout => "timeout",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Transport => "transport_error",
            FailureKind::Upstream => "upstream_error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized outcome of one provider call.
///
/// Exactly one variant per provider per dispatch. Callers branch on the
/// variant; error state is never encoded in the text content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GenerationResult {
    Success {
        provider: ProviderId,
        text: String,
    },
    Failure {
        provider: ProviderId,
        kind: FailureKind,
        message: String,
    },
}

impl GenerationResult {
    pub fn provider(&self) -> ProviderId {
        match self {
            GenerationResult::Success { provider, .. } => *provider,
            GenerationResult::Failure { provider, .. } => *provider,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    /// The answer text, when this result carries one.
    pub fn answer(&self) -> Option<&str> {
        match self {
            GenerationResult::Success { text, .. } => Some(text),
            GenerationResult::Failure { .. } => None,
        }
    }

    /// Short human-readable error string, when this result is a failure.
    pub fn error_message(&self) -> Option<String> {
        match self {
            GenerationResult::Success { .. } => None,
            GenerationResult::Failure { kind, message, .. } => {
                Some(format!("{kind}: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parse_is_case_insensitive() {
        assert_eq!(ProviderId::parse("openai"), Some(ProviderId::OpenAi));
        assert_eq!(ProviderId::parse("OpenAI"), Some(ProviderId::OpenAi));
        assert_eq!(ProviderId::parse("OPENAI"), Some(ProviderId::OpenAi));
        assert_eq!(ProviderId::parse(" Gemini "), Some(ProviderId::Gemini));
        assert_eq!(ProviderId::parse("claude"), None);
    }

    #[test]
    fn provider_round_trips_through_as_str() {
        for provider in ProviderId::ALL {
            assert_eq!(ProviderId::parse(provider.as_str()), Some(provider));
        }
    }

    #[test]
    fn request_clamps_out_of_range_values() {
        let request = GenerationRequest::new("hi")
            .with_temperature(3.0)
            .with_max_tokens(0);
        assert_eq!(request.temperature, 1.0);
        assert_eq!(request.max_tokens, 1);
    }

    #[test]
    fn failure_formats_with_kind_prefix() {
        let result = GenerationResult::Failure {
            provider: ProviderId::Grok,
            kind: FailureKind::Timeout,
            message: "call exceeded 30s".into(),
        };
        assert_eq!(
            result.error_message().as_deref(),
            Some("timeout: call exceeded 30s")
        );
        assert!(result.answer().is_none());
    }
}
