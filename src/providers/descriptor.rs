//! Per-provider wire descriptors.
//!
//! All four vendors share one control flow (build payload, post, branch on
//! status, extract the answer field); only the endpoint, payload shape, and
//! extraction path differ. Those differences live here so the client stays
//! generic.

use super::{GenerationRequest, ProviderId};
use serde_json::Value;

/// Which request/response shape a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// POST `{base}/v1/chat/completions` with bearer auth; answer at
    /// `choices[0].message.content`.
    OpenAiChat,
    /// POST `{base}/v1beta/models/{model}:generateContent` with the key in
    /// the query string; answer at `candidates[0].content.parts[0].text`.
    Gemini,
}

/// Static description of one provider's endpoint and defaults.
#[derive(Debug, Clone, Copy)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub base_url: &'static str,
    pub model: &'static str,
    pub wire: WireFormat,
    /// Default system preamble sent when the request carries none.
    pub system_preamble: Option<&'static str>,
}

const ASSISTANT_PREAMBLE: &str =
    "You are a helpful AI assistant that provides thoughtful, concise responses.";

const GROK_PREAMBLE: &str =
    "You are Grok, a chatbot inspired by the Hitchhikers Guide to the Galaxy.";

impl ProviderDescriptor {
    /// Descriptor for a registered provider.
    pub fn for_provider(id: ProviderId) -> Self {
        match id {
            ProviderId::OpenAi => Self {
                id,
                base_url: "https://api.openai.com",
                model: "gpt-4-turbo-preview",
                wire: WireFormat::OpenAiChat,
                system_preamble: Some(ASSISTANT_PREAMBLE),
            },
            ProviderId::Gemini => Self {
                id,
                base_url: "https://generativelanguage.googleapis.com",
                model: "gemini-1.5-pro",
                wire: WireFormat::Gemini,
                system_preamble: None,
            },
            ProviderId::Grok => Self {
                id,
                base_url: "https://api.x.ai",
                model: "grok-2-latest",
                wire: WireFormat::OpenAiChat,
                system_preamble: Some(GROK_PREAMBLE),
            },
            ProviderId::Deepseek => Self {
                id,
                base_url: "https://api.deepseek.com",
                model: "deepseek-chat",
                wire: WireFormat::OpenAiChat,
                system_preamble: Some(ASSISTANT_PREAMBLE),
            },
        }
    }

    /// Full request URL. Gemini carries the credential in the query string;
    /// the OpenAI-compatible providers use bearer auth instead.
    pub fn endpoint(&self, api_key: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.wire {
            WireFormat::OpenAiChat => format!("{base}/v1/chat/completions"),
            WireFormat::Gemini => format!(
                "{base}/v1beta/models/{model}:generateContent?key={api_key}",
                model = self.model
            ),
        }
    }

    /// Build the JSON request body for this provider.
    pub fn build_body(&self, request: &GenerationRequest) -> Value {
        match self.wire {
            WireFormat::OpenAiChat => {
                let mut messages = Vec::new();

                let system = request
                    .system
                    .as_deref()
                    .or(self.system_preamble);
                if let Some(system) = system {
                    messages.push(serde_json::json!({
                        "role": "system",
                        "content": system,
                    }));
                }

                messages.push(serde_json::json!({
                    "role": "user",
                    "content": request.prompt,
                }));

                let mut body = serde_json::json!({
                    "model": self.model,
                    "messages": messages,
                    "temperature": request.temperature,
                    "max_tokens": request.max_tokens,
                });

                // Grok rejects implicit streaming defaults.
                if self.id == ProviderId::Grok {
                    body["stream"] = serde_json::json!(false);
                }

                body
            }
            WireFormat::Gemini => serde_json::json!({
                "contents": [{
                    "parts": [{ "text": request.prompt }],
                }],
                "generationConfig": {
                    "temperature": request.temperature,
                    "maxOutputTokens": request.max_tokens,
                    "topP": 0.8,
                    "topK": 40,
                },
            }),
        }
    }

    /// Extract the single answer string from a 2xx response body.
    ///
    /// Returns None when the expected field path is absent or empty; the
    /// caller reports that as a malformed response, never as an empty
    /// answer.
    pub fn extract_answer(&self, body: &Value) -> Option<String> {
        let text = match self.wire {
            WireFormat::OpenAiChat => body["choices"][0]["message"]["content"].as_str(),
            WireFormat::Gemini => body["candidates"][0]["content"]["parts"][0]["text"].as_str(),
        }?;

        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// Pull the provider-declared error message out of an error body, if
    /// the vendor supplied one.
    pub fn extract_error_message(&self, body: &Value) -> Option<String> {
        body["error"]["message"]
            .as_str()
            .map(|message| message.to_string())
    }
}
