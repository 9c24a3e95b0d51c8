//! Configuration loading and validation.

use crate::error::Result;
use crate::providers::ProviderId;
use anyhow::Context as _;
use std::net::SocketAddr;

/// Quorum configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory path.
    pub data_dir: std::path::PathBuf,

    /// Address the HTTP API binds to.
    pub bind: SocketAddr,

    /// LLM provider configuration.
    pub llm: LlmConfig,
}

/// LLM provider configuration.
///
/// Keys loaded here are process-wide defaults; API callers may override
/// them per request. Clients are never constructed from this struct at
/// startup; each dispatch builds fresh clients with whatever credential
/// wins.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI API key (from env).
    pub openai_key: Option<String>,

    /// Gemini API key (from env).
    pub gemini_key: Option<String>,

    /// Grok API key (from env).
    pub grok_key: Option<String>,

    /// Deepseek API key (from env).
    pub deepseek_key: Option<String>,

    /// Judge model settings.
    pub judge: JudgeConfig,
}

/// Settings for the secondary analysis ("judge") call.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// API key for the judge endpoint. Missing key degrades analysis to
    /// the generic failure envelope rather than blocking dispatch.
    pub api_key: Option<String>,

    /// Base URL of the judge endpoint (OpenAI-compatible chat wire).
    pub base_url: String,

    /// Judge model name.
    pub model: String,

    /// Low temperature favors deterministic ranking.
    pub temperature: f32,

    /// Output budget for the judge reply.
    pub max_tokens: u32,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.deepseek.com".into(),
            model: "deepseek-chat".into(),
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}

impl LlmConfig {
    /// Process-default credential for a provider, if one was configured.
    pub fn credential_for(&self, provider: ProviderId) -> Option<&str> {
        match provider {
            ProviderId::OpenAi => self.openai_key.as_deref(),
            ProviderId::Gemini => self.gemini_key.as_deref(),
            ProviderId::Grok => self.grok_key.as_deref(),
            ProviderId::Deepseek => self.deepseek_key.as_deref(),
        }
    }
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var("QUORUM_DATA_DIR") {
            Ok(dir) => std::path::PathBuf::from(dir),
            Err(_) => dirs::data_dir()
                .map(|d| d.join("quorum"))
                .unwrap_or_else(|| std::path::PathBuf::from("./data")),
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

        let bind = std::env::var("QUORUM_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8000".into())
            .parse()
            .map_err(|_| {
                crate::error::ConfigError::Invalid("QUORUM_BIND is not a socket address".into())
            })?;

        let deepseek_key = std::env::var("DEEPSEEK_API_KEY").ok();

        let llm = LlmConfig {
            openai_key: std::env::var("OPENAI_API_KEY").ok(),
            gemini_key: std::env::var("GEMINI_API_KEY").ok(),
            grok_key: std::env::var("GROK_API_KEY").ok(),
            deepseek_key: deepseek_key.clone(),
            judge: JudgeConfig {
                api_key: deepseek_key,
                ..JudgeConfig::default()
            },
        };

        Ok(Self {
            data_dir,
            bind,
            llm,
        })
    }

    /// Get the document store path.
    pub fn store_path(&self) -> std::path::PathBuf {
        self.data_dir.join("quorum.redb")
    }
}
