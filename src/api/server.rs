//! HTTP server setup: router and API routes.

use super::state::ApiState;
use crate::error::{ConfigError, Error, RegistryError};
use crate::providers::{GenerationResult, ProviderId};
use crate::store::StoredResponse;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;

// -- Request/response types --

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: u64,
}

#[derive(Serialize)]
struct ModelsResponse {
    models: Vec<&'static str>,
}

#[derive(Deserialize)]
struct MessageRequest {
    content: String,
    id: String,
}

#[derive(Serialize)]
struct MessageResponse {
    response: String,
}

#[derive(Deserialize)]
struct SendMessageRequest {
    question: String,
    message_id: String,
    providers: Vec<String>,
    /// Per-request credential overrides; providers absent here fall back
    /// to the process-wide keys from the environment.
    #[serde(default)]
    credentials: HashMap<String, String>,
}

#[derive(Serialize)]
struct SendMessageResponse {
    message_id: String,
    responses: BTreeMap<String, StoredResponse>,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    question: String,
    /// When present, the verdict is persisted under this id.
    message_id: Option<String>,
    /// Already-normalized answer texts keyed by provider name.
    responses: HashMap<String, String>,
}

#[derive(Deserialize)]
struct ValidateKeyRequest {
    provider: String,
    credential: String,
}

#[derive(Serialize)]
struct ValidateKeyResponse {
    provider: String,
    valid: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Configuration mistakes are the caller's to fix; everything else is ours.
fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::Registry(RegistryError::UnknownProvider(_)) => StatusCode::BAD_REQUEST,
        Error::Config(ConfigError::MissingCredential(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn into_api_error(error: Error) -> ApiError {
    let status = error_status(&error);
    if status.is_server_error() {
        tracing::error!(%error, "request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Start the HTTP server on the given address.
pub async fn start_http_server(
    bind: SocketAddr,
    state: Arc<ApiState>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/models", get(list_models))
        .route("/message", post(save_message))
        .route("/send_message", post(send_message))
        .route("/analyze_responses", post(analyze_responses))
        .route("/validate_key", post(validate_key));

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, "HTTP server listening");

    let handle = tokio::spawn(async move {
        let mut shutdown = shutdown_rx;
        if let Err(error) = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|v| *v).await;
            })
            .await
        {
            tracing::error!(%error, "HTTP server exited with error");
        }
    });

    Ok(handle)
}

// -- API handlers --

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// The providers available for dispatch.
async fn list_models(State(state): State<Arc<ApiState>>) -> Json<ModelsResponse> {
    let models = state
        .dispatcher
        .registry()
        .list_available()
        .iter()
        .map(|provider| provider.as_str())
        .collect();
    Json(ModelsResponse { models })
}

/// Persist a question without dispatching it.
async fn save_message(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .store
        .save_question(&request.id, &request.content)
        .map_err(into_api_error)?;

    Ok(Json(MessageResponse {
        response: format!("Message saved with ID: {}", request.id),
    }))
}

/// Fan a question out to the requested providers, persist every outcome,
/// and return the per-provider records.
///
/// Unknown provider names and missing credentials reject the whole request
/// up front; individual provider failures travel inside the records.
async fn send_message(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let mut credentials: HashMap<String, String> = request
        .credentials
        .iter()
        .map(|(name, key)| (name.trim().to_lowercase(), key.clone()))
        .collect();

    // Fill in process-default keys for providers the request didn't cover.
    for provider in state.dispatcher.registry().list_available() {
        if !credentials.contains_key(provider.as_str())
            && let Some(key) = state.config.llm.credential_for(provider)
        {
            credentials.insert(provider.as_str().to_string(), key.to_string());
        }
    }

    state
        .store
        .save_question(&request.message_id, &request.question)
        .map_err(into_api_error)?;

    let answers = state
        .dispatcher
        .dispatch(&request.question, &request.providers, &credentials)
        .await
        .map_err(into_api_error)?;

    let responses = state
        .store
        .save_responses(&request.message_id, &answers)
        .map_err(into_api_error)?;

    Ok(Json(SendMessageResponse {
        message_id: request.message_id,
        responses,
    }))
}

/// Run the judge over a set of answer texts.
///
/// The request carries plain `{provider: text}` pairs; unrecognized
/// provider keys are ignored. Analysis failures surface as the degraded
/// envelope with HTTP 200: the judge failing is an outcome, not a request
/// error.
async fn analyze_responses(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut answers = crate::dispatch::AggregatedAnswerSet::new();
    for (name, text) in &request.responses {
        match ProviderId::parse(name) {
            Some(provider) => {
                answers.insert(
                    provider,
                    GenerationResult::Success {
                        provider,
                        text: text.clone(),
                    },
                );
            }
            None => {
                tracing::warn!(%name, "ignoring answer from unrecognized provider");
            }
        }
    }

    let verdict = state.analyzer.analyze(&request.question, &answers).await;

    if let Some(message_id) = &request.message_id {
        state
            .store
            .save_analysis(message_id, &verdict)
            .map_err(into_api_error)?;
    }

    Ok(Json(verdict.to_wire()))
}

/// Probe a credential against the provider's real endpoint.
async fn validate_key(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ValidateKeyRequest>,
) -> Result<Json<ValidateKeyResponse>, ApiError> {
    let client = state
        .dispatcher
        .registry()
        .resolve(&request.provider, &request.credential)
        .map_err(into_api_error)?;

    let valid = client.validate_credential().await;

    Ok(Json(ValidateKeyResponse {
        provider: client.provider().to_string(),
        valid,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_map_to_bad_request() {
        let error = Error::Registry(RegistryError::UnknownProvider("claude".into()));
        assert_eq!(error_status(&error), StatusCode::BAD_REQUEST);

        let error = Error::Config(ConfigError::MissingCredential("grok".into()));
        assert_eq!(error_status(&error), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_errors_map_to_internal_server_error() {
        let error = Error::Other(anyhow::anyhow!("boom"));
        assert_eq!(error_status(&error), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn send_message_request_accepts_missing_credentials_field() {
        let request: SendMessageRequest = serde_json::from_value(serde_json::json!({
            "question": "What is 2+2?",
            "message_id": "msg-1",
            "providers": ["openai", "grok"],
        }))
        .expect("request without credentials should deserialize");

        assert!(request.credentials.is_empty());
        assert_eq!(request.providers.len(), 2);
    }

    #[test]
    fn stored_records_serialize_without_null_fields() {
        let response = SendMessageResponse {
            message_id: "msg-1".into(),
            responses: BTreeMap::from([(
                "openai".to_string(),
                StoredResponse {
                    answer: Some("4".into()),
                    error: None,
                    timestamp: 1_700_000_000_000,
                },
            )]),
        };

        let value = serde_json::to_value(&response).expect("response should serialize");
        let record = &value["responses"]["openai"];
        assert_eq!(record["answer"], "4");
        assert!(record.get("error").is_none());
    }
}
