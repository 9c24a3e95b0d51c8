//! Concurrent fan-out over provider clients.

use crate::error::{ConfigError, Result};
use crate::prompts;
use crate::providers::{
    FailureKind, GenerationRequest, GenerationResult, ProviderClient, ProviderId,
    ProviderRegistry,
};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// One normalized result per dispatched provider. Keys are fixed when the
/// dispatch returns; no late insertion.
pub type AggregatedAnswerSet = BTreeMap<ProviderId, GenerationResult>;

/// Ceiling for one provider's call within a dispatch. Exceeding it resolves
/// that provider's slot to a timeout failure without touching siblings.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Capability seam between the dispatcher and provider clients, so tests
/// can substitute scripted providers.
pub trait ProviderCall: Send + Sync + 'static {
    fn provider(&self) -> ProviderId;

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = GenerationResult> + Send + 'a>>;
}

impl ProviderCall for ProviderClient {
    fn provider(&self) -> ProviderId {
        ProviderClient::provider(self)
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = GenerationResult> + Send + 'a>> {
        Box::pin(ProviderClient::generate(self, request))
    }
}

/// Issues concurrent requests to a set of providers and aggregates one
/// result per provider.
///
/// Never raises for runtime provider behavior; the only error paths are
/// configuration ones (unknown provider name, missing credential) detected
/// before any call is issued.
pub struct Dispatcher {
    registry: ProviderRegistry,
    call_timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Override the per-provider call ceiling.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Fan a question out to the named providers and wait for every slot.
    ///
    /// Credential map keys are provider names (any casing). Duplicate
    /// provider names collapse to a single dispatch.
    pub async fn dispatch(
        &self,
        question: &str,
        providers: &[String],
        credentials: &HashMap<String, String>,
    ) -> Result<AggregatedAnswerSet> {
        let credentials: HashMap<ProviderId, &str> = credentials
            .iter()
            .filter_map(|(name, key)| {
                ProviderId::parse(name).map(|id| (id, key.as_str()))
            })
            .collect();

        // Resolve everything up front: configuration problems fail the
        // whole dispatch before a single request goes out.
        let mut clients: Vec<Arc<dyn ProviderCall>> = Vec::new();
        let mut requested = Vec::new();
        for name in providers {
            let id = self.registry.lookup(name)?;
            if requested.contains(&id) {
                tracing::debug!(provider = %id, "duplicate provider in dispatch, collapsing");
                continue;
            }
            let credential = credentials
                .get(&id)
                .copied()
                .ok_or_else(|| ConfigError::MissingCredential(id.to_string()))?;
            clients.push(Arc::new(self.registry.resolve(name, credential)?));
            requested.push(id);
        }

        let request = GenerationRequest::new(prompts::deep_question_prompt(question));

        tracing::info!(
            providers = ?requested,
            "dispatching question to providers"
        );

        Ok(join_generations(clients, request, self.call_timeout).await)
    }
}

/// Run every client concurrently and join all outcomes.
///
/// Each call runs in its own task: a panic inside one provider's call path
/// is caught at the join boundary and lands in that provider's slot as a
/// transport failure, so the aggregate contract holds unconditionally.
async fn join_generations(
    clients: Vec<Arc<dyn ProviderCall>>,
    request: GenerationRequest,
    call_timeout: Duration,
) -> AggregatedAnswerSet {
    let tasks = clients.into_iter().map(|client| {
        let provider = client.provider();
        let request = request.clone();
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(call_timeout, client.generate(&request)).await {
                Ok(result) => result,
                Err(_) => GenerationResult::Failure {
                    provider,
                    kind: FailureKind::Timeout,
                    message: format!(
                        "provider call exceeded {}s",
                        call_timeout.as_secs_f64()
                    ),
                },
            }
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(join_error) => {
                    tracing::error!(
                        %provider,
                        %join_error,
                        "provider call path panicked"
                    );
                    GenerationResult::Failure {
                        provider,
                        kind: FailureKind::Transport,
                        message: "provider call failed unexpectedly".into(),
                    }
                }
            }
        }
    });

    let mut answers = AggregatedAnswerSet::new();
    for result in futures::future::join_all(tasks).await {
        answers.insert(result.provider(), result);
    }
    answers
}
