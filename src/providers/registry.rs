//! Provider name resolution.

use super::client::ProviderClient;
use super::descriptor::ProviderDescriptor;
use super::ProviderId;
use crate::error::{RegistryError, Result};

/// Maps provider names to client constructors.
///
/// The sole validation point for provider names; everything downstream
/// works with `ProviderId`. Clients are built fresh per call since each
/// request may carry a different credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderRegistry;

impl ProviderRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Validate a provider name (case-insensitive) without constructing a
    /// client.
    pub fn lookup(&self, name: &str) -> Result<ProviderId> {
        ProviderId::parse(name)
            .ok_or_else(|| RegistryError::UnknownProvider(name.trim().to_string()).into())
    }

    /// Resolve a provider name into a client bound to the given credential.
    pub fn resolve(&self, name: &str, credential: &str) -> Result<ProviderClient> {
        let id = self.lookup(name)?;
        ProviderClient::new(ProviderDescriptor::for_provider(id), credential)
    }

    /// The providers available for dispatch.
    pub fn list_available(&self) -> [ProviderId; 4] {
        ProviderId::ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn resolution_ignores_case_and_whitespace() {
        let registry = ProviderRegistry::new();
        for name in ["openai", "OpenAI", "OPENAI", " openai "] {
            let client = registry
                .resolve(name, "key")
                .expect("known provider should resolve");
            assert_eq!(client.provider(), ProviderId::OpenAi);
        }
    }

    #[test]
    fn unknown_names_fail_with_unknown_provider() {
        let registry = ProviderRegistry::new();
        let error = registry
            .resolve("claude", "key")
            .expect_err("unregistered provider must not resolve");

        match error {
            Error::Registry(RegistryError::UnknownProvider(name)) => {
                assert_eq!(name, "claude");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn listing_covers_the_registered_set() {
        let registry = ProviderRegistry::new();
        assert_eq!(registry.list_available(), ProviderId::ALL);
    }
}
