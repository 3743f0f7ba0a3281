//! In-memory secrets backend for tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::SecretsError;
use crate::traits::SecretsBackend;
use crate::types::{SecretContext, SecretScope, SecretValue};

fn storage_key(scope: &SecretScope, name: &str) -> String {
    format!("{}:{}", scope.to_key(), name)
}

/// Fixed set of secrets held in memory.
///
/// Seeded at construction and resolved with the same scope order as the
/// other backends. Nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct MemorySecrets {
    data: HashMap<String, SecretValue>,
}

impl MemorySecrets {
    /// Creates a new, empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend holding one global secret.
    pub fn with_global(name: &str, value: impl Into<String>) -> Self {
        Self::new().with_scoped(&SecretScope::global(), name, value)
    }

    /// Adds a secret at `scope`, replacing any value already there.
    #[must_use]
    pub fn with_scoped(
        mut self,
        scope: &SecretScope,
        name: &str,
        value: impl Into<String>,
    ) -> Self {
        self.data.insert(storage_key(scope, name), SecretValue::new(value));
        self
    }
}

#[async_trait]
impl SecretsBackend for MemorySecrets {
    async fn get(
        &self,
        name: &str,
        context: &SecretContext,
    ) -> Result<Option<SecretValue>, SecretsError> {
        Ok(context
            .resolution_order()
            .iter()
            .find_map(|scope| self.data.get(&storage_key(scope, name)).cloned()))
    }
}
