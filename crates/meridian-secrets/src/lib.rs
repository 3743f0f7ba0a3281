//! Secret retrieval for meridian.
//!
//! Every remote call meridian makes is authenticated with a token resolved
//! through a [`SecretGetter`]. Tokens are fetched fresh for each call and
//! are protected in memory with `secrecy` and `zeroize`. Lookups can be
//! held to a shared token-bucket budget with `[secrets.rate_limit]`.
//!
//! # Backends
//!
//! - **Env** (`env` feature): environment variables, used on CI runners
//! - **Memory** (`memory` feature): a fixed in-memory set for tests; not
//!   selectable from configuration
//!
//! # Scope Resolution
//!
//! 1. **Environment**: a team + environment pair
//! 2. **Team**: every environment of one team
//! 3. **Global**: available everywhere
//!
//! # Example
//!
//! ```rust,ignore
//! use meridian_secrets::{SecretGetter, SecretsConfig, SecretsProvider};
//!
//! let provider = SecretsProvider::from_config(&SecretsConfig::default())?;
//! let token = provider.getter("PLATFORM_API_TOKEN")?.get_secret().await?;
//! ```

#![forbid(unsafe_code)]

mod error;
mod getter;
mod traits;
mod types;

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "env")]
mod env;

#[cfg(feature = "config")]
mod config;

#[cfg(feature = "config")]
mod provider;

pub use error::SecretsError;
pub use getter::{lookup_budget, BackendSecretGetter};
pub use traits::{SecretGetter, SecretsBackend};
pub use types::{SecretContext, SecretScope, SecretValue};

#[cfg(feature = "memory")]
pub use memory::MemorySecrets;

#[cfg(feature = "env")]
pub use env::EnvSecrets;

#[cfg(feature = "config")]
pub use config::{SecretsBackendKind, SecretsConfig, SecretsRateLimit};

#[cfg(feature = "config")]
pub use provider::SecretsProvider;
