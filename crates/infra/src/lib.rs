//! Infrastructure layer: identity store adapters and configuration.

pub mod config;
pub mod identity;

pub use config::{Config, ConfigError};
pub use identity::{IdentitySeed, InMemoryIdentityStore, PostgresIdentityStore, SeedError};
