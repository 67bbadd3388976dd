//! Identity store adapters.
//!
//! Both adapters implement `tessera_auth::IdentityStore`; the authorization
//! core never sees which one is in use.

pub mod in_memory;
pub mod postgres;
pub mod seed;

pub use in_memory::InMemoryIdentityStore;
pub use postgres::PostgresIdentityStore;
pub use seed::{IdentitySeed, SeedError};
