//! # Scribe Infrastructure
//!
//! Concrete implementations of the ports defined in `scribe-core`.
//! This crate contains the database repositories, the session-token
//! validation for the external identity provider, and the media store.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL repositories via SeaORM
//!
//! Without `postgres`, the in-memory repositories are the only store; they
//! also back the handler test-suite.

pub mod auth;
pub mod database;
pub mod media;

pub use auth::{JwtConfig, JwtTokenService};
pub use database::DatabaseConfig;
pub use database::memory::InMemoryStore;
pub use media::{FsMediaStore, InMemoryMediaStore};

#[cfg(feature = "postgres")]
pub use database::{
    PostgresCommentRepository, PostgresFollowRepository, PostgresGroupRepository,
    PostgresPostRepository, PostgresUserRepository, connect,
};
