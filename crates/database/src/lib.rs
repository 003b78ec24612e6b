//! # Database Crate
//!
//! The Postgres implementation of the ledger's store traits. It is the
//! system's "permanent archive."
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate encapsulates all database-specific
//!   logic. The rest of the application talks to the `ledger` store
//!   traits and never sees SQL.
//! - **Permissive Row Mapping:** Historical rows can be partially
//!   malformed. Numeric columns map through the safe-numeric contract
//!   (missing reads as zero) and an unreadable snapshot maps to `None`
//!   rather than failing the whole batch.
//! - **Asynchronous & Pooled:** All operations are asynchronous over a
//!   shared `PgPool`.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: A utility to apply database migrations.
//! - `ProfitRepository`: The store-trait implementation holding the pool.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::ProfitRepository;
