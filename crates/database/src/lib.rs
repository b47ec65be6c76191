//! # Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! SQLite database holding the `customer_accounts` table.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate is an adapter that encapsulates all
//!   database-specific logic. It provides a clean, abstract API to the rest
//!   of the application, hiding the underlying SQL and database
//!   implementation details.
//! - **Asynchronous & Pooled:** All operations are asynchronous, and it uses
//!   a connection pool (`SqlitePool`) shared across request handlers.
//!
//! ## Public API
//!
//! - `connect_with`: establish the database connection pool.
//! - `run_migrations`: apply the embedded schema migrations.
//! - `DbRepository`: the struct that holds the connection pool and provides
//!   all the high-level data access methods (e.g. `upsert_accounts`).
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect_with, run_migrations};
pub use error::DbError;
pub use repository::{DbRepository, ImportSummary};
