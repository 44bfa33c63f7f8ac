//! Postgres storage backend.
//!
//! Uses `sqlx` runtime queries against a `PgPool`. The schema in [`schema`]
//! is applied at startup and is safe to re-run. Payment methods live in
//! their own table so the encrypted identifier is persisted alongside the
//! wallet.

mod conversions;
mod error;
mod repository;
mod schema;

pub use repository::PgRepository;
