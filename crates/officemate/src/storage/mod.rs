//! Storage backend implementations.
//!
//! Concrete implementations of the repository traits defined in
//! `officemate_core::storage`, selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): relational data in process memory
//! - `postgres`: relational data in Postgres via `sqlx`
//! - `dynamodb`: route preferences in DynamoDB (in memory otherwise)
//!
//! `inmemory` and `postgres` are mutually exclusive.
//!
//! Build with Postgres and DynamoDB:
//! ```bash
//! cargo build -p officemate --no-default-features --features postgres,memory-sessions,dynamodb
//! ```

#[cfg(all(feature = "inmemory", feature = "postgres"))]
compile_error!(
    "Features 'inmemory' and 'postgres' are mutually exclusive. \
    Enable only one relational storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "postgres")))]
compile_error!(
    "No relational storage backend selected. Enable 'inmemory' or 'postgres' feature. \
    Example: cargo build -p officemate --features postgres"
);

pub mod inmemory;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use inmemory::InMemoryRepository;

#[cfg(feature = "postgres")]
pub use postgres::PgRepository;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbRepository;
