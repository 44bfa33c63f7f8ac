//! In-memory storage backend.
//!
//! Stores every entity in HashMaps wrapped in `Arc<RwLock<_>>`. Used for
//! tests, local development, and route preferences when the `dynamodb`
//! feature is off. Nothing survives a restart.

mod repository;

pub use repository::InMemoryRepository;
