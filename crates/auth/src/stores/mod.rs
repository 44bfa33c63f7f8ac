//! Key-value storage for sessions, OTP records and counters.
//!
//! Provides `SessionRepository`, `OtpRepository` and `CounterStore`
//! implementations for:
//! - In-memory (always available)
//! - Redis (with `redis` feature)

mod inmemory;
#[cfg(feature = "redis")]
mod redis_impl;

pub use inmemory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_impl::RedisStore;
