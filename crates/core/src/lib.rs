//! Functional core for the OfficeMate backend.
//!
//! Pure domain types, validation rules and decision functions. Everything
//! that performs I/O lives behind the traits in [`storage`], [`notify`] and
//! (with the `auth` feature) [`auth`], implemented by the outer crates.

pub mod account;
pub mod audit;
#[cfg(feature = "auth")]
pub mod auth;
pub mod email;
pub mod notify;
pub mod profile;
pub mod route;
pub mod safety;
pub mod serde;
pub mod storage;
pub mod wallet;
