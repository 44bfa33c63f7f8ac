pub mod audit_logs;
pub mod email;
pub mod error;
pub mod health;
pub mod profile;
pub mod route_preferences;
pub mod safety;
pub mod wallet;

pub use error::AppError;
