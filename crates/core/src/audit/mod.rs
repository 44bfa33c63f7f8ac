//! Security events and the entity change trail recorded for auditing.

mod types;

pub use types::{AuditAction, AuditLog, SecurityEvent, SecurityEventType, Severity};
