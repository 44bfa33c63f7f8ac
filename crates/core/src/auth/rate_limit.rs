//! Rate limiting and lockout policy.

use chrono::Duration;

use crate::audit::Severity;

/// Failed OTP verifications tolerated before the identifier is locked.
pub const MAX_FAILED_ATTEMPTS: u64 = 5;

/// Window in which failed attempts are counted.
pub const FAILED_ATTEMPT_WINDOW: Duration = Duration::hours(1);

/// How long an identifier stays locked.
pub const LOCKOUT_DURATION: Duration = Duration::minutes(30);

/// Occurrences within [`SUSPICIOUS_ACTIVITY_WINDOW`] that escalate to high severity.
pub const SUSPICIOUS_ACTIVITY_THRESHOLD: u64 = 10;

pub const SUSPICIOUS_ACTIVITY_WINDOW: Duration = Duration::hours(24);

/// A fixed-window request budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u64,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const OTP_REQUESTS: Self = Self {
        max_requests: 5,
        window: Duration::hours(1),
    };

    pub const LOGIN_ATTEMPTS: Self = Self {
        max_requests: 10,
        window: Duration::hours(1),
    };

    pub const REGISTRATIONS: Self = Self {
        max_requests: 5,
        window: Duration::hours(1),
    };

    pub fn allows(&self, count: u64) -> bool {
        is_within_limit(count, self.max_requests)
    }

    pub fn remaining(&self, count: u64) -> u64 {
        self.max_requests.saturating_sub(count)
    }
}

/// A request is allowed while the post-increment count stays within `max`.
pub fn is_within_limit(count: u64, max: u64) -> bool {
    count <= max
}

/// Severity of a repeated suspicious activity.
pub fn suspicious_severity(count: u64, threshold: u64) -> Severity {
    if count >= threshold {
        Severity::High
    } else {
        Severity::Medium
    }
}
