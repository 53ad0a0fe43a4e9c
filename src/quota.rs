//! src/quota.rs

use crate::domain::{DispatchLimits, RequestKind};
use chrono::{DateTime, TimeDelta, Utc};

/// Length of the trailing window every ceiling applies to.
pub fn quota_window() -> TimeDelta {
    TimeDelta::hours(1)
}

/// One more request is admissible iff it does not push the count above the ceiling.
pub fn admit(current_count: u64, ceiling: u64) -> bool {
    current_count < ceiling
}

/// Decides, from the ledger count of the trailing hour, whether the next send may go out.
///
/// The check is not a reservation. Two runs that check concurrently may both be admitted.
#[derive(Debug, Clone, Copy)]
pub struct QuotaGuard {
    limits: DispatchLimits,
}

impl QuotaGuard {
    pub fn new(limits: DispatchLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &DispatchLimits {
        &self.limits
    }

    pub fn ceiling(&self, kind: RequestKind) -> u64 {
        self.limits.ceiling(kind)
    }

    /// Oldest ledger timestamp that still counts against the quota at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - quota_window()
    }

    pub fn admit(&self, kind: RequestKind, current_count: u64) -> bool {
        let ceiling = self.ceiling(kind);
        let admitted = admit(current_count, ceiling);
        if !admitted {
            tracing::warn!(
                request_kind = %kind,
                current_count,
                ceiling,
                "Hourly rate limit reached"
            );
        }
        admitted
    }
}
