//! src/domain/dispatch_limits.rs

use crate::domain::RequestKind;
use std::num::NonZeroUsize;

/// Batch capacity and hourly ceilings of a dispatcher.
///
/// Loaded once from configuration, never changed while the application runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    pub max_batch_size: NonZeroUsize,
    pub max_batch_requests_per_hour: u64,
    pub max_individual_requests_per_hour: u64,
}

impl DispatchLimits {
    pub fn ceiling(&self, kind: RequestKind) -> u64 {
        match kind {
            RequestKind::Batch => self.max_batch_requests_per_hour,
            RequestKind::Individual => self.max_individual_requests_per_hour,
        }
    }
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            max_batch_size: NonZeroUsize::new(1000).expect("1000 is not zero"),
            max_batch_requests_per_hour: 50,
            max_individual_requests_per_hour: 3600,
        }
    }
}
