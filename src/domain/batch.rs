//! src/domain/batch.rs

use crate::domain::SubscriberPayload;

/// Ordered group of payloads sent to the third-party API in one call.
///
/// A batch is never empty. It only lives for the duration of one dispatch run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Batch {
    subscribers: Vec<SubscriberPayload>,
}

impl Batch {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, payload: SubscriberPayload) {
        self.subscribers.push(payload);
    }

    pub fn subscribers(&self) -> &[SubscriberPayload] {
        &self.subscribers
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
