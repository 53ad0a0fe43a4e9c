//! src/batcher.rs

use crate::domain::{Batch, SourceRecord, SubscriberPayload};
use std::num::NonZeroUsize;

/// Split records into ordered batches of at most `capacity` payloads.
///
/// Every batch but the last holds exactly `capacity` payloads. No records
/// give no batches. Input order is preserved.
pub fn partition(records: &[SourceRecord], capacity: NonZeroUsize) -> Vec<Batch> {
    let capacity = capacity.get();
    records
        .chunks(capacity)
        .map(|chunk| {
            let mut batch = Batch::with_capacity(chunk.len());
            for record in chunk {
                batch.push(SubscriberPayload::from(record));
            }
            batch
        })
        .collect()
}
