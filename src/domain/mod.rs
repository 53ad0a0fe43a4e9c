//! src/domain/mod.rs

mod batch;
mod dispatch_limits;
mod request_kind;
mod source_record;
mod subscriber_payload;

pub use batch::Batch;
pub use dispatch_limits::DispatchLimits;
pub use request_kind::RequestKind;
pub use source_record::SourceRecord;
pub use subscriber_payload::SubscriberPayload;
