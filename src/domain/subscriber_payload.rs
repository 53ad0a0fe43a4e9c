//! src/domain/subscriber_payload.rs

use crate::domain::SourceRecord;

/// Profile data as the third-party API expects it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SubscriberPayload {
    email: String,
    time_zone: String,
    #[serde(rename = "name")]
    display_name: String,
}

impl SubscriberPayload {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl From<&SourceRecord> for SubscriberPayload {
    /// Fields are copied verbatim, no normalization or validation takes place.
    fn from(record: &SourceRecord) -> Self {
        Self {
            email: record.email.clone(),
            time_zone: record.time_zone.clone(),
            display_name: format!("{} {}", record.first_name, record.last_name),
        }
    }
}
