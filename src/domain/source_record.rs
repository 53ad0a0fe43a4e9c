//! src/domain/source_record.rs

use uuid::Uuid;

/// A user whose profile has changed and has to be pushed to the third-party API.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SourceRecord {
    pub id: Uuid,
    pub email: String,
    pub time_zone: String,
    pub first_name: String,
    pub last_name: String,
}
