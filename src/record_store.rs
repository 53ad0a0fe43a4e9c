//! src/record_store.rs

use crate::domain::SourceRecord;
use crate::error::StoreError;
use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Mutex;

/// Source of users whose profile has to be pushed to the third-party API.
///
/// Which users qualify is decided by the store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_pending(&self) -> Result<Vec<SourceRecord>, StoreError>;
}

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    #[tracing::instrument(name = "Get users that need an update", skip(self))]
    async fn list_pending(&self) -> Result<Vec<SourceRecord>, StoreError> {
        let records = sqlx::query_as::<_, SourceRecord>(
            r#"
            SELECT id, email, time_zone, first_name, last_name
            FROM users
            WHERE needs_update = TRUE
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to read users that need an update from database.")
        .map_err(StoreError::RecordStore)?;
        Ok(records)
    }
}

/// Record store kept in process memory. Every stored record is pending.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<Vec<SourceRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: SourceRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }
}

impl FromIterator<SourceRecord> for InMemoryRecordStore {
    fn from_iter<I: IntoIterator<Item = SourceRecord>>(iter: I) -> Self {
        Self {
            records: Mutex::new(iter.into_iter().collect()),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_pending(&self) -> Result<Vec<SourceRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}
