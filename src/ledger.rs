//! src/ledger.rs

use crate::domain::RequestKind;
use crate::error::StoreError;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Mutex;

/// A single dispatch attempt as recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    pub kind: RequestKind,
    pub created_at: DateTime<Utc>,
}

/// Append-only log of dispatch attempts, used for hourly quota accounting.
#[async_trait]
pub trait RequestLedger: Send + Sync {
    async fn append(&self, kind: RequestKind, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Record `count` attempts of `kind` at the same instant.
    async fn append_many(
        &self,
        kind: RequestKind,
        at: DateTime<Utc>,
        count: usize,
    ) -> Result<(), StoreError> {
        for _ in 0..count {
            self.append(kind, at).await?;
        }
        Ok(())
    }

    /// Number of entries of `kind` created at or after `since`.
    async fn count_since(&self, kind: RequestKind, since: DateTime<Utc>)
        -> Result<u64, StoreError>;
}

pub struct PgRequestLedger {
    pool: PgPool,
}

impl PgRequestLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestLedger for PgRequestLedger {
    #[tracing::instrument(name = "Append to request ledger", skip(self))]
    async fn append(&self, kind: RequestKind, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO request_logs (request_type, created_at) VALUES ($1, $2)")
            .bind(kind)
            .bind(at)
            .execute(&self.pool)
            .await
            .context("Failed to insert into request_logs.")
            .map_err(StoreError::Ledger)?;
        Ok(())
    }

    #[tracing::instrument(name = "Append many to request ledger", skip(self))]
    async fn append_many(
        &self,
        kind: RequestKind,
        at: DateTime<Utc>,
        count: usize,
    ) -> Result<(), StoreError> {
        let count = i64::try_from(count)
            .context("Number of ledger entries does not fit into BIGINT.")
            .map_err(StoreError::Ledger)?;
        sqlx::query(
            r#"
            INSERT INTO request_logs (request_type, created_at)
            SELECT $1, $2
            FROM generate_series(1::BIGINT, $3)
            "#,
        )
        .bind(kind)
        .bind(at)
        .bind(count)
        .execute(&self.pool)
        .await
        .context("Failed to insert batch entries into request_logs.")
        .map_err(StoreError::Ledger)?;
        Ok(())
    }

    #[tracing::instrument(name = "Count request ledger entries", skip(self))]
    async fn count_since(
        &self,
        kind: RequestKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM request_logs
            WHERE request_type = $1 AND created_at >= $2
            "#,
        )
        .bind(kind)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count entries of request_logs.")
        .map_err(StoreError::Ledger)?;
        // COUNT(*) is never negative
        Ok(count.max(0) as u64)
    }
}

/// Ledger kept in process memory. Entries are lost on restart.
#[derive(Default)]
pub struct InMemoryRequestLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl InMemoryRequestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.lock().clone()
    }

    pub fn count(&self, kind: RequestKind) -> usize {
        self.lock().iter().filter(|e| e.kind == kind).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LedgerEntry>> {
        // entries are only ever pushed, a poisoned lock still holds a consistent log
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RequestLedger for InMemoryRequestLedger {
    async fn append(&self, kind: RequestKind, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.lock().push(LedgerEntry {
            kind,
            created_at: at,
        });
        Ok(())
    }

    async fn count_since(
        &self,
        kind: RequestKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count = self
            .lock()
            .iter()
            .filter(|e| e.kind == kind && e.created_at >= since)
            .count();
        Ok(count as u64)
    }
}
