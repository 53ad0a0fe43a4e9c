//! src/dispatcher.rs

use crate::batcher::partition;
use crate::domain::{Batch, DispatchLimits, RequestKind, SourceRecord, SubscriberPayload};
use crate::error::{StoreError, SyncResult};
use crate::ledger::RequestLedger;
use crate::quota::QuotaGuard;
use crate::record_store::RecordStore;
use crate::transport::{Outcome, Transport};
use anyhow::Context;
use chrono::Utc;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{field::display, Instrument, Span};
use uuid::Uuid;

/// What a dispatch run did before it completed or was stopped.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DispatchReport {
    pub batches_sent: usize,
    pub batch_entries_recorded: usize,
    pub individuals_sent: usize,
    pub failed_sends: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success(DispatchReport),
    /// A ceiling was reached; nothing after the refused send was attempted.
    RateLimited {
        scope: RequestKind,
        report: DispatchReport,
    },
}

impl RunOutcome {
    pub fn report(&self) -> &DispatchReport {
        match self {
            RunOutcome::Success(report) => report,
            RunOutcome::RateLimited { report, .. } => report,
        }
    }
}

/// Pushes pending user updates to the third-party API within the hourly quotas.
///
/// All batches are sent first, then every record once more on its own.
/// Runs of one dispatcher never overlap.
pub struct Dispatcher {
    record_store: Arc<dyn RecordStore>,
    ledger: Arc<dyn RequestLedger>,
    transport: Arc<dyn Transport>,
    quota_guard: QuotaGuard,
    run_lock: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        record_store: Arc<dyn RecordStore>,
        ledger: Arc<dyn RequestLedger>,
        transport: Arc<dyn Transport>,
        limits: DispatchLimits,
    ) -> Self {
        Self {
            record_store,
            ledger,
            transport,
            quota_guard: QuotaGuard::new(limits),
            run_lock: Mutex::new(()),
        }
    }

    pub fn limits(&self) -> &DispatchLimits {
        self.quota_guard.limits()
    }

    /// Run on a task of its own and wait for it.
    ///
    /// Dropping the returned future does not stop the run, so every send that
    /// goes out still gets its ledger entry.
    pub async fn run_detached(self: Arc<Self>) -> SyncResult<RunOutcome> {
        let run = tokio::spawn(async move { self.run().await }.instrument(Span::current()));
        let outcome = run.await.context("Dispatch run task failed to complete.")??;
        Ok(outcome)
    }

    #[tracing::instrument(
        name = "Dispatch pending user updates",
        skip(self),
        fields(run_id = %Uuid::new_v4(), pending_records = tracing::field::Empty)
    )]
    pub async fn run(&self) -> Result<RunOutcome, StoreError> {
        let _guard = self.run_lock.lock().await;

        let records = self.record_store.list_pending().await?;
        Span::current().record("pending_records", &display(records.len()));
        let mut report = DispatchReport::default();

        let batches = partition(&records, self.limits().max_batch_size);
        if let ControlFlow::Break(scope) = self.batching_phase(&batches, &mut report).await? {
            return Ok(RunOutcome::RateLimited { scope, report });
        }
        if let ControlFlow::Break(scope) = self.individual_phase(&records, &mut report).await? {
            return Ok(RunOutcome::RateLimited { scope, report });
        }

        tracing::info!(
            batches_sent = report.batches_sent,
            individuals_sent = report.individuals_sent,
            failed_sends = report.failed_sends,
            "User updates sent"
        );
        Ok(RunOutcome::Success(report))
    }

    async fn batching_phase(
        &self,
        batches: &[Batch],
        report: &mut DispatchReport,
    ) -> Result<ControlFlow<RequestKind>, StoreError> {
        for batch in batches {
            if !self.admit(RequestKind::Batch).await? {
                return Ok(ControlFlow::Break(RequestKind::Batch));
            }
            let outcome = self.transport.send_batch(batch).await;
            log_outcome(&outcome, RequestKind::Batch, None);
            // one entry per subscriber, regardless of the outcome
            self.ledger
                .append_many(RequestKind::Batch, Utc::now(), batch.len())
                .await?;
            report.batches_sent += 1;
            report.batch_entries_recorded += batch.len();
            if !outcome.success {
                report.failed_sends += 1;
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn individual_phase(
        &self,
        records: &[SourceRecord],
        report: &mut DispatchReport,
    ) -> Result<ControlFlow<RequestKind>, StoreError> {
        for record in records {
            if !self.admit(RequestKind::Individual).await? {
                return Ok(ControlFlow::Break(RequestKind::Individual));
            }
            let payload = SubscriberPayload::from(record);
            let outcome = self.transport.send_individual(&payload).await;
            log_outcome(&outcome, RequestKind::Individual, Some(payload.email()));
            self.ledger
                .append(RequestKind::Individual, Utc::now())
                .await?;
            report.individuals_sent += 1;
            if !outcome.success {
                report.failed_sends += 1;
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn admit(&self, kind: RequestKind) -> Result<bool, StoreError> {
        let since = self.quota_guard.window_start(Utc::now());
        let current_count = self.ledger.count_since(kind, since).await?;
        Ok(self.quota_guard.admit(kind, current_count))
    }
}

fn log_outcome(outcome: &Outcome, kind: RequestKind, subscriber_email: Option<&str>) {
    let subscriber_email = subscriber_email.unwrap_or_default();
    if outcome.success {
        tracing::info!(
            request_kind = %kind,
            subscriber_email,
            response = %outcome.body,
            "Update sent successfully"
        );
    } else {
        tracing::error!(
            request_kind = %kind,
            subscriber_email,
            response = %outcome.body,
            "Failed to send update"
        );
    }
}
