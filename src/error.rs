//! src/error.rs

use actix_web::http::StatusCode;
use actix_web::ResponseError;

pub type SyncResult<T> = Result<T, Error>;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// Failure of one of the stores a dispatch run depends on.
///
/// Without the stores there is nothing to recover from, so a run is aborted.
#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read pending records from the record store.")]
    RecordStore(#[source] anyhow::Error),
    #[error("Failed to access the request ledger.")]
    Ledger(#[source] anyhow::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error)]
pub enum Error {
    #[error("Dispatch run aborted")]
    StoreError(#[from] StoreError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::StoreError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
