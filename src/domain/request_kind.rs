//! src/domain/request_kind.rs

use std::fmt;

/// Type tag of an entry in the request ledger.
///
/// Each kind has its own hourly ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "request_kind", rename_all = "lowercase")]
pub enum RequestKind {
    Batch,
    Individual,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Batch => "batch",
            RequestKind::Individual => "individual",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
