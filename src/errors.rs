//! Fatal error types for the core (§7, §10.2). Non-fatal per-record drops
//! are handled entirely by `diagnostics::DiagnosticLog` and never surface
//! here.

use thiserror::Error;

/// The only error the core itself can raise. Everything else (malformed
/// records, empty traces) is ordinary, non-fatal control flow.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A hard invariant was violated by the input trace (`tstart > tend`, a
    /// rank index out of range). This is treated as a bug in the upstream
    /// trace reader, not a recoverable condition.
    #[error("invariant breach on rank {rank}: {detail}")]
    InvariantBreach { rank: u32, detail: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
