//! Non-fatal drop accounting for §4.1. Dropping a malformed or
//! out-of-vocabulary record is ordinary control flow, not an error channel —
//! see `errors::CoreError` for the fatal counterpart.

use serde::Serialize;
use std::collections::BTreeMap;

/// Why a single trace record never made it into a `TypedInterval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// `func_id` fell outside the trace's function-name table.
    UnknownFunction,
    /// An MPI-IO handle was used before (or without) a matching
    /// `MPI_File_open` binding it to a filename.
    UnresolvedHandle,
    /// A required positional arg was missing or failed to parse as an
    /// integer.
    MalformedArgs,
    /// The function name passed the layer filter but matched nothing in the
    /// operation vocabulary.
    UnclassifiedOperation,
}

impl DropReason {
    #[must_use]
    fn label(self) -> &'static str {
        match self {
            Self::UnknownFunction => "unknown function id",
            Self::UnresolvedHandle => "unresolved MPI-IO handle",
            Self::MalformedArgs => "malformed arguments",
            Self::UnclassifiedOperation => "unclassified operation",
        }
    }
}

/// One dropped record, kept for diagnostic reporting rather than surfaced as
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedRecord {
    pub rank:    u32,
    pub func_id: u16,
    pub reason:  DropReason,
}

/// Accumulates `DroppedRecord`s across one builder pass (§4.1).
#[derive(Debug, Default, Clone)]
pub struct DiagnosticLog {
    dropped: Vec<DroppedRecord>,
}

impl DiagnosticLog {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn drop_record(&mut self, rank: u32, func_id: u16, reason: DropReason) {
        self.dropped.push(DroppedRecord { rank, func_id, reason });
    }

    #[must_use]
    pub fn records(&self) -> &[DroppedRecord] { &self.dropped }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.dropped.is_empty() }

    #[must_use]
    pub fn summary(&self) -> DiagnosticSummary {
        let mut by_reason: BTreeMap<String, usize> = BTreeMap::new();
        for dropped in &self.dropped {
            *by_reason.entry(dropped.reason.label().to_owned()).or_insert(0) += 1;
        }
        DiagnosticSummary {
            total_dropped: self.dropped.len(),
            by_reason,
        }
    }
}

/// The serializable, per-reason breakdown bundled into the final `Report`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DiagnosticSummary {
    pub total_dropped: usize,
    pub by_reason:     BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_groups_by_reason() {
        let mut log = DiagnosticLog::new();
        log.drop_record(0, 1, DropReason::MalformedArgs);
        log.drop_record(0, 2, DropReason::MalformedArgs);
        log.drop_record(1, 3, DropReason::UnresolvedHandle);

        let summary = log.summary();
        assert_eq!(summary.total_dropped, 3);
        assert_eq!(summary.by_reason["malformed arguments"], 2);
        assert_eq!(summary.by_reason["unresolved MPI-IO handle"], 1);
    }

    #[test]
    fn empty_log_is_empty() {
        assert!(DiagnosticLog::new().is_empty());
    }
}
