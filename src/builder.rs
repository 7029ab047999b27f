//! Interval Builder (§4.1): consumes a `TraceReader` for a single layer and
//! emits that layer's `FileIntervals`.

use crate::classify;
use crate::diagnostics::{DiagnosticLog, DropReason};
use crate::errors::CoreError;
use crate::ingest::{MpiTypeOracle, TraceReader};
use crate::model::{FileIntervals, Layer, OperationKind, TypedInterval};
use std::collections::HashMap;

/// A record that survived the layer filter, carrying its own rank (stamped
/// from the reader's per-rank iteration, not trusted from the record
/// itself) and owned copies of the fields the rest of the builder needs.
struct Candidate {
    rank:      u32,
    func_id:   u16,
    func_name: String,
    tstart:    f64,
    tend:      f64,
    args:      Vec<String>,
}

/// Runs one pass of the Interval Builder for `layer`, returning the
/// resulting `filename -> intervals` map.
///
/// # Errors
///
/// Returns `CoreError::InvariantBreach` if any record has `tstart > tend`;
/// this is treated as a bug in the upstream trace, not a recoverable
/// condition (§7).
pub fn build(
    reader: &dyn TraceReader,
    layer: Layer,
    oracle: &dyn MpiTypeOracle,
    diagnostics: &mut DiagnosticLog,
) -> Result<FileIntervals, CoreError> {
    let funcs = reader.funcs();
    let total_ranks = reader.total_ranks();

    let mut candidates = Vec::new();
    for rank in 0..total_ranks {
        for record in reader.records(rank) {
            if record.tstart > record.tend {
                return Err(CoreError::InvariantBreach {
                    rank,
                    detail: format!(
                        "func_id {} has tstart {} > tend {}",
                        record.func_id, record.tstart, record.tend
                    ),
                });
            }

            let func_name = match funcs.get(record.func_id as usize) {
                Some(name) => name,
                None => {
                    diagnostics.drop_record(rank, record.func_id, DropReason::UnknownFunction);
                    continue;
                },
            };

            let included = match layer {
                Layer::Posix => classify::passes_posix_filter(func_name),
                Layer::Mpiio => classify::passes_mpiio_filter(func_name),
            };
            if !included {
                continue;
            }

            candidates.push(Candidate {
                rank,
                func_id: record.func_id,
                func_name: func_name.clone(),
                tstart: record.tstart,
                tend: record.tend,
                args: record.args.clone(),
            });
        }
    }

    // §4.1 step 3: sort by tstart ascending, ties broken by rank ascending.
    candidates.sort_by(|a, b| {
        a.tstart
            .partial_cmp(&b.tstart)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.rank.cmp(&b.rank))
    });

    let mut handles: HashMap<String, String> = HashMap::new();
    let mut intervals: FileIntervals = FileIntervals::new();

    for candidate in candidates {
        let filename = match layer {
            Layer::Posix => resolve_posix_filename(&candidate, diagnostics),
            Layer::Mpiio => resolve_mpiio_filename(&candidate, &mut handles, diagnostics),
        };
        let filename = match filename {
            Some(filename) => filename,
            None => continue,
        };

        if classify::is_ignored_filename(&filename) {
            continue;
        }

        let interval = match layer {
            Layer::Posix => classify_posix_record(&candidate, diagnostics),
            Layer::Mpiio => classify_mpiio_record(&candidate, oracle, diagnostics),
        };
        let interval = match interval {
            Some(interval) => interval,
            None => continue,
        };

        intervals.entry(filename).or_default().push(interval);
    }

    Ok(intervals)
}

/// POSIX filename resolution (§4.1 step 4): the first arg.
fn resolve_posix_filename(candidate: &Candidate, diagnostics: &mut DiagnosticLog) -> Option<String> {
    match candidate.args.first() {
        Some(name) => Some(name.clone()),
        None => {
            diagnostics.drop_record(candidate.rank, candidate.func_id, DropReason::MalformedArgs);
            None
        },
    }
}

/// MPI-IO filename resolution (§4.1 step 4): `MPI_File_open` binds a handle
/// to a filename; every other MPI-IO call resolves its handle through the
/// binding recorded so far in this pass.
fn resolve_mpiio_filename(
    candidate: &Candidate,
    handles: &mut HashMap<String, String>,
    diagnostics: &mut DiagnosticLog,
) -> Option<String> {
    if candidate.func_name.contains("open") {
        match (candidate.args.get(1), candidate.args.get(4)) {
            (Some(filename), Some(handle)) => {
                handles.insert(handle.clone(), filename.clone());
                Some(filename.clone())
            },
            _ => {
                diagnostics.drop_record(candidate.rank, candidate.func_id, DropReason::MalformedArgs);
                None
            },
        }
    } else {
        match candidate.args.first() {
            Some(handle) => match handles.get(handle) {
                Some(filename) => Some(filename.clone()),
                None => {
                    diagnostics.drop_record(candidate.rank, candidate.func_id, DropReason::UnresolvedHandle);
                    None
                },
            },
            None => {
                diagnostics.drop_record(candidate.rank, candidate.func_id, DropReason::MalformedArgs);
                None
            },
        }
    }
}

fn classify_posix_record(candidate: &Candidate, diagnostics: &mut DiagnosticLog) -> Option<TypedInterval> {
    let op = match classify::classify_posix(&candidate.func_name) {
        Some(op) => op,
        None => {
            diagnostics.drop_record(candidate.rank, candidate.func_id, DropReason::UnclassifiedOperation);
            return None;
        },
    };

    let byte_count = if op.is_data() {
        match candidate.args.get(2).and_then(|arg| classify::parse_u64(arg)) {
            Some(count) => count,
            None => {
                diagnostics.drop_record(candidate.rank, candidate.func_id, DropReason::MalformedArgs);
                return None;
            },
        }
    } else {
        0
    };

    Some(TypedInterval {
        rank: candidate.rank,
        tstart: candidate.tstart,
        tend: candidate.tend,
        op,
        byte_count,
    })
}

fn classify_mpiio_record(
    candidate: &Candidate,
    oracle: &dyn MpiTypeOracle,
    diagnostics: &mut DiagnosticLog,
) -> Option<TypedInterval> {
    let op = match classify::classify_mpiio(&candidate.func_name) {
        Some(op) => op,
        None => {
            diagnostics.drop_record(candidate.rank, candidate.func_id, DropReason::UnclassifiedOperation);
            return None;
        },
    };

    let byte_count = if op.is_data() {
        // "_at" variants (MPI_File_write_at / MPI_File_read_at) carry an
        // extra leading offset arg, shifting count/datatype one slot right.
        let (count_idx, type_idx) = if candidate.func_name.contains("at") {
            (3, 4)
        } else {
            (2, 3)
        };

        let count = candidate.args.get(count_idx).and_then(|arg| classify::parse_u64(arg));
        let type_name = candidate.args.get(type_idx);

        match (count, type_name) {
            (Some(count), Some(type_name)) => {
                let element_size = oracle.size_of(classify::strip_mpi_prefix(type_name));
                count.saturating_mul(element_size)
            },
            _ => {
                diagnostics.drop_record(candidate.rank, candidate.func_id, DropReason::MalformedArgs);
                return None;
            },
        }
    } else {
        0
    };

    Some(TypedInterval {
        rank: candidate.rank,
        tstart: candidate.tstart,
        tend: candidate.tend,
        op,
        byte_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::mpi_types::StaticMpiTypeOracle;
    use crate::model::Record;

    struct FixedReader {
        funcs: Vec<String>,
        ranks: Vec<Vec<Record>>,
    }

    impl TraceReader for FixedReader {
        fn total_ranks(&self) -> u32 { self.ranks.len() as u32 }

        fn funcs(&self) -> &[String] { &self.funcs }

        fn records(&self, rank: u32) -> &[Record] {
            self.ranks.get(rank as usize).map_or(&[], Vec::as_slice)
        }
    }

    fn record(rank: u32, func_id: u16, tstart: f64, tend: f64, args: &[&str]) -> Record {
        Record {
            rank,
            func_id,
            tstart,
            tend,
            args: args.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    #[test]
    fn posix_pass_drops_non_posix_and_ignored_files() {
        let reader = FixedReader {
            funcs: vec!["write".to_owned(), "MPI_File_write_at".to_owned(), "open".to_owned()],
            ranks: vec![vec![
                record(0, 0, 0.0, 0.1, &["/data/a", "buf", "1024"]),
                record(0, 1, 0.2, 0.3, &["h1", "0", "buf", "1", "MPI_INT"]),
                record(0, 2, 0.4, 0.5, &["/proc/self/status"]),
            ]],
        };

        let mut diagnostics = DiagnosticLog::new();
        let intervals = build(&reader, Layer::Posix, &StaticMpiTypeOracle, &mut diagnostics).unwrap();

        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals["/data/a"].len(), 1);
        assert_eq!(intervals["/data/a"][0].byte_count, 1024);
    }

    #[test]
    fn mpiio_handle_aliasing_resolves_filename() {
        let reader = FixedReader {
            funcs: vec!["MPI_File_open".to_owned(), "MPI_File_write_at".to_owned()],
            ranks: vec![vec![
                record(0, 0, 0.0, 0.01, &["comm", "/data/a", "amode", "info", "h7"]),
                record(0, 1, 0.01, 0.02, &["h7", "0", "buf", "1024", "MPI_DOUBLE"]),
            ]],
        };

        let mut diagnostics = DiagnosticLog::new();
        let intervals = build(&reader, Layer::Mpiio, &StaticMpiTypeOracle, &mut diagnostics).unwrap();

        assert_eq!(intervals["/data/a"].len(), 2);
        let write = intervals["/data/a"].iter().find(|iv| iv.op == OperationKind::Write).unwrap();
        assert_eq!(write.byte_count, 8192);
    }

    #[test]
    fn unresolved_handle_is_dropped_with_diagnostic() {
        let reader = FixedReader {
            funcs: vec!["MPI_File_write_at".to_owned()],
            ranks: vec![vec![record(0, 0, 0.0, 0.1, &["h_unknown", "0", "buf", "1", "MPI_INT"])]],
        };

        let mut diagnostics = DiagnosticLog::new();
        let intervals = build(&reader, Layer::Mpiio, &StaticMpiTypeOracle, &mut diagnostics).unwrap();

        assert!(intervals.is_empty());
        assert_eq!(diagnostics.records().len(), 1);
        assert_eq!(diagnostics.records()[0].reason, DropReason::UnresolvedHandle);
    }

    #[test]
    fn invariant_breach_on_backwards_interval_is_fatal() {
        let reader = FixedReader {
            funcs: vec!["write".to_owned()],
            ranks: vec![vec![record(0, 0, 1.0, 0.5, &["/data/a", "buf", "1"])]],
        };

        let mut diagnostics = DiagnosticLog::new();
        let result = build(&reader, Layer::Posix, &StaticMpiTypeOracle, &mut diagnostics);
        assert!(matches!(result, Err(CoreError::InvariantBreach { .. })));
    }

    #[test]
    fn zero_ranks_yields_empty_intervals() {
        let reader = FixedReader {
            funcs: vec!["write".to_owned()],
            ranks: vec![],
        };

        let mut diagnostics = DiagnosticLog::new();
        let intervals = build(&reader, Layer::Posix, &StaticMpiTypeOracle, &mut diagnostics).unwrap();
        assert!(intervals.is_empty());
    }
}
