//! Top-level orchestration: wires the Interval Builder, Byte Accountant,
//! Pure-Time Bandwidth Reducer, Metadata Assigner, and Global Aggregator
//! into one `Report`.

use crate::accountant::{self, FileBytes};
use crate::aggregate;
use crate::diagnostics::DiagnosticLog;
use crate::errors::CoreError;
use crate::ingest::{MpiTypeOracle, TraceReader};
use crate::metadata;
use crate::model::{FileIntervals, Layer, OperationKind, PerFileMetrics};
use crate::pure_time;
use crate::report::Report;
use std::collections::{BTreeMap, BTreeSet};

/// Runs the full pipeline over a trace, producing the bundled `Report`.
///
/// # Errors
///
/// Propagates `CoreError::InvariantBreach` from the Interval Builder if
/// either layer's pass encounters a record with `tstart > tend` (§7).
pub fn run(reader: &dyn TraceReader, oracle: &dyn MpiTypeOracle) -> Result<Report, CoreError> {
    let total_ranks = reader.total_ranks();
    let mut diagnostics = DiagnosticLog::new();

    let posix = crate::builder::build(reader, Layer::Posix, oracle, &mut diagnostics)?;
    let mpiio = crate::builder::build(reader, Layer::Mpiio, oracle, &mut diagnostics)?;

    let posix_bytes = accountant::layer_bytes(&posix);
    let mpiio_bytes = accountant::layer_bytes(&mpiio);
    let combined_bytes = accountant::combine(&posix_bytes, &mpiio_bytes);

    let filenames: BTreeSet<&String> = posix.keys().chain(mpiio.keys()).collect();

    let mut files: BTreeMap<String, PerFileMetrics> = BTreeMap::new();
    for filename in filenames {
        let bytes = combined_bytes.get(filename).copied().unwrap_or_default();
        let metrics = file_metrics(&posix, &mpiio, filename, total_ranks, bytes);
        files.insert(filename.clone(), metrics);
    }

    // The Global Aggregator needs every file enumerated (zero-activity ones
    // contribute their necessarily-zero slice to totals/maxima, §4.5), but
    // the reported per-file map excludes them, per the same section.
    let global = aggregate::aggregate(&files);
    files.retain(|_, metrics| !metrics.is_zero_activity());

    Ok(Report {
        files,
        global,
        diagnostics: diagnostics.summary(),
    })
}

/// Computes one file's full `PerFileMetrics` row across both layers and
/// both operations.
fn file_metrics(
    posix: &FileIntervals,
    mpiio: &FileIntervals,
    filename: &str,
    total_ranks: u32,
    bytes: FileBytes,
) -> PerFileMetrics {
    let empty = Vec::new();
    let posix_intervals = posix.get(filename).unwrap_or(&empty);
    let mpiio_intervals = mpiio.get(filename).unwrap_or(&empty);

    let (posix_op_time_w, posix_pure_bw_w, posix_meta_time_w, posix_e2e_bw_w) =
        reduce_op(posix_intervals, total_ranks, OperationKind::Write, bytes.bytes_w);
    let (posix_op_time_r, posix_pure_bw_r, posix_meta_time_r, posix_e2e_bw_r) =
        reduce_op(posix_intervals, total_ranks, OperationKind::Read, bytes.bytes_r);
    let (mpiio_op_time_w, mpiio_pure_bw_w, mpiio_meta_time_w, mpiio_e2e_bw_w) =
        reduce_op(mpiio_intervals, total_ranks, OperationKind::Write, bytes.bytes_w);
    let (mpiio_op_time_r, mpiio_pure_bw_r, mpiio_meta_time_r, mpiio_e2e_bw_r) =
        reduce_op(mpiio_intervals, total_ranks, OperationKind::Read, bytes.bytes_r);

    PerFileMetrics {
        bytes_w: bytes.bytes_w,
        bytes_r: bytes.bytes_r,
        posix_op_time_w,
        posix_op_time_r,
        posix_meta_time_w,
        posix_meta_time_r,
        posix_pure_bw_w,
        posix_pure_bw_r,
        posix_e2e_bw_w,
        posix_e2e_bw_r,
        mpiio_op_time_w,
        mpiio_op_time_r,
        mpiio_meta_time_w,
        mpiio_meta_time_r,
        mpiio_pure_bw_w,
        mpiio_pure_bw_r,
        mpiio_e2e_bw_w,
        mpiio_e2e_bw_r,
    }
}

/// Runs the Pure-Time Bandwidth Reducer and Metadata Assigner for one
/// (file, layer, operation), returning `(op_time, pure_bw, meta_time, e2e_bw)`.
fn reduce_op(
    intervals: &[crate::model::TypedInterval],
    total_ranks: u32,
    op: OperationKind,
    bytes: u64,
) -> (f64, f64, f64, f64) {
    let per_rank = pure_time::per_rank_times(intervals, total_ranks, op);
    let pure = pure_time::reduce(&per_rank, bytes);
    let meta = metadata::assign_and_reduce(intervals, total_ranks, op, &per_rank, bytes);
    (pure.op_time, pure.pure_bw, meta.meta_time, meta.e2e_bw)
}
