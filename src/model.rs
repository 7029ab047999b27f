//! Data model shared by every pipeline stage: the trace-level `Record`, the
//! classified `TypedInterval`, and the two output aggregates
//! (`PerFileMetrics`, `GlobalMetrics`).

use serde::Serialize;
use std::collections::BTreeMap;
use strum_macros::Display;

/// One returned call on some rank, as handed to the core by a `TraceReader`.
///
/// `tstart <= tend` is an ingest-time invariant; a violation is a fatal
/// `CoreError::InvariantBreach`, not a dropped record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub rank:    u32,
    pub func_id: u16,
    pub tstart:  f64,
    pub tend:    f64,
    pub args:    Vec<String>,
}

/// The interface layer a record's function name was classified into.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Posix,
    Mpiio,
}

/// The small vocabulary of operations a trace record can reduce to.
///
/// Not every kind exists at every layer: MPI-IO never produces `Seek`,
/// `Sync`, `Ftruncate`, or `Fcntl`; POSIX never produces `SetSize`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Write,
    Read,
    Open,
    Close,
    Seek,
    Sync,
    SetSize,
    Ftruncate,
    Fcntl,
}

impl OperationKind {
    /// Whether this kind carries transferred bytes (as opposed to being a
    /// pure metadata call).
    #[must_use]
    pub const fn is_data(self) -> bool { matches!(self, Self::Write | Self::Read) }
}

/// A record reduced to `(rank, tstart, tend, op, byte_count)`, the core
/// entity every downstream stage operates on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypedInterval {
    pub rank:       u32,
    pub tstart:     f64,
    pub tend:       f64,
    pub op:         OperationKind,
    pub byte_count: u64,
}

impl TypedInterval {
    #[must_use]
    pub fn duration(&self) -> f64 { self.tend - self.tstart }
}

/// `filename -> intervals`, time-ordered by `tstart` at the builder's output,
/// one instance per layer.
pub type FileIntervals = BTreeMap<String, Vec<TypedInterval>>;

/// Per-file metrics at both interface layers, under both accounting
/// policies. All times are seconds; all bandwidths are MiB/s (divisor
/// 1024^2).
///
/// Field naming keeps the spec's overload intentionally: `*_meta_time_*`
/// stores the *end-to-end* time (pure time plus attributed metadata time),
/// not metadata time alone — see the Metadata Assigner's per-file reduction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct PerFileMetrics {
    pub bytes_w: u64,
    pub bytes_r: u64,

    pub posix_op_time_w:   f64,
    pub posix_op_time_r:   f64,
    pub posix_meta_time_w: f64,
    pub posix_meta_time_r: f64,
    pub posix_pure_bw_w:   f64,
    pub posix_pure_bw_r:   f64,
    pub posix_e2e_bw_w:    f64,
    pub posix_e2e_bw_r:    f64,

    pub mpiio_op_time_w:   f64,
    pub mpiio_op_time_r:   f64,
    pub mpiio_meta_time_w: f64,
    pub mpiio_meta_time_r: f64,
    pub mpiio_pure_bw_w:   f64,
    pub mpiio_pure_bw_r:   f64,
    pub mpiio_e2e_bw_w:    f64,
    pub mpiio_e2e_bw_r:    f64,
}

impl PerFileMetrics {
    /// A file is zero-activity iff every write and read metric field is
    /// zero. Such files are excluded from global averages and from
    /// per-file reporting, but are still iterated over during aggregation.
    #[must_use]
    pub fn is_zero_activity(&self) -> bool {
        self.bytes_w == 0
            && self.bytes_r == 0
            && self.posix_op_time_w == 0.0
            && self.posix_op_time_r == 0.0
            && self.posix_meta_time_w == 0.0
            && self.posix_meta_time_r == 0.0
            && self.posix_pure_bw_w == 0.0
            && self.posix_pure_bw_r == 0.0
            && self.posix_e2e_bw_w == 0.0
            && self.posix_e2e_bw_r == 0.0
            && self.mpiio_op_time_w == 0.0
            && self.mpiio_op_time_r == 0.0
            && self.mpiio_meta_time_w == 0.0
            && self.mpiio_meta_time_r == 0.0
            && self.mpiio_pure_bw_w == 0.0
            && self.mpiio_pure_bw_r == 0.0
            && self.mpiio_e2e_bw_w == 0.0
            && self.mpiio_e2e_bw_r == 0.0
    }
}

/// Global reduction for a single (layer, operation) pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct OpLayerMetrics {
    pub total_bytes:  u64,
    pub max_op_time:  f64,
    pub max_meta_time: f64,
    pub agg_pure_bw:  f64,
    pub agg_e2e_bw:   f64,
    pub avg_pure_bw:  f64,
    pub avg_e2e_bw:   f64,
}

/// The four (layer, operation) reductions that make up the global report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct GlobalMetrics {
    pub posix_write: OpLayerMetrics,
    pub posix_read:  OpLayerMetrics,
    pub mpiio_write: OpLayerMetrics,
    pub mpiio_read:  OpLayerMetrics,
}
