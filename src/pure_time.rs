//! Pure-Time Bandwidth Reducer (§4.3): per-rank summed durations, reduced to
//! a per-file max and the resulting pure bandwidth.

use crate::model::{OperationKind, TypedInterval};

const MIB: f64 = 1024.0 * 1024.0;

/// Sums `op`'s interval durations per rank, producing an array indexed by
/// rank. Shared with the Metadata Assigner, which adds attributed metadata
/// time on top of these same per-rank sums to get end-to-end time.
#[must_use]
pub fn per_rank_times(intervals: &[TypedInterval], total_ranks: u32, op: OperationKind) -> Vec<f64> {
    let mut times = vec![0.0; total_ranks as usize];
    for interval in intervals {
        if interval.op == op {
            if let Some(slot) = times.get_mut(interval.rank as usize) {
                *slot += interval.duration();
            }
        }
    }
    times
}

/// The reduced (op_time, pure_bw) pair for one file/layer/operation (§4.3
/// step 3).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PureTimeMetrics {
    pub op_time: f64,
    pub pure_bw: f64,
}

/// Takes the max of per-rank times as the file's pure-operation time — the
/// slowest rank bounds the wall-clock of a collective I/O phase — and
/// derives bandwidth from it.
#[must_use]
pub fn reduce(per_rank_times: &[f64], bytes: u64) -> PureTimeMetrics {
    let op_time = per_rank_times.iter().copied().fold(0.0_f64, f64::max);
    let pure_bw = if op_time > 0.0 && bytes > 0 {
        bytes as f64 / op_time / MIB
    } else {
        0.0
    };
    PureTimeMetrics { op_time, pure_bw }
}
