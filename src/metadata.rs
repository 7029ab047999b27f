//! Metadata Assigner (§4.4), the hardest subsystem: for each rank, attaches
//! the open/close/seek/sync/set_size/ftruncate/fcntl intervals that bracket
//! each data interval, then reduces to the per-file end-to-end bandwidth.

use crate::model::{OperationKind, TypedInterval};
use std::collections::HashSet;

const MIB: f64 = 1024.0 * 1024.0;

/// One rank's metadata intervals, partitioned by kind and sorted ascending
/// by `tstart` (inherited for free from the builder's global tstart sort,
/// since filtering a sorted sequence by rank/kind preserves relative
/// order).
struct MetaIndex {
    open:      Vec<TypedInterval>,
    close:     Vec<TypedInterval>,
    seek:      Vec<TypedInterval>,
    sync:      Vec<TypedInterval>,
    set_size:  Vec<TypedInterval>,
    ftruncate: Vec<TypedInterval>,
    fcntl:     Vec<TypedInterval>,
}

impl MetaIndex {
    fn build(intervals: &[TypedInterval], rank: u32) -> Self {
        let mut index = MetaIndex {
            open: Vec::new(),
            close: Vec::new(),
            seek: Vec::new(),
            sync: Vec::new(),
            set_size: Vec::new(),
            ftruncate: Vec::new(),
            fcntl: Vec::new(),
        };
        for interval in intervals.iter().filter(|iv| iv.rank == rank) {
            match interval.op {
                OperationKind::Open => index.open.push(*interval),
                OperationKind::Close => index.close.push(*interval),
                OperationKind::Seek => index.seek.push(*interval),
                OperationKind::Sync => index.sync.push(*interval),
                OperationKind::SetSize => index.set_size.push(*interval),
                OperationKind::Ftruncate => index.ftruncate.push(*interval),
                OperationKind::Fcntl => index.fcntl.push(*interval),
                OperationKind::Write | OperationKind::Read => {},
            }
        }
        index
    }
}

/// Largest index with `list[i].tstart <= target`, or `None` if the list is
/// empty or every element is past `target`.
fn bisect_le(list: &[TypedInterval], target: f64) -> Option<usize> {
    let mut lo = 0usize;
    let mut hi = list.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if list[mid].tstart <= target {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo.checked_sub(1)
}

/// `last-before(d, M)`: the latest `m` with `m.tend < threshold`. Found by
/// bisecting to the largest `tstart <= threshold`, then walking left while
/// the candidate's `tend` still overlaps (§4.4).
fn last_before(list: &[TypedInterval], threshold: f64) -> Option<usize> {
    let mut idx = bisect_le(list, threshold)?;
    loop {
        if list[idx].tend < threshold {
            return Some(idx);
        }
        idx = idx.checked_sub(1)?;
    }
}

/// The `fcntl` special case of `last-before`: only the `tstart` test (a
/// legitimately enclosing fcntl call may have `tend` far past `threshold`).
fn last_before_fcntl(list: &[TypedInterval], threshold: f64) -> Option<usize> {
    let mut lo = 0usize;
    let mut hi = list.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if list[mid].tstart < threshold {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo.checked_sub(1)
}

/// `first-after(d, M)`: the earliest `m` with `m.tstart > threshold`. Used
/// both for the plain rule (threshold = `d.tend`) and the `fcntl` special
/// case (threshold = `d.tstart`) — the two differ only in which timestamp
/// the caller passes in.
fn first_after(list: &[TypedInterval], threshold: f64) -> Option<usize> {
    let mut lo = 0usize;
    let mut hi = list.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if list[mid].tstart > threshold {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    if lo == list.len() {
        None
    } else {
        Some(lo)
    }
}

/// The three time components attributed to one rank/op pass: open and
/// close sums plus the conflated "other" bucket (seek, sync, set_size,
/// ftruncate, fcntl).
#[derive(Debug, Default, Clone, Copy)]
struct RankMetaTimes {
    open_time:  f64,
    close_time: f64,
    other_time: f64,
}

/// Assigns brackets to every data interval of `data_op` on one rank,
/// deduplicating within each of the three buckets, and sums their
/// durations.
fn assign_rank(index: &MetaIndex, data: &[TypedInterval], is_write: bool) -> RankMetaTimes {
    let mut used_open: HashSet<usize> = HashSet::new();
    let mut used_close: HashSet<usize> = HashSet::new();
    let mut used_seek: HashSet<usize> = HashSet::new();
    let mut used_sync: HashSet<usize> = HashSet::new();
    let mut used_set_size: HashSet<usize> = HashSet::new();
    let mut used_ftruncate: HashSet<usize> = HashSet::new();
    let mut used_fcntl: HashSet<usize> = HashSet::new();

    for d in data {
        if let Some(i) = last_before(&index.open, d.tstart) {
            used_open.insert(i);
        }
        if let Some(i) = first_after(&index.close, d.tend) {
            used_close.insert(i);
        }
        if let Some(i) = last_before(&index.seek, d.tstart) {
            used_seek.insert(i);
        }
        if let Some(i) = last_before_fcntl(&index.fcntl, d.tstart) {
            used_fcntl.insert(i);
        }
        if let Some(i) = first_after(&index.fcntl, d.tstart) {
            used_fcntl.insert(i);
        }

        if is_write {
            if let Some(i) = first_after(&index.sync, d.tend) {
                used_sync.insert(i);
            }
            if let Some(i) = last_before(&index.set_size, d.tstart) {
                used_set_size.insert(i);
                let m = index.set_size[i];
                if let Some(oi) = last_before(&index.open, m.tstart) {
                    used_open.insert(oi);
                }
                if let Some(ci) = first_after(&index.close, m.tend) {
                    used_close.insert(ci);
                }
            }
            if let Some(i) = last_before(&index.ftruncate, d.tstart) {
                used_ftruncate.insert(i);
                let m = index.ftruncate[i];
                if let Some(oi) = last_before(&index.open, m.tstart) {
                    used_open.insert(oi);
                }
                if let Some(ci) = first_after(&index.close, m.tend) {
                    used_close.insert(ci);
                }
            }
        }
    }

    let sum = |used: &HashSet<usize>, list: &[TypedInterval]| -> f64 {
        used.iter().map(|&i| list[i].duration()).sum()
    };

    RankMetaTimes {
        open_time: sum(&used_open, &index.open),
        close_time: sum(&used_close, &index.close),
        other_time: sum(&used_seek, &index.seek)
            + sum(&used_sync, &index.sync)
            + sum(&used_set_size, &index.set_size)
            + sum(&used_ftruncate, &index.ftruncate)
            + sum(&used_fcntl, &index.fcntl),
    }
}

/// The end-to-end time and bandwidth for one file/layer/operation (§4.4
/// per-file reduction). `meta_time` keeps the spec's own overload: it holds
/// the *end-to-end* time (pure time plus attributed metadata time), not
/// metadata time alone.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MetaTimeMetrics {
    pub meta_time: f64,
    pub e2e_bw:    f64,
}

/// Runs the Metadata Assigner for one (layer, file, operation), returning
/// the per-file end-to-end time and bandwidth.
///
/// `pure_time_per_rank` must be the same per-rank array the Pure-Time
/// Bandwidth Reducer computed for this operation, indexed by rank.
#[must_use]
pub fn assign_and_reduce(
    intervals: &[TypedInterval],
    total_ranks: u32,
    data_op: OperationKind,
    pure_time_per_rank: &[f64],
    bytes: u64,
) -> MetaTimeMetrics {
    let is_write = data_op == OperationKind::Write;
    let mut max_e2e = 0.0_f64;

    for rank in 0..total_ranks {
        let index = MetaIndex::build(intervals, rank);
        let data: Vec<TypedInterval> = intervals
            .iter()
            .copied()
            .filter(|iv| iv.rank == rank && iv.op == data_op)
            .collect();

        let times = assign_rank(&index, &data, is_write);
        let meta_time = times.open_time + times.close_time + times.other_time;
        let pure_time = pure_time_per_rank.get(rank as usize).copied().unwrap_or(0.0);
        let e2e_time = pure_time + meta_time;

        if e2e_time > max_e2e {
            max_e2e = e2e_time;
        }
    }

    let e2e_bw = if max_e2e > 0.0 && bytes > 0 {
        bytes as f64 / max_e2e / MIB
    } else {
        0.0
    };

    MetaTimeMetrics {
        meta_time: max_e2e,
        e2e_bw,
    }
}
