//! Global Aggregator (§4.5): reduces the per-file metrics map to the four
//! (layer, operation) global reductions, under both the aggregate and
//! average bandwidth semantics.

use crate::model::{GlobalMetrics, OpLayerMetrics, PerFileMetrics};

const MIB: f64 = 1024.0 * 1024.0;

/// One (layer, operation)'s worth of per-file figures, extracted from
/// `PerFileMetrics` by the caller so this module stays layer-agnostic.
struct PerFileSlice {
    bytes:    u64,
    op_time:  f64,
    e2e_time: f64,
    pure_bw:  f64,
    e2e_bw:   f64,
}

/// Reduces one (layer, operation) slice across all files to an
/// `OpLayerMetrics`. Zero-activity files (per `PerFileMetrics::is_zero_activity`)
/// are excluded from the average denominators but still contribute to
/// `total_bytes`/`max_*_time` via their (necessarily zero) slices.
fn reduce_slice(slices: &[(PerFileSlice, bool)]) -> OpLayerMetrics {
    let total_bytes: u64 = slices.iter().map(|(s, _)| s.bytes).sum();
    let max_op_time = slices.iter().map(|(s, _)| s.op_time).fold(0.0_f64, f64::max);
    let max_meta_time = slices.iter().map(|(s, _)| s.e2e_time).fold(0.0_f64, f64::max);

    let agg_pure_bw = if max_op_time > 0.0 {
        total_bytes as f64 / max_op_time / MIB
    } else {
        0.0
    };
    let agg_e2e_bw = if max_meta_time > 0.0 {
        total_bytes as f64 / max_meta_time / MIB
    } else {
        0.0
    };

    let active: Vec<&PerFileSlice> = slices.iter().filter(|(_, active)| *active).map(|(s, _)| s).collect();
    let avg_pure_bw = mean(active.iter().map(|s| s.pure_bw));
    let avg_e2e_bw = mean(active.iter().map(|s| s.e2e_bw));

    OpLayerMetrics {
        total_bytes,
        max_op_time,
        max_meta_time,
        agg_pure_bw,
        agg_e2e_bw,
        avg_pure_bw,
        avg_e2e_bw,
    }
}

fn mean<I: ExactSizeIterator<Item = f64>>(values: I) -> f64 {
    let count = values.len();
    if count == 0 {
        0.0
    } else {
        values.sum::<f64>() / count as f64
    }
}

/// Runs the Global Aggregator over every file's metrics, producing the four
/// (layer, operation) reductions.
#[must_use]
pub fn aggregate(files: &std::collections::BTreeMap<String, PerFileMetrics>) -> GlobalMetrics {
    let mut posix_write = Vec::with_capacity(files.len());
    let mut posix_read = Vec::with_capacity(files.len());
    let mut mpiio_write = Vec::with_capacity(files.len());
    let mut mpiio_read = Vec::with_capacity(files.len());

    for metrics in files.values() {
        let active = !metrics.is_zero_activity();

        posix_write.push((
            PerFileSlice {
                bytes: metrics.bytes_w,
                op_time: metrics.posix_op_time_w,
                e2e_time: metrics.posix_meta_time_w,
                pure_bw: metrics.posix_pure_bw_w,
                e2e_bw: metrics.posix_e2e_bw_w,
            },
            active,
        ));
        posix_read.push((
            PerFileSlice {
                bytes: metrics.bytes_r,
                op_time: metrics.posix_op_time_r,
                e2e_time: metrics.posix_meta_time_r,
                pure_bw: metrics.posix_pure_bw_r,
                e2e_bw: metrics.posix_e2e_bw_r,
            },
            active,
        ));
        mpiio_write.push((
            PerFileSlice {
                bytes: metrics.bytes_w,
                op_time: metrics.mpiio_op_time_w,
                e2e_time: metrics.mpiio_meta_time_w,
                pure_bw: metrics.mpiio_pure_bw_w,
                e2e_bw: metrics.mpiio_e2e_bw_w,
            },
            active,
        ));
        mpiio_read.push((
            PerFileSlice {
                bytes: metrics.bytes_r,
                op_time: metrics.mpiio_op_time_r,
                e2e_time: metrics.mpiio_meta_time_r,
                pure_bw: metrics.mpiio_pure_bw_r,
                e2e_bw: metrics.mpiio_e2e_bw_r,
            },
            active,
        ));
    }

    GlobalMetrics {
        posix_write: reduce_slice(&posix_write),
        posix_read: reduce_slice(&posix_read),
        mpiio_write: reduce_slice(&mpiio_write),
        mpiio_read: reduce_slice(&mpiio_read),
    }
}
