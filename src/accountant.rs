//! Byte Accountant (§4.2): reduces one layer's intervals to per-file byte
//! totals, then reconciles both layers' totals into the figures that end up
//! on `PerFileMetrics`.

use crate::model::{FileIntervals, OperationKind};
use std::collections::{BTreeMap, BTreeSet};

/// A file's write/read byte totals at a single layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileBytes {
    pub bytes_w: u64,
    pub bytes_r: u64,
}

/// Sums write/read byte counts per file for one layer's intervals.
#[must_use]
pub fn layer_bytes(intervals: &FileIntervals) -> BTreeMap<String, FileBytes> {
    intervals
        .iter()
        .map(|(filename, list)| {
            let mut bytes = FileBytes::default();
            for interval in list {
                match interval.op {
                    OperationKind::Write => bytes.bytes_w += interval.byte_count,
                    OperationKind::Read => bytes.bytes_r += interval.byte_count,
                    _ => {},
                }
            }
            (filename.clone(), bytes)
        })
        .collect()
}

/// Reconciles the two layers' per-file totals by taking the larger of the
/// two for each of write/read, over the union of filenames either layer
/// saw. The two layers observe the same user data through different APIs;
/// taking the larger is the chosen reconciliation (§4.2).
#[must_use]
pub fn combine(
    posix: &BTreeMap<String, FileBytes>,
    mpiio: &BTreeMap<String, FileBytes>,
) -> BTreeMap<String, FileBytes> {
    let filenames: BTreeSet<&String> = posix.keys().chain(mpiio.keys()).collect();

    filenames
        .into_iter()
        .map(|filename| {
            let p = posix.get(filename).copied().unwrap_or_default();
            let m = mpiio.get(filename).copied().unwrap_or_default();
            let combined = FileBytes {
                bytes_w: p.bytes_w.max(m.bytes_w),
                bytes_r: p.bytes_r.max(m.bytes_r),
            };
            (filename.clone(), combined)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypedInterval;

    fn interval(op: OperationKind, byte_count: u64) -> TypedInterval {
        TypedInterval {
            rank: 0,
            tstart: 0.0,
            tend: 1.0,
            op,
            byte_count,
        }
    }

    #[test]
    fn layer_bytes_sums_write_and_read_separately() {
        let mut intervals = FileIntervals::new();
        intervals.insert(
            "/data/a".to_owned(),
            vec![
                interval(OperationKind::Write, 100),
                interval(OperationKind::Write, 50),
                interval(OperationKind::Read, 10),
                interval(OperationKind::Open, 0),
            ],
        );

        let bytes = layer_bytes(&intervals);
        assert_eq!(bytes["/data/a"].bytes_w, 150);
        assert_eq!(bytes["/data/a"].bytes_r, 10);
    }

    #[test]
    fn combine_takes_the_larger_of_each_layer() {
        let mut posix = BTreeMap::new();
        posix.insert("/data/a".to_owned(), FileBytes { bytes_w: 100, bytes_r: 0 });

        let mut mpiio = BTreeMap::new();
        mpiio.insert("/data/a".to_owned(), FileBytes { bytes_w: 40, bytes_r: 20 });

        let combined = combine(&posix, &mpiio);
        assert_eq!(combined["/data/a"], FileBytes { bytes_w: 100, bytes_r: 20 });
    }

    #[test]
    fn combine_includes_files_seen_by_only_one_layer() {
        let mut posix = BTreeMap::new();
        posix.insert("/data/only-posix".to_owned(), FileBytes { bytes_w: 5, bytes_r: 0 });
        let mpiio = BTreeMap::new();

        let combined = combine(&posix, &mpiio);
        assert_eq!(combined["/data/only-posix"].bytes_w, 5);
    }
}
