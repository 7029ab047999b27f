//! End-to-end scenarios run entirely through `pipeline::run()` against a
//! small in-memory trace fixture, checking the exact numbers the analytical
//! core is expected to produce.

use iotrace_metrics::ingest::mpi_types::StaticMpiTypeOracle;
use iotrace_metrics::ingest::TraceReader;
use iotrace_metrics::model::Record;
use iotrace_metrics::pipeline;

struct FixedTrace {
    funcs: Vec<String>,
    ranks: Vec<Vec<Record>>,
}

impl TraceReader for FixedTrace {
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

fn close_enough(a: f64, b: f64) -> bool { (a - b).abs() < 1e-6 }

#[test]
fn s1_single_write() {
    let trace = FixedTrace {
        funcs: vec!["write".to_owned()],
        ranks: vec![vec![record(0, 0, 0.0, 1.0, &["/data/a", "buf", "1048576"])]],
    };

    let report = pipeline::run(&trace, &StaticMpiTypeOracle).unwrap();
    let file = &report.files["/data/a"];

    assert_eq!(file.bytes_w, 1_048_576);
    assert!(close_enough(file.posix_op_time_w, 1.0));
    assert!(close_enough(file.posix_pure_bw_w, 1.0));
    assert!(close_enough(file.posix_meta_time_w, 1.0));
    assert!(close_enough(file.posix_e2e_bw_w, 1.0));
}

#[test]
fn s2_open_write_close() {
    let trace = FixedTrace {
        funcs: vec!["open".to_owned(), "write".to_owned(), "close".to_owned()],
        ranks: vec![vec![
            record(0, 0, 0.0, 0.1, &["/data/a"]),
            record(0, 1, 0.2, 0.4, &["/data/a", "buf", "2097152"]),
            record(0, 2, 0.5, 0.6, &["/data/a"]),
        ]],
    };

    let report = pipeline::run(&trace, &StaticMpiTypeOracle).unwrap();
    let file = &report.files["/data/a"];

    assert!(close_enough(file.posix_op_time_w, 0.2));
    assert!(close_enough(file.posix_pure_bw_w, 10.0));
    assert!(close_enough(file.posix_meta_time_w, 0.4));
    assert!(close_enough(file.posix_e2e_bw_w, 5.0));
}

#[test]
fn s3_straggler_rank_bounds_op_time() {
    let trace = FixedTrace {
        funcs: vec!["open".to_owned(), "write".to_owned(), "close".to_owned()],
        ranks: vec![
            vec![
                record(0, 0, -0.01, 0.0, &["/data/a"]),
                record(0, 1, 0.0, 0.1, &["/data/a", "buf", "1048576"]),
                record(0, 2, 0.1, 0.11, &["/data/a"]),
            ],
            vec![
                record(1, 0, -0.01, 0.0, &["/data/a"]),
                record(1, 1, 0.0, 1.0, &["/data/a", "buf", "1048576"]),
                record(1, 2, 1.0, 1.01, &["/data/a"]),
            ],
        ],
    };

    let report = pipeline::run(&trace, &StaticMpiTypeOracle).unwrap();
    let file = &report.files["/data/a"];

    assert_eq!(file.bytes_w, 2 * 1_048_576);
    assert!(close_enough(file.posix_op_time_w, 1.0));
    assert!(close_enough(file.posix_pure_bw_w, 2.0));
}

#[test]
fn s4_fcntl_enclosing_write_uses_tstart_only_rule() {
    let trace = FixedTrace {
        funcs: vec!["fcntl".to_owned(), "write".to_owned()],
        ranks: vec![vec![
            record(0, 0, 0.0, 0.5, &["/data/a"]),
            record(0, 1, 0.1, 0.2, &["/data/a", "buf", "1048576"]),
        ]],
    };

    let report = pipeline::run(&trace, &StaticMpiTypeOracle).unwrap();
    let file = &report.files["/data/a"];

    assert!(close_enough(file.posix_op_time_w, 0.1));
    assert!(close_enough(file.posix_meta_time_w, 0.6));
    assert!(close_enough(file.posix_e2e_bw_w, 1.0 / 0.6));
}

#[test]
fn s5_mpiio_handle_aliasing() {
    let trace = FixedTrace {
        funcs: vec!["MPI_File_open".to_owned(), "MPI_File_write_at".to_owned()],
        ranks: vec![vec![
            record(0, 0, 0.0, 0.01, &["comm", "/data/a", "amode", "info", "h7"]),
            record(0, 1, 0.01, 0.02, &["h7", "offset", "x", "1024", "MPI_DOUBLE"]),
        ]],
    };

    let report = pipeline::run(&trace, &StaticMpiTypeOracle).unwrap();
    let file = &report.files["/data/a"];

    assert_eq!(file.bytes_w, 8192);
}

/// Exercises "a size-change op pulls in its own bracketing open/close"
/// (§4.4) using `ftruncate` as the concrete POSIX function name, since
/// POSIX classification has no `set_size` branch (that name only appears
/// in the MPI-IO vocabulary) — the bracket-pulling logic treats both kinds
/// identically. A is an unrelated open/close pair; B brackets the
/// ftruncate; C is the write's own direct last-before/first-after
/// open/close, distinct from B, so the test actually exercises the
/// "pulled in via the ftruncate bracket" path rather than something direct
/// adjacency would already cover.
#[test]
fn s6_size_change_pulls_in_its_own_open_and_close() {
    let trace = FixedTrace {
        funcs: vec!["open".to_owned(), "close".to_owned(), "ftruncate".to_owned(), "write".to_owned()],
        ranks: vec![vec![
            record(0, 0, 0.0, 0.1, &["/data/a"]),  // open A
            record(0, 1, 0.2, 0.3, &["/data/a"]),  // close A
            record(0, 0, 0.4, 0.5, &["/data/a"]),  // open B
            record(0, 2, 0.6, 0.7, &["/data/a"]),  // ftruncate
            record(0, 1, 0.9, 1.0, &["/data/a"]),  // close B
            record(0, 0, 1.1, 1.2, &["/data/a"]),  // open C
            record(0, 3, 1.3, 1.4, &["/data/a", "buf", "1048576"]), // write
            record(0, 1, 1.5, 1.6, &["/data/a"]),  // close C
        ]],
    };

    let report = pipeline::run(&trace, &StaticMpiTypeOracle).unwrap();
    let file = &report.files["/data/a"];

    assert!(close_enough(file.posix_op_time_w, 0.1));
    assert!(close_enough(file.posix_meta_time_w, 0.6));
    assert!(close_enough(file.posix_e2e_bw_w, 1.0 / 0.6));
}

#[test]
fn zero_ranks_yields_all_zero_report() {
    let trace = FixedTrace { funcs: vec![], ranks: vec![] };
    let report = pipeline::run(&trace, &StaticMpiTypeOracle).unwrap();
    assert!(report.files.is_empty());
    assert_eq!(report.global.posix_write.total_bytes, 0);
}

/// An open/close-only file (no write/read data interval) is zero-activity
/// and must not appear in the reported per-file map, though an active
/// file alongside it still does (§4.5: excluded from per-file reporting,
/// but still enumerated during global aggregation).
#[test]
fn zero_activity_file_is_excluded_from_reported_files() {
    let trace = FixedTrace {
        funcs: vec!["open".to_owned(), "close".to_owned(), "write".to_owned()],
        ranks: vec![vec![
            record(0, 0, 0.0, 0.1, &["/data/idle"]),
            record(0, 1, 0.2, 0.3, &["/data/idle"]),
            record(0, 2, 0.0, 1.0, &["/data/a", "buf", "1048576"]),
        ]],
    };

    let report = pipeline::run(&trace, &StaticMpiTypeOracle).unwrap();

    assert!(!report.files.contains_key("/data/idle"));
    assert!(report.files.contains_key("/data/a"));
    assert_eq!(report.files.len(), 1);
}
