//! Reference `TraceReader`: a small line-delimited-friendly JSON format,
//! deserialized wholesale with `serde`/`serde_json`. Production readers
//! (Recorder-format, Darshan, etc.) are expected to implement `TraceReader`
//! themselves; this one exists so the crate is runnable end to end without
//! one.

use super::TraceReader;
use crate::errors::CoreError;
use crate::model::Record;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawRecord {
    func_id: u16,
    tstart:  f64,
    tend:    f64,
    #[serde(default)]
    args:    Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawTrace {
    funcs: Vec<String>,
    ranks: Vec<Vec<RawRecord>>,
}

/// Loads an entire trace into memory from a single JSON document shaped as
/// `{"funcs": [...], "ranks": [[record, ...], ...]}`, one inner array per
/// rank.
pub struct JsonTraceReader {
    funcs: Vec<String>,
    ranks: Vec<Vec<Record>>,
}

impl JsonTraceReader {
    /// Reads and parses the trace at `path`. Fails only on I/O or
    /// deserialization errors — malformed individual records are the
    /// Interval Builder's concern, not the reader's.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let file = File::open(path)?;
        let raw: RawTrace = serde_json::from_reader(BufReader::new(file))?;

        let ranks = raw
            .ranks
            .into_iter()
            .enumerate()
            .map(|(rank, records)| {
                records
                    .into_iter()
                    .map(|record| Record {
                        rank: rank as u32,
                        func_id: record.func_id,
                        tstart: record.tstart,
                        tend: record.tend,
                        args: record.args,
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            funcs: raw.funcs,
            ranks,
        })
    }
}

impl TraceReader for JsonTraceReader {
    fn total_ranks(&self) -> u32 { self.ranks.len() as u32 }

    fn funcs(&self) -> &[String] { &self.funcs }

    fn records(&self, rank: u32) -> &[Record] {
        self.ranks.get(rank as usize).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    /// Writes `contents` to a process-unique path under the OS temp
    /// directory; the caller removes it.
    fn write_temp_json(contents: &str) -> std::path::PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir()
            .join(format!("iotrace-metrics-test-{}-{id}.json", std::process::id()));
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        path
    }

    #[test]
    fn parses_a_minimal_trace() {
        let path = write_temp_json(
            r#"{
                "funcs": ["open", "write", "close"],
                "ranks": [
                    [
                        {"func_id": 0, "tstart": 0.0, "tend": 0.1, "args": ["/data/a"]},
                        {"func_id": 1, "tstart": 0.2, "tend": 0.4, "args": ["/data/a", "buf", "2097152"]},
                        {"func_id": 2, "tstart": 0.5, "tend": 0.6, "args": ["/data/a"]}
                    ]
                ]
            }"#,
        );

        let reader = JsonTraceReader::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(reader.total_ranks(), 1);
        assert_eq!(reader.funcs(), &["open", "write", "close"]);
        assert_eq!(reader.records(0).len(), 3);
        assert_eq!(reader.records(0)[1].rank, 0);
        assert_eq!(reader.records(1).len(), 0);
    }
}
