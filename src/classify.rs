//! Centralizes the trace's substring-based classification vocabulary in one
//! place, per the spec's own design note: adding new instrumentation should
//! mean editing one table here, not hunting through the pipeline.

use crate::model::OperationKind;

/// Substrings that exclude a record from the POSIX layer outright.
const POSIX_LAYER_EXCLUDE: &[&str] = &["MPI", "H5", "writev"];

/// Function names that contain `write`/`read` as a substring but are not
/// themselves the raw data-transfer calls the spec wants classified as
/// `Write`/`Read`.
const EXCLUDED_DATA_FUNCS: &[&str] = &["fwrite", "fread", "writev", "readv", "fprintf"];

const IGNORED_FILENAME_PREFIXES: &[&str] = &["/sys/", "/proc", "/etc/"];
const IGNORED_FILENAME_EXACT: &[&str] = &["stdout", "stderr", "stdin"];
const IGNORED_FILENAME_SUBSTRINGS: &[&str] = &[".locktest", "_cid-", "pipe:"];

/// The POSIX-pass layer filter (§4.1 step 2): included unless the function
/// name contains any of `MPI`, `H5`, `writev`.
#[must_use]
pub fn passes_posix_filter(func_name: &str) -> bool {
    !POSIX_LAYER_EXCLUDE.iter().any(|needle| func_name.contains(needle))
}

/// The MPI-IO-pass layer filter (§4.1 step 2): included only if the function
/// name contains `MPI`.
#[must_use]
pub fn passes_mpiio_filter(func_name: &str) -> bool { func_name.contains("MPI") }

/// The file-ignore filter (§4.1 step 5).
#[must_use]
pub fn is_ignored_filename(name: &str) -> bool {
    if name.is_empty() {
        return true;
    }
    if IGNORED_FILENAME_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
        return true;
    }
    if IGNORED_FILENAME_EXACT.contains(&name) {
        return true;
    }
    IGNORED_FILENAME_SUBSTRINGS.iter().any(|needle| name.contains(needle))
}

fn is_excluded_data_func(name: &str) -> bool {
    EXCLUDED_DATA_FUNCS.iter().any(|needle| name.contains(needle))
}

/// POSIX operation classification (§4.1 step 6), in priority order.
#[must_use]
pub fn classify_posix(name: &str) -> Option<OperationKind> {
    let excluded = is_excluded_data_func(name);
    if !excluded && (name.contains("write") || name.contains("pwrite")) {
        Some(OperationKind::Write)
    } else if !excluded && (name.contains("read") || name.contains("pread")) {
        Some(OperationKind::Read)
    } else if name.contains("open") {
        Some(OperationKind::Open)
    } else if name.contains("close") {
        Some(OperationKind::Close)
    } else if name.contains("seek") {
        Some(OperationKind::Seek)
    } else if name.contains("sync") {
        Some(OperationKind::Sync)
    } else if name.contains("ftruncate") {
        Some(OperationKind::Ftruncate)
    } else if name.contains("fcntl") {
        // Not in the spec's explicit substring table, but OperationKind::Fcntl
        // exists and the Metadata Assigner has dedicated fcntl rules (§4.4);
        // POSIX is the only layer that ever produces fcntl intervals.
        Some(OperationKind::Fcntl)
    } else {
        None
    }
}

/// MPI-IO operation classification (§4.1 step 6). Byte-count extraction is
/// left to the caller, since it needs the record's args and the type-size
/// oracle.
#[must_use]
pub fn classify_mpiio(name: &str) -> Option<OperationKind> {
    if name.contains("write") {
        Some(OperationKind::Write)
    } else if name.contains("read") {
        Some(OperationKind::Read)
    } else if name.contains("open") {
        Some(OperationKind::Open)
    } else if name.contains("close") {
        Some(OperationKind::Close)
    } else if name.contains("set_size") {
        Some(OperationKind::SetSize)
    } else {
        None
    }
}

/// Strips the `MPI_` prefix from a datatype name before handing it to the
/// `MpiTypeOracle`.
#[must_use]
pub fn strip_mpi_prefix(name: &str) -> &str { name.strip_prefix("MPI_").unwrap_or(name) }

/// Parses a trace arg as an unsigned integer byte/element count, dropping
/// the record (by returning `None`) on anything non-numeric.
#[must_use]
pub fn parse_u64(text: &str) -> Option<u64> { atoi::atoi::<u64>(text.as_bytes()) }
