mod cli;
mod shell;
mod util;

use anyhow::Context;
use iotrace_metrics::ingest::json::JsonTraceReader;
use iotrace_metrics::ingest::mpi_types::StaticMpiTypeOracle;
use iotrace_metrics::{pipeline, report};
use shell::Shell;
use std::process;

fn main() {
    human_panic::setup_panic!(human_panic::Metadata {
        name:     env!("CARGO_PKG_NAME").into(),
        version:  env!("CARGO_PKG_VERSION").into(),
        authors:  env!("CARGO_PKG_AUTHORS").into(),
        homepage: "https://github.com/example/iotrace-metrics/issues/new".into(),
    });

    let opts = match cli::load() {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("(error): {}", err);
            process::exit(1);
        },
    };

    let shell = Shell::new(&opts.shell);

    if let Err(err) = run(&opts, &shell) {
        shell.error(err);
        process::exit(1);
    }
}

/// Loads the trace, runs the pipeline, and writes the report, reporting
/// progress through `shell` along the way.
///
/// Each fallible step is wrapped with `anyhow::Context` so a failure names
/// which file it was reading or writing, not just the underlying
/// `CoreError`; `main` prints the resulting error chain via the shell.
fn run(opts: &cli::ResolvedOpts, shell: &Shell) -> anyhow::Result<()> {
    shell.status("Reading", &opts.input);
    let reader = JsonTraceReader::from_path(&opts.input)
        .with_context(|| format!("failed to read trace from `{}`", opts.input))?;
    let oracle = StaticMpiTypeOracle;

    shell.status("Analyzing", "POSIX and MPI-IO interval pipeline");
    let report = pipeline::run(&reader, &oracle).context("interval analysis pipeline failed")?;

    if !report.diagnostics.by_reason.is_empty() {
        shell.warn(format!(
            "dropped {} record(s) during ingest: {:?}",
            report.diagnostics.total_dropped, report.diagnostics.by_reason
        ));
    }

    let total_bytes: u64 = report.files.values().map(|f| f.bytes_w + f.bytes_r).sum();
    let human_total = byte_unit::Byte::from_bytes(u128::from(total_bytes))
        .get_appropriate_unit(false)
        .to_string();

    shell.status("Writing", format!("{} ({} across {} file(s))", opts.output, human_total, report.files.len()));
    report::write_report(&report, &opts.output, opts.format)
        .with_context(|| format!("failed to write report to `{}`", opts.output))?;

    shell.status("Finished", "report written successfully");
    Ok(())
}
