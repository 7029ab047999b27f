use crate::report::ReportFormat;
use crate::shell;
use clap::Clap;
use std::fmt;
use std::str::FromStr;

/// Auto-parsed CLI options, generated via clap.
#[derive(Clap)]
#[clap(
    version = "0.1.0",
    author = "Dana Whitfield",
    about = "Reduces an HPC I/O trace to a per-file and global bandwidth report"
)]
struct Opts {
    /// Path to the input trace file
    #[clap(short = 'i', long = "input", help = "path to the input trace file")]
    input: String,

    /// Path to write the report to
    #[clap(short = 'o', long = "output", help = "path to write the report to")]
    output: String,

    /// Report format, either `json` or `csv`
    #[clap(
        short = 'f',
        long = "format",
        default_value = "json",
        help = "report format, either `json` or `csv`"
    )]
    format: String,

    #[clap(flatten)]
    shell: shell::Options,
}

/// Resolved version of `Opts`, with the format string parsed and validated.
pub struct ResolvedOpts {
    pub input:  String,
    pub output: String,
    pub format: ReportFormat,
    pub shell:  shell::Options,
}

/// Parses and resolves CLI arguments, exiting the process (via clap's own
/// usage/version handling) if the arguments are malformed.
///
/// # Errors
///
/// Returns `ParseFailure` if `--format` names anything other than `json`
/// or `csv`.
pub fn load() -> Result<ResolvedOpts, ParseFailure> {
    let opts: Opts = Opts::parse();
    let format = ReportFormat::from_str(&opts.format)
        .map_err(|_| ParseFailure::new(String::from("report format"), opts.format.clone()))?;

    Ok(ResolvedOpts {
        input: opts.input,
        output: opts.output,
        format,
        shell: opts.shell,
    })
}

/// A value provided on the CLI failed to parse into its target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    field: String,
    value: String,
}

impl ParseFailure {
    #[must_use]
    pub fn new(field: String, value: String) -> Self { Self { field, value } }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value `{}` for {}", self.value, self.field)
    }
}

impl std::error::Error for ParseFailure {}
