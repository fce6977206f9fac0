//! CLI argument parsing for pdfsplice.
//!
//! This module only describes the command line; `build.rs` includes it to
//! render the man page, so it depends on nothing but `clap` and `std`.

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Merge and split PDF documents.
///
/// pdfsplice concatenates PDF files into one document, or splits one
/// document into several by page ranges. Every output is a fresh,
/// self-contained PDF; encrypted inputs are rejected.
#[derive(Parser, Debug)]
#[command(name = "pdfsplice")]
#[command(version)]
#[command(about = "Merge and split PDF documents", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output; repeat for more log detail (-v, -vv, -vvv)
    ///
    /// Shows per-file details and statistics, and raises the log level
    /// written to stderr. RUST_LOG overrides the log level.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output
    ///
    /// Only errors and warnings will be printed.
    /// Useful for scripts and automation.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Number of input files loaded in parallel
    ///
    /// Default is number of CPU cores. Use 1 for sequential loading.
    #[arg(short, long, value_name = "N", global = true)]
    pub jobs: Option<usize>,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show page count and metadata of PDF files
    Info(InfoArgs),

    /// Concatenate PDF files into a single document
    ///
    /// Examples:
    ///   pdfsplice merge a.pdf b.pdf -o both.pdf
    ///   pdfsplice merge 'chapter*.pdf' -o book.pdf --title "The Book"
    Merge(MergeArgs),

    /// Split a PDF into several documents
    ///
    /// Examples:
    ///   pdfsplice split scan.pdf --ranges "1-3, 5, 8-10" -d parts/
    ///   pdfsplice split scan.pdf --each-page
    Split(SplitArgs),
}

/// Arguments of `info`.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// PDF files or glob patterns
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Print a JSON array instead of text
    #[arg(long)]
    pub json: bool,
}

/// Overwrite behavior shared by commands that write files.
#[derive(Args, Debug, Default)]
pub struct OverwriteArgs {
    /// Overwrite existing output files without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output files
    ///
    /// If an output file already exists, exit with an error
    /// instead of prompting or overwriting.
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,
}

/// Arguments of `merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// PDF files or glob patterns, merged in the order given
    #[arg(value_name = "FILE", required_unless_present = "input_list")]
    pub inputs: Vec<String>,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Read more input paths from a file (one path per line)
    ///
    /// Blank lines and lines starting with '#' are ignored. Paths from
    /// the list come after the ones given on the command line.
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    /// Set title metadata for the output
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Set author metadata for the output
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Set subject metadata for the output
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Set keywords metadata for the output (comma-separated)
    #[arg(long, value_name = "TEXT")]
    pub keywords: Option<String>,

    /// Write stream data uncompressed
    #[arg(long)]
    pub no_compress: bool,

    #[command(flatten)]
    pub overwrite: OverwriteArgs,

    /// Dry run - load inputs and report without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Arguments of `split`.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("mode").required(true).args(["ranges", "each_page"])))]
pub struct SplitArgs {
    /// PDF file to split
    #[arg(value_name = "FILE")]
    pub input: String,

    /// Comma-separated pages and spans, one output per item
    ///
    /// Page numbers are 1-based. Items selecting no existing page
    /// produce no file.
    ///
    /// Examples:
    ///   --ranges "1-3"       # one file with pages 1 to 3
    ///   --ranges "1,3,5"     # three single-page files
    ///   --ranges "1-5,10-15" # two files
    #[arg(short, long, value_name = "EXPR")]
    pub ranges: Option<String>,

    /// Write every page to its own file
    #[arg(short, long)]
    pub each_page: bool,

    /// Directory for the output files
    #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Write stream data uncompressed
    #[arg(long)]
    pub no_compress: bool,

    #[command(flatten)]
    pub overwrite: OverwriteArgs,

    /// Dry run - load the input and list outputs without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}
