//! Configuration for file-based runs.
//!
//! The CLI turns its arguments into a [`Config`], which is validated once
//! and then drives loading, splicing and writing. It handles:
//! - Validation of argument combinations
//! - Defaults for parallelism and compression
//! - Mapping to the library's [`Options`] and [`OutputNaming`]

use std::path::PathBuf;

use anyhow::{Result, bail, ensure};

use crate::info::Metadata;
use crate::ops::{Options, OutputNaming};
use crate::writer::WriteOptions;

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Ask before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without asking.
    Force,
    /// Never overwrite; fail if an output exists.
    NoClobber,
}

/// How a split divides its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitMode {
    /// One output per non-empty range of a range expression.
    Ranges(String),
    /// One output per page.
    EachPage,
}

/// What a run does with its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Report page counts and metadata.
    Info {
        /// Print JSON instead of text.
        json: bool,
    },
    /// Concatenate all inputs into `output`.
    Merge {
        /// Output file path.
        output: PathBuf,
    },
    /// Split the single input into files under `output_dir`.
    Split {
        /// Ranges or one file per page.
        mode: SplitMode,
        /// Directory receiving the outputs.
        output_dir: PathBuf,
    },
}

/// Complete, validated settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input PDF paths, in order.
    pub inputs: Vec<PathBuf>,

    /// The operation to perform.
    pub task: Task,

    /// Load and plan, but write nothing.
    pub dry_run: bool,

    /// Verbose console output.
    pub verbose: bool,

    /// Suppress non-error console output.
    pub quiet: bool,

    /// What to do when an output file exists.
    pub overwrite_mode: OverwriteMode,

    /// Flate-compress unfiltered streams in outputs.
    pub compress: bool,

    /// Descriptive metadata for outputs.
    pub metadata: Metadata,

    /// Number of files loaded concurrently (None = one per CPU).
    pub jobs: Option<usize>,
}

impl Config {
    /// Create a configuration with default settings for `task`.
    pub fn new(inputs: Vec<PathBuf>, task: Task) -> Self {
        Self {
            inputs,
            task,
            dry_run: false,
            verbose: false,
            quiet: false,
            overwrite_mode: OverwriteMode::default(),
            compress: true,
            metadata: Metadata::default(),
            jobs: None,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - Jobs count is zero
    /// - A merge output is also one of its inputs
    /// - A split is given anything but exactly one input
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.inputs.is_empty(), "No input files specified");

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            bail!("Number of jobs must be at least 1");
        }

        match &self.task {
            Task::Info { .. } => {}
            Task::Merge { output } => {
                if let Some(input) = self.inputs.iter().find(|input| *input == output) {
                    bail!(
                        "Output file cannot be the same as an input file: {}",
                        input.display()
                    );
                }
            }
            Task::Split { .. } => {
                ensure!(
                    self.inputs.len() == 1,
                    "split takes exactly one input file, got {}",
                    self.inputs.len()
                );
            }
        }

        Ok(())
    }

    /// The configured job count, or the number of CPU cores.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Serializer settings.
    pub fn write_options(&self) -> WriteOptions {
        if self.compress {
            WriteOptions::new()
        } else {
            WriteOptions::uncompressed()
        }
    }

    /// Options for the library operations.
    pub fn options(&self) -> Options {
        Options {
            metadata: self.metadata.clone(),
            write: self.write_options(),
        }
    }

    /// Naming scheme for split outputs of the input called `file_name`.
    pub fn naming(&self, file_name: &str) -> OutputNaming {
        match &self.task {
            Task::Split {
                mode: SplitMode::EachPage,
                ..
            } => OutputNaming::per_page(file_name),
            _ => OutputNaming::Extraction,
        }
    }
}
