//! Turning parsed arguments into a validated [`Config`].

use pdfsplice::config::{Config, OverwriteMode, SplitMode, Task};
use pdfsplice::error::Result;
use pdfsplice::info::Metadata;
use pdfsplice::utils::{collect_paths_for_patterns, read_input_list};

use crate::cli::{Cli, Command, OverwriteArgs};

impl OverwriteArgs {
    fn mode(&self) -> OverwriteMode {
        if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        }
    }
}

impl Cli {
    /// Expand inputs and build a validated configuration.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` for bad glob patterns or argument combinations
    /// - `FailedToReadInputList` if `--input-list` cannot be read
    pub async fn to_config(&self) -> Result<Config> {
        let mut config = match &self.command {
            Command::Info(args) => Config::new(
                collect_paths_for_patterns(&args.inputs)?,
                Task::Info { json: args.json },
            ),
            Command::Merge(args) => {
                let mut inputs = collect_paths_for_patterns(&args.inputs)?;
                if let Some(list) = &args.input_list {
                    inputs.extend(read_input_list(list).await?);
                }
                let mut config = Config::new(
                    inputs,
                    Task::Merge {
                        output: args.output.clone(),
                    },
                );
                config.metadata = Metadata::new(
                    args.title.clone(),
                    args.author.clone(),
                    args.subject.clone(),
                    args.keywords.clone(),
                );
                config.compress = !args.no_compress;
                config.overwrite_mode = args.overwrite.mode();
                config.dry_run = args.dry_run;
                config
            }
            Command::Split(args) => {
                let mode = match &args.ranges {
                    Some(expression) => SplitMode::Ranges(expression.clone()),
                    None => SplitMode::EachPage,
                };
                let mut config = Config::new(
                    collect_paths_for_patterns([&args.input])?,
                    Task::Split {
                        mode,
                        output_dir: args.output_dir.clone(),
                    },
                );
                config.compress = !args.no_compress;
                config.overwrite_mode = args.overwrite.mode();
                config.dry_run = args.dry_run;
                config
            }
        };

        config.verbose = self.verbose > 0;
        config.quiet = self.quiet;
        config.jobs = self.jobs;

        config.validate()?;
        Ok(config)
    }

    /// Default `tracing` filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pdfsplice::PdfSpliceError;
    use rstest::rstest;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pdfsplice").chain(args.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn test_merge_to_config() {
        let cli = parse(&[
            "merge",
            "a.pdf",
            "b.pdf",
            "-o",
            "out.pdf",
            "--title",
            "  Book ",
            "--no-compress",
        ]);
        let config = cli.to_config().await.unwrap();

        assert_eq!(config.inputs, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
        assert_eq!(
            config.task,
            Task::Merge {
                output: PathBuf::from("out.pdf")
            }
        );
        assert_eq!(config.metadata.title.as_deref(), Some("Book"));
        assert!(!config.compress);
        assert_eq!(config.overwrite_mode, OverwriteMode::Prompt);
    }

    #[rstest]
    #[case(&[], OverwriteMode::Prompt)]
    #[case(&["-f"], OverwriteMode::Force)]
    #[case(&["--no-clobber"], OverwriteMode::NoClobber)]
    #[tokio::test]
    async fn test_overwrite_modes(#[case] flags: &[&str], #[case] expected: OverwriteMode) {
        let mut args = vec!["split", "scan.pdf", "--each-page"];
        args.extend_from_slice(flags);
        let config = parse(&args).to_config().await.unwrap();
        assert_eq!(config.overwrite_mode, expected);
    }

    #[tokio::test]
    async fn test_split_to_config() {
        let cli = parse(&["split", "scan.pdf", "-r", "1-2, 4", "-d", "parts", "-n"]);
        let config = cli.to_config().await.unwrap();

        assert_eq!(
            config.task,
            Task::Split {
                mode: SplitMode::Ranges("1-2, 4".to_string()),
                output_dir: PathBuf::from("parts"),
            }
        );
        assert!(config.dry_run);
        assert!(config.compress);
    }

    #[tokio::test]
    async fn test_merge_output_equal_to_input_is_rejected() {
        let cli = parse(&["merge", "a.pdf", "-o", "a.pdf"]);
        let err = cli.to_config().await.unwrap_err();
        assert!(matches!(err, PdfSpliceError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_zero_jobs_is_rejected() {
        let cli = parse(&["info", "a.pdf", "-j", "0"]);
        assert!(cli.to_config().await.is_err());
    }

    #[tokio::test]
    async fn test_input_list_is_appended() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("list.txt");
        std::fs::write(&list, "c.pdf\n# comment\nd.pdf\n").unwrap();

        let list = list.to_string_lossy().into_owned();
        let cli = parse(&["merge", "a.pdf", "--input-list", &list, "-o", "out.pdf"]);
        let config = cli.to_config().await.unwrap();
        assert_eq!(
            config.inputs,
            vec![
                PathBuf::from("a.pdf"),
                PathBuf::from("c.pdf"),
                PathBuf::from("d.pdf")
            ]
        );
    }

    #[rstest]
    #[case(&["info", "a.pdf"], "warn")]
    #[case(&["info", "a.pdf", "-v"], "info")]
    #[case(&["info", "a.pdf", "-vv"], "debug")]
    #[case(&["info", "a.pdf", "-vvvv"], "trace")]
    #[case(&["info", "a.pdf", "-q"], "error")]
    fn test_log_filter(#[case] args: &[&str], #[case] expected: &str) {
        assert_eq!(parse(args).log_filter(), expected);
    }
}
