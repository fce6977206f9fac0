//! pdfsplice - merge and split PDF documents.
//!
//! Command-line front end of the `pdfsplice` library.

mod args;
mod cli;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tokio::task;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use pdfsplice::config::{Config, OverwriteMode, SplitMode, Task};
use pdfsplice::error::{PdfSpliceError, Result};
use pdfsplice::io::{PdfReader, PdfWriter, format_file_size};
use pdfsplice::ops::{describe, extract_ranges, merge_documents};
use pdfsplice::output::{OutputFormatter, display_load_statistics, display_metadata};
use pdfsplice::{Document, ranges};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_filter());

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Log to stderr; `RUST_LOG` takes precedence over `-v`/`-q`.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    let config = cli.to_config().await?;
    let formatter = OutputFormatter::from_config(&config);
    tracing::debug!(version = pdfsplice::VERSION, task = ?config.task, "starting");

    match &config.task {
        Task::Info { json } => run_info(&config, *json, &formatter).await,
        Task::Merge { output } => run_merge(&config, output, &formatter).await,
        Task::Split { mode, output_dir } => run_split(&config, mode, output_dir, &formatter).await,
    }
}

async fn run_info(config: &Config, json: bool, formatter: &OutputFormatter) -> Result<()> {
    let (results, stats) = PdfReader::new()
        .load_all(&config.inputs, config.effective_jobs())
        .await;

    let mut reports = Vec::with_capacity(results.len());
    for result in results {
        let loaded = result?;
        reports.push((loaded.path.display().to_string(), describe(&loaded.document)?));
    }

    if json {
        let entries = reports
            .iter()
            .map(|(file, metadata)| {
                let mut value = serde_json::to_value(metadata).map_err(json_error)?;
                if let Some(object) = value.as_object_mut() {
                    object.insert("file".to_string(), file.clone().into());
                }
                Ok(value)
            })
            .collect::<Result<Vec<_>>>()?;
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).map_err(json_error)?
        );
        return Ok(());
    }

    for (index, (file, metadata)) in reports.iter().enumerate() {
        if index > 0 {
            println!();
        }
        display_metadata(file, metadata);
    }
    if formatter.is_verbose() {
        formatter.blank_line();
        display_load_statistics(formatter, &stats);
    }
    Ok(())
}

async fn run_merge(config: &Config, output: &Path, formatter: &OutputFormatter) -> Result<()> {
    let writer = PdfWriter::new();
    writer.can_write(output).await?;

    // Handle output file existence
    if !config.dry_run {
        handle_output_overwrite(&[output.to_path_buf()], config.overwrite_mode, formatter).await?;
    }

    formatter.info(&format!("Loading {} file(s)...", config.inputs.len()));
    let (results, stats) = PdfReader::new()
        .load_all(&config.inputs, config.effective_jobs())
        .await;
    let loaded = results
        .into_iter()
        .enumerate()
        .map(|(index, result)| result.map_err(|err| PdfSpliceError::source_failed(index, err)))
        .collect::<Result<Vec<_>>>()?;

    if formatter.is_verbose() {
        display_load_statistics(formatter, &stats);
        for (index, pdf) in loaded.iter().enumerate() {
            formatter.list_item(
                index + 1,
                &format!(
                    "{} ({} pages, {})",
                    pdf.path.display(),
                    pdf.page_count,
                    format_file_size(pdf.file_size)
                ),
            );
        }
    }

    // Dry run mode - stop here
    if config.dry_run {
        formatter.blank_line();
        formatter.success("Dry run completed successfully");
        formatter.info(&format!(
            "  Output would be: {} ({} pages)",
            output.display(),
            stats.total_pages
        ));
        formatter.info("  Run without --dry-run to create the merged PDF");
        return Ok(());
    }

    let options = config.options();
    let documents: Vec<Document> = loaded.into_iter().map(|pdf| pdf.document).collect();
    let start = Instant::now();
    let bytes = task::spawn_blocking(move || merge_documents(&documents, &options))
        .await
        .map_err(|e| PdfSpliceError::other(format!("Merge task failed: {e}")))??;
    let merge_time = start.elapsed();

    let write_stats = writer.save_with_stats(bytes, output).await?;
    formatter.success(&format!(
        "Created {} ({} pages, {})",
        output.display(),
        stats.total_pages,
        write_stats.format_file_size()
    ));

    if formatter.is_verbose() {
        formatter.section("Statistics");
        formatter.detail("Input files", &stats.success_count.to_string());
        formatter.detail("Total pages", &stats.total_pages.to_string());
        formatter.detail("Input size", &stats.format_total_size());
        formatter.detail("Output size", &write_stats.format_file_size());
        formatter.detail(
            "Load time",
            &format!("{:.2}s", stats.total_time.as_secs_f64()),
        );
        formatter.detail(
            "Average load",
            &format!("{:.2}s", stats.average_time.as_secs_f64()),
        );
        formatter.detail("Merge time", &format!("{:.2}s", merge_time.as_secs_f64()));
        formatter.detail(
            "Write time",
            &format!("{:.2}s", write_stats.write_time.as_secs_f64()),
        );
        formatter.detail("Compression", if config.compress { "Yes" } else { "No" });
        if !config.metadata.is_empty() {
            formatter.detail("Metadata", "Set");
        }
    }

    Ok(())
}

async fn run_split(
    config: &Config,
    mode: &SplitMode,
    output_dir: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    let input = config
        .inputs
        .first()
        .ok_or_else(|| PdfSpliceError::invalid_config("No input file specified"))?;

    let loaded = PdfReader::new().load(input).await?;
    let plan = match mode {
        SplitMode::Ranges(expression) => ranges::plan(expression, loaded.page_count)?,
        SplitMode::EachPage => ranges::all_pages(loaded.page_count),
    };

    let naming = config.naming(&loaded.file_name());
    let selected: Vec<&[usize]> = plan
        .iter()
        .filter(|range| !range.is_empty())
        .map(|range| range.pages())
        .collect();
    let outputs: Vec<PathBuf> = (1..=selected.len())
        .map(|n| output_dir.join(naming.file_name(n)))
        .collect();

    let Some(first) = outputs.first() else {
        formatter.warning(&format!(
            "No pages of {} selected ({} pages); nothing to write",
            input.display(),
            loaded.page_count
        ));
        return Ok(());
    };
    let writer = PdfWriter::new();
    writer.can_write(first).await?;

    if config.dry_run {
        formatter.success("Dry run completed successfully");
        for (n, (path, pages)) in outputs.iter().zip(&selected).enumerate() {
            formatter.list_item(n + 1, &format!("{} ({})", path.display(), describe_pages(pages)));
        }
        return Ok(());
    }

    handle_output_overwrite(&outputs, config.overwrite_mode, formatter).await?;

    let options = config.options();
    let document = loaded.document;
    let parts = task::spawn_blocking(move || extract_ranges(&document, &plan, &options))
        .await
        .map_err(|e| PdfSpliceError::other(format!("Split task failed: {e}")))??;

    let written = writer
        .save_all(outputs.iter().cloned().zip(parts).collect())
        .await?;
    let mut total_size = 0;
    for stats in &written {
        formatter.debug(&format!(
            "{} ({})",
            stats.output_path.display(),
            stats.format_file_size()
        ));
        total_size += stats.file_size;
    }

    formatter.success(&format!(
        "Wrote {} file(s) to {} ({})",
        outputs.len(),
        output_dir.display(),
        format_file_size(total_size)
    ));
    Ok(())
}

/// Handle output file overwrite scenarios.
async fn handle_output_overwrite(
    paths: &[PathBuf],
    mode: OverwriteMode,
    formatter: &OutputFormatter,
) -> Result<()> {
    let writer = PdfWriter::new();
    let mut existing = Vec::new();
    for path in paths {
        if writer.exists(path).await {
            existing.push(path);
        }
    }

    let Some(first) = existing.first() else {
        return Ok(());
    };

    match mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(PdfSpliceError::output_exists(first.to_path_buf())),
        OverwriteMode::Prompt => {
            // Nobody to ask in quiet mode
            if formatter.is_quiet() {
                return Err(PdfSpliceError::output_exists(first.to_path_buf()));
            }

            for path in &existing {
                formatter.warning(&format!("Output file already exists: {}", path.display()));
            }

            use std::io::{self, Write};
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| PdfSpliceError::other(format!("Failed to read input: {err}")))?;

            let response = response.trim().to_lowercase();
            if response == "y" || response == "yes" {
                Ok(())
            } else {
                Err(PdfSpliceError::Cancelled)
            }
        }
    }
}

/// `page 3` or `pages 4-7`; ranges are always contiguous.
fn describe_pages(pages: &[usize]) -> String {
    match pages {
        [] => "no pages".to_string(),
        [page] => format!("page {page}"),
        [first, .., last] => format!("pages {first}-{last}"),
    }
}

fn json_error(err: serde_json::Error) -> PdfSpliceError {
    PdfSpliceError::other(format!("Failed to encode JSON: {err}"))
}
