//! User-facing console output.
//!
//! Logging (via `tracing`) is for diagnosing the library; this module is for
//! telling the person at the terminal what happened.
//!
//! # Examples
//!
//! ```no_run
//! use pdfsplice::output::OutputFormatter;
//! use pdfsplice::config::Config;
//!
//! # fn example(config: Config) {
//! let formatter = OutputFormatter::from_config(&config);
//! formatter.info("Splitting scan.pdf");
//! formatter.success("Wrote 3 file(s)");
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::io::LoadStatistics;
use crate::ops::DocumentMetadata;

/// Display load statistics.
pub fn display_load_statistics(formatter: &OutputFormatter, stats: &LoadStatistics) {
    if stats.failure_count > 0 {
        formatter.warning(&format!("{} file(s) failed to load", stats.failure_count));
    }

    formatter.info(&format!(
        "Loaded {} file(s) in {:.2}s: {} pages, {}",
        stats.success_count,
        stats.total_time.as_secs_f64(),
        stats.total_pages,
        stats.format_total_size()
    ));
}

/// Lines describing one document, as printed by `info`.
pub fn metadata_lines(name: &str, metadata: &DocumentMetadata) -> Vec<String> {
    let mut lines = vec![
        name.to_string(),
        format!("  Pages:    {}", metadata.page_count),
        format!("  Version:  {}", metadata.version),
        format!("  Objects:  {}", metadata.object_count),
    ];
    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
        ("Producer", &metadata.producer),
        ("Creator", &metadata.creator),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            lines.push(format!("  {:<9} {value}", format!("{label}:")));
        }
    }
    lines
}

/// Print the `info` report for one document.
///
/// This is the command's result rather than a status message, so quiet mode
/// does not suppress it.
pub fn display_metadata(name: &str, metadata: &DocumentMetadata) {
    for line in metadata_lines(name, metadata) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> DocumentMetadata {
        DocumentMetadata {
            page_count: 12,
            version: "1.4".to_string(),
            object_count: 40,
            title: Some("Annual Report".to_string()),
            author: None,
            subject: None,
            keywords: None,
            producer: Some("pdfsplice".to_string()),
            creator: None,
        }
    }

    #[test]
    fn test_metadata_lines() {
        let lines = metadata_lines("report.pdf", &metadata());
        assert_eq!(lines[0], "report.pdf");
        assert_eq!(lines[1], "  Pages:    12");
        assert!(lines.iter().any(|l| l == "  Title:    Annual Report"));
        assert!(lines.iter().any(|l| l == "  Producer: pdfsplice"));
        assert!(!lines.iter().any(|l| l.contains("Author")));
    }
}
