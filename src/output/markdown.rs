//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a run,
//! including statistics, a failure breakdown, and the per-URL outcome table.

use crate::output::summary::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generates a markdown summary of a run
///
/// # Arguments
///
/// * `summary` - The run summary data
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Summary report location for a metadata file: `<dir>/<stem>_summary.md`
///
/// # Example
///
/// ```
/// use document_ingestor::output::summary_path_for;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     summary_path_for(Path::new("state/crawl_metadata.json")),
///     PathBuf::from("state/crawl_metadata_summary.md")
/// );
/// ```
pub fn summary_path_for(metadata_path: &Path) -> PathBuf {
    let stem = metadata_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "crawl".to_string());
    metadata_path.with_file_name(format!("{}_summary.md", stem))
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();
    let stats = &summary.statistics;

    md.push_str("# Document Ingestor Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        summary.finished_at.to_rfc3339()
    ));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        summary.duration_seconds()
    ));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Status | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Fetched | {} |\n", stats.fetched));
    md.push_str(&format!("| Skipped | {} |\n", stats.skipped));
    md.push_str(&format!("| Failed | {} |\n", stats.failed));
    md.push_str(&format!("| **Total** | {} |\n\n", stats.total_urls));
    md.push_str(&format!(
        "Success rate: {:.2}%\n\n",
        stats.success_rate()
    ));

    // Failure summary
    if !stats.failures_by_kind.is_empty() {
        md.push_str("## Failure Summary\n\n");
        md.push_str("| Failure | Count |\n");
        md.push_str("|---------|-------|\n");

        let mut kinds: Vec<_> = stats.failures_by_kind.iter().collect();
        kinds.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (kind, count) in kinds {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');
    }

    // Per-URL outcomes
    if !summary.entries.is_empty() {
        md.push_str("## Documents\n\n");
        md.push_str("| URL | Status | SHA-256 | Detail |\n");
        md.push_str("|-----|--------|---------|--------|\n");

        for entry in &summary.entries {
            match &entry.result {
                Ok(record) => md.push_str(&format!(
                    "| {} | {} | `{}` | {} |\n",
                    entry.url,
                    record.status,
                    short_hash(&record.content_hash),
                    record.storage_path.display()
                )),
                Err(reason) => md.push_str(&format!(
                    "| {} | failed | - | {} |\n",
                    entry.url,
                    reason.to_string().replace('|', "\\|")
                )),
            }
        }
        md.push('\n');
    }

    md
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
