//! Output formatters for regeneration reports.
//!
//! Human-readable, JSON and compact renderings of the endpoints resolved per
//! document, plus the one-line summary.

use colored::Colorize;

use crate::workspace::{DocumentReport, RegenerateSummary};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored output.
    Pretty,
    /// JSON output for tooling integration.
    Json,
    /// Compact one-line-per-endpoint.
    Compact,
}

/// Format one document's report.
pub fn format_document(report: &DocumentReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Pretty => format_pretty(report),
        OutputFormat::Json => format_json(report),
        OutputFormat::Compact => format_compact(report),
    }
}

fn format_pretty(report: &DocumentReport) -> String {
    let mut output = String::new();

    let status = if let Some(ref error) = report.error {
        format!("{} {}", "✖".red(), error.red())
    } else if report.changed {
        "changed".green().bold().to_string()
    } else {
        "unchanged".dimmed().to_string()
    };
    output.push_str(&format!(
        "\n{} {}\n",
        report.path.display().to_string().bold().underline(),
        status
    ));

    for block in &report.blocks {
        let line_no = (block.line + 1).to_string();
        for endpoint in &block.endpoints {
            output.push_str(&format!(
                "  {} │ {} {}\n",
                line_no.dimmed(),
                verb_colored(&endpoint.http_verb),
                endpoint.full_url
            ));
        }
    }

    output
}

fn verb_colored(verb: &str) -> colored::ColoredString {
    match verb {
        "GET" => verb.green().bold(),
        "POST" => verb.yellow().bold(),
        "PUT" => verb.blue().bold(),
        "DELETE" => verb.red().bold(),
        _ => verb.cyan().bold(),
    }
}

fn format_json(report: &DocumentReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_default()
}

fn format_compact(report: &DocumentReport) -> String {
    let mut output = String::new();

    if let Some(ref error) = report.error {
        output.push_str(&format!("{}: error: {}\n", report.path.display(), error));
    }
    for block in &report.blocks {
        for endpoint in &block.endpoints {
            output.push_str(&format!(
                "{}:{}: {} {}\n",
                report.path.display(),
                block.line + 1,
                endpoint.http_verb,
                endpoint.full_url
            ));
        }
    }

    output
}

/// Format the whole summary as one JSON document.
pub fn format_summary_json(summary: &RegenerateSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_default()
}

/// Format the closing summary line.
pub fn format_summary(summary: &RegenerateSummary) -> String {
    let failures = summary.failures().count();
    let message = if summary.endpoint_count() == 0 {
        summary.message().yellow().to_string()
    } else {
        summary.message().green().bold().to_string()
    };

    if failures == 0 {
        message
    } else {
        format!(
            "{} ({} {})",
            message,
            failures.to_string().red().bold(),
            if failures == 1 { "failure" } else { "failures" }
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{Annotator, Document};

    fn create_test_report() -> DocumentReport {
        let doc = Document::new(
            "FilmController.java",
            "@RestController\npublic class F {\n  @DeleteMapping(\"/films/{id}\")\n  public void d(@PathVariable Long id) {}\n}\n",
        );
        DocumentReport {
            path: PathBuf::from("FilmController.java"),
            blocks: Annotator::new("https://localhost:8080").plan(&doc).blocks,
            changed: true,
            error: None,
        }
    }

    #[test]
    fn test_format_compact() {
        let output = format_compact(&create_test_report());
        assert_eq!(
            output,
            "FilmController.java:3: DELETE https://localhost:8080/films/{id:int}\n"
        );
    }

    #[test]
    fn test_format_json() {
        let output = format_json(&create_test_report());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["changed"], true);
        assert_eq!(value["blocks"][0]["endpoints"][0]["http_verb"], "DELETE");
        assert_eq!(
            value["blocks"][0]["endpoints"][0]["full_url"],
            "https://localhost:8080/films/{id:int}"
        );
    }

    #[test]
    fn test_format_pretty_mentions_endpoints() {
        colored::control::set_override(false);
        let output = format_pretty(&create_test_report());
        assert!(output.contains("FilmController.java changed"));
        assert!(output.contains("3 │ DELETE https://localhost:8080/films/{id:int}"));
    }

    #[test]
    fn test_summary_with_failures() {
        colored::control::set_override(false);
        let mut failed = create_test_report();
        failed.changed = false;
        failed.error = Some("failed to write".into());

        let summary = RegenerateSummary {
            base_url: "https://localhost:8080".into(),
            dry_run: false,
            documents: vec![create_test_report(), failed],
        };
        assert_eq!(
            format_summary(&summary),
            "Updated endpoint comments in 1 document (1 failure)"
        );

        let preview = RegenerateSummary {
            dry_run: true,
            ..summary
        };
        assert_eq!(
            format_summary(&preview),
            "Would update endpoint comments in 1 document (1 failure)"
        );
    }
}
