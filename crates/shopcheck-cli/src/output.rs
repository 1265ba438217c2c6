//! Report rendering for the terminal

use crate::commands::ReportFormat;
use crate::error::{CliError, CliResult};
use console::style;
use shopcheck::{SuiteReport, Verdict};

/// Writes suite reports to stdout
#[derive(Debug, Clone, Copy)]
pub struct ReportPrinter {
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode: only failures and the summary
    pub quiet: bool,
}

impl ReportPrinter {
    /// Create a printer
    #[must_use]
    pub const fn new(use_color: bool, quiet: bool) -> Self {
        Self { use_color, quiet }
    }

    /// Render `report` in `format`
    pub fn render(&self, report: &SuiteReport, format: ReportFormat) -> CliResult<String> {
        match format {
            ReportFormat::Json => serde_json::to_string_pretty(report)
                .map_err(|e| CliError::report_generation(e.to_string())),
            ReportFormat::Text => Ok(self.render_text(report)),
        }
    }

    fn render_text(&self, report: &SuiteReport) -> String {
        let mut out = String::new();
        for scenario in &report.scenarios {
            if self.quiet && scenario.verdict != Verdict::Failed {
                continue;
            }
            out.push_str(&format!(
                "{} {} ({}ms)",
                self.badge(scenario.verdict),
                scenario.name,
                scenario.duration_ms
            ));
            if let Some(message) = &scenario.message {
                out.push_str(&format!(": {message}"));
            }
            out.push('\n');
        }

        let summary = format!(
            "{} passed, {} failed, {} skipped against {} ({})",
            report.passed(),
            report.failed(),
            report.skipped(),
            report.base_url,
            report.browser
        );
        let summary = if !self.use_color {
            summary
        } else if report.is_success() {
            style(summary).green().bold().to_string()
        } else {
            style(summary).red().bold().to_string()
        };
        out.push('\n');
        out.push_str(&summary);
        out.push('\n');
        out
    }

    fn badge(&self, verdict: Verdict) -> String {
        let text = verdict.to_string();
        if !self.use_color {
            return text;
        }
        match verdict {
            Verdict::Passed => style(text).green().bold().to_string(),
            Verdict::Failed => style(text).red().bold().to_string(),
            Verdict::Skipped => style(text).yellow().to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn report() -> SuiteReport {
        serde_json::from_value(serde_json::json!({
            "started_at": "2026-01-01T00:00:00Z",
            "base_url": "https://www.saucedemo.com",
            "browser": "edge",
            "scenarios": [
                { "name": "login::valid_login", "verdict": "passed", "duration_ms": 12 },
                {
                    "name": "cart::clear_cart",
                    "verdict": "failed",
                    "duration_ms": 40,
                    "message": "badge still shows 1"
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_plain_text() {
        let text = ReportPrinter::new(false, false)
            .render(&report(), ReportFormat::Text)
            .unwrap();
        assert!(text.contains("PASS login::valid_login (12ms)"));
        assert!(text.contains("FAIL cart::clear_cart (40ms): badge still shows 1"));
        assert!(text.contains("1 passed, 1 failed, 0 skipped"));
    }

    #[test]
    fn test_quiet_keeps_failures() {
        let text = ReportPrinter::new(false, true)
            .render(&report(), ReportFormat::Text)
            .unwrap();
        assert!(!text.contains("login::valid_login"));
        assert!(text.contains("cart::clear_cart"));
    }

    #[test]
    fn test_json() {
        let json = ReportPrinter::new(false, false)
            .render(&report(), ReportFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["scenarios"][1]["verdict"], "failed");
        assert_eq!(value["browser"], "edge");
    }
}
