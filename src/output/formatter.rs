//! Output formatters for run results
//!
//! Provides Table, JSON, CSV and summary renderings of status snapshots.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use super::DisplayComparator;
use crate::models::{ModuleResults, StatusSnapshot, TestResult, TestStatus};
use crate::utils::timer::format_duration_ms;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Status tallies over every result of a snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub passed: usize,
    pub warned: usize,
    pub skipped: usize,
    pub failed: usize,
    pub pending: usize,
}

impl StatusCounts {
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        let mut counts = Self::default();
        for result in snapshot.results() {
            match result.status() {
                TestStatus::Pass => counts.passed += 1,
                TestStatus::Warn => counts.warned += 1,
                TestStatus::Skip => counts.skipped += 1,
                TestStatus::Fail => counts.failed += 1,
                TestStatus::Pending => counts.pending += 1,
            }
        }
        counts
    }
}

/// A finished run as written to reports
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub target: String,
    pub generated_at: DateTime<Utc>,
    pub counts: StatusCounts,
    pub status: StatusSnapshot,
}

impl RunReport {
    pub fn new(target: impl Into<String>, status: StatusSnapshot) -> Self {
        Self {
            target: target.into(),
            generated_at: Utc::now(),
            counts: StatusCounts::from_snapshot(&status),
            status,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
    comparator: DisplayComparator,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
            comparator: DisplayComparator::default(),
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn with_comparator(mut self, comparator: DisplayComparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Modules and results in display order
    fn ordered(&self, snapshot: &StatusSnapshot) -> Vec<ModuleResults> {
        let mut modules = snapshot.module_results.clone();
        self.comparator.sort_modules(&mut modules);
        modules
    }

    fn status_label(&self, status: TestStatus) -> String {
        let label = format!("{} {}", status.symbol(), status);
        if !self.colorize {
            return label;
        }
        let color = match status {
            TestStatus::Pass => "32",
            TestStatus::Warn | TestStatus::Skip => "33",
            TestStatus::Fail => "31",
            TestStatus::Pending => "90",
        };
        format!("\x1b[{color}m{label}\x1b[0m")
    }

    /// One-line progress update for an in-flight snapshot
    pub fn format_progress(&self, snapshot: &StatusSnapshot) -> String {
        let percent = snapshot.progress_percent();
        let bar_len = ((percent / 5.0) as usize).min(20);
        format!(
            "[{}{}] {:5.1}% {}",
            "█".repeat(bar_len),
            "░".repeat(20 - bar_len),
            percent,
            snapshot
        )
    }

    /// Format a single test result
    pub fn format_result(&self, result: &TestResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Summary => format!(
                "{} {} ({})",
                result.status().symbol(),
                result.unit.name,
                format_duration_ms(result.time_taken_ms)
            ),
            OutputFormat::Table | OutputFormat::Csv => self.format_result_table(result),
        }
    }

    fn format_result_table(&self, result: &TestResult) -> String {
        let mut line = format!(
            "  {:28} {:24} [{:>8}]",
            result.unit.name,
            self.status_label(result.status()),
            format_duration_ms(result.time_taken_ms)
        );
        if let Some(overall) = &result.summary.overall {
            line.push_str(&format!("\n      {}", overall.message));
        }
        for entry in &result.summary.entries {
            if Some(entry) != result.summary.overall.as_ref() {
                line.push_str(&format!("\n      - {entry}"));
            }
        }
        line
    }

    /// Format a complete report
    pub fn format_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(self.format_report_table(report)),
            OutputFormat::Json => {
                serde_json::to_string(&self.sorted(report)).context("Failed to serialize report")
            }
            OutputFormat::JsonPretty => serde_json::to_string_pretty(&self.sorted(report))
                .context("Failed to serialize report"),
            OutputFormat::Csv => self.format_report_csv(report),
            OutputFormat::Summary => Ok(self.format_report_brief(report)),
        }
    }

    fn sorted(&self, report: &RunReport) -> RunReport {
        let mut sorted = report.clone();
        sorted.status.module_results = self.ordered(&report.status);
        sorted
    }

    fn format_report_table(&self, report: &RunReport) -> String {
        let mut output = String::new();

        output.push_str("\n═══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(" Runtime Test Results: {}\n", report.target));
        output.push_str(&format!(
            " Generated: {}\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str("═══════════════════════════════════════════════════════════════\n");

        for module in self.ordered(&report.status) {
            output.push_str(&format!("\n {}\n", module.module));
            output.push_str(" ───────────────────────────────────────────────────────────\n");
            for result in &module.results {
                output.push_str(&self.format_result_table(result));
                output.push('\n');
            }
        }

        let counts = report.counts;
        output.push_str("\n───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            " Total: {} | Pass: {} | Warn: {} | Skip: {} | Fail: {} | Not run: {}\n",
            report.status.total(),
            counts.passed,
            counts.warned,
            counts.skipped,
            counts.failed,
            counts.pending
        ));

        let never_ran = report.status.outstanding_ids();
        if report.status.done && !never_ran.is_empty() {
            output.push_str(" Never started (dependencies not satisfied):\n");
            for id in never_ran {
                output.push_str(&format!("   - {id}\n"));
            }
        }

        output
    }

    fn format_report_csv(&self, report: &RunReport) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "module",
            "id",
            "name",
            "status",
            "severity",
            "time_taken_ms",
            "description",
            "message",
            "error",
        ])?;

        for module in self.ordered(&report.status) {
            for result in &module.results {
                let overall = result.summary.overall.as_ref();
                writer.write_record([
                    module.module.clone(),
                    result.unit.id.clone(),
                    result.unit.name.clone(),
                    result.status().to_string(),
                    result
                        .max_severity()
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                    result.time_taken_ms.to_string(),
                    overall.map(|e| e.description.clone()).unwrap_or_default(),
                    overall.map(|e| e.message.clone()).unwrap_or_default(),
                    overall.and_then(|e| e.error.clone()).unwrap_or_default(),
                ])?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {e}"))?;
        String::from_utf8(bytes).context("CSV output is not valid UTF-8")
    }

    fn format_report_brief(&self, report: &RunReport) -> String {
        let counts = report.counts;
        format!(
            "{}: {}/{} passed, {} warnings, {} failed, {} not run",
            report.target,
            counts.passed,
            report.status.total(),
            counts.warned,
            counts.failed,
            counts.pending
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Write a report to a file
pub fn write_report_to_file(
    path: &str,
    report: &RunReport,
    format: OutputFormat,
    comparator: DisplayComparator,
) -> Result<()> {
    let formatter = ResultFormatter::new(format)
        .no_color()
        .with_comparator(comparator);
    let content = formatter.format_report(report)?;

    let mut file =
        std::fs::File::create(path).with_context(|| format!("Failed to create {path}"))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResultEntry, Severity, TestUnit};

    fn snapshot() -> StatusSnapshot {
        let ping = TestUnit::new("zookeeper", "zk-ping", "Ping Zookeeper");
        let list = TestUnit::new("hdfs", "hdfs-list", "List directory");
        let write = TestUnit::new("hdfs", "hdfs-write", "Write file").depends_on("missing");
        StatusSnapshot {
            module_results: vec![
                ModuleResults {
                    module: "zookeeper".to_string(),
                    outstanding: Vec::new(),
                    running: Vec::new(),
                    results: vec![TestResult::completed(
                        ping,
                        ResultEntry::info("Connected", "Reached zk:2181").into(),
                        12,
                    )],
                },
                ModuleResults {
                    module: "hdfs".to_string(),
                    outstanding: vec![write.clone()],
                    running: Vec::new(),
                    results: vec![
                        TestResult::pending(write),
                        TestResult::completed(
                            list,
                            ResultEntry::new(Severity::Error, "Denied", "Permission denied, \"root\"")
                                .into(),
                            40,
                        ),
                    ],
                },
            ],
            tests_done: 2,
            tests_running: 0,
            tests_outstanding: 1,
            done: true,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn test_status_counts() {
        let counts = StatusCounts::from_snapshot(&snapshot());
        assert_eq!(counts.passed, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.pending, 1);
    }

    #[test]
    fn test_table_report_uses_display_order() {
        let report = RunReport::new("dev-cluster", snapshot());
        let formatter = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .with_comparator(DisplayComparator::from_order(["zookeeper"]));
        let output = formatter.format_report(&report).unwrap();

        let zk = output.find(" zookeeper\n").unwrap();
        let hdfs = output.find(" hdfs\n").unwrap();
        assert!(zk < hdfs);
        // Same module orders by id
        assert!(output.find("List directory").unwrap() < output.find("Write file").unwrap());
        assert!(output.contains("Never started"));
        assert!(output.contains("   - hdfs-write"));
    }

    #[test]
    fn test_csv_report_escapes_fields() {
        let report = RunReport::new("dev-cluster", snapshot());
        let output = ResultFormatter::new(OutputFormat::Csv)
            .format_report(&report)
            .unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("module,id,name,status"));
        assert!(output.contains("\"Permission denied, \"\"root\"\"\""));
    }

    #[test]
    fn test_json_report_round_trips_through_value() {
        let report = RunReport::new("dev-cluster", snapshot());
        let output = ResultFormatter::new(OutputFormat::Json)
            .format_report(&report)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["target"], "dev-cluster");
        assert_eq!(value["status"]["done"], true);
        assert_eq!(value["counts"]["failed"], 1);
    }

    #[test]
    fn test_progress_line() {
        let mut snap = snapshot();
        snap.done = false;
        let line = ResultFormatter::default().format_progress(&snap);
        assert!(line.contains("66.7%"));
        assert!(line.contains("2/3 done"));
    }

    #[test]
    fn test_summary_report() {
        let report = RunReport::new("dev-cluster", snapshot());
        let output = ResultFormatter::new(OutputFormat::Summary)
            .format_report(&report)
            .unwrap();
        assert_eq!(output, "dev-cluster: 1/3 passed, 0 warnings, 1 failed, 1 not run");
    }
}
