//! Result entry models
//!
//! Severity-graded findings produced by executing a check.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a single finding, ordered from least to most severe
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Skipped,
    Error,
    Fatal,
}

impl Severity {
    /// Whether a finding of this severity means the check failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(Severity::Debug),
            "info" => Some(Severity::Info),
            "warn" | "warning" => Some(Severity::Warning),
            "skip" | "skipped" => Some(Severity::Skipped),
            "error" => Some(Severity::Error),
            "fatal" => Some(Severity::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Skipped => "SKIPPED",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        };
        write!(f, "{s}")
    }
}

/// Display status derived from a severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Warn,
    Skip,
    Fail,
    Pending,
}

impl TestStatus {
    pub fn from_severity(severity: Option<Severity>) -> Self {
        match severity {
            Some(Severity::Debug) | Some(Severity::Info) => TestStatus::Pass,
            Some(Severity::Warning) => TestStatus::Warn,
            Some(Severity::Skipped) => TestStatus::Skip,
            Some(Severity::Error) | Some(Severity::Fatal) => TestStatus::Fail,
            None => TestStatus::Pending,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Pass => "✓",
            TestStatus::Warn => "⚠",
            TestStatus::Skip => "○",
            TestStatus::Fail => "✗",
            TestStatus::Pending => "…",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestStatus::Pass => "PASS",
            TestStatus::Warn => "WARN",
            TestStatus::Skip => "SKIP",
            TestStatus::Fail => "FAIL",
            TestStatus::Pending => "PENDING",
        };
        write!(f, "{s}")
    }
}

/// A single finding reported by a check
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub severity: Severity,
    pub description: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultEntry {
    pub fn new(
        severity: Severity,
        description: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            description: description.into(),
            message: message.into(),
            error: None,
        }
    }

    pub fn info(description: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, description, message)
    }

    pub fn warning(description: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, description, message)
    }

    pub fn fatal(description: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, description, message)
    }

    /// Attach the rendered cause chain of an error
    pub fn with_error(mut self, error: &anyhow::Error) -> Self {
        self.error = Some(format!("{error:#}"));
        self
    }

    /// Attach a plain error description
    pub fn with_error_message(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl fmt::Display for ResultEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.description, self.message)?;
        if let Some(error) = &self.error {
            write!(f, " ({error})")?;
        }
        Ok(())
    }
}

/// Outcome of one check: an overall status entry plus detailed findings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Absent until the check has produced a result
    pub overall: Option<ResultEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<ResultEntry>,
}

impl ResultSummary {
    /// Summary consisting of a single overall entry
    pub fn single(entry: ResultEntry) -> Self {
        Self {
            overall: Some(entry),
            entries: Vec::new(),
        }
    }

    pub fn with_entries(overall: ResultEntry, entries: Vec<ResultEntry>) -> Self {
        Self {
            overall: Some(overall),
            entries,
        }
    }

    /// Highest severity across the overall entry and every finding
    pub fn max_severity(&self) -> Option<Severity> {
        self.overall
            .iter()
            .chain(self.entries.iter())
            .map(|e| e.severity)
            .max()
    }

    pub fn status(&self) -> TestStatus {
        TestStatus::from_severity(self.max_severity())
    }

    pub fn is_empty(&self) -> bool {
        self.overall.is_none() && self.entries.is_empty()
    }
}

impl From<ResultEntry> for ResultSummary {
    fn from(entry: ResultEntry) -> Self {
        Self::single(entry)
    }
}

/// The most severe finding becomes the overall entry; the first one wins ties.
impl From<Vec<ResultEntry>> for ResultSummary {
    fn from(entries: Vec<ResultEntry>) -> Self {
        let mut overall: Option<&ResultEntry> = None;
        for entry in &entries {
            if overall.map_or(true, |o| entry.severity > o.severity) {
                overall = Some(entry);
            }
        }
        Self {
            overall: overall.cloned(),
            entries,
        }
    }
}
