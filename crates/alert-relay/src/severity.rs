//! Severity classification for relayed alerts.

/// Severity derived from an alert's free-text severity or status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Recovered or healthy
    Ok,
    /// Immediate action required
    Critical,
    /// Anything else, including no severity at all
    Warning,
}

/// Ordered classification rules. Evaluated top to bottom, first match wins.
const RULES: &[(&str, Severity)] = &[
    ("ok", Severity::Ok),
    ("resolved", Severity::Ok),
    ("critical", Severity::Critical),
    ("error", Severity::Critical),
];

impl Severity {
    /// Classify a severity/status string by case-insensitive substring match.
    ///
    /// `ok`/`resolved` are checked before `critical`/`error`, so
    /// `"ok-critical"` is [`Severity::Ok`]. Unmatched input is
    /// [`Severity::Warning`].
    #[must_use]
    pub fn classify(label: &str) -> Self {
        let label = label.to_lowercase();
        RULES
            .iter()
            .find(|(needle, _)| label.contains(needle))
            .map_or(Self::Warning, |(_, severity)| *severity)
    }

    /// Get the Slack attachment color for this severity.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Ok => "#36A64F",       // Green
            Self::Critical => "#FF0000", // Red
            Self::Warning => "#FFCC00",  // Yellow
        }
    }

    /// Get display name for this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "Ok",
            Self::Critical => "Critical",
            Self::Warning => "Warning",
        }
    }
}
