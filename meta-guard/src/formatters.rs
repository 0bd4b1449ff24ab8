//! Result formatting and reporting for classification runs.
//!
//! This module provides different formatters for a [`ClassificationReport`],
//! allowing users to output results as JSON, human-readable text, or
//! Markdown for documentation purposes.
//!
//! Candidates are printed by column id unless the formatter is given a
//! [`Catalog`], in which case qualified column names are used.
//!
//! # Examples
//!
//! ```rust
//! use meta_guard::fk::ClassificationReport;
//! use meta_guard::formatters::{HumanFormatter, ResultFormatter};
//!
//! let report = ClassificationReport::empty(vec!["coverage".to_string()]);
//! let output = HumanFormatter::new().format(&report).unwrap();
//! assert!(output.contains("Classified 0 of 0 candidates"));
//! ```

use std::fmt::Write;
use std::sync::Arc;

use crate::catalog::{Catalog, ColumnId};
use crate::error::{MetaError, Result};
use crate::fk::{CandidateDecision, ClassificationReport, ForeignKeyLabel};

/// Configuration options for formatting classification reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include every classifier verdict under each decision
    pub include_partial_results: bool,
    /// Maximum number of decisions to display (`None` for all)
    pub max_decisions: Option<usize>,
    /// Only list decisions labelled as foreign keys
    pub only_foreign_keys: bool,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
    /// Whether to include run timestamps in output
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_partial_results: false,
            max_decisions: None,
            only_foreign_keys: false,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing the summary and foreign keys.
    pub fn minimal() -> Self {
        Self {
            include_partial_results: false,
            max_decisions: Some(20),
            only_foreign_keys: true,
            use_colors: false,
            include_timestamps: false,
        }
    }

    /// Creates a detailed configuration showing every decision and verdict.
    pub fn detailed() -> Self {
        Self {
            include_partial_results: true,
            max_decisions: None,
            only_foreign_keys: false,
            use_colors: true,
            include_timestamps: true,
        }
    }

    /// Sets whether classifier verdicts are included.
    pub fn with_partial_results(mut self, include: bool) -> Self {
        self.include_partial_results = include;
        self
    }

    /// Sets the maximum number of decisions to display.
    pub fn with_max_decisions(mut self, max: usize) -> Self {
        self.max_decisions = Some(max);
        self
    }

    /// Sets whether only foreign keys are listed.
    pub fn with_only_foreign_keys(mut self, only: bool) -> Self {
        self.only_foreign_keys = only;
        self
    }

    /// Sets whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Sets whether to include timestamps.
    pub fn with_timestamps(mut self, include: bool) -> Self {
        self.include_timestamps = include;
        self
    }

    /// The decisions selected by this configuration and the number left out.
    fn select<'a>(&self, report: &'a ClassificationReport) -> (Vec<&'a CandidateDecision>, usize) {
        let matching: Vec<&CandidateDecision> = report
            .decisions
            .iter()
            .filter(|d| !self.only_foreign_keys || d.decision.label == ForeignKeyLabel::ForeignKey)
            .collect();
        let shown = self
            .max_decisions
            .map_or(matching.len(), |max| max.min(matching.len()));
        let hidden = matching.len() - shown;
        (matching.into_iter().take(shown).collect(), hidden)
    }
}

/// Trait for formatting classification reports.
pub trait ResultFormatter {
    /// Formats a report into a string representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be rendered.
    fn format(&self, report: &ClassificationReport) -> Result<String>;

    /// Formats a report with explicit configuration.
    fn format_with_config(
        &self,
        report: &ClassificationReport,
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(report)
    }
}

/// Renders a candidate column by qualified name when a catalog is available.
fn column_label(catalog: Option<&Catalog>, id: ColumnId) -> String {
    catalog
        .and_then(|c| c.qualified_name(id))
        .unwrap_or_else(|| format!("[{id}]"))
}

fn candidate_label(catalog: Option<&Catalog>, decision: &CandidateDecision) -> String {
    format!(
        "{} ⊆ {}",
        column_label(catalog, decision.candidate.dependent_column_id),
        column_label(catalog, decision.candidate.referenced_column_id)
    )
}

fn render_error(e: std::fmt::Error) -> MetaError {
    MetaError::Internal(format!("Failed to render report: {e}"))
}

/// Formats classification reports as structured JSON.
///
/// The output is the serialized report with the configured decision
/// filter applied; partial results are dropped unless requested.
///
/// # Examples
///
/// ```rust
/// use meta_guard::formatters::{ResultFormatter, JsonFormatter};
/// # let report = meta_guard::fk::ClassificationReport::empty(Vec::new());
///
/// let formatter = JsonFormatter::new().with_pretty(false);
/// let json = formatter.format(&report).unwrap();
/// assert!(json.starts_with('{'));
/// ```
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    /// Creates a new JSON formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, report: &ClassificationReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &ClassificationReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let filtered = filter_report(report, config);

        let json = if self.pretty {
            serde_json::to_string_pretty(&filtered)
        } else {
            serde_json::to_string(&filtered)
        };
        json.map_err(|e| MetaError::Serialization(format!("Failed to serialize report to JSON: {e}")))
    }
}

/// Formats classification reports for console output.
///
/// # Examples
///
/// ```rust
/// use meta_guard::formatters::{FormatterConfig, HumanFormatter, ResultFormatter};
/// # let report = meta_guard::fk::ClassificationReport::empty(Vec::new());
///
/// let formatter = HumanFormatter::with_config(FormatterConfig::minimal());
/// println!("{}", formatter.format(&report).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
    catalog: Option<Arc<Catalog>>,
}

impl HumanFormatter {
    /// Creates a new human formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            catalog: None,
        }
    }

    /// Creates a new human formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            catalog: None,
        }
    }

    /// Resolves column ids to names through `catalog`.
    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    fn render(
        &self,
        output: &mut String,
        report: &ClassificationReport,
        config: &FormatterConfig,
    ) -> std::fmt::Result {
        let catalog = self.catalog.as_deref();
        let paint = |text: &str, color: &str| {
            if config.use_colors {
                format!("\x1b[{color}m{text}\x1b[0m")
            } else {
                text.to_string()
            }
        };

        writeln!(output)?;
        let status = if report.cancelled {
            format!("⚠️ {}", paint("Classification CANCELLED", "33"))
        } else {
            format!("✅ {}", paint("Classification COMPLETE", "32"))
        };
        writeln!(output, "{status}")?;
        writeln!(output)?;

        let metadata = &report.metadata;
        writeln!(
            output,
            "Classified {} of {} candidates in {}ms",
            metadata.candidates_classified,
            metadata.candidates_total,
            metadata.duration_ms()
        )?;
        writeln!(output, "Classifiers: {}", metadata.classifiers.join(", "))?;
        if config.include_timestamps {
            writeln!(output, "Started: {}", metadata.started_at.to_rfc3339())?;
            writeln!(output, "Finished: {}", metadata.finished_at.to_rfc3339())?;
        }

        writeln!(output)?;
        writeln!(output, "📊 Decisions:")?;
        for (label, count) in report.label_counts() {
            writeln!(output, "   {label}: {count}")?;
        }

        let (decisions, hidden) = config.select(report);
        if !decisions.is_empty() {
            writeln!(output)?;
            let heading = if config.only_foreign_keys {
                "🔗 Foreign Keys:"
            } else {
                "🔍 Candidates:"
            };
            writeln!(output, "{heading}")?;

            for (i, d) in decisions.iter().enumerate() {
                let label = match d.decision.label {
                    ForeignKeyLabel::ForeignKey => paint(d.decision.label.as_str(), "32"),
                    ForeignKeyLabel::NoForeignKey => paint(d.decision.label.as_str(), "31"),
                    ForeignKeyLabel::Unknown => paint(d.decision.label.as_str(), "33"),
                };
                writeln!(
                    output,
                    "   {}. {} {} ({:.2})",
                    i + 1,
                    candidate_label(catalog, d),
                    label,
                    d.decision.confidence
                )?;

                if config.include_partial_results {
                    for result in &d.partial_results {
                        writeln!(
                            output,
                            "      - {}: {} (weight {:.2})",
                            result.classifier.as_deref().unwrap_or("unnamed"),
                            result.label,
                            result.weight
                        )?;
                    }
                }
            }

            if hidden > 0 {
                writeln!(output, "   ... and {hidden} more decisions")?;
            }
        }

        Ok(())
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for HumanFormatter {
    fn format(&self, report: &ClassificationReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &ClassificationReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        self.render(&mut output, report, config)
            .map_err(render_error)?;
        Ok(output)
    }
}

/// Formats classification reports as Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    catalog: Option<Arc<Catalog>>,
    heading_level: u8,
}

impl MarkdownFormatter {
    /// Creates a new Markdown formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            catalog: None,
            heading_level: 2,
        }
    }

    /// Creates a new Markdown formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    /// Sets the base heading level (1-6).
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    /// Resolves column ids to names through `catalog`.
    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    fn render(
        &self,
        output: &mut String,
        report: &ClassificationReport,
        config: &FormatterConfig,
    ) -> std::fmt::Result {
        let catalog = self.catalog.as_deref();
        let h = "#".repeat(self.heading_level as usize);
        let metadata = &report.metadata;

        let status = if report.cancelled {
            "⚠️ Classification Report - CANCELLED"
        } else {
            "✅ Classification Report"
        };
        writeln!(output, "{h} {status}")?;
        writeln!(output)?;
        writeln!(output, "**Classifiers:** {}", metadata.classifiers.join(", "))?;
        if config.include_timestamps {
            writeln!(output, "**Started:** {}", metadata.started_at.to_rfc3339())?;
        }
        writeln!(output)?;

        writeln!(output, "{h}# Summary")?;
        writeln!(output)?;
        writeln!(output, "| Metric | Value |")?;
        writeln!(output, "|--------|-------|")?;
        writeln!(output, "| Candidates | {} |", metadata.candidates_total)?;
        writeln!(output, "| Classified | {} |", metadata.candidates_classified)?;
        for (label, count) in report.label_counts() {
            writeln!(output, "| {label} | {count} |")?;
        }
        writeln!(output, "| Duration | {}ms |", metadata.duration_ms())?;

        let (decisions, hidden) = config.select(report);
        if !decisions.is_empty() {
            writeln!(output)?;
            writeln!(output, "{h}# Decisions")?;
            writeln!(output)?;
            writeln!(output, "| # | Candidate | Label | Confidence |")?;
            writeln!(output, "|---|-----------|-------|------------|")?;
            for (i, d) in decisions.iter().enumerate() {
                writeln!(
                    output,
                    "| {} | `{}` | {} | {:.2} |",
                    i + 1,
                    candidate_label(catalog, d),
                    d.decision.label,
                    d.decision.confidence
                )?;
            }

            if config.include_partial_results {
                for (i, d) in decisions.iter().enumerate() {
                    writeln!(output)?;
                    writeln!(output, "{h}## Candidate #{}: `{}`", i + 1, candidate_label(catalog, d))?;
                    writeln!(output)?;
                    for result in &d.partial_results {
                        writeln!(
                            output,
                            "- **{}:** {} (weight {:.2})",
                            result.classifier.as_deref().unwrap_or("unnamed"),
                            result.label,
                            result.weight
                        )?;
                    }
                }
            }

            if hidden > 0 {
                writeln!(output)?;
                writeln!(
                    output,
                    "> **Note:** {hidden} additional decisions not shown in this report."
                )?;
            }
        }

        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for MarkdownFormatter {
    fn format(&self, report: &ClassificationReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &ClassificationReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        self.render(&mut output, report, config)
            .map_err(render_error)?;
        Ok(output)
    }
}

/// Applies the decision filter and drops what the configuration excludes.
fn filter_report(report: &ClassificationReport, config: &FormatterConfig) -> ClassificationReport {
    let (decisions, _) = config.select(report);
    let mut filtered = ClassificationReport {
        decisions: decisions.into_iter().cloned().collect(),
        metadata: report.metadata.clone(),
        cancelled: report.cancelled,
    };

    if !config.include_partial_results {
        for decision in &mut filtered.decisions {
            decision.partial_results.clear();
        }
    }

    filtered
}
