//! Structural quality gate.
//!
//! Computes per-record structural metrics — LOC, cyclomatic complexity,
//! maximum lexical nesting depth, synthetic-docstring flag — and checks them
//! against the configured bounds. Metrics are computed independently of
//! dedup order and reported as computed, never corrected; a record failing
//! any bound is dropped with an explicit reason. The whole gate can be
//! toggled off, turning evaluation into a pass-through while the per-record
//! malformed-input check stays active.

use aho_corasick::AhoCorasick;

use crate::core::config::QualityGateConfig;
use crate::core::errors::{Result, ShardsmithError};
use crate::core::records::{FunctionRecord, QualityMetrics};
use crate::detectors::minhash::tokenize;

/// Tokens counted as decision points for cyclomatic complexity.
const DECISION_TOKENS: &[&str] = &[
    "if", "elif", "for", "while", "except", "catch", "case", "and", "or", "&&", "||", "?",
];

/// One bound the metrics violated.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityViolation {
    /// Metric that failed
    pub metric: String,

    /// Computed value
    pub value: f64,

    /// Configured bound it crossed
    pub limit: f64,

    /// Human-readable description
    pub message: String,
}

/// Result of evaluating a record's metrics against the gate.
#[derive(Debug, Clone, Default)]
pub struct QualityVerdict {
    /// Bounds the record violated, empty for a pass
    pub violations: Vec<QualityViolation>,
}

impl QualityVerdict {
    /// True when no bound was violated.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Message of the first violation, for drop-decision detail.
    pub fn first_message(&self) -> Option<&str> {
        self.violations.first().map(|v| v.message.as_str())
    }
}

/// Configurable structural quality gate.
#[derive(Debug)]
pub struct QualityGate {
    config: QualityGateConfig,
    synthetic_matcher: Option<AhoCorasick>,
}

impl QualityGate {
    /// Build a gate from configuration, compiling the synthetic rule table.
    pub fn new(config: QualityGateConfig) -> Result<Self> {
        let synthetic_matcher = if config.synthetic_docstrings.patterns.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::new(&config.synthetic_docstrings.patterns).map_err(|e| {
                    ShardsmithError::config_field(
                        format!("invalid synthetic docstring rule table: {e}"),
                        "quality.synthetic_docstrings.patterns",
                    )
                })?,
            )
        };

        Ok(Self {
            config,
            synthetic_matcher,
        })
    }

    /// True when the gate is enabled.
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Compute structural metrics for a record.
    ///
    /// Fails (recovered per record as `PARSE_FAILURE`) when the code text is
    /// empty after normalization or the provenance line span is inverted.
    pub fn measure(&self, record: &FunctionRecord, normalized: &str) -> Result<QualityMetrics> {
        if normalized.is_empty() {
            return Err(ShardsmithError::record_with_id(
                "empty code text",
                record.provenance_id(),
            ));
        }
        if record.start_line > record.end_line {
            return Err(ShardsmithError::record_with_id(
                format!(
                    "inverted line span {}-{}",
                    record.start_line, record.end_line
                ),
                record.provenance_id(),
            ));
        }

        let loc = record
            .line_span()
            .unwrap_or_else(|| normalized.lines().count());

        Ok(QualityMetrics {
            loc,
            cyclomatic: cyclomatic_complexity(normalized),
            max_nesting_depth: max_nesting_depth(normalized),
            synthetic_docstring: self.is_synthetic(record.docstring.as_deref()),
        })
    }

    /// Evaluate metrics against the configured bounds.
    ///
    /// A disabled gate passes everything.
    pub fn evaluate(&self, metrics: &QualityMetrics) -> QualityVerdict {
        let mut verdict = QualityVerdict::default();
        if !self.config.enabled {
            return verdict;
        }

        if metrics.loc < self.config.min_loc {
            verdict.violations.push(QualityViolation {
                metric: "loc".to_string(),
                value: metrics.loc as f64,
                limit: self.config.min_loc as f64,
                message: format!(
                    "loc {} below minimum {}",
                    metrics.loc, self.config.min_loc
                ),
            });
        }
        if metrics.loc > self.config.max_loc {
            verdict.violations.push(QualityViolation {
                metric: "loc".to_string(),
                value: metrics.loc as f64,
                limit: self.config.max_loc as f64,
                message: format!("loc {} above maximum {}", metrics.loc, self.config.max_loc),
            });
        }
        if metrics.cyclomatic > self.config.max_cyclomatic {
            verdict.violations.push(QualityViolation {
                metric: "cyclomatic".to_string(),
                value: f64::from(metrics.cyclomatic),
                limit: f64::from(self.config.max_cyclomatic),
                message: format!(
                    "cyclomatic complexity {} above maximum {}",
                    metrics.cyclomatic, self.config.max_cyclomatic
                ),
            });
        }
        if metrics.max_nesting_depth > self.config.max_nesting {
            verdict.violations.push(QualityViolation {
                metric: "max_nesting_depth".to_string(),
                value: f64::from(metrics.max_nesting_depth),
                limit: f64::from(self.config.max_nesting),
                message: format!(
                    "nesting depth {} above maximum {}",
                    metrics.max_nesting_depth, self.config.max_nesting
                ),
            });
        }
        if metrics.synthetic_docstring && !self.config.allow_synthetic_docstrings {
            verdict.violations.push(QualityViolation {
                metric: "synthetic_docstring".to_string(),
                value: 1.0,
                limit: 0.0,
                message: "synthetic docstring disallowed".to_string(),
            });
        }

        verdict
    }

    fn is_synthetic(&self, docstring: Option<&str>) -> bool {
        match (docstring, &self.synthetic_matcher) {
            (Some(doc), Some(matcher)) => matcher.is_match(doc),
            _ => false,
        }
    }
}

/// Decision-point count over code-aware tokens, plus one baseline.
fn cyclomatic_complexity(normalized: &str) -> u32 {
    let decisions = tokenize(normalized)
        .iter()
        .filter(|token| DECISION_TOKENS.contains(token))
        .count();
    1 + u32::try_from(decisions).unwrap_or(u32::MAX - 1)
}

/// Maximum lexical nesting depth, derived from indentation.
///
/// The indent unit is the smallest positive indent in the record; a tab
/// counts as four columns. Flat records report depth zero.
fn max_nesting_depth(normalized: &str) -> u32 {
    let widths: Vec<usize> = normalized
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(indent_width)
        .collect();

    let Some(unit) = widths.iter().copied().filter(|w| *w > 0).min() else {
        return 0;
    };

    let depth = widths.iter().map(|w| w / unit).max().unwrap_or(0);
    u32::try_from(depth).unwrap_or(u32::MAX)
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}
