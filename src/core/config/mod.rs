//! Configuration types for the shardsmith deduplication engine.
//!
//! The whole configuration surface is one structured object,
//! [`ShardsmithConfig`], consumed by the pipeline coordinator. Every field
//! carries a documented default; `validate()` is called by
//! [`CorpusPipeline::new`](crate::core::pipeline::CorpusPipeline::new) before
//! any record is processed, so invalid settings fail the run pre-flight.

pub mod validation;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, ShardsmithError};

pub use validation::{
    validate_ordered_range, validate_positive_u32, validate_positive_usize, validate_unit_range,
};

/// Main configuration for a shardsmith run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShardsmithConfig {
    /// Deduplication settings (shingling, MinHash, LSH)
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Structural quality gate settings
    #[serde(default)]
    pub quality: QualityGateConfig,
}

impl ShardsmithConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ShardsmithError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            ShardsmithError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate the full configuration.
    pub fn validate(&self) -> Result<()> {
        self.dedup.validate()?;
        self.quality.validate()?;
        Ok(())
    }
}

/// Deduplication configuration: shingling, MinHash, and LSH banding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Shingle size in code tokens
    #[serde(default = "DedupConfig::default_shingle_k")]
    pub shingle_k: usize,

    /// Number of MinHash permutations (signature length)
    #[serde(default = "DedupConfig::default_num_permutations")]
    pub num_permutations: usize,

    /// Estimated-Jaccard similarity threshold for near-duplicate merging
    #[serde(default = "DedupConfig::default_threshold")]
    pub threshold: f64,

    /// Explicit LSH band count; derived from `threshold` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bands: Option<usize>,

    /// Explicit rows per band; derived from `threshold` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,

    /// Base seed for all similarity hashing
    #[serde(default = "DedupConfig::default_seed")]
    pub seed: u64,
}

impl DedupConfig {
    /// Default shingle size.
    const fn default_shingle_k() -> usize {
        7
    }

    /// Default MinHash permutation count.
    const fn default_num_permutations() -> usize {
        128
    }

    /// Default near-duplicate similarity threshold.
    const fn default_threshold() -> f64 {
        0.80
    }

    /// Default hashing seed.
    const fn default_seed() -> u64 {
        1
    }

    /// Validate the deduplication configuration.
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.shingle_k, "dedup.shingle_k")?;
        validate_positive_usize(self.num_permutations, "dedup.num_permutations")?;
        validate_unit_range(self.threshold, "dedup.threshold")?;

        match (self.bands, self.rows) {
            (None, None) => {}
            (Some(bands), Some(rows)) => {
                validate_positive_usize(bands, "dedup.bands")?;
                validate_positive_usize(rows, "dedup.rows")?;
                if bands * rows != self.num_permutations {
                    return Err(ShardsmithError::validation_field(
                        format!(
                            "dedup.bands * dedup.rows must equal num_permutations ({} * {} != {})",
                            bands, rows, self.num_permutations
                        ),
                        "dedup.bands",
                    ));
                }
            }
            _ => {
                return Err(ShardsmithError::validation_field(
                    "dedup.bands and dedup.rows must be set together",
                    "dedup.bands",
                ));
            }
        }

        Ok(())
    }
}

/// Default implementation for [`DedupConfig`].
impl Default for DedupConfig {
    /// Returns the default deduplication configuration.
    fn default() -> Self {
        Self {
            shingle_k: Self::default_shingle_k(),
            num_permutations: Self::default_num_permutations(),
            threshold: Self::default_threshold(),
            bands: None,
            rows: None,
            seed: Self::default_seed(),
        }
    }
}

/// Structural quality gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityGateConfig {
    /// Enable the quality gate; when false every record passes through
    #[serde(default = "QualityGateConfig::default_enabled")]
    pub enabled: bool,

    /// Minimum lines of code (inclusive line span)
    #[serde(default = "QualityGateConfig::default_min_loc")]
    pub min_loc: usize,

    /// Maximum lines of code (inclusive line span)
    #[serde(default = "QualityGateConfig::default_max_loc")]
    pub max_loc: usize,

    /// Maximum cyclomatic complexity
    #[serde(default = "QualityGateConfig::default_max_cyclomatic")]
    pub max_cyclomatic: u32,

    /// Maximum lexical nesting depth
    #[serde(default = "QualityGateConfig::default_max_nesting")]
    pub max_nesting: u32,

    /// Keep records whose docstring matches the synthetic rule table
    #[serde(default)]
    pub allow_synthetic_docstrings: bool,

    /// Rule table for synthetic-docstring detection
    #[serde(default)]
    pub synthetic_docstrings: SyntheticDocstringRules,
}

impl QualityGateConfig {
    /// Gate enabled by default.
    const fn default_enabled() -> bool {
        true
    }

    /// Default minimum function line span.
    const fn default_min_loc() -> usize {
        5
    }

    /// Default maximum function line span.
    const fn default_max_loc() -> usize {
        400
    }

    /// Default cyclomatic complexity ceiling.
    const fn default_max_cyclomatic() -> u32 {
        20
    }

    /// Default nesting depth ceiling.
    const fn default_max_nesting() -> u32 {
        6
    }

    /// Validate the quality gate configuration.
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.min_loc, "quality.min_loc")?;
        validate_ordered_range(self.min_loc, self.max_loc, "quality.loc")?;
        validate_positive_u32(self.max_cyclomatic, "quality.max_cyclomatic")?;
        validate_positive_u32(self.max_nesting, "quality.max_nesting")?;
        self.synthetic_docstrings.validate()?;
        Ok(())
    }
}

/// Default implementation for [`QualityGateConfig`].
impl Default for QualityGateConfig {
    /// Returns the default quality gate configuration.
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            min_loc: Self::default_min_loc(),
            max_loc: Self::default_max_loc(),
            max_cyclomatic: Self::default_max_cyclomatic(),
            max_nesting: Self::default_max_nesting(),
            allow_synthetic_docstrings: false,
            synthetic_docstrings: SyntheticDocstringRules::default(),
        }
    }
}

/// Versioned rule table for synthetic-docstring detection.
///
/// Extractor-fabricated docstrings follow fixed templates; a docstring
/// containing any of these literal phrases is flagged as synthetic. The
/// table is configuration so the heuristic stays auditable and testable
/// rather than buried in gate logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticDocstringRules {
    /// Rule table version, bumped whenever the default pattern set changes
    #[serde(default = "SyntheticDocstringRules::default_version")]
    pub version: u32,

    /// Literal phrases that mark a docstring as synthetic
    #[serde(default = "SyntheticDocstringRules::default_patterns")]
    pub patterns: Vec<String>,
}

impl SyntheticDocstringRules {
    /// Current default rule table version.
    const fn default_version() -> u32 {
        1
    }

    /// Phrases produced by known extractor templates.
    fn default_patterns() -> Vec<String> {
        vec![
            "Briefly describe what this function does".to_string(),
            ": description".to_string(),
            "Returns:\n- description".to_string(),
            "=...".to_string(),
        ]
    }

    /// Validate the rule table.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.patterns {
            if pattern.is_empty() {
                return Err(ShardsmithError::validation_field(
                    "empty pattern in synthetic_docstrings.patterns",
                    "quality.synthetic_docstrings.patterns",
                ));
            }
        }
        Ok(())
    }
}

/// Default implementation for [`SyntheticDocstringRules`].
impl Default for SyntheticDocstringRules {
    /// Returns the version-1 rule table.
    fn default() -> Self {
        Self {
            version: Self::default_version(),
            patterns: Self::default_patterns(),
        }
    }
}

#[cfg(test)]
mod tests;
