//! JSON configuration of classification pipelines.
//!
//! A configuration lists classifiers in the order they run:
//!
//! ```json
//! {
//!   "classifiers": [
//!     { "type": "coverage", "weight": 2.0, "fk_ratio": 0.9, "non_fk_ratio": 0.5 },
//!     { "type": "naming", "weight": 1.0 }
//!   ],
//!   "workers": 4,
//!   "error_policy": "skip_and_record"
//! }
//! ```
//!
//! Classifiers that need external data (statistics, a catalog, discovered
//! dependencies) take it from a [`ClassifierContext`] when the pipeline is
//! built.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::catalog::Catalog;
use crate::constraints::{BatchErrorPolicy, PartialInclusionDependency, StatisticsProvider};
use crate::error::{ErrorContext, MetaError, Result};

use super::classifiers::{
    validate_thresholds, validate_weight, CoverageClassifier, NamingClassifier,
    PartialForeignKeyClassifier, TypeCompatibilityClassifier, ValueOverlapClassifier,
};

/// Default number of candidates below which a run is not split further.
pub const DEFAULT_MIN_SHARD_SIZE: usize = 256;

fn default_weight() -> f64 {
    1.0
}

fn default_fk_ratio() -> f64 {
    0.9
}

fn default_non_fk_ratio() -> f64 {
    0.5
}

fn default_fk_min_coverage() -> f64 {
    0.95
}

fn default_non_fk_max_coverage() -> f64 {
    0.5
}

fn default_fk_similarity() -> f64 {
    0.9
}

fn default_non_fk_similarity() -> f64 {
    0.6
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_min_shard_size() -> usize {
    DEFAULT_MIN_SHARD_SIZE
}

/// One configured classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierSpec {
    /// Distinct-value coverage ratio, see [`CoverageClassifier`]
    Coverage {
        #[serde(default = "default_weight")]
        weight: f64,
        #[serde(default = "default_fk_ratio")]
        fk_ratio: f64,
        #[serde(default = "default_non_fk_ratio")]
        non_fk_ratio: f64,
    },
    /// Inclusion-dependency overlap, see [`ValueOverlapClassifier`]
    ValueOverlap {
        #[serde(default = "default_weight")]
        weight: f64,
        #[serde(default = "default_fk_min_coverage")]
        fk_min_coverage: f64,
        #[serde(default = "default_non_fk_max_coverage")]
        non_fk_max_coverage: f64,
    },
    /// Declared-type compatibility, see [`TypeCompatibilityClassifier`]
    TypeCompatibility {
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Naming similarity, see [`NamingClassifier`]
    Naming {
        #[serde(default = "default_weight")]
        weight: f64,
        #[serde(default = "default_fk_similarity")]
        fk_similarity: f64,
        #[serde(default = "default_non_fk_similarity")]
        non_fk_similarity: f64,
    },
}

impl ClassifierSpec {
    /// The classifier's configured type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            ClassifierSpec::Coverage { .. } => CoverageClassifier::NAME,
            ClassifierSpec::ValueOverlap { .. } => ValueOverlapClassifier::NAME,
            ClassifierSpec::TypeCompatibility { .. } => TypeCompatibilityClassifier::NAME,
            ClassifierSpec::Naming { .. } => NamingClassifier::NAME,
        }
    }

    fn check(&self) -> Result<()> {
        match *self {
            ClassifierSpec::Coverage {
                weight,
                fk_ratio,
                non_fk_ratio,
            } => {
                validate_weight(weight)?;
                validate_thresholds("coverage ratio", fk_ratio, non_fk_ratio)
            }
            ClassifierSpec::ValueOverlap {
                weight,
                fk_min_coverage,
                non_fk_max_coverage,
            } => {
                validate_weight(weight)?;
                validate_thresholds("value overlap", fk_min_coverage, non_fk_max_coverage)?;
                check_unit("value overlap", fk_min_coverage)
            }
            ClassifierSpec::TypeCompatibility { weight } => validate_weight(weight).map(|_| ()),
            ClassifierSpec::Naming {
                weight,
                fk_similarity,
                non_fk_similarity,
            } => {
                validate_weight(weight)?;
                validate_thresholds("naming similarity", fk_similarity, non_fk_similarity)?;
                check_unit("naming similarity", fk_similarity)
            }
        }
    }

    /// Builds the classifier, taking external data from `context`.
    pub fn build(
        &self,
        context: &ClassifierContext,
    ) -> Result<Arc<dyn PartialForeignKeyClassifier>> {
        let classifier: Arc<dyn PartialForeignKeyClassifier> = match *self {
            ClassifierSpec::Coverage {
                weight,
                fk_ratio,
                non_fk_ratio,
            } => Arc::new(CoverageClassifier::new(
                weight,
                fk_ratio,
                non_fk_ratio,
                context.require_statistics(self)?,
            )?),
            ClassifierSpec::ValueOverlap {
                weight,
                fk_min_coverage,
                non_fk_max_coverage,
            } => Arc::new(ValueOverlapClassifier::new(
                weight,
                fk_min_coverage,
                non_fk_max_coverage,
                &context.pinds,
            )?),
            ClassifierSpec::TypeCompatibility { weight } => Arc::new(
                TypeCompatibilityClassifier::new(weight, context.require_catalog(self)?)?,
            ),
            ClassifierSpec::Naming {
                weight,
                fk_similarity,
                non_fk_similarity,
            } => Arc::new(NamingClassifier::new(
                weight,
                fk_similarity,
                non_fk_similarity,
                context.require_catalog(self)?,
            )?),
        };
        Ok(classifier)
    }
}

fn check_unit(what: &str, threshold: f64) -> Result<()> {
    if threshold > 1.0 {
        return Err(MetaError::invalid_argument(format!(
            "{what} threshold must not exceed 1, got {threshold}"
        )));
    }
    Ok(())
}

/// Configuration of a [`ClassificationPipeline`](super::ClassificationPipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Classifiers in execution order
    pub classifiers: Vec<ClassifierSpec>,
    /// Maximum number of concurrent shards
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Minimum number of candidates per shard
    #[serde(default = "default_min_shard_size")]
    pub min_shard_size: usize,
    /// How invalid inputs are handled when building candidates
    #[serde(default)]
    pub error_policy: BatchErrorPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classifiers: Vec::new(),
            workers: default_workers(),
            min_shard_size: default_min_shard_size(),
            error_policy: BatchErrorPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MetaError::Configuration(format!("Invalid pipeline configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)
            .with_context(|| format!("pipeline configuration {}", path.display()))?;
        debug!(classifiers = config.classifiers.len(), "Loaded pipeline configuration");
        Ok(config)
    }

    /// Adds a classifier.
    pub fn with_classifier(mut self, spec: ClassifierSpec) -> Self {
        self.classifiers.push(spec);
        self
    }

    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the minimum shard size.
    pub fn with_min_shard_size(mut self, min_shard_size: usize) -> Self {
        self.min_shard_size = min_shard_size;
        self
    }

    /// Sets the batch error policy.
    pub fn with_error_policy(mut self, policy: BatchErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// A [`MetaError::Configuration`] naming the first offending entry.
    pub fn validate(&self) -> Result<()> {
        if self.classifiers.is_empty() {
            return Err(MetaError::Configuration(
                "At least one classifier must be configured".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(MetaError::Configuration(
                "workers must be greater than 0".to_string(),
            ));
        }
        if self.min_shard_size == 0 {
            return Err(MetaError::Configuration(
                "min_shard_size must be greater than 0".to_string(),
            ));
        }
        for (index, spec) in self.classifiers.iter().enumerate() {
            spec.check().map_err(|e| {
                MetaError::Configuration(format!(
                    "classifier {index} ({}): {e}",
                    spec.type_name()
                ))
            })?;
        }
        Ok(())
    }
}

/// External data classifiers are built from.
///
/// The context is read-only during a run; statistics and catalog are shared
/// snapshots.
#[derive(Debug, Clone, Default)]
pub struct ClassifierContext {
    /// Column statistics for the coverage classifier
    pub statistics: Option<Arc<dyn StatisticsProvider>>,
    /// Catalog for type and naming classifiers
    pub catalog: Option<Arc<Catalog>>,
    /// Discovered dependencies for the value-overlap classifier
    pub pinds: Vec<PartialInclusionDependency>,
}

impl ClassifierContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the statistics provider.
    pub fn with_statistics(mut self, statistics: Arc<dyn StatisticsProvider>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// Sets the catalog snapshot.
    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the discovered dependencies.
    pub fn with_pinds(mut self, pinds: Vec<PartialInclusionDependency>) -> Self {
        self.pinds = pinds;
        self
    }

    fn require_statistics(&self, spec: &ClassifierSpec) -> Result<Arc<dyn StatisticsProvider>> {
        self.statistics.clone().ok_or_else(|| {
            MetaError::Configuration(format!(
                "{} classifier requires column statistics",
                spec.type_name()
            ))
        })
    }

    fn require_catalog(&self, spec: &ClassifierSpec) -> Result<Arc<Catalog>> {
        self.catalog.clone().ok_or_else(|| {
            MetaError::Configuration(format!(
                "{} classifier requires a catalog",
                spec.type_name()
            ))
        })
    }
}
