//! Orchestration of classifier runs over candidate batches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::constraints::{BatchErrorPolicy, BatchOutcome, PartialInclusionDependency};
use crate::error::{MetaError, Result};
use crate::log_classifier;
use crate::logging::LogConfig;

use super::aggregator::{Decision, DecisionAggregator};
use super::candidate::{candidates_from_pinds, UnaryForeignKeyCandidate};
use super::classifiers::{validate_weight, PartialForeignKeyClassifier};
use super::config::{ClassifierContext, PipelineConfig, DEFAULT_MIN_SHARD_SIZE};
use super::{ClassificationSet, ForeignKeyLabel, WeightedResult};

/// Type alias for progress callback function.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Decision and supporting verdicts for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDecision {
    /// The candidate
    pub candidate: UnaryForeignKeyCandidate,
    /// The aggregated decision
    pub decision: Decision,
    /// Every classifier verdict, in classifier order
    pub partial_results: Vec<WeightedResult>,
}

/// Bookkeeping about one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Candidates submitted
    pub candidates_total: usize,
    /// Candidates that received a decision
    pub candidates_classified: usize,
    /// Classifier names in execution order
    pub classifiers: Vec<String>,
}

impl RunMetadata {
    /// Wall-clock duration of the run in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Decisions in candidate input order
    pub decisions: Vec<CandidateDecision>,
    pub metadata: RunMetadata,
    /// Whether the run stopped early on a shutdown signal
    pub cancelled: bool,
}

impl ClassificationReport {
    /// A report without decisions, stamped with the current time.
    pub fn empty(classifiers: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            decisions: Vec::new(),
            metadata: RunMetadata {
                started_at: now,
                finished_at: now,
                candidates_total: 0,
                candidates_classified: 0,
                classifiers,
            },
            cancelled: false,
        }
    }

    /// Decisions labelled as foreign keys.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &CandidateDecision> {
        self.decisions
            .iter()
            .filter(|d| d.decision.label == ForeignKeyLabel::ForeignKey)
    }

    /// Number of decisions per label; every label is present.
    pub fn label_counts(&self) -> BTreeMap<ForeignKeyLabel, usize> {
        let mut counts: BTreeMap<ForeignKeyLabel, usize> =
            ForeignKeyLabel::ALL.iter().map(|label| (*label, 0)).collect();
        for decision in &self.decisions {
            *counts.entry(decision.decision.label).or_default() += 1;
        }
        counts
    }
}

/// An ordered list of classifiers and the aggregator that combines them.
///
/// Candidates are independent of each other, so [`run`](Self::run) splits
/// them into contiguous shards classified on blocking worker threads. Each
/// shard owns its classification sets; classifiers and their data are shared
/// read-only. Results come back in input order regardless of how shards
/// finish.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tokio::sync::watch;
/// use meta_guard::catalog::ColumnId;
/// use meta_guard::constraints::{ColumnStatistics, InMemoryStatistics};
/// use meta_guard::fk::{ClassificationPipeline, CoverageClassifier, UnaryForeignKeyCandidate};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let stats = Arc::new(InMemoryStatistics::from_statistics(
///     (0..100).map(|i| ColumnStatistics::new(ColumnId::new(i)).with_distinct_values(u64::from(i))),
/// ));
/// let pipeline = ClassificationPipeline::new()
///     .add_classifier(Arc::new(CoverageClassifier::new(1.0, 0.9, 0.5, stats).unwrap()))
///     .unwrap()
///     .with_workers(4)
///     .with_min_shard_size(10);
///
/// let candidates: Vec<_> = (1..100)
///     .map(|i| UnaryForeignKeyCandidate::new(ColumnId::new(i - 1), ColumnId::new(i)))
///     .collect();
///
/// let (_shutdown_tx, shutdown_rx) = watch::channel(false);
/// let report = pipeline.run(candidates, shutdown_rx).await.unwrap();
/// assert_eq!(report.decisions.len(), 99);
/// assert!(!report.cancelled);
/// # })
/// ```
#[derive(Clone)]
pub struct ClassificationPipeline {
    classifiers: Vec<Arc<dyn PartialForeignKeyClassifier>>,
    aggregator: DecisionAggregator,
    workers: usize,
    min_shard_size: usize,
    error_policy: BatchErrorPolicy,
    log_config: LogConfig,
    on_progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for ClassificationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationPipeline")
            .field("classifiers", &self.classifier_names())
            .field("workers", &self.workers)
            .field("min_shard_size", &self.min_shard_size)
            .field("error_policy", &self.error_policy)
            .finish()
    }
}

impl Default for ClassificationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationPipeline {
    /// Creates an empty pipeline using every CPU.
    pub fn new() -> Self {
        Self {
            classifiers: Vec::new(),
            aggregator: DecisionAggregator::new(),
            workers: num_cpus::get(),
            min_shard_size: DEFAULT_MIN_SHARD_SIZE,
            error_policy: BatchErrorPolicy::default(),
            log_config: LogConfig::default(),
            on_progress: None,
        }
    }

    /// Builds a pipeline from a validated configuration.
    #[instrument(skip_all, fields(classifiers = config.classifiers.len()))]
    pub fn from_config(config: &PipelineConfig, context: &ClassifierContext) -> Result<Self> {
        config.validate()?;
        let mut pipeline = Self::new()
            .with_workers(config.workers)
            .with_min_shard_size(config.min_shard_size)
            .with_error_policy(config.error_policy);
        for spec in &config.classifiers {
            pipeline = pipeline.add_classifier(spec.build(context)?)?;
        }
        debug!(classifiers = ?pipeline.classifier_names(), "Built classification pipeline");
        Ok(pipeline)
    }

    /// Appends a classifier; classifiers run in the order they were added.
    ///
    /// Fails with `InvalidArgument` when the classifier's weight is negative
    /// or not finite.
    pub fn add_classifier(mut self, classifier: Arc<dyn PartialForeignKeyClassifier>) -> Result<Self> {
        validate_weight(classifier.weight()).map_err(|e| {
            MetaError::invalid_argument(format!("classifier '{}': {e}", classifier.name()))
        })?;
        self.classifiers.push(classifier);
        Ok(self)
    }

    /// Sets the maximum number of concurrent shards (at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the minimum shard size (at least 1).
    pub fn with_min_shard_size(mut self, min_shard_size: usize) -> Self {
        self.min_shard_size = min_shard_size.max(1);
        self
    }

    /// Sets the policy used by [`candidates`](Self::candidates).
    pub fn with_error_policy(mut self, policy: BatchErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Sets the logging configuration.
    pub fn with_log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    /// Registers a callback receiving the completed fraction after each shard.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Names of the configured classifiers in execution order.
    pub fn classifier_names(&self) -> Vec<String> {
        self.classifiers.iter().map(|c| c.name().to_string()).collect()
    }

    /// Number of configured classifiers.
    pub fn classifier_count(&self) -> usize {
        self.classifiers.len()
    }

    /// Builds candidates from discovered dependencies under the pipeline's
    /// error policy.
    pub fn candidates<'a>(
        &self,
        pinds: impl IntoIterator<Item = &'a PartialInclusionDependency>,
    ) -> Result<BatchOutcome<UnaryForeignKeyCandidate>> {
        candidates_from_pinds(pinds, self.error_policy)
    }

    /// Classifies candidates on the calling thread.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub fn classify(&self, candidates: &[UnaryForeignKeyCandidate]) -> Vec<CandidateDecision> {
        let (decisions, _) = self.classify_shard(candidates, None);
        decisions
    }

    /// Classifies a single candidate.
    pub fn classify_one(&self, candidate: UnaryForeignKeyCandidate) -> CandidateDecision {
        let mut set = ClassificationSet::new(candidate);
        for classifier in &self.classifiers {
            classifier.classify(std::slice::from_mut(&mut set));
            if let Some(result) = set.results().last() {
                log_classifier!(
                    self.log_config,
                    candidate = %candidate,
                    classifier = classifier.name(),
                    label = %result.label,
                    weight = result.weight,
                    "Classifier verdict"
                );
            }
        }
        let decision = self.aggregator.aggregate(&set);
        let (candidate, partial_results) = set.into_parts();
        CandidateDecision {
            candidate,
            decision,
            partial_results,
        }
    }

    /// Classifies until done or until the shutdown flag is raised; returns
    /// the decisions made and whether the shard was cut short.
    fn classify_shard(
        &self,
        candidates: &[UnaryForeignKeyCandidate],
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> (Vec<CandidateDecision>, bool) {
        let mut decisions = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if shutdown.is_some_and(|rx| *rx.borrow()) {
                return (decisions, true);
            }
            decisions.push(self.classify_one(*candidate));
        }
        (decisions, false)
    }

    fn shard_size(&self, total: usize) -> usize {
        ((total + self.workers - 1) / self.workers).max(self.min_shard_size)
    }

    /// Classifies candidates on blocking worker threads.
    ///
    /// The shutdown flag is checked between candidates; a cancelled run
    /// returns the decisions completed so far, still in input order, with
    /// [`ClassificationReport::cancelled`] set.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Internal`] if a worker thread panics.
    #[instrument(skip_all, fields(candidates = candidates.len(), workers = self.workers))]
    pub async fn run(
        &self,
        candidates: Vec<UnaryForeignKeyCandidate>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<ClassificationReport> {
        let started_at = Utc::now();
        let total = candidates.len();
        info!(
            "Starting classification of {} candidates with {} classifiers",
            total,
            self.classifiers.len()
        );
        if self.classifiers.is_empty() {
            warn!("Classification pipeline has no classifiers; every candidate will be UNKNOWN");
        }

        let shard_size = self.shard_size(total);
        let candidates = Arc::new(candidates);
        let pipeline = Arc::new(self.clone());
        let mut tasks = JoinSet::new();
        for (index, start) in (0..total).step_by(shard_size.max(1)).enumerate() {
            let end = (start + shard_size).min(total);
            let candidates = Arc::clone(&candidates);
            let pipeline = Arc::clone(&pipeline);
            let shutdown = shutdown.clone();
            tasks.spawn_blocking(move || {
                let (decisions, cancelled) =
                    pipeline.classify_shard(&candidates[start..end], Some(&shutdown));
                (index, decisions, cancelled)
            });
        }
        debug!(shards = tasks.len(), shard_size, "Dispatched classification shards");

        let mut shards = Vec::with_capacity(tasks.len());
        let mut done = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let (index, decisions, cancelled) = joined
                .map_err(|e| MetaError::Internal(format!("Classification shard failed: {e}")))?;
            done += decisions.len();
            if let Some(ref callback) = self.on_progress {
                callback(if total == 0 { 1.0 } else { done as f64 / total as f64 });
            }
            shards.push((index, decisions, cancelled));
        }
        shards.sort_by_key(|(index, _, _)| *index);

        let cancelled = shards.iter().any(|(_, _, cancelled)| *cancelled);
        let decisions: Vec<CandidateDecision> = shards
            .into_iter()
            .flat_map(|(_, decisions, _)| decisions)
            .collect();

        let report = ClassificationReport {
            metadata: RunMetadata {
                started_at,
                finished_at: Utc::now(),
                candidates_total: total,
                candidates_classified: decisions.len(),
                classifiers: self.classifier_names(),
            },
            decisions,
            cancelled,
        };

        if cancelled {
            warn!(
                classified = report.metadata.candidates_classified,
                total, "Classification cancelled"
            );
        } else {
            info!(
                foreign_keys = report.foreign_keys().count(),
                duration_ms = report.metadata.duration_ms(),
                "Classification completed"
            );
        }
        Ok(report)
    }
}
