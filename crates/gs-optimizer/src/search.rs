//! Search configuration, the grid search driver and run reports.

use std::num::NonZeroUsize;

use chrono::{DateTime, Duration, Utc};
use gs_types::{
    invalid_parameter, GridError, GsResult, ObjectiveDirection, SearchBox, SearchError,
    SearchResult, Trial,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::evaluate::{into_trials, score_lattice};
use crate::lattice::Lattice;
use crate::objective::Objective;
use crate::reduce::best_score_index;

/// Unique search run identifier.
pub type SearchId = Uuid;

/// Parameters of a grid search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Samples per axis, endpoints included. Must be at least 2.
    pub subdivisions: usize,

    /// Number of worker threads. Must be at least 1.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub direction: ObjectiveDirection,

    /// Keep every scored trial in the report, not just the best one.
    #[serde(default)]
    pub retain_trials: bool,
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl SearchConfig {
    pub fn new(subdivisions: usize, concurrency: usize) -> Self {
        Self {
            subdivisions,
            concurrency,
            direction: ObjectiveDirection::Maximize,
            retain_trials: false,
        }
    }

    pub fn with_subdivisions(mut self, n: usize) -> Self {
        self.subdivisions = n;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn with_direction(mut self, direction: ObjectiveDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_retained_trials(mut self, retain: bool) -> Self {
        self.retain_trials = retain;
        self
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Check subdivisions, then concurrency.
    pub fn validate(&self) -> GsResult<()> {
        if self.subdivisions < 2 {
            return Err(invalid_parameter!(
                "subdivisions",
                self.subdivisions,
                "must be at least 2"
            ));
        }
        if self.concurrency < 1 {
            return Err(invalid_parameter!(
                "concurrency",
                self.concurrency,
                "must be at least 1"
            ));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new(10, default_concurrency())
    }
}

/// Summary of a completed search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub id: SearchId,
    /// Dimension names, in coordinate order.
    pub dimensions: Vec<String>,
    pub direction: ObjectiveDirection,
    pub concurrency: usize,
    pub points_evaluated: usize,
    pub best: Trial,
    /// Every trial in lattice order, when `retain_trials` is set.
    pub trials: Option<Vec<Trial>>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SearchReport {
    pub fn result(&self) -> SearchResult {
        self.best.clone().into()
    }

    pub fn into_result(self) -> SearchResult {
        self.best.into()
    }

    pub fn elapsed(&self) -> Duration {
        self.finished_at - self.started_at
    }

    /// Best point's coordinates paired with their dimension names.
    pub fn named_point(&self) -> Vec<(&str, f64)> {
        self.dimensions
            .iter()
            .map(String::as_str)
            .zip(self.best.point.iter().copied())
            .collect()
    }
}

/// Exhaustive search over the regular lattice of a [`SearchBox`].
#[derive(Debug, Clone)]
pub struct GridSearch {
    config: SearchConfig,
}

impl GridSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Evaluate `objective` at every lattice point of `space` and report the
    /// best one.
    ///
    /// The result does not depend on `concurrency`: trials keep their
    /// lattice order and ties go to the earliest point.
    pub fn run<O>(
        &self,
        objective: &O,
        space: &SearchBox,
    ) -> Result<SearchReport, SearchError<O::Error>>
    where
        O: Objective,
    {
        self.config.validate()?;
        if space.is_empty() {
            return Err(GridError::EmptySearchBox.into());
        }

        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let SearchConfig {
            subdivisions,
            concurrency,
            direction,
            retain_trials,
        } = self.config;

        let lattice = Lattice::for_box(space, subdivisions)?;
        info!(
            %id,
            points = lattice.len(),
            dimensions = space.len(),
            workers = concurrency,
            "Starting grid search"
        );

        let scores = score_lattice(&lattice, objective, concurrency)?;
        let points_evaluated = scores.len();
        let best_idx = best_score_index(&scores, direction).ok_or(GridError::EmptySearchBox)?;
        let best = Trial {
            index: best_idx,
            point: lattice.point(best_idx).to_vec(),
            score: scores[best_idx],
        };
        let trials = if retain_trials {
            Some(into_trials(&lattice, scores)?)
        } else {
            None
        };
        drop(lattice);

        let finished_at = Utc::now();
        info!(
            %id,
            score = best.score,
            index = best.index,
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "Grid search finished"
        );

        Ok(SearchReport {
            id,
            dimensions: space.names().map(str::to_string).collect(),
            direction,
            concurrency,
            points_evaluated,
            best,
            trials,
            started_at,
            finished_at,
        })
    }
}

/// Maximize `objective` over the box `[mins[0], maxes[0]] × ... ×
/// [mins[n-1], maxes[n-1]]`, sampled at `subdivisions` points per axis, on
/// `concurrency` worker threads.
///
/// # Errors
///
/// In order of checking: `subdivisions < 2` and `concurrency < 1` give
/// [`GridError::InvalidParameter`], unequal bound lengths give
/// [`GridError::DimensionMismatch`], empty bounds give
/// [`GridError::EmptySearchBox`]. A failing objective aborts the search with
/// [`SearchError::Objective`].
pub fn search<O>(
    objective: &O,
    mins: &[f64],
    maxes: &[f64],
    subdivisions: usize,
    concurrency: usize,
) -> Result<SearchResult, SearchError<O::Error>>
where
    O: Objective,
{
    let config = SearchConfig::new(subdivisions, concurrency);
    config.validate()?;
    let space = SearchBox::from_bounds(mins, maxes)?;

    GridSearch::new(config)
        .run(objective, &space)
        .map(SearchReport::into_result)
}
