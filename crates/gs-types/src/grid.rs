//! Search box, grid points and scored trials.

use serde::{Deserialize, Serialize};

use crate::errors::{GridError, GsResult};

/// A candidate argument vector, one coordinate per dimension.
pub type GridPoint = Vec<f64>;

/// One axis of the search box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Human-readable name (e.g. "x0", "learning_rate").
    pub name: String,
    /// Lower bound, sampled as the first axis value.
    pub low: f64,
    /// Upper bound, sampled as the last axis value.
    pub high: f64,
}

/// Axis-aligned box in R^n: one [`Dimension`] per coordinate.
///
/// `low <= high` is not enforced; a reversed dimension is swept from `low`
/// down to `high`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchBox {
    pub dimensions: Vec<Dimension>,
}

impl SearchBox {
    pub fn new() -> Self {
        Self {
            dimensions: Vec::new(),
        }
    }

    pub fn add_dimension(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.dimensions.push(Dimension {
            name: name.into(),
            low,
            high,
        });
        self
    }

    /// Build a box from parallel bound slices. Dimensions are named
    /// `x0`, `x1`, ... in order.
    pub fn from_bounds(mins: &[f64], maxes: &[f64]) -> GsResult<Self> {
        if mins.len() != maxes.len() {
            return Err(GridError::DimensionMismatch {
                mins: mins.len(),
                maxes: maxes.len(),
            });
        }

        let dimensions = mins
            .iter()
            .zip(maxes)
            .enumerate()
            .map(|(i, (&low, &high))| Dimension {
                name: format!("x{i}"),
                low,
                high,
            })
            .collect();

        Ok(Self { dimensions })
    }

    /// Number of dimensions `n`.
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|d| d.name.as_str())
    }

    /// Total number of lattice points with `subdivisions` samples per axis
    /// (returns `None` on overflow).
    pub fn lattice_size(&self, subdivisions: usize) -> Option<usize> {
        let exponent = u32::try_from(self.len()).ok()?;
        subdivisions.checked_pow(exponent)
    }
}

impl Default for SearchBox {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether we are maximizing or minimizing the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveDirection {
    Maximize,
    Minimize,
}

impl Default for ObjectiveDirection {
    fn default() -> Self {
        Self::Maximize
    }
}

impl ObjectiveDirection {
    /// Whether `candidate` strictly improves on `incumbent`.
    ///
    /// Equal scores never improve, so the earliest of several equal scores
    /// is kept. A NaN never improves on a number; any number improves on a
    /// NaN incumbent.
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        if incumbent.is_nan() {
            return !candidate.is_nan();
        }
        match self {
            Self::Maximize => candidate > incumbent,
            Self::Minimize => candidate < incumbent,
        }
    }
}

/// A lattice point paired with its objective score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Position of the point in lattice generation order.
    pub index: usize,
    pub point: GridPoint,
    pub score: f64,
}

/// Best point found by a search, with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub point: GridPoint,
    pub score: f64,
}

impl From<Trial> for SearchResult {
    fn from(trial: Trial) -> Self {
        Self {
            point: trial.point,
            score: trial.score,
        }
    }
}
