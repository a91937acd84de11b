use thiserror::Error;

/// Errors raised while validating or preparing a grid search.
///
/// Every variant is produced before the first objective call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },

    #[error("Dimension mismatch: mins has {mins} entries, maxes has {maxes}")]
    DimensionMismatch { mins: usize, maxes: usize },

    #[error("Search box has no dimensions")]
    EmptySearchBox,

    #[error("Lattice too large: {subdivisions}^{dimensions} points overflows usize")]
    LatticeTooLarge {
        subdivisions: usize,
        dimensions: usize,
    },

    #[error("Worker pool error: {message}")]
    WorkerPool { message: String },
}

/// Errors returned by a search run.
///
/// `E` is the objective's own error type. It is carried unchanged in
/// [`SearchError::Objective`].
#[derive(Error, Debug)]
pub enum SearchError<E> {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("Objective failed at lattice index {index} (point {point:?})")]
    Objective {
        index: usize,
        point: Vec<f64>,
        #[source]
        source: E,
    },
}

impl<E> SearchError<E> {
    /// The objective's error, if this is an objective failure.
    pub fn into_objective_error(self) -> Option<E> {
        match self {
            Self::Objective { source, .. } => Some(source),
            Self::Grid(_) => None,
        }
    }

    /// The validation error, if the search was rejected before evaluation.
    pub fn as_grid_error(&self) -> Option<&GridError> {
        match self {
            Self::Grid(err) => Some(err),
            Self::Objective { .. } => None,
        }
    }
}

/// Result type alias for grid validation and lattice construction.
pub type GsResult<T> = Result<T, GridError>;

/// Macro for creating invalid-parameter errors
#[macro_export]
macro_rules! invalid_parameter {
    ($name:expr, $value:expr, $reason:expr) => {
        $crate::GridError::InvalidParameter {
            name: $name,
            value: $value,
            reason: $reason,
        }
    };
}
