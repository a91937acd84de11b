//! # gs-optimizer
//!
//! Exhaustive grid search for GridSweep.
//!
//! Subdivides each axis of a search box, evaluates a black-box objective at
//! every point of the resulting lattice on a fixed pool of worker threads,
//! and reduces the scored trials to the best point.

mod evaluate;
mod lattice;
mod objective;
mod reduce;
mod search;

pub use evaluate::{evaluate, partition};
pub use lattice::{axis_values, Lattice};
pub use objective::{Infallible, Objective};
pub use reduce::{best_index, best_score_index, best_trial};
pub use search::{search, GridSearch, SearchConfig, SearchId, SearchReport};
