//! Selection of the best trial.

use gs_types::{ObjectiveDirection, Trial};

/// Position of the best trial in `trials`, scanning left to right.
///
/// A trial replaces the current best only when its score is strictly
/// better, so the earliest of several equal scores wins. See
/// [`ObjectiveDirection::improves`] for NaN handling.
pub fn best_index(trials: &[Trial], direction: ObjectiveDirection) -> Option<usize> {
    first_best(trials.iter().map(|t| t.score), direction)
}

/// Same selection as [`best_index`], over bare scores in lattice order.
pub fn best_score_index(scores: &[f64], direction: ObjectiveDirection) -> Option<usize> {
    first_best(scores.iter().copied(), direction)
}

fn first_best<I>(scores: I, direction: ObjectiveDirection) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut scores = scores.into_iter().enumerate();
    let (mut best, mut best_score) = scores.next()?;

    for (index, score) in scores {
        if direction.improves(score, best_score) {
            best = index;
            best_score = score;
        }
    }

    Some(best)
}

pub fn best_trial(trials: &[Trial], direction: ObjectiveDirection) -> Option<&Trial> {
    best_index(trials, direction).map(|i| &trials[i])
}
