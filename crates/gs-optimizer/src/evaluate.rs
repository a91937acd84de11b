//! Parallel evaluation of an objective over a lattice.
//!
//! The lattice is cut into one contiguous range per worker. Each worker owns
//! the score slots for its range, so results land at their lattice index
//! without locking, and the output order never depends on scheduling.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use gs_types::{invalid_parameter, GridError, GsResult, SearchError, Trial};
use parking_lot::Mutex;
use rayon::ThreadPoolBuilder;
use tracing::debug;

use crate::lattice::Lattice;
use crate::objective::Objective;

/// Split `0..len` into `workers` contiguous, disjoint ranges.
///
/// Sizes differ by at most one; the first `len % workers` ranges take the
/// extra point. Ranges are empty when `workers > len`.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    if workers == 0 {
        return Vec::new();
    }

    let per_worker = len / workers;
    let extras = len % workers;
    let mut start = 0;

    (0..workers)
        .map(|worker| {
            let size = per_worker + usize::from(worker < extras);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

/// Score every lattice point on a pool of `concurrency` workers.
///
/// Returns one [`Trial`] per point, in lattice order. The first failing
/// objective call stops all workers; once they are joined the failure with
/// the lowest lattice index is returned and no trials are produced.
pub fn evaluate<O>(
    lattice: &Lattice,
    objective: &O,
    concurrency: usize,
) -> Result<Vec<Trial>, SearchError<O::Error>>
where
    O: Objective,
{
    let scores = score_lattice(lattice, objective, concurrency)?;
    into_trials(lattice, scores).map_err(SearchError::from)
}

/// Pair each score with its lattice point.
pub(crate) fn into_trials(lattice: &Lattice, scores: Vec<f64>) -> GsResult<Vec<Trial>> {
    let mut trials = lattice.buffer(scores.len())?;
    trials.extend(scores.into_iter().enumerate().map(|(index, score)| Trial {
        index,
        point: lattice.point(index).to_vec(),
        score,
    }));
    Ok(trials)
}

/// Scores in lattice order, without materializing per-point trials.
pub(crate) fn score_lattice<O>(
    lattice: &Lattice,
    objective: &O,
    concurrency: usize,
) -> Result<Vec<f64>, SearchError<O::Error>>
where
    O: Objective,
{
    if concurrency < 1 {
        return Err(invalid_parameter!("concurrency", concurrency, "must be at least 1").into());
    }

    let mut scores = lattice.buffer(lattice.len())?;
    scores.resize(lattice.len(), f64::NAN);

    let pool = ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("gs-worker-{i}"))
        .build()
        .map_err(|e| GridError::WorkerPool {
            message: e.to_string(),
        })?;

    let abort = AtomicBool::new(false);
    let failure: Mutex<Option<(usize, O::Error)>> = Mutex::new(None);

    pool.scope(|scope| {
        let mut rest: &mut [f64] = &mut scores;
        for (worker, range) in partition(lattice.len(), concurrency).into_iter().enumerate() {
            let (slots, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            rest = tail;

            if range.is_empty() {
                continue;
            }

            let abort = &abort;
            let failure = &failure;
            scope.spawn(move |_| {
                debug!(worker, start = range.start, end = range.end, "Worker started");
                score_range(lattice, objective, range, slots, abort, failure);
            });
        }
    });

    if let Some((index, source)) = failure.into_inner() {
        return Err(SearchError::Objective {
            index,
            point: lattice.point(index).to_vec(),
            source,
        });
    }

    Ok(scores)
}

fn score_range<O>(
    lattice: &Lattice,
    objective: &O,
    range: Range<usize>,
    slots: &mut [f64],
    abort: &AtomicBool,
    failure: &Mutex<Option<(usize, O::Error)>>,
) where
    O: Objective,
{
    for (index, slot) in range.zip(slots.iter_mut()) {
        if abort.load(Ordering::Relaxed) {
            debug!(index, "Worker stopped after failure elsewhere");
            return;
        }

        match objective.evaluate(lattice.point(index)) {
            Ok(score) => *slot = score,
            Err(err) => {
                abort.store(true, Ordering::Relaxed);
                let mut first = failure.lock();
                if first.as_ref().map_or(true, |(seen, _)| index < *seen) {
                    *first = Some((index, err));
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Infallible;
    use gs_types::SearchBox;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn square_lattice(subdivisions: usize) -> Lattice {
        let space = SearchBox::from_bounds(&[-1.0, -1.0], &[1.0, 1.0]).unwrap();
        Lattice::for_box(&space, subdivisions).unwrap()
    }

    #[test]
    fn partition_spreads_remainder_over_first_ranges() {
        assert_eq!(partition(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(partition(100, 5), vec![0..20, 20..40, 40..60, 60..80, 80..100]);
    }

    #[test]
    fn partition_with_more_workers_than_points() {
        assert_eq!(partition(2, 4), vec![0..1, 1..2, 2..2, 2..2]);
        assert!(partition(5, 0).is_empty());
    }

    #[test]
    fn partition_covers_every_index_once() {
        for len in [0, 1, 7, 64, 101] {
            for workers in 1..=9 {
                let ranges = partition(len, workers);
                assert_eq!(ranges.len(), workers);
                assert_eq!(ranges.first().map(|r| r.start), Some(0));
                assert_eq!(ranges.last().map(|r| r.end), Some(len));
                for pair in ranges.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                    assert!(pair[0].len() >= pair[1].len());
                    assert!(pair[0].len() - pair[1].len() <= 1);
                }
            }
        }
    }

    #[test]
    fn trials_are_aligned_with_lattice_order() {
        let lattice = square_lattice(5);
        let objective = Infallible(|p: &[f64]| p[0] * 10.0 + p[1]);

        for concurrency in [1, 2, 3, 8, 40] {
            let trials = evaluate(&lattice, &objective, concurrency).unwrap();
            assert_eq!(trials.len(), lattice.len());
            for (index, trial) in trials.iter().enumerate() {
                assert_eq!(trial.index, index);
                assert_eq!(trial.point, lattice.point(index));
                assert_eq!(trial.score, trial.point[0] * 10.0 + trial.point[1]);
            }
        }
    }

    #[test]
    fn every_point_is_evaluated_exactly_once() {
        let lattice = square_lattice(7);
        let calls = AtomicUsize::new(0);
        let objective = Infallible(|_: &[f64]| {
            calls.fetch_add(1, Ordering::SeqCst);
            1.0
        });

        evaluate(&lattice, &objective, 4).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 49);
    }

    #[test]
    fn zero_concurrency_is_rejected_before_evaluation() {
        let lattice = square_lattice(3);
        let calls = AtomicUsize::new(0);
        let objective = Infallible(|_: &[f64]| {
            calls.fetch_add(1, Ordering::SeqCst);
            0.0
        });

        let err = evaluate(&lattice, &objective, 0).unwrap_err();
        assert!(matches!(
            err.as_grid_error(),
            Some(GridError::InvalidParameter {
                name: "concurrency",
                ..
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn objective_failure_aborts_with_its_error() {
        let lattice = square_lattice(4);
        let objective = |p: &[f64]| -> Result<f64, String> {
            if p == [1.0, 1.0] {
                Err("corner".to_string())
            } else {
                Ok(0.0)
            }
        };

        for concurrency in [1, 3] {
            let err = evaluate(&lattice, &objective, concurrency).unwrap_err();
            match err {
                SearchError::Objective {
                    index,
                    point,
                    source,
                } => {
                    assert_eq!(index, 15);
                    assert_eq!(point, vec![1.0, 1.0]);
                    assert_eq!(source, "corner");
                }
                other => panic!("Expected objective failure, got {other:?}"),
            }
        }
    }

    #[test]
    fn failure_in_one_worker_stops_the_others() {
        // Worker 0 owns 0..32 and fails at once; worker 1 owns 32..64 and
        // is slow enough that it must notice the abort long before its end.
        let lattice = Lattice::from_axes(&[(0..64).map(f64::from).collect()]).unwrap();
        let failed = AtomicBool::new(false);
        let slow_calls = AtomicUsize::new(0);
        let objective = |p: &[f64]| -> Result<f64, String> {
            if p[0] < 32.0 {
                failed.store(true, Ordering::SeqCst);
                return Err(format!("rejected {}", p[0]));
            }
            slow_calls.fetch_add(1, Ordering::SeqCst);
            for _ in 0..1000 {
                if failed.load(Ordering::SeqCst) {
                    break;
                }
                std::thread::sleep(Duration::from_millis(1));
            }
            std::thread::sleep(Duration::from_millis(5));
            Ok(p[0])
        };

        let err = evaluate(&lattice, &objective, 2).unwrap_err();
        match err {
            SearchError::Objective { index, source, .. } => {
                assert_eq!(index, 0);
                assert_eq!(source, "rejected 0");
            }
            other => panic!("Expected objective failure, got {other:?}"),
        }

        let calls = slow_calls.load(Ordering::SeqCst);
        assert!(calls < 8, "worker 1 kept going for {calls} points");
        assert!(1 + calls < lattice.len());
    }

    #[test]
    fn oversized_trial_buffer_is_rejected() {
        let lattice = Lattice::from_axes(&[vec![0.0, 1.0]]).unwrap();
        let err = lattice.buffer::<Trial>(usize::MAX).unwrap_err();
        assert_eq!(
            err,
            GridError::LatticeTooLarge {
                subdivisions: 2,
                dimensions: 1
            }
        );
    }

    #[test]
    fn single_worker_stops_at_first_failure() {
        let lattice = square_lattice(4);
        let calls = AtomicUsize::new(0);
        let objective = |_: &[f64]| -> Result<f64, &'static str> {
            if calls.fetch_add(1, Ordering::SeqCst) == 2 {
                Err("third call fails")
            } else {
                Ok(1.0)
            }
        };

        let err = evaluate(&lattice, &objective, 1).unwrap_err();
        assert_eq!(err.into_objective_error(), Some("third call fails"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
