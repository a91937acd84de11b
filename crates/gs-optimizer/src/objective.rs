//! The function being maximized.

/// A black-box scalar function over grid points.
///
/// Implemented for every `Fn(&[f64]) -> Result<f64, E>`; wrap an infallible
/// `Fn(&[f64]) -> f64` in [`Infallible`]. Evaluations run concurrently, so
/// implementors must be `Sync`.
pub trait Objective: Sync {
    type Error: Send;

    /// Score a single point. May block.
    fn evaluate(&self, point: &[f64]) -> Result<f64, Self::Error>;
}

impl<F, E> Objective for F
where
    F: Fn(&[f64]) -> Result<f64, E> + Sync,
    E: Send,
{
    type Error = E;

    fn evaluate(&self, point: &[f64]) -> Result<f64, E> {
        self(point)
    }
}

/// Adapter for objectives that cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct Infallible<F>(pub F);

impl<F> Objective for Infallible<F>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    type Error = std::convert::Infallible;

    fn evaluate(&self, point: &[f64]) -> Result<f64, Self::Error> {
        Ok((self.0)(point))
    }
}
