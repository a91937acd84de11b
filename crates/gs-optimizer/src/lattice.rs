//! Axis subdivision and the cartesian-product lattice.

use gs_types::{invalid_parameter, GridError, GsResult, SearchBox};
use tracing::debug;

/// Evenly spaced samples on `[lo, hi]`, both endpoints included exactly.
///
/// `subdivisions` is the number of samples and must be at least 2: with
/// `subdivisions = 4`, `[0, 6]` is sampled at `{0, 2, 4, 6}`.
pub fn axis_values(lo: f64, hi: f64, subdivisions: usize) -> GsResult<Vec<f64>> {
    if subdivisions < 2 {
        return Err(invalid_parameter!(
            "subdivisions",
            subdivisions,
            "must be at least 2"
        ));
    }

    let last = subdivisions - 1;
    Ok((0..subdivisions)
        .map(|i| {
            if i == 0 {
                lo
            } else if i == last {
                hi
            } else {
                let t = i as f64 / last as f64;
                lo + t * (hi - lo)
            }
        })
        .collect())
}

/// Every point of the cartesian product of a set of axes, materialized in
/// one row-major buffer.
///
/// Points are ordered lexicographically by axis index: dimension 0 varies
/// slowest, the last dimension fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    dimensions: usize,
    /// Longest axis, reported when a buffer sized by this lattice cannot be
    /// allocated.
    subdivisions: usize,
    len: usize,
    coords: Vec<f64>,
}

impl Lattice {
    /// Lattice over `space` with `subdivisions` samples per axis.
    pub fn for_box(space: &SearchBox, subdivisions: usize) -> GsResult<Self> {
        let axes = space
            .dimensions
            .iter()
            .map(|d| axis_values(d.low, d.high, subdivisions))
            .collect::<GsResult<Vec<_>>>()?;

        space
            .lattice_size(subdivisions)
            .ok_or(GridError::LatticeTooLarge {
                subdivisions,
                dimensions: space.len(),
            })?;

        Self::from_axes(&axes)
    }

    /// Cartesian product of arbitrary axes. Axis lengths may differ.
    ///
    /// With no axes the lattice holds a single empty point.
    pub fn from_axes(axes: &[Vec<f64>]) -> GsResult<Self> {
        let dimensions = axes.len();
        let subdivisions = axes.iter().map(Vec::len).max().unwrap_or(0);
        let too_large = || GridError::LatticeTooLarge {
            subdivisions,
            dimensions,
        };

        let len = axes
            .iter()
            .try_fold(1usize, |acc, axis| acc.checked_mul(axis.len()))
            .ok_or_else(too_large)?;
        let total = len.checked_mul(dimensions).ok_or_else(too_large)?;

        let mut coords = Vec::new();
        coords
            .try_reserve_exact(total)
            .map_err(|_| too_large())?;
        coords.resize(total, 0.0);
        if dimensions > 0 {
            // Mixed-radix counting: the index digits, last axis least
            // significant, select one value per axis.
            for (index, point) in coords.chunks_exact_mut(dimensions).enumerate() {
                let mut rem = index;
                for (slot, axis) in point.iter_mut().zip(axes).rev() {
                    *slot = axis[rem % axis.len()];
                    rem /= axis.len();
                }
            }
        }

        debug!(dimensions, points = len, "Built lattice");

        Ok(Self {
            dimensions,
            subdivisions,
            len,
            coords,
        })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Coordinates of the point at `index` in generation order.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn point(&self, index: usize) -> &[f64] {
        assert!(index < self.len, "lattice index {index} out of range");
        let start = index * self.dimensions;
        &self.coords[start..start + self.dimensions]
    }

    /// Allocate a buffer of `len` items, one per point or per coordinate.
    ///
    /// Fails with [`GridError::LatticeTooLarge`] instead of aborting when the
    /// allocation cannot be satisfied.
    pub(crate) fn buffer<T>(&self, len: usize) -> GsResult<Vec<T>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| GridError::LatticeTooLarge {
                subdivisions: self.subdivisions,
                dimensions: self.dimensions,
            })?;
        Ok(buf)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.len).map(move |i| self.point(i))
    }
}
