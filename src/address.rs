// SPDX-License-Identifier: AGPL-3.0-only

//! Logical (row, column) resolution over a flat field level.
//!
//! Column indices may be any integer and are wrapped into `[0, my)`
//! (periodic y). Row indices may additionally take the values `-1` and
//! `nx`, meaning one cell outside the bounded x-direction; those resolve
//! through the edge's [`GhostInterpolator`], never through memory. Exactly
//! one ghost layer is supported per edge — anything further out is an
//! out-of-range error.
//!
//! Resolution is pure and reentrant: it never mutates the data slice and
//! may be called concurrently from any number of threads.

use crate::boundary::{Edge, GhostInterpolator};
use crate::element::Element;
use crate::error::SolverError;
use crate::geometry::{BoundarySet, SlabLayout};

/// Index resolver for one field level with known bounds and boundaries.
///
/// Wrap table for the column index (`my = 8`):
///
/// ```text
/// m:        -2  -1   0   1 ...  7   8   9
/// wrapped:   6   7   0   1 ...  7   0   1
/// ```
#[derive(Clone, Copy, Debug)]
pub struct AddressMap<T: Element> {
    nx: usize,
    my: usize,
    pad_y: usize,
    delta_x: f64,
    left: Option<GhostInterpolator<T>>,
    right: Option<GhostInterpolator<T>>,
}

impl<T: Element> AddressMap<T> {
    /// Build the resolver for a layout and its x-edge conditions.
    ///
    /// Periodic x-edges leave the corresponding interpolator unset; the
    /// field remains constructible (its normalization contract needs the
    /// kind) but any ghost resolution on that edge fails with a
    /// configuration error.
    pub fn new(layout: &SlabLayout, bvals: &BoundarySet<T>) -> Result<Self, SolverError> {
        layout.validate()?;
        let left = match &bvals.left {
            bc if bc.is_periodic() => None,
            bc => Some(GhostInterpolator::for_edge(bc, Edge::Left)?),
        };
        let right = match &bvals.right {
            bc if bc.is_periodic() => None,
            bc => Some(GhostInterpolator::for_edge(bc, Edge::Right)?),
        };
        Ok(Self {
            nx: layout.nx,
            my: layout.my,
            pad_y: layout.pad_y,
            delta_x: layout.delta_x,
            left,
            right,
        })
    }

    /// Raw offset access: `data[n·(my + pad_y) + m]`.
    ///
    /// No wrapping, no ghost interpolation; the caller guarantees `n` and
    /// `m` are already inside the allocated block.
    #[inline]
    #[must_use]
    pub fn direct(&self, data: &[T], n: usize, m: usize) -> T {
        data[n * (self.my + self.pad_y) + m]
    }

    /// Wrap an arbitrary integer column index into `[0, my)`.
    #[inline]
    #[must_use]
    pub fn wrap_column(&self, m: isize) -> usize {
        m.rem_euclid(self.my as isize) as usize
    }

    /// General accessor: wrap the column, then read the interior directly
    /// or interpolate the one-cell ghost layer at `n == -1` / `n == nx`.
    ///
    /// # Errors
    ///
    /// [`SolverError::RowOutOfRange`] beyond the ghost window, and
    /// [`SolverError::UnsupportedBoundary`] when the requested edge is
    /// periodic in x.
    #[inline]
    pub fn resolve(&self, data: &[T], n: isize, m: isize) -> Result<T, SolverError> {
        let mw = self.wrap_column(m);
        if n >= 0 && (n as usize) < self.nx {
            Ok(self.direct(data, n as usize, mw))
        } else if n == -1 {
            let interp = self.left.as_ref().ok_or(SolverError::UnsupportedBoundary {
                side: "left",
                kind: "periodic",
            })?;
            Ok(interp.ghost(self.direct(data, 0, mw), self.delta_x))
        } else if n == self.nx as isize {
            let interp = self.right.as_ref().ok_or(SolverError::UnsupportedBoundary {
                side: "right",
                kind: "periodic",
            })?;
            Ok(interp.ghost(self.direct(data, self.nx - 1, mw), self.delta_x))
        } else {
            Err(SolverError::RowOutOfRange {
                row: n,
                nx: self.nx,
            })
        }
    }

    #[inline]
    #[must_use]
    pub const fn nx(&self) -> usize {
        self.nx
    }

    #[inline]
    #[must_use]
    pub const fn my(&self) -> usize {
        self.my
    }

    #[inline]
    #[must_use]
    pub const fn delta_x(&self) -> f64 {
        self.delta_x
    }
}
