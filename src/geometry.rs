// SPDX-License-Identifier: AGPL-3.0-only

//! Slab layout and boundary-condition records.
//!
//! A slab is `nx` finite-difference rows (bounded x-direction) by `my`
//! columns (periodic y-direction), cell-centered, with padding columns
//! reserved for the in-place bookkeeping of the row transform. Layouts are
//! immutable for the lifetime of any container built on them.

use serde::{Deserialize, Serialize};

use crate::error::SolverError;

/// Immutable slab geometry.
///
/// Rows run over `[0, nx + pad_x)`, columns over `[0, my + pad_y)`; only
/// `[0, nx) x [0, my)` holds interior data. Coordinates are cell-centered:
/// the left domain face sits half a cell before the first center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlabLayout {
    pub x_left: f64,
    pub delta_x: f64,
    pub y_low: f64,
    pub delta_y: f64,
    pub nx: usize,
    pub pad_x: usize,
    pub my: usize,
    pub pad_y: usize,
}

impl SlabLayout {
    /// Fails on zero extents or non-positive grid spacing.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.nx == 0 || self.my == 0 {
            return Err(SolverError::config(format!(
                "layout extents must be positive, got nx = {}, my = {}",
                self.nx, self.my
            )));
        }
        if !(self.delta_x > 0.0) || !(self.delta_y > 0.0) {
            return Err(SolverError::config(format!(
                "grid spacing must be positive, got delta_x = {}, delta_y = {}",
                self.delta_x, self.delta_y
            )));
        }
        Ok(())
    }

    /// Allocated row length, including transform padding.
    #[inline]
    #[must_use]
    pub const fn row_len(&self) -> usize {
        self.my + self.pad_y
    }

    /// Allocated row count, including padding rows.
    #[inline]
    #[must_use]
    pub const fn rows_alloc(&self) -> usize {
        self.nx + self.pad_x
    }

    /// Elements per time level.
    #[inline]
    #[must_use]
    pub const fn elems_per_level(&self) -> usize {
        self.rows_alloc() * self.row_len()
    }

    /// Flat offset of `(n, m)` within one time level.
    #[inline]
    #[must_use]
    pub const fn index(&self, n: usize, m: usize) -> usize {
        n * self.row_len() + m
    }

    /// Cell-center x-coordinate of row `n`.
    #[inline]
    #[must_use]
    pub fn x(&self, n: usize) -> f64 {
        self.x_left + (n as f64 + 0.5) * self.delta_x
    }

    /// Cell-center y-coordinate of column `m`.
    #[inline]
    #[must_use]
    pub fn y(&self, m: usize) -> f64 {
        self.y_low + (m as f64 + 0.5) * self.delta_y
    }

    #[inline]
    #[must_use]
    pub fn length_x(&self) -> f64 {
        self.delta_x * self.nx as f64
    }

    #[inline]
    #[must_use]
    pub fn length_y(&self) -> f64 {
        self.delta_y * self.my as f64
    }

    /// Companion layout for row-transformed (spectral) fields: the real
    /// row of `my` samples becomes `(my + pad_y) / 2` complex
    /// coefficients, no padding.
    #[must_use]
    pub fn spectral(&self) -> SlabLayout {
        SlabLayout {
            my: (self.my + self.pad_y) / 2,
            pad_y: 0,
            pad_x: self.pad_x,
            ..*self
        }
    }

    /// Axis-swapped spectral layout used by the elliptic diagonal setup:
    /// one row per wavenumber, one column per finite-difference grid
    /// point. The coordinate roles swap with the axes.
    #[must_use]
    pub fn transposed_spectral(&self) -> SlabLayout {
        SlabLayout {
            x_left: self.y_low,
            delta_x: self.delta_y,
            y_low: self.x_left,
            delta_y: self.delta_x,
            nx: (self.my + self.pad_y) / 2,
            pad_x: 0,
            my: self.nx,
            pad_y: 0,
        }
    }
}

/// Boundary condition on one x-edge, carrying its prescribed value.
///
/// The y-direction is always periodic by construction (column indices are
/// wrapped, never ghost-interpolated) and carries no record here.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BoundaryCondition<T> {
    /// Prescribed field value at the domain face.
    Dirichlet(T),
    /// Prescribed normal derivative at the domain face.
    Neumann(T),
    /// Wrap-around; not representable by a finite-difference ghost layer.
    Periodic,
}

impl<T> BoundaryCondition<T> {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Dirichlet(_) => "dirichlet",
            Self::Neumann(_) => "neumann",
            Self::Periodic => "periodic",
        }
    }

    #[must_use]
    pub const fn is_periodic(&self) -> bool {
        matches!(self, Self::Periodic)
    }

    /// Map the carried value, preserving the kind.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BoundaryCondition<U> {
        match self {
            Self::Dirichlet(v) => BoundaryCondition::Dirichlet(f(v)),
            Self::Neumann(v) => BoundaryCondition::Neumann(f(v)),
            Self::Periodic => BoundaryCondition::Periodic,
        }
    }
}

/// Left and right x-edge conditions of one field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundarySet<T> {
    pub left: BoundaryCondition<T>,
    pub right: BoundaryCondition<T>,
}

impl<T> BoundarySet<T> {
    pub const fn new(left: BoundaryCondition<T>, right: BoundaryCondition<T>) -> Self {
        Self { left, right }
    }

    pub const fn dirichlet(left: T, right: T) -> Self {
        Self {
            left: BoundaryCondition::Dirichlet(left),
            right: BoundaryCondition::Dirichlet(right),
        }
    }

    pub const fn neumann(left: T, right: T) -> Self {
        Self {
            left: BoundaryCondition::Neumann(left),
            right: BoundaryCondition::Neumann(right),
        }
    }

    pub const fn periodic() -> Self {
        Self {
            left: BoundaryCondition::Periodic,
            right: BoundaryCondition::Periodic,
        }
    }

    /// Map both carried values, preserving the kinds.
    pub fn map<U>(self, f: impl Fn(T) -> U) -> BoundarySet<U> {
        BoundarySet {
            left: self.left.map(&f),
            right: self.right.map(&f),
        }
    }
}
