// SPDX-License-Identifier: AGPL-3.0-only

//! Ghost-point interpolators for the bounded x-direction.
//!
//! A ghost point is the field value one cell outside the domain, needed by
//! finite-difference stencils at the first and last rows. It is computed
//! from the last interior value and the boundary condition, never stored:
//!
//! - Dirichlet: `ghost = 2·bval − interior`, a linear reflection placing
//!   `bval` exactly on the domain face between the two cells.
//! - Neumann left: `ghost = interior − Δx·bval`.
//! - Neumann right: `ghost = interior + Δx·bval`.
//!
//! Periodic x-edges cannot be serviced by a one-cell ghost layer; requests
//! for one are a configuration error at construction time, not a silent
//! fallback.

use crate::element::Element;
use crate::error::SolverError;
use crate::geometry::BoundaryCondition;

/// Which x-edge an interpolator serves. Neumann ghost values depend on the
/// outward normal direction, so the side is fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

impl Edge {
    const fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Ghost-value formula for one x-edge, dispatched once at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GhostInterpolator<T: Element> {
    Dirichlet { bval: T },
    NeumannLeft { bval: T },
    NeumannRight { bval: T },
}

impl<T: Element> GhostInterpolator<T> {
    /// Build the interpolator for `edge` from a boundary condition.
    ///
    /// # Errors
    ///
    /// [`SolverError::UnsupportedBoundary`] for periodic conditions.
    pub fn for_edge(bc: &BoundaryCondition<T>, edge: Edge) -> Result<Self, SolverError> {
        match (bc, edge) {
            (BoundaryCondition::Dirichlet(bval), _) => Ok(Self::Dirichlet { bval: *bval }),
            (BoundaryCondition::Neumann(bval), Edge::Left) => {
                Ok(Self::NeumannLeft { bval: *bval })
            }
            (BoundaryCondition::Neumann(bval), Edge::Right) => {
                Ok(Self::NeumannRight { bval: *bval })
            }
            (BoundaryCondition::Periodic, edge) => Err(SolverError::UnsupportedBoundary {
                side: edge.name(),
                kind: "periodic",
            }),
        }
    }

    /// Ghost value from the last interior value and the grid spacing.
    #[inline]
    #[must_use]
    pub fn ghost(&self, interior: T, delta_x: f64) -> T {
        match self {
            Self::Dirichlet { bval } => *bval * 2.0 - interior,
            Self::NeumannLeft { bval } => interior - *bval * delta_x,
            Self::NeumannRight { bval } => interior + *bval * delta_x,
        }
    }

    /// The prescribed boundary value.
    #[must_use]
    pub fn boundary_value(&self) -> T {
        match self {
            Self::Dirichlet { bval }
            | Self::NeumannLeft { bval }
            | Self::NeumannRight { bval } => *bval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirichlet_reflects_through_face() {
        let interp =
            GhostInterpolator::for_edge(&BoundaryCondition::Dirichlet(1.0_f64), Edge::Left)
                .expect("dirichlet left");
        // Face value is the mean of ghost and interior.
        let ghost = interp.ghost(0.25, 0.1);
        assert!((0.5 * (ghost + 0.25) - 1.0).abs() < 1e-15);
        assert!((ghost - 1.75).abs() < 1e-15);
    }

    #[test]
    fn dirichlet_same_formula_both_edges() {
        let bc = BoundaryCondition::Dirichlet(-2.0_f64);
        let l = GhostInterpolator::for_edge(&bc, Edge::Left).expect("left");
        let r = GhostInterpolator::for_edge(&bc, Edge::Right).expect("right");
        assert!((l.ghost(3.0, 0.5) - r.ghost(3.0, 0.5)).abs() < 1e-15);
    }

    #[test]
    fn neumann_slope_signs() {
        let bc = BoundaryCondition::Neumann(2.0_f64);
        let l = GhostInterpolator::for_edge(&bc, Edge::Left).expect("left");
        let r = GhostInterpolator::for_edge(&bc, Edge::Right).expect("right");
        let dx = 0.1;
        // Outward derivative fixed: left ghost sits below, right ghost above.
        assert!((l.ghost(1.0, dx) - (1.0 - 0.2)).abs() < 1e-15);
        assert!((r.ghost(1.0, dx) - (1.0 + 0.2)).abs() < 1e-15);
    }

    #[test]
    fn zero_neumann_copies_interior() {
        let bc = BoundaryCondition::Neumann(0.0_f64);
        let l = GhostInterpolator::for_edge(&bc, Edge::Left).expect("left");
        assert!((l.ghost(7.5, 0.25) - 7.5).abs() < 1e-15);
    }

    #[test]
    fn periodic_fails_at_construction() {
        let err = GhostInterpolator::<f64>::for_edge(&BoundaryCondition::Periodic, Edge::Left)
            .expect_err("periodic x must be rejected");
        assert_eq!(
            err,
            SolverError::UnsupportedBoundary {
                side: "left",
                kind: "periodic"
            }
        );
        let err = GhostInterpolator::<f64>::for_edge(&BoundaryCondition::Periodic, Edge::Right)
            .expect_err("periodic x must be rejected");
        assert!(matches!(
            err,
            SolverError::UnsupportedBoundary { side: "right", .. }
        ));
    }

    #[test]
    fn boundary_value_recovered() {
        let interp =
            GhostInterpolator::for_edge(&BoundaryCondition::Neumann(-0.5_f64), Edge::Right)
                .expect("neumann right");
        assert!((interp.boundary_value() - (-0.5)).abs() < 1e-15);
    }
}
