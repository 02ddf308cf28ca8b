// SPDX-License-Identifier: AGPL-3.0-only

//! driftslab — bounded-slab solver core for 2D drift-wave turbulence.
//!
//! Finite differences across the bounded x-direction, a discrete Fourier
//! basis along the periodic y-direction, and a Karniadakis stiffly-stable
//! multi-step integrator for the stiff (diffusive) part of the equations.
//! Ghost points outside the x-boundaries are interpolated on the fly from
//! the boundary condition; they are never stored.
//!
//! ## Module map
//!
//! - `geometry` — slab layout, boundary-condition records
//! - `boundary` — ghost-point interpolators for the x-edges
//! - `address` — (row, column) resolution incl. wrap and ghost layers
//! - `field` — multi-time-level bounded field container
//! - `complex` — complex scalar used by the spectral representation
//! - `fft` — row-wise real↔spectral transform service
//! - `solver` — complex tridiagonal (Thomas) elimination
//! - `integrator` — Karniadakis integrator + elliptic diagonal setup
//! - `slab` — named-field assembly and per-step orchestration
//! - `config` — JSON run configuration
//! - `error` — typed failure modes
//! - `tolerances` — documented numeric thresholds

pub mod address;
pub mod boundary;
pub mod complex;
pub mod config;
pub mod element;
pub mod error;
pub mod fft;
pub mod field;
pub mod geometry;
pub mod integrator;
pub mod slab;
pub mod solver;
pub mod tolerances;
