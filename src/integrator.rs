// SPDX-License-Identifier: AGPL-3.0-only

//! Karniadakis stiffly-stable time integration and elliptic inversion.
//!
//! Dynamical fields live in a mixed representation: a discrete Fourier
//! basis along y (one column per wavenumber) and finite differences along
//! x. For every wavenumber `ky`, the implicit diffusive part of the PDE
//! couples the x-direction through the tridiagonal operator
//! `L = d²/dx² − ky²`, so each step solves one small banded system per
//! mode. The three bands depend only on layout and parameters — they are
//! built once at construction and reused for every solve at every step.
//!
//! ## Step protocol
//!
//! With `u` the dynamical field and `N` its explicit right-hand side:
//!
//! 1. rotate the RHS ring, then write `N^n` into RHS level 0;
//! 2. rotate the field ring (level 1 now holds `u^n`);
//! 3. [`KarniadakisIntegrator::integrate`] reads field levels
//!    `1..=order` and RHS levels `0..order`, solves
//!    `(α₀ − Δt·D·L)·u^{n+1} = Σ αₖ·u^{n+1−k} + Δt·Σ βₖ·N^{n+1−k}`
//!    per mode, and writes `u^{n+1}` into field level 0.
//!
//! Level 0 is therefore always the most recently computed state of either
//! ring. Startup ramps the order 1 → 2 → 3 as history accumulates.

use log::debug;
use rayon::prelude::*;
use std::f64::consts::TAU;

use crate::complex::Complex64;
use crate::error::SolverError;
use crate::field::SlabField;
use crate::geometry::{BoundarySet, SlabLayout};
use crate::solver::solve_tridiagonal;

/// Weights of the stiffly-stable scheme, by order. `ALPHA[o-1][0]`
/// multiplies the unknown; `ALPHA[o-1][k]` multiplies `u^{n+1-k}`.
const ALPHA: [[f64; 4]; 3] = [
    [1.0, 1.0, 0.0, 0.0],
    [1.5, 2.0, -0.5, 0.0],
    [11.0 / 6.0, 3.0, -1.5, 1.0 / 3.0],
];

/// Explicit-term weights: `BETA[o-1][k-1]` multiplies `N^{n+1-k}`.
const BETA: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [2.0, -1.0, 0.0], [3.0, -3.0, 1.0]];

/// Maximum scheme order (limited by the coefficient tables).
pub const MAX_ORDER: usize = 3;

/// Time-integration parameters of one dynamical field.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StiffParams {
    /// Time step.
    pub delta_t: f64,
    /// Diffusion coefficient of the implicit part.
    pub diff: f64,
    /// Hyperviscosity coefficient (ky⁴ damping).
    pub hv: f64,
    /// Spectral modes per row transform, `my/2 + 1`.
    pub num_modes: usize,
    /// Retained time levels; supports scheme orders up to `tlevs - 1`.
    pub tlevs: usize,
}

impl StiffParams {
    pub fn validate(&self) -> Result<(), SolverError> {
        if !(self.delta_t > 0.0) {
            return Err(SolverError::config(format!(
                "time step must be positive, got {}",
                self.delta_t
            )));
        }
        if self.diff < 0.0 || self.hv < 0.0 {
            return Err(SolverError::config(
                "diffusion and hyperviscosity coefficients must be non-negative",
            ));
        }
        if self.num_modes == 0 {
            return Err(SolverError::config("mode count must be positive"));
        }
        if self.tlevs < 2 || self.tlevs > MAX_ORDER + 1 {
            return Err(SolverError::config(format!(
                "time level count {} outside supported range [2, {}]",
                self.tlevs,
                MAX_ORDER + 1
            )));
        }
        Ok(())
    }
}

/// Stiff multi-step integrator with precomputed elliptic diagonals.
///
/// Holds the axis-swapped spectral layout (one row per wavenumber, one
/// column per x grid point) and three single-level complex fields for the
/// main, lower and upper bands of `L`. The bands are shared read-only
/// state across all per-mode solves of one `integrate` call;
/// [`KarniadakisIntegrator::init_diagonals`] is the only mutator and must
/// not run concurrently with a solve on the same instance.
pub struct KarniadakisIntegrator {
    layout: SlabLayout,
    transposed: SlabLayout,
    bvals: BoundarySet<f64>,
    params: StiffParams,
    diag: SlabField<Complex64>,
    diag_l: SlabField<Complex64>,
    diag_u: SlabField<Complex64>,
}

impl KarniadakisIntegrator {
    /// Build the integrator and compute the diagonals.
    pub fn new(
        layout: SlabLayout,
        bvals: BoundarySet<f64>,
        params: StiffParams,
    ) -> Result<Self, SolverError> {
        layout.validate()?;
        params.validate()?;
        let transposed = layout.transposed_spectral();
        if params.num_modes != transposed.nx {
            return Err(SolverError::config(format!(
                "mode count {} does not match layout ({} row coefficients)",
                params.num_modes, transposed.nx
            )));
        }
        // The band fields never resolve ghost points; the zero-Dirichlet
        // record only satisfies the container contract.
        let band_bvals = BoundarySet::dirichlet(Complex64::ZERO, Complex64::ZERO);
        let mut integrator = Self {
            layout,
            transposed,
            bvals,
            params,
            diag: SlabField::new(transposed, band_bvals, 1)?,
            diag_l: SlabField::new(transposed, band_bvals, 1)?,
            diag_u: SlabField::new(transposed, band_bvals, 1)?,
        };
        integrator.init_diagonals()?;
        Ok(integrator)
    }

    /// (Re)build the three bands of the elliptic operator.
    ///
    /// Row `n` is the wavenumber index, column `m` the grid point along
    /// the finite-difference direction. Boundary rows carry the one-sided
    /// Dirichlet stencil correction; the first lower and last upper
    /// entries are forced to zero per the banded-solver convention.
    /// Deterministic: depends only on layout and parameters.
    pub fn init_diagonals(&mut self) -> Result<(), SolverError> {
        debug!(
            "building elliptic bands: {} modes x {} points",
            self.transposed.nx, self.transposed.my
        );
        self.diag.evaluate(
            |n, m, g| {
                let ky2 = Self::ky_for(g, n).powi(2);
                let inv_dy2 = 1.0 / (g.delta_y * g.delta_y);
                if m == 0 || m == g.my - 1 {
                    Complex64::real(-3.0 * inv_dy2 - ky2)
                } else {
                    Complex64::real(-2.0 * inv_dy2 - ky2)
                }
            },
            0,
        )?;
        self.diag_l.evaluate(
            |_, m, g| {
                if m == 0 {
                    Complex64::ZERO
                } else {
                    Complex64::real(1.0 / (g.delta_x * g.delta_x))
                }
            },
            0,
        )?;
        self.diag_u.evaluate(
            |_, m, g| {
                if m == g.my - 1 {
                    Complex64::ZERO
                } else {
                    Complex64::real(1.0 / (g.delta_x * g.delta_x))
                }
            },
            0,
        )?;
        Ok(())
    }

    /// Wavenumber of mode `n` on the transposed layout. The row transform
    /// halves the spectral extent, so the physical length is rebuilt from
    /// the coefficient count.
    fn ky_for(g: &SlabLayout, n: usize) -> f64 {
        let lx = g.delta_x * 2.0 * (g.nx as f64 - 1.0);
        TAU * n as f64 / lx
    }

    /// Advance one dynamical field by one step at the given scheme order.
    ///
    /// `field` must carry `params.tlevs` levels with `u^n` at level 1
    /// (ring already rotated); `rhs` carries the explicit history with
    /// `N^n` at level 0. The new state lands in `field` level 0.
    pub fn integrate(
        &self,
        field: &mut SlabField<Complex64>,
        rhs: &SlabField<Complex64>,
        order: usize,
    ) -> Result<(), SolverError> {
        if order == 0 || order > MAX_ORDER || order > self.params.tlevs - 1 {
            return Err(SolverError::config(format!(
                "scheme order {order} unsupported with {} time levels",
                self.params.tlevs
            )));
        }
        if field.tlevs() != self.params.tlevs {
            return Err(SolverError::config(format!(
                "field carries {} levels, integrator expects {}",
                field.tlevs(),
                self.params.tlevs
            )));
        }
        self.check_spectral_operand("integrate field", field.layout())?;
        self.check_spectral_operand("integrate rhs", rhs.layout())?;
        if rhs.tlevs() < order {
            return Err(SolverError::config(format!(
                "rhs carries {} levels, order {order} needs them all",
                rhs.tlevs()
            )));
        }

        let modes = self.transposed.nx;
        let points = self.transposed.my;
        let frow = field.layout().row_len();
        let trow = self.transposed.row_len();
        let dt = self.params.delta_t;
        let diff = self.params.diff;
        let hv = self.params.hv;
        let alpha = ALPHA[order - 1];
        let beta = BETA[order - 1];

        let new_cols: Vec<Vec<Complex64>> = {
            let u_hist: Vec<&[Complex64]> = (1..=order)
                .map(|k| field.device_level(k))
                .collect::<Result<_, _>>()?;
            let n_hist: Vec<&[Complex64]> = (0..order)
                .map(|k| rhs.device_level(k))
                .collect::<Result<_, _>>()?;
            let band_d = self.diag.device_level(0)?;
            let band_l = self.diag_l.device_level(0)?;
            let band_u = self.diag_u.device_level(0)?;

            (0..modes)
                .into_par_iter()
                .map(|j| -> Result<Vec<Complex64>, SolverError> {
                    // Weighted history per x point of this mode.
                    let mut x = vec![Complex64::ZERO; points];
                    for i in 0..points {
                        let idx = i * frow + j;
                        let mut acc = Complex64::ZERO;
                        for k in 1..=order {
                            acc += u_hist[k - 1][idx] * alpha[k];
                        }
                        for k in 1..=order {
                            acc += n_hist[k - 1][idx] * (beta[k - 1] * dt);
                        }
                        x[i] = acc;
                    }

                    // Assembled system: alpha0*I - dt*D*L, plus ky^4 damping.
                    let ky = Self::ky_for(&self.transposed, j);
                    let damp = dt * hv * ky.powi(4);
                    let base = j * trow;
                    let mut lower = vec![Complex64::ZERO; points];
                    let mut main = vec![Complex64::ZERO; points];
                    let mut upper = vec![Complex64::ZERO; points];
                    for i in 0..points {
                        lower[i] = band_l[base + i] * (-dt * diff);
                        upper[i] = band_u[base + i] * (-dt * diff);
                        main[i] =
                            Complex64::real(alpha[0] + damp) - band_d[base + i] * (dt * diff);
                    }
                    solve_tridiagonal(&lower, &main, &upper, &mut x).map_err(|e| match e {
                        SolverError::SingularSystem { index, .. } => {
                            SolverError::SingularSystem { mode: j, index }
                        }
                        other => other,
                    })?;
                    Ok(x)
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let out = field.device_level_mut(0)?;
        for (j, col) in new_cols.iter().enumerate() {
            for (i, v) in col.iter().enumerate() {
                out[i * frow + j] = *v;
            }
        }
        Ok(())
    }

    /// Solve `L·x = src` per mode with the precomputed bands, writing the
    /// solution into `dst`. Inverts the Laplace-type operator directly
    /// (no time-step scaling).
    pub fn invert_laplace(
        &self,
        src: &SlabField<Complex64>,
        t_src: usize,
        dst: &mut SlabField<Complex64>,
        t_dst: usize,
    ) -> Result<(), SolverError> {
        self.check_spectral_operand("invert_laplace src", src.layout())?;
        self.check_spectral_operand("invert_laplace dst", dst.layout())?;

        let modes = self.transposed.nx;
        let points = self.transposed.my;
        let frow = src.layout().row_len();
        let trow = self.transposed.row_len();

        let new_cols: Vec<Vec<Complex64>> = {
            let data = src.device_level(t_src)?;
            let band_d = self.diag.device_level(0)?;
            let band_l = self.diag_l.device_level(0)?;
            let band_u = self.diag_u.device_level(0)?;

            (0..modes)
                .into_par_iter()
                .map(|j| -> Result<Vec<Complex64>, SolverError> {
                    let base = j * trow;
                    let mut x: Vec<Complex64> =
                        (0..points).map(|i| data[i * frow + j]).collect();
                    solve_tridiagonal(
                        &band_l[base..base + points],
                        &band_d[base..base + points],
                        &band_u[base..base + points],
                        &mut x,
                    )
                    .map_err(|e| match e {
                        SolverError::SingularSystem { index, .. } => {
                            SolverError::SingularSystem { mode: j, index }
                        }
                        other => other,
                    })?;
                    Ok(x)
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let out = dst.device_level_mut(t_dst)?;
        for (j, col) in new_cols.iter().enumerate() {
            for (i, v) in col.iter().enumerate() {
                out[i * frow + j] = *v;
            }
        }
        Ok(())
    }

    fn check_spectral_operand(
        &self,
        context: &'static str,
        layout: &SlabLayout,
    ) -> Result<(), SolverError> {
        if layout.nx != self.transposed.my || layout.my != self.transposed.nx {
            return Err(SolverError::DimensionMismatch {
                context,
                expected: (self.transposed.my, self.transposed.nx),
                actual: (layout.nx, layout.my),
            });
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &SlabLayout {
        &self.layout
    }

    #[inline]
    #[must_use]
    pub const fn transposed_layout(&self) -> &SlabLayout {
        &self.transposed
    }

    #[inline]
    #[must_use]
    pub const fn bvals(&self) -> &BoundarySet<f64> {
        &self.bvals
    }

    #[inline]
    #[must_use]
    pub const fn params(&self) -> &StiffParams {
        &self.params
    }

    #[inline]
    #[must_use]
    pub const fn main_band(&self) -> &SlabField<Complex64> {
        &self.diag
    }

    #[inline]
    #[must_use]
    pub const fn lower_band(&self) -> &SlabField<Complex64> {
        &self.diag_l
    }

    #[inline]
    #[must_use]
    pub const fn upper_band(&self) -> &SlabField<Complex64> {
        &self.diag_u
    }
}
