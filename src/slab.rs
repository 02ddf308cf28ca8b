// SPDX-License-Identifier: AGPL-3.0-only

//! Slab assembly: named fields, operators and per-step orchestration.
//!
//! Bundles the dynamical state of a drift-wave slab — particle density
//! `theta`, vorticity `omega`, stream function `strmf`, their spatial
//! derivatives, spectral counterparts and explicit right-hand-side
//! history — together with the transform service and the stiff
//! integrator. Driver programs construct a slab, seed initial conditions
//! through `evaluate`, then repeatedly call [`Slab::step`].
//!
//! The physics of the explicit right-hand side is a collaborator behind
//! [`ExplicitRhs`]; the crate ships only the trivial [`NullRhs`] model
//! (pure implicit diffusion).

use log::info;
use rayon::prelude::*;
use std::f64::consts::TAU;

use crate::complex::Complex64;
use crate::config::SimulationConfig;
use crate::error::SolverError;
use crate::fft::{RowDft, SpectralTransform};
use crate::field::SlabField;
use crate::geometry::{BoundarySet, SlabLayout};
use crate::integrator::{KarniadakisIntegrator, StiffParams};

/// Real-space fields, one time level each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Theta,
    ThetaX,
    ThetaY,
    Omega,
    OmegaX,
    OmegaY,
    Strmf,
    StrmfX,
    StrmfY,
    Tmp,
}

const REAL_FIELDS: usize = 10;

/// Spectral fields. The two dynamical ones carry the full time-level
/// ring; the derived ones hold a single level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpectralKind {
    ThetaHat,
    ThetaYHat,
    OmegaHat,
    OmegaYHat,
    StrmfHat,
    StrmfYHat,
    TmpHat,
}

const SPECTRAL_FIELDS: usize = 7;

/// Dynamical fields advanced by the stiff integrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DynField {
    Theta,
    Omega,
}

impl DynField {
    const fn spectral(self) -> SpectralKind {
        match self {
            Self::Theta => SpectralKind::ThetaHat,
            Self::Omega => SpectralKind::OmegaHat,
        }
    }
}

/// Read-only view handed to explicit right-hand-side models.
pub struct RhsContext<'a> {
    pub layout: &'a SlabLayout,
    real: &'a [SlabField<f64>],
    spectral: &'a [SlabField<Complex64>],
}

impl<'a> RhsContext<'a> {
    #[must_use]
    pub fn field(&self, kind: FieldKind) -> &'a SlabField<f64> {
        &self.real[kind as usize]
    }

    #[must_use]
    pub fn spectral_field(&self, kind: SpectralKind) -> &'a SlabField<Complex64> {
        &self.spectral[kind as usize]
    }
}

/// Explicit right-hand-side evaluator: reads the dynamical state and
/// writes `N^n` into level 0 of both RHS containers. Invoked once per
/// step before the rings rotate.
pub trait ExplicitRhs: Send + Sync {
    fn eval(
        &self,
        ctx: &RhsContext<'_>,
        theta_rhs: &mut SlabField<Complex64>,
        omega_rhs: &mut SlabField<Complex64>,
    ) -> Result<(), SolverError>;
}

/// Zero explicit term: the slab evolves under implicit diffusion only.
pub struct NullRhs;

impl ExplicitRhs for NullRhs {
    fn eval(
        &self,
        _ctx: &RhsContext<'_>,
        theta_rhs: &mut SlabField<Complex64>,
        omega_rhs: &mut SlabField<Complex64>,
    ) -> Result<(), SolverError> {
        theta_rhs.zero_level(0)?;
        omega_rhs.zero_level(0)
    }
}

/// Pick `(immutable src, mutable dst)` out of one field vector.
fn two_mut<T: crate::element::Element>(
    fields: &mut [SlabField<T>],
    src: usize,
    dst: usize,
) -> Result<(&SlabField<T>, &mut SlabField<T>), SolverError> {
    if src == dst {
        return Err(SolverError::config(
            "source and destination fields must differ",
        ));
    }
    if src < dst {
        let (a, b) = fields.split_at_mut(dst);
        Ok((&a[src], &mut b[0]))
    } else {
        let (a, b) = fields.split_at_mut(src);
        Ok((&b[0], &mut a[dst]))
    }
}

/// The full dynamical slab.
pub struct Slab {
    layout: SlabLayout,
    bvals: BoundarySet<f64>,
    params: StiffParams,
    transform: RowDft,
    integrator: KarniadakisIntegrator,
    real: Vec<SlabField<f64>>,
    spectral: Vec<SlabField<Complex64>>,
    rhs: Vec<SlabField<Complex64>>,
    rhs_model: Box<dyn ExplicitRhs>,
    steps_taken: usize,
}

impl Slab {
    /// Allocate every field and plan the transforms.
    pub fn new(
        layout: SlabLayout,
        bvals: BoundarySet<f64>,
        params: StiffParams,
    ) -> Result<Self, SolverError> {
        layout.validate()?;
        params.validate()?;
        let spec_layout = layout.spectral();
        let spec_bvals = bvals.map(Complex64::real);

        let mut real = Vec::with_capacity(REAL_FIELDS);
        for _ in 0..REAL_FIELDS {
            real.push(SlabField::new(layout, bvals, 1)?);
        }
        let mut spectral = Vec::with_capacity(SPECTRAL_FIELDS);
        for kind in 0..SPECTRAL_FIELDS {
            let tlevs = if kind == SpectralKind::ThetaHat as usize
                || kind == SpectralKind::OmegaHat as usize
            {
                params.tlevs
            } else {
                1
            };
            spectral.push(SlabField::new(spec_layout, spec_bvals, tlevs)?);
        }
        let rhs = vec![
            SlabField::new(spec_layout, spec_bvals, params.tlevs - 1)?,
            SlabField::new(spec_layout, spec_bvals, params.tlevs - 1)?,
        ];

        info!(
            "slab {} x {}: {} spectral modes, dt = {}, order up to {}",
            layout.nx,
            layout.my,
            params.num_modes,
            params.delta_t,
            params.tlevs - 1
        );
        Ok(Self {
            layout,
            bvals,
            params,
            transform: RowDft::new(&layout)?,
            integrator: KarniadakisIntegrator::new(layout, bvals, params)?,
            real,
            spectral,
            rhs,
            rhs_model: Box::new(NullRhs),
            steps_taken: 0,
        })
    }

    /// Build a slab straight from a validated run configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SolverError> {
        config.validate()?;
        Self::new(config.layout(), config.boundaries(), config.stiff_params())
    }

    /// Swap in a physics model for the explicit terms.
    pub fn set_rhs_model(&mut self, model: Box<dyn ExplicitRhs>) {
        self.rhs_model = model;
    }

    // ── Field registry ───────────────────────────────────────────────

    #[must_use]
    pub fn field(&self, kind: FieldKind) -> &SlabField<f64> {
        &self.real[kind as usize]
    }

    #[must_use]
    pub fn field_mut(&mut self, kind: FieldKind) -> &mut SlabField<f64> {
        &mut self.real[kind as usize]
    }

    #[must_use]
    pub fn spectral_field(&self, kind: SpectralKind) -> &SlabField<Complex64> {
        &self.spectral[kind as usize]
    }

    #[must_use]
    pub fn spectral_field_mut(&mut self, kind: SpectralKind) -> &mut SlabField<Complex64> {
        &mut self.spectral[kind as usize]
    }

    #[must_use]
    pub fn rhs_field(&self, field: DynField) -> &SlabField<Complex64> {
        &self.rhs[field as usize]
    }

    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &SlabLayout {
        &self.layout
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
    pub const fn integrator(&self) -> &KarniadakisIntegrator {
        &self.integrator
    }

    #[inline]
    #[must_use]
    pub const fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    // ── Transforms ───────────────────────────────────────────────────

    /// Real field (level 0) → spectral field at `t_dst`.
    pub fn dft_forward(
        &mut self,
        src: FieldKind,
        dst: SpectralKind,
        t_dst: usize,
    ) -> Result<(), SolverError> {
        let transform = &self.transform;
        let src_ref = &self.real[src as usize];
        let dst_ref = &mut self.spectral[dst as usize];
        transform.forward(src_ref, 0, dst_ref, t_dst)
    }

    /// Spectral field at `t_src` → real field (level 0), normalized.
    pub fn dft_inverse(
        &mut self,
        src: SpectralKind,
        dst: FieldKind,
        t_src: usize,
    ) -> Result<(), SolverError> {
        let transform = &self.transform;
        let src_ref = &self.spectral[src as usize];
        let dst_ref = &mut self.real[dst as usize];
        transform.inverse(src_ref, t_src, dst_ref, 0)?;
        self.real[dst as usize].normalize(0)
    }

    // ── Derivatives ──────────────────────────────────────────────────

    /// Centered finite-difference x-derivative of a real field,
    /// `(u[n+1] − u[n-1]) / 2Δx`, resolving ghost rows through the
    /// boundary interpolators.
    pub fn d_dx(&mut self, src: FieldKind, dst: FieldKind) -> Result<(), SolverError> {
        let (src_ref, dst_ref) = two_mut(&mut self.real, src as usize, dst as usize)?;
        let layout = *src_ref.layout();
        let addr = *src_ref.address();
        let data = src_ref.device_level(0)?;
        let inv_2dx = 1.0 / (2.0 * layout.delta_x);
        let row_len = layout.row_len();
        let out = dst_ref.device_level_mut(0)?;
        out.par_chunks_mut(row_len)
            .take(layout.nx)
            .enumerate()
            .try_for_each(|(n, row)| -> Result<(), SolverError> {
                let ni = n as isize;
                for (m, cell) in row.iter_mut().take(layout.my).enumerate() {
                    let fwd = addr.resolve(data, ni + 1, m as isize)?;
                    let bwd = addr.resolve(data, ni - 1, m as isize)?;
                    *cell = (fwd - bwd) * inv_2dx;
                }
                Ok(())
            })
    }

    /// Spectral y-derivative: multiply mode `j` by `i·ky`. The Nyquist
    /// column (even `my`) is zeroed — its sine component is not
    /// representable on the grid, and a real inverse transform requires a
    /// real-valued highest coefficient.
    pub fn d_dy(
        &mut self,
        src: SpectralKind,
        dst: SpectralKind,
        t_src: usize,
    ) -> Result<(), SolverError> {
        let (src_ref, dst_ref) = two_mut(&mut self.spectral, src as usize, dst as usize)?;
        let spec = *src_ref.layout();
        let ly = self.layout.length_y();
        let my_even = self.layout.my % 2 == 0;
        let data = src_ref.device_level(t_src)?;
        let row_len = spec.row_len();
        let out = dst_ref.device_level_mut(0)?;
        out.par_chunks_mut(row_len)
            .take(spec.nx)
            .enumerate()
            .for_each(|(n, row)| {
                for (j, cell) in row.iter_mut().take(spec.my).enumerate() {
                    let nyquist = my_even && j == spec.my - 1;
                    let ky = if nyquist { 0.0 } else { TAU * j as f64 / ly };
                    *cell = data[n * row_len + j] * Complex64::new(0.0, ky);
                }
            });
        Ok(())
    }

    /// Invert the Laplace-type operator: `strmf = L⁻¹ omega`, per mode,
    /// using the integrator's precomputed bands.
    pub fn invert_laplace(
        &mut self,
        src: SpectralKind,
        dst: SpectralKind,
        t_src: usize,
        t_dst: usize,
    ) -> Result<(), SolverError> {
        let integrator = &self.integrator;
        let (src_ref, dst_ref) = two_mut(&mut self.spectral, src as usize, dst as usize)?;
        integrator.invert_laplace(src_ref, t_src, dst_ref, t_dst)
    }

    // ── Stepping ─────────────────────────────────────────────────────

    /// Forward-transform the seeded real fields into the spectral rings
    /// and derive the stream function. Call once after writing initial
    /// conditions into `Theta` and `Omega`.
    pub fn initialize(&mut self) -> Result<(), SolverError> {
        self.dft_forward(FieldKind::Theta, SpectralKind::ThetaHat, 0)?;
        self.dft_forward(FieldKind::Omega, SpectralKind::OmegaHat, 0)?;
        self.invert_laplace(SpectralKind::OmegaHat, SpectralKind::StrmfHat, 0, 0)?;
        self.update_real_fields(0)?;
        self.steps_taken = 0;
        Ok(())
    }

    /// Compute the explicit right-hand side into RHS level 0.
    pub fn compute_rhs(&mut self) -> Result<(), SolverError> {
        let ctx = RhsContext {
            layout: &self.layout,
            real: &self.real,
            spectral: &self.spectral,
        };
        let (theta_rhs, omega_rhs) = self.rhs.split_at_mut(1);
        self.rhs_model
            .eval(&ctx, &mut theta_rhs[0], &mut omega_rhs[0])
    }

    /// Rotate the time-level rings of the dynamical spectral fields.
    pub fn advance(&mut self) {
        self.spectral[SpectralKind::ThetaHat as usize].advance_time_levels();
        self.spectral[SpectralKind::OmegaHat as usize].advance_time_levels();
    }

    /// Integrate one dynamical field at the given order.
    pub fn integrate(&mut self, field: DynField, order: usize) -> Result<(), SolverError> {
        let integrator = &self.integrator;
        let rhs_ref = &self.rhs[field as usize];
        let field_ref = &mut self.spectral[field.spectral() as usize];
        integrator.integrate(field_ref, rhs_ref, order)
    }

    /// Scheme order for the next step; ramps 1 → `tlevs − 1` while the
    /// multi-step history fills.
    #[must_use]
    pub fn current_order(&self) -> usize {
        (self.steps_taken + 1).min(self.params.tlevs - 1)
    }

    /// One full time step: explicit RHS, ring rotation, stiff solves,
    /// stream-function update and real-field refresh.
    pub fn step(&mut self) -> Result<(), SolverError> {
        let order = self.current_order();
        self.rhs[DynField::Theta as usize].advance_time_levels();
        self.rhs[DynField::Omega as usize].advance_time_levels();
        self.compute_rhs()?;
        self.advance();
        self.integrate(DynField::Theta, order)?;
        self.integrate(DynField::Omega, order)?;
        self.invert_laplace(SpectralKind::OmegaHat, SpectralKind::StrmfHat, 0, 0)?;
        self.update_real_fields(0)?;
        self.steps_taken += 1;
        Ok(())
    }

    /// Refresh every real field and derivative from the spectral state at
    /// `tlev` (dynamical fields) and level 0 (derived fields).
    pub fn update_real_fields(&mut self, tlev: usize) -> Result<(), SolverError> {
        self.dft_inverse(SpectralKind::ThetaHat, FieldKind::Theta, tlev)?;
        self.d_dy(SpectralKind::ThetaHat, SpectralKind::ThetaYHat, tlev)?;
        self.dft_inverse(SpectralKind::ThetaYHat, FieldKind::ThetaY, 0)?;
        self.d_dx(FieldKind::Theta, FieldKind::ThetaX)?;

        self.dft_inverse(SpectralKind::OmegaHat, FieldKind::Omega, tlev)?;
        self.d_dy(SpectralKind::OmegaHat, SpectralKind::OmegaYHat, tlev)?;
        self.dft_inverse(SpectralKind::OmegaYHat, FieldKind::OmegaY, 0)?;
        self.d_dx(FieldKind::Omega, FieldKind::OmegaX)?;

        self.dft_inverse(SpectralKind::StrmfHat, FieldKind::Strmf, 0)?;
        self.d_dy(SpectralKind::StrmfHat, SpectralKind::StrmfYHat, 0)?;
        self.dft_inverse(SpectralKind::StrmfYHat, FieldKind::StrmfY, 0)?;
        self.d_dx(FieldKind::Strmf, FieldKind::StrmfX)?;
        Ok(())
    }
}
