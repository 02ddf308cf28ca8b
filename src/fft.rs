// SPDX-License-Identifier: AGPL-3.0-only

//! Row-wise real↔spectral transform service.
//!
//! The solver treats the DFT as an opaque collaborator behind
//! [`SpectralTransform`]: forward takes a real field level into a complex
//! one, inverse goes back, and neither normalizes — callers follow an
//! inverse with [`crate::field::SlabField::normalize`] when they need the
//! original scale (some transform backends return unnormalized
//! coefficients, so normalization is a separate, explicit step).
//!
//! [`RowDft`] is the packaged implementation: a 1-D real-to-complex DFT
//! along each row (the periodic y-direction), `my` samples in,
//! `my/2 + 1` coefficients out, planned once per layout.

use std::sync::Arc;

use log::debug;
use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use crate::complex::Complex64;
use crate::error::SolverError;
use crate::field::SlabField;
use crate::geometry::SlabLayout;

/// Opaque forward/inverse transform pair over container levels.
pub trait SpectralTransform {
    /// Real level `t_src` of `src` → spectral level `t_dst` of `dst`.
    fn forward(
        &self,
        src: &SlabField<f64>,
        t_src: usize,
        dst: &mut SlabField<Complex64>,
        t_dst: usize,
    ) -> Result<(), SolverError>;

    /// Spectral level `t_src` of `src` → real level `t_dst` of `dst`,
    /// unnormalized. Does not modify `src`.
    fn inverse(
        &self,
        src: &SlabField<Complex64>,
        t_src: usize,
        dst: &mut SlabField<f64>,
        t_dst: usize,
    ) -> Result<(), SolverError>;
}

/// Planned per-row real↔complex DFT for one slab layout.
pub struct RowDft {
    /// Real samples per row.
    len: usize,
    /// Complex coefficients per row, `len/2 + 1`.
    spec_len: usize,
    rows: usize,
    r2c: Arc<dyn RealToComplex<f64>>,
    c2r: Arc<dyn ComplexToReal<f64>>,
}

impl RowDft {
    /// Plan forward and inverse transforms for `layout`'s row length.
    pub fn new(layout: &SlabLayout) -> Result<Self, SolverError> {
        layout.validate()?;
        let len = layout.my;
        let spec_len = len / 2 + 1;
        if layout.spectral().my != spec_len {
            return Err(SolverError::config(format!(
                "row padding {} cannot hold {} spectral coefficients",
                layout.pad_y, spec_len
            )));
        }
        debug!("planning row DFT: {len} real -> {spec_len} complex");
        let mut planner = RealFftPlanner::<f64>::new();
        Ok(Self {
            len,
            spec_len,
            rows: layout.nx,
            r2c: planner.plan_fft_forward(len),
            c2r: planner.plan_fft_inverse(len),
        })
    }

    fn check_pair(
        &self,
        real: &SlabLayout,
        spectral: &SlabLayout,
    ) -> Result<(), SolverError> {
        if real.nx != self.rows || real.my != self.len {
            return Err(SolverError::DimensionMismatch {
                context: "transform real operand",
                expected: (self.rows, self.len),
                actual: (real.nx, real.my),
            });
        }
        if spectral.nx != self.rows || spectral.my != self.spec_len {
            return Err(SolverError::DimensionMismatch {
                context: "transform spectral operand",
                expected: (self.rows, self.spec_len),
                actual: (spectral.nx, spectral.my),
            });
        }
        Ok(())
    }
}

impl SpectralTransform for RowDft {
    fn forward(
        &self,
        src: &SlabField<f64>,
        t_src: usize,
        dst: &mut SlabField<Complex64>,
        t_dst: usize,
    ) -> Result<(), SolverError> {
        self.check_pair(src.layout(), dst.layout())?;
        let src_row_len = src.layout().row_len();
        let dst_row_len = dst.layout().row_len();
        let data = src.device_level(t_src)?;
        let out = dst.device_level_mut(t_dst)?;

        let mut input = vec![0.0_f64; self.len];
        let mut spectrum = vec![Complex::new(0.0, 0.0); self.spec_len];
        for n in 0..self.rows {
            input.copy_from_slice(&data[n * src_row_len..n * src_row_len + self.len]);
            self.r2c
                .process(&mut input, &mut spectrum)
                .map_err(|e| SolverError::Transform(e.to_string()))?;
            let dst_row = &mut out[n * dst_row_len..n * dst_row_len + self.spec_len];
            dst_row.copy_from_slice(bytemuck::cast_slice(&spectrum));
        }
        Ok(())
    }

    fn inverse(
        &self,
        src: &SlabField<Complex64>,
        t_src: usize,
        dst: &mut SlabField<f64>,
        t_dst: usize,
    ) -> Result<(), SolverError> {
        self.check_pair(dst.layout(), src.layout())?;
        let src_row_len = src.layout().row_len();
        let dst_row_len = dst.layout().row_len();
        let data = src.device_level(t_src)?;
        let out = dst.device_level_mut(t_dst)?;

        // The backend consumes its spectral input, so each row is staged
        // through scratch and the source level stays intact.
        let mut spectrum = vec![Complex::new(0.0, 0.0); self.spec_len];
        let mut output = vec![0.0_f64; self.len];
        for n in 0..self.rows {
            let src_row = &data[n * src_row_len..n * src_row_len + self.spec_len];
            spectrum.copy_from_slice(bytemuck::cast_slice(src_row));
            self.c2r
                .process(&mut spectrum, &mut output)
                .map_err(|e| SolverError::Transform(e.to_string()))?;
            out[n * dst_row_len..n * dst_row_len + self.len].copy_from_slice(&output);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundarySet;
    use crate::tolerances::SPECTRAL_ROUNDTRIP;
    use std::f64::consts::TAU;

    fn layout(nx: usize, my: usize) -> SlabLayout {
        SlabLayout {
            x_left: 0.0,
            delta_x: 1.0 / nx as f64,
            y_low: 0.0,
            delta_y: 1.0 / my as f64,
            nx,
            pad_x: 0,
            my,
            pad_y: 2,
        }
    }

    fn pair(nx: usize, my: usize) -> (SlabField<f64>, SlabField<Complex64>, RowDft) {
        let l = layout(nx, my);
        let real = SlabField::new(l, BoundarySet::dirichlet(0.0, 0.0), 1).expect("real");
        let spec = SlabField::new(
            l.spectral(),
            BoundarySet::dirichlet(Complex64::ZERO, Complex64::ZERO),
            1,
        )
        .expect("spectral");
        let dft = RowDft::new(&l).expect("plan");
        (real, spec, dft)
    }

    #[test]
    fn forward_of_constant_is_dc_bin() {
        let (mut real, mut spec, dft) = pair(4, 16);
        real.evaluate(|_, _, _| 2.5, 0).expect("fill");
        dft.forward(&real, 0, &mut spec, 0).expect("forward");
        spec.copy_to_host();
        for n in 0..4 {
            let dc = spec.element_at(0, n, 0).expect("dc");
            assert!((dc.re - 2.5 * 16.0).abs() < 1e-12, "DC bin holds my * mean");
            assert!(dc.im.abs() < 1e-13);
            for j in 1..9 {
                assert!(spec.element_at(0, n, j).expect("bin").abs() < 1e-12);
            }
        }
    }

    #[test]
    fn single_harmonic_lands_in_one_bin() {
        let (mut real, mut spec, dft) = pair(2, 32);
        real.evaluate(|_, m, _| (TAU * 3.0 * m as f64 / 32.0).cos(), 0)
            .expect("fill");
        dft.forward(&real, 0, &mut spec, 0).expect("forward");
        spec.copy_to_host();
        let peak = spec.element_at(0, 0, 3).expect("bin 3");
        assert!((peak.re - 16.0).abs() < 1e-10, "cos amplitude my/2, got {peak}");
        for j in [0usize, 1, 2, 4, 8, 16] {
            if j != 3 {
                assert!(spec.element_at(0, 0, j).expect("bin").abs() < 1e-10);
            }
        }
    }

    #[test]
    fn roundtrip_restores_field_after_normalize() {
        let (mut real, mut spec, dft) = pair(8, 32);
        real.evaluate(
            |n, m, g| (TAU * g.y(m) / g.length_y()).sin() + 0.3 * (n as f64),
            0,
        )
        .expect("fill");
        let before: Vec<f64> = real.device_level(0).expect("level").to_vec();
        dft.forward(&real, 0, &mut spec, 0).expect("forward");
        dft.inverse(&spec, 0, &mut real, 0).expect("inverse");
        real.normalize(0).expect("normalize");
        let after = real.device_level(0).expect("level");
        let row_len = real.layout().row_len();
        for n in 0..8 {
            for m in 0..32 {
                let i = n * row_len + m;
                assert!(
                    (before[i] - after[i]).abs() < SPECTRAL_ROUNDTRIP,
                    "cell ({n}, {m}): {} vs {}",
                    before[i],
                    after[i]
                );
            }
        }
    }

    #[test]
    fn inverse_leaves_source_intact() {
        let (mut real, mut spec, dft) = pair(2, 16);
        real.evaluate(|_, m, _| (m as f64).sin(), 0).expect("fill");
        dft.forward(&real, 0, &mut spec, 0).expect("forward");
        let saved: Vec<Complex64> = spec.device_level(0).expect("level").to_vec();
        dft.inverse(&spec, 0, &mut real, 0).expect("inverse");
        let now = spec.device_level(0).expect("level");
        assert_eq!(saved, now, "inverse must not consume the spectral source");
    }

    #[test]
    fn mismatched_operands_rejected() {
        let (_, mut spec, dft) = pair(4, 16);
        let other = layout(4, 32);
        let real_other =
            SlabField::<f64>::new(other, BoundarySet::dirichlet(0.0, 0.0), 1).expect("field");
        assert!(matches!(
            dft.forward(&real_other, 0, &mut spec, 0),
            Err(SolverError::DimensionMismatch { .. })
        ));
        // A second forward with the matching pair still works: planning is
        // per-layout, failures leave the service reusable.
        let (real, _, _) = pair(4, 16);
        assert!(dft.forward(&real, 0, &mut spec, 0).is_ok());
    }
}
