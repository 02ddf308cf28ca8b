// SPDX-License-Identifier: AGPL-3.0-only

//! Scalar element trait for bounded field containers.
//!
//! Fields hold either real samples (`f64`) or spectral coefficients
//! ([`crate::complex::Complex64`]); the container, addressing layer and
//! ghost-point interpolators only need the small set of operations below.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Sub};

/// Scalar stored in a [`crate::field::SlabField`].
///
/// `Mul<f64>` / `Div<f64>` cover real rescaling (ghost interpolation,
/// integrator weights, transform normalization) without requiring full
/// closure under complex multiplication at this level.
pub trait Element:
    Copy
    + Default
    + Debug
    + PartialEq
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
{
    /// Squared modulus, as summed by interior L2 norms.
    fn norm_sq(self) -> f64;
}

impl Element for f64 {
    #[inline]
    fn norm_sq(self) -> f64 {
        self * self
    }
}
