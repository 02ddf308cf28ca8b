// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized numeric tolerances with documented rationale.
//!
//! Every threshold used by the solver internals and the test suites lives
//! here. No ad-hoc magic numbers at call sites.

// ═══════════════════════════════════════════════════════════════════
// Machine-precision tolerances (IEEE 754 f64)
// ═══════════════════════════════════════════════════════════════════

/// Operations that are exact up to a handful of f64 roundings
/// (arithmetic identities, single-mode spectral derivatives).
pub const EXACT_F64: f64 = 1e-12;

/// Forward transform → inverse transform → normalize, per element.
///
/// Each direction accumulates O(log My) butterfly roundings; for the grid
/// sizes used here the observed error stays below 1e-13 per unit amplitude.
pub const SPECTRAL_ROUNDTRIP: f64 = 1e-12;

/// One assembled tridiagonal solve against an analytic eigenmode.
///
/// Thomas elimination on a diagonally dominant system is backward stable;
/// the result matches the closed-form amplification factor to roughly
/// machine precision times the system size.
pub const STIFF_STEP_F64: f64 = 1e-10;

// ═══════════════════════════════════════════════════════════════════
// Pivot guards
// ═══════════════════════════════════════════════════════════════════

/// Smallest pivot modulus accepted by the tridiagonal elimination.
///
/// The assembled elliptic systems are strictly diagonally dominant, so a
/// pivot this small only appears when the system is genuinely singular
/// (e.g. a zero main diagonal passed in by a misconfigured caller). The
/// guard stays far below any physical diagonal magnitude (≥ 1/Δx²).
pub const TRIDIAG_PIVOT_GUARD: f64 = 1e-30;

// ═══════════════════════════════════════════════════════════════════
// Discretization accuracy (second-order finite differences)
// ═══════════════════════════════════════════════════════════════════

/// RMS error for the Gaussian Laplace inversion on a 64 x 64 slab
/// spanning [-10, 10]^2.
///
/// Truncation is (Δx²/12)·∂⁴g with max |∂⁴g| = 3 for the unit Gaussian,
/// amplified by the inverse-operator norm; measured errors sit near 3e-3,
/// the bound allows a generous safety factor.
pub const LAPLACE_L2_COARSE: f64 = 8e-2;

/// RMS error for the same scenario on a 128 x 128 slab (one refinement,
/// one quarter of the coarse truncation error).
pub const LAPLACE_L2_FINE: f64 = 2e-2;

/// Accepted range for the coarse/fine RMS error ratio under one grid
/// refinement. Second-order convergence gives exactly 4 in the asymptotic
/// regime; the band tolerates pre-asymptotic contamination from the
/// spectral direction and boundary cells.
pub const CONVERGENCE_RATIO_MIN: f64 = 3.0;
pub const CONVERGENCE_RATIO_MAX: f64 = 5.0;

/// Relative error for centered finite-difference derivatives of smooth
/// test profiles at the grid sizes used in the suites (Δx ≈ 0.1 gives
/// truncation near (Δx²/6)·max|∂³u| ≈ 2e-3).
pub const FD_DERIVATIVE_REL: f64 = 1e-2;
