// SPDX-License-Identifier: AGPL-3.0-only

//! Complex tridiagonal elimination (Thomas algorithm).
//!
//! Solves one banded system per spectral mode during implicit time steps
//! and Laplace inversion. Bands follow the batched-solver convention: the
//! first element of the lower diagonal and the last element of the upper
//! diagonal are zero and never read.
//!
//! The assembled elliptic systems are strictly diagonally dominant, so the
//! elimination runs without pivoting; a pivot below the guard threshold
//! means the system is genuinely singular and is reported as such.

use crate::complex::Complex64;
use crate::error::SolverError;
use crate::tolerances::TRIDIAG_PIVOT_GUARD;

/// Solve `lower[i]·x[i-1] + diag[i]·x[i] + upper[i]·x[i+1] = rhs[i]`
/// in place: `rhs` holds the solution on return.
///
/// All four slices must share one length; `lower[0]` and `upper[n-1]`
/// are ignored per the banded convention.
///
/// # Errors
///
/// [`SolverError::DimensionMismatch`] on ragged inputs and
/// [`SolverError::SingularSystem`] on a vanishing pivot (`mode` is filled
/// in by the caller that knows which spectral mode this system belongs to).
pub fn solve_tridiagonal(
    lower: &[Complex64],
    diag: &[Complex64],
    upper: &[Complex64],
    rhs: &mut [Complex64],
) -> Result<(), SolverError> {
    let n = diag.len();
    if n == 0 || lower.len() != n || upper.len() != n || rhs.len() != n {
        return Err(SolverError::DimensionMismatch {
            context: "tridiagonal bands",
            expected: (n, n),
            actual: (lower.len(), rhs.len()),
        });
    }

    // Forward elimination: cp holds the modified upper coefficients.
    let mut cp = vec![Complex64::ZERO; n];
    let mut pivot = diag[0];
    if pivot.abs() < TRIDIAG_PIVOT_GUARD {
        return Err(SolverError::SingularSystem { mode: 0, index: 0 });
    }
    cp[0] = upper[0] / pivot;
    rhs[0] = rhs[0] / pivot;

    for i in 1..n {
        pivot = diag[i] - lower[i] * cp[i - 1];
        if pivot.abs() < TRIDIAG_PIVOT_GUARD {
            return Err(SolverError::SingularSystem { mode: 0, index: i });
        }
        cp[i] = upper[i] / pivot;
        rhs[i] = (rhs[i] - lower[i] * rhs[i - 1]) / pivot;
    }

    // Back substitution.
    for i in (0..n - 1).rev() {
        rhs[i] = rhs[i] - cp[i] * rhs[i + 1];
    }
    Ok(())
}

/// Multiply the banded operator onto a vector: `out[i] = lower[i]·x[i-1]
/// + diag[i]·x[i] + upper[i]·x[i+1]`. Used to verify assembled systems.
#[must_use]
pub fn apply_tridiagonal(
    lower: &[Complex64],
    diag: &[Complex64],
    upper: &[Complex64],
    x: &[Complex64],
) -> Vec<Complex64> {
    let n = diag.len();
    let mut out = vec![Complex64::ZERO; n];
    for i in 0..n {
        let mut acc = diag[i] * x[i];
        if i > 0 {
            acc += lower[i] * x[i - 1];
        }
        if i + 1 < n {
            acc += upper[i] * x[i + 1];
        }
        out[i] = acc;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64) -> Complex64 {
        Complex64::real(re)
    }

    #[test]
    fn solves_known_3x3() {
        // [ 2 1 0 ] [x]   [ 4 ]
        // [ 1 3 1 ] [y] = [ 9 ]      solution (1, 2, 1)
        // [ 0 1 2 ] [z]   [ 4 ]
        let lower = [c(0.0), c(1.0), c(1.0)];
        let diag = [c(2.0), c(3.0), c(2.0)];
        let upper = [c(1.0), c(1.0), c(0.0)];
        let mut rhs = [c(4.0), c(9.0), c(4.0)];
        solve_tridiagonal(&lower, &diag, &upper, &mut rhs).expect("solve");
        for (got, want) in rhs.iter().zip([1.0, 2.0, 1.0]) {
            assert!((got.re - want).abs() < 1e-13, "got {got}, want {want}");
            assert!(got.im.abs() < 1e-13);
        }
    }

    #[test]
    fn complex_rhs_preserved_through_solve() {
        let n = 16;
        let lower: Vec<Complex64> = (0..n).map(|i| c(if i == 0 { 0.0 } else { 1.0 })).collect();
        let upper: Vec<Complex64> = (0..n)
            .map(|i| c(if i == n - 1 { 0.0 } else { 1.0 }))
            .collect();
        let diag: Vec<Complex64> = (0..n).map(|_| c(-4.0)).collect();
        let x_true: Vec<Complex64> = (0..n)
            .map(|i| Complex64::new((i as f64 * 0.3).sin(), (i as f64 * 0.7).cos()))
            .collect();
        let mut rhs = apply_tridiagonal(&lower, &diag, &upper, &x_true);
        solve_tridiagonal(&lower, &diag, &upper, &mut rhs).expect("solve");
        for (got, want) in rhs.iter().zip(x_true.iter()) {
            assert!((*got - *want).abs() < 1e-12);
        }
    }

    #[test]
    fn convention_entries_never_read() {
        // Garbage in lower[0] / upper[n-1] must not change the solution.
        let diag = [c(2.0), c(2.0)];
        let mut rhs_a = [c(2.0), c(4.0)];
        let mut rhs_b = rhs_a;
        solve_tridiagonal(&[c(0.0), c(0.5)], &diag, &[c(0.5), c(0.0)], &mut rhs_a)
            .expect("solve a");
        solve_tridiagonal(&[c(1e9), c(0.5)], &diag, &[c(0.5), c(1e9)], &mut rhs_b)
            .expect("solve b");
        for (a, b) in rhs_a.iter().zip(rhs_b.iter()) {
            assert!((*a - *b).abs() < 1e-14);
        }
    }

    #[test]
    fn singular_reported_with_index() {
        let lower = [c(0.0), c(1.0)];
        let diag = [c(0.0), c(1.0)];
        let upper = [c(1.0), c(0.0)];
        let mut rhs = [c(1.0), c(1.0)];
        let err = solve_tridiagonal(&lower, &diag, &upper, &mut rhs).expect_err("singular");
        assert_eq!(err, SolverError::SingularSystem { mode: 0, index: 0 });
    }

    #[test]
    fn ragged_inputs_rejected() {
        let mut rhs = [c(1.0)];
        assert!(matches!(
            solve_tridiagonal(&[c(0.0), c(0.0)], &[c(1.0)], &[c(0.0)], &mut rhs),
            Err(SolverError::DimensionMismatch { .. })
        ));
    }
}
