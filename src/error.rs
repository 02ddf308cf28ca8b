// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for slab construction and solver operations.
//!
//! Every fallible public API returns this enum instead of a sentinel value
//! or a stringly error, so callers can pattern-match on failure modes
//! (bad configuration, index out of range, collaborator failure) and decide
//! policy themselves. Nothing is retried or corrected inside the core.

use std::fmt;

/// Errors arising from slab configuration, addressing, or backend calls.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Invalid layout or parameter set, detected at construction or at the
    /// start of an operation.
    Config(String),

    /// A boundary kind the finite-difference ghost layer cannot service
    /// (periodic x-edges must go through a transform-based method).
    UnsupportedBoundary {
        /// Which x-edge was requested ("left" or "right").
        side: &'static str,
        /// The offending boundary kind.
        kind: &'static str,
    },

    /// Row index outside the one-ghost-layer window `[-1, nx]`.
    RowOutOfRange { row: isize, nx: usize },

    /// Time level index at or beyond the container's level count.
    TimeLevelOutOfRange { tlev: usize, tlevs: usize },

    /// Host-mirror element index outside the allocated block.
    ElementOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Operand shapes do not match (rows, columns).
    DimensionMismatch {
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// The transform collaborator reported failure.
    Transform(String),

    /// Tridiagonal elimination hit a vanishing pivot.
    SingularSystem { mode: usize, index: usize },
}

impl SolverError {
    /// Shorthand for a configuration error with a formatted message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Self::UnsupportedBoundary { side, kind } => {
                write!(
                    f,
                    "unsupported {side} boundary kind '{kind}' for finite-difference ghost points"
                )
            }
            Self::RowOutOfRange { row, nx } => {
                write!(f, "row index {row} outside ghost window [-1, {nx}]")
            }
            Self::TimeLevelOutOfRange { tlev, tlevs } => {
                write!(f, "time level {tlev} out of range (container holds {tlevs})")
            }
            Self::ElementOutOfRange {
                row,
                col,
                rows,
                cols,
            } => {
                write!(
                    f,
                    "element ({row}, {col}) outside allocated block {rows} x {cols}"
                )
            }
            Self::DimensionMismatch {
                context,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{context}: dimension mismatch, expected {} x {}, got {} x {}",
                    expected.0, expected.1, actual.0, actual.1
                )
            }
            Self::Transform(msg) => write!(f, "transform failed: {msg}"),
            Self::SingularSystem { mode, index } => {
                write!(
                    f,
                    "tridiagonal system singular at mode {mode}, element {index}"
                )
            }
        }
    }
}

impl std::error::Error for SolverError {}
