// SPDX-License-Identifier: AGPL-3.0-only

//! Bounded multi-time-level field container.
//!
//! A [`SlabField`] owns `tlevs` time levels of an `(nx + pad_x) x
//! (my + pad_y)` block twice over: a compute arena that every numerical
//! operator runs against (data-parallel across cells on the rayon pool),
//! and a host mirror for inspection and persistence. The two sides are
//! never synchronized implicitly — [`SlabField::copy_to_host`] and
//! [`SlabField::copy_to_device`] are explicit whole-array barriers.
//!
//! Time levels form a ring: logical level 0 is always the most recently
//! computed state, level `tlevs - 1` the oldest retained.
//! [`SlabField::advance_time_levels`] rotates an index permutation over
//! fixed buffers — no payload moves, and the single ring covers both
//! arenas so the sides can never disagree about which buffer is newest.
//!
//! `evaluate`/`apply` are the sole write primitives used to build
//! numerical operators; they touch interior cells only and leave the
//! padding reserved for transform bookkeeping untouched.

use log::debug;
use rayon::prelude::*;

use crate::address::AddressMap;
use crate::element::Element;
use crate::error::SolverError;
use crate::geometry::{BoundaryCondition, BoundarySet, SlabLayout};

/// Multi-time-level bounded field with compute arena and host mirror.
pub struct SlabField<T: Element> {
    layout: SlabLayout,
    bvals: BoundarySet<T>,
    address: AddressMap<T>,
    tlevs: usize,
    /// Logical level -> buffer slot.
    ring: Vec<usize>,
    /// Compute arena, `tlevs * elems_per_level` elements.
    dev: Vec<T>,
    /// Host mirror, same extent.
    host: Vec<T>,
}

impl<T: Element> SlabField<T> {
    /// Allocate both arenas zero-initialized.
    ///
    /// The `(layout, bvals, tlevs)` triple is immutable for the object's
    /// lifetime; storage is released when the field is dropped.
    ///
    /// # Errors
    ///
    /// Configuration errors for zero extents, bad spacing, an unsupported
    /// boundary combination, or `tlevs == 0`.
    pub fn new(
        layout: SlabLayout,
        bvals: BoundarySet<T>,
        tlevs: usize,
    ) -> Result<Self, SolverError> {
        layout.validate()?;
        if tlevs == 0 {
            return Err(SolverError::config("a field needs at least one time level"));
        }
        let address = AddressMap::new(&layout, &bvals)?;
        let total = tlevs * layout.elems_per_level();
        debug!(
            "allocating field: {} x {} ({} levels, {} elements per arena)",
            layout.nx, layout.my, tlevs, total
        );
        Ok(Self {
            layout,
            bvals,
            address,
            tlevs,
            ring: (0..tlevs).collect(),
            dev: vec![T::default(); total],
            host: vec![T::default(); total],
        })
    }

    // ── Geometry and accessors ───────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &SlabLayout {
        &self.layout
    }

    #[inline]
    #[must_use]
    pub const fn bvals(&self) -> &BoundarySet<T> {
        &self.bvals
    }

    #[inline]
    #[must_use]
    pub const fn address(&self) -> &AddressMap<T> {
        &self.address
    }

    #[inline]
    #[must_use]
    pub const fn tlevs(&self) -> usize {
        self.tlevs
    }

    #[inline]
    #[must_use]
    pub const fn nx(&self) -> usize {
        self.layout.nx
    }

    #[inline]
    #[must_use]
    pub const fn my(&self) -> usize {
        self.layout.my
    }

    /// Buffer slot backing a logical time level.
    fn slot(&self, tlev: usize) -> Result<usize, SolverError> {
        if tlev < self.tlevs {
            Ok(self.ring[tlev])
        } else {
            Err(SolverError::TimeLevelOutOfRange {
                tlev,
                tlevs: self.tlevs,
            })
        }
    }

    fn slot_range(&self, slot: usize) -> std::ops::Range<usize> {
        let per = self.layout.elems_per_level();
        slot * per..(slot + 1) * per
    }

    /// Compute-arena view of one time level, for transform/solve
    /// collaborators.
    pub fn device_level(&self, tlev: usize) -> Result<&[T], SolverError> {
        let r = self.slot_range(self.slot(tlev)?);
        Ok(&self.dev[r])
    }

    /// Mutable compute-arena view of one time level.
    pub fn device_level_mut(&mut self, tlev: usize) -> Result<&mut [T], SolverError> {
        let r = self.slot_range(self.slot(tlev)?);
        Ok(&mut self.dev[r])
    }

    /// Host-mirror view of one time level (read after `copy_to_host`).
    pub fn host_level(&self, tlev: usize) -> Result<&[T], SolverError> {
        let r = self.slot_range(self.slot(tlev)?);
        Ok(&self.host[r])
    }

    // ── Element-wise evaluation ──────────────────────────────────────

    /// Evaluate `op(n, m, layout)` into every interior cell of `tlev`.
    ///
    /// Data-parallel across cells; padding cells are never written.
    /// Concurrent `evaluate` calls on the same level require external
    /// synchronization (the field does not serialize callers).
    pub fn evaluate<F>(&mut self, op: F, tlev: usize) -> Result<(), SolverError>
    where
        F: Fn(usize, usize, &SlabLayout) -> T + Sync,
    {
        let layout = self.layout;
        let row_len = layout.row_len();
        let data = self.device_level_mut(tlev)?;
        data.par_chunks_mut(row_len)
            .take(layout.nx)
            .enumerate()
            .for_each(|(n, row)| {
                for (m, cell) in row.iter_mut().take(layout.my).enumerate() {
                    *cell = op(n, m, &layout);
                }
            });
        Ok(())
    }

    /// Like [`SlabField::evaluate`], but passes the current cell value to
    /// the operator: `op(value, n, m, layout)`.
    pub fn apply<F>(&mut self, op: F, tlev: usize) -> Result<(), SolverError>
    where
        F: Fn(T, usize, usize, &SlabLayout) -> T + Sync,
    {
        let layout = self.layout;
        let row_len = layout.row_len();
        let data = self.device_level_mut(tlev)?;
        data.par_chunks_mut(row_len)
            .take(layout.nx)
            .enumerate()
            .for_each(|(n, row)| {
                for (m, cell) in row.iter_mut().take(layout.my).enumerate() {
                    *cell = op(*cell, n, m, &layout);
                }
            });
        Ok(())
    }

    // ── Host-mirror element access ───────────────────────────────────

    /// Read one host-mirror element with direct addressing — no wrapping,
    /// no ghost interpolation. Meant for inspecting materialized data,
    /// not for domain-physics queries.
    pub fn element_at(&self, tlev: usize, n: usize, m: usize) -> Result<T, SolverError> {
        let slot = self.slot(tlev)?;
        self.check_element(n, m)?;
        Ok(self.host[slot * self.layout.elems_per_level() + self.layout.index(n, m)])
    }

    /// Write one host-mirror element with direct addressing.
    pub fn set_element(
        &mut self,
        tlev: usize,
        n: usize,
        m: usize,
        value: T,
    ) -> Result<(), SolverError> {
        let slot = self.slot(tlev)?;
        self.check_element(n, m)?;
        let idx = slot * self.layout.elems_per_level() + self.layout.index(n, m);
        self.host[idx] = value;
        Ok(())
    }

    fn check_element(&self, n: usize, m: usize) -> Result<(), SolverError> {
        if n < self.layout.rows_alloc() && m < self.layout.row_len() {
            Ok(())
        } else {
            Err(SolverError::ElementOutOfRange {
                row: n,
                col: m,
                rows: self.layout.rows_alloc(),
                cols: self.layout.row_len(),
            })
        }
    }

    // ── Transfers ────────────────────────────────────────────────────

    /// Copy the whole compute arena (every time level) into the host
    /// mirror. Blocking; returns only after the copy completes.
    pub fn copy_to_host(&mut self) {
        self.host.copy_from_slice(&self.dev);
    }

    /// Copy the whole host mirror into the compute arena. Blocking.
    pub fn copy_to_device(&mut self) {
        self.dev.copy_from_slice(&self.host);
    }

    // ── Time-level ring ──────────────────────────────────────────────

    /// Rotate the level ring by one position without copying payload.
    ///
    /// The buffer that held the oldest level becomes logical level 0 with
    /// its stale content intact; zero it explicitly (`zero_level`) when
    /// the next writer needs a clean slate. `tlevs` rotations restore the
    /// original assignment.
    pub fn advance_time_levels(&mut self) {
        self.ring.rotate_right(1);
    }

    /// Zero all cells (including padding) of one level's compute buffer.
    pub fn zero_level(&mut self, tlev: usize) -> Result<(), SolverError> {
        self.fill_level(tlev, T::default())
    }

    /// Fill one level's compute buffer with a constant.
    pub fn fill_level(&mut self, tlev: usize, value: T) -> Result<(), SolverError> {
        self.device_level_mut(tlev)?.fill(value);
        Ok(())
    }

    /// Copy the compute payload of `t_src` onto `t_dst`.
    pub fn copy_level(&mut self, t_dst: usize, t_src: usize) -> Result<(), SolverError> {
        let dst = self.slot(t_dst)?;
        let src = self.slot(t_src)?;
        if dst == src {
            return Ok(());
        }
        let src_range = self.slot_range(src);
        let dst_start = self.slot_range(dst).start;
        self.dev.copy_within(src_range, dst_start);
        Ok(())
    }

    /// Move the compute payload of `t_src` onto `t_dst`, zeroing `t_src`.
    pub fn move_level(&mut self, t_dst: usize, t_src: usize) -> Result<(), SolverError> {
        self.copy_level(t_dst, t_src)?;
        if self.slot(t_dst)? != self.slot(t_src)? {
            self.zero_level(t_src)?;
        }
        Ok(())
    }

    // ── Numerics ─────────────────────────────────────────────────────

    /// Undo the scaling of an unnormalized inverse transform on `tlev`.
    ///
    /// Divides every interior cell by `my` when the x-edges carry
    /// Dirichlet/Neumann conditions (row transform along y only) and by
    /// `nx·my` when x is periodic (full 2-D transform).
    pub fn normalize(&mut self, tlev: usize) -> Result<(), SolverError> {
        let cells = match self.bvals.left {
            BoundaryCondition::Periodic => (self.layout.nx * self.layout.my) as f64,
            _ => self.layout.my as f64,
        };
        self.apply(move |v, _, _, _| v / cells, tlev)
    }

    /// Interior RMS of one compute-arena level:
    /// `sqrt(sum |u|² / (nx·my))`.
    pub fn l2_norm(&self, tlev: usize) -> Result<f64, SolverError> {
        let layout = self.layout;
        let data = self.device_level(tlev)?;
        let sum: f64 = data
            .par_chunks(layout.row_len())
            .take(layout.nx)
            .map(|row| row.iter().take(layout.my).map(|v| v.norm_sq()).sum::<f64>())
            .sum();
        Ok((sum / (layout.nx * layout.my) as f64).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(nx: usize, my: usize) -> SlabLayout {
        SlabLayout {
            x_left: -1.0,
            delta_x: 2.0 / nx as f64,
            y_low: -1.0,
            delta_y: 2.0 / my as f64,
            nx,
            pad_x: 0,
            my,
            pad_y: 2,
        }
    }

    fn field(nx: usize, my: usize, tlevs: usize) -> SlabField<f64> {
        SlabField::new(layout(nx, my), BoundarySet::dirichlet(0.0, 0.0), tlevs).expect("field")
    }

    #[test]
    fn construction_zero_fills_every_level() {
        let mut f = field(4, 6, 3);
        f.copy_to_host();
        for t in 0..3 {
            for n in 0..4 {
                for m in 0..8 {
                    assert_eq!(f.element_at(t, n, m).expect("in bounds"), 0.0);
                }
            }
        }
    }

    #[test]
    fn zero_extents_rejected() {
        let mut l = layout(4, 6);
        l.nx = 0;
        assert!(SlabField::<f64>::new(l, BoundarySet::dirichlet(0.0, 0.0), 1).is_err());
        let mut l = layout(4, 6);
        l.my = 0;
        assert!(SlabField::<f64>::new(l, BoundarySet::dirichlet(0.0, 0.0), 1).is_err());
        assert!(SlabField::<f64>::new(layout(4, 6), BoundarySet::dirichlet(0.0, 0.0), 0).is_err());
    }

    #[test]
    fn evaluate_writes_interior_only() {
        let mut f = field(4, 6, 1);
        f.evaluate(|_, _, _| 1.0, 0).expect("evaluate");
        f.copy_to_host();
        for n in 0..4 {
            for m in 0..8 {
                let v = f.element_at(0, n, m).expect("in bounds");
                if m < 6 {
                    assert_eq!(v, 1.0, "interior cell ({n}, {m})");
                } else {
                    assert_eq!(v, 0.0, "padding cell ({n}, {m}) must stay untouched");
                }
            }
        }
    }

    #[test]
    fn apply_sees_existing_values() {
        let mut f = field(4, 6, 1);
        f.evaluate(|n, m, _| (n * 10 + m) as f64, 0).expect("seed");
        f.apply(|v, _, _, _| v * 2.0, 0).expect("double");
        f.copy_to_host();
        assert_eq!(f.element_at(0, 3, 5).expect("read"), 70.0);
    }

    #[test]
    fn evaluate_rejects_bad_level() {
        let mut f = field(4, 6, 2);
        assert!(matches!(
            f.evaluate(|_, _, _| 0.0, 2),
            Err(SolverError::TimeLevelOutOfRange { tlev: 2, tlevs: 2 })
        ));
    }

    #[test]
    fn element_access_bounds() {
        let f = field(4, 6, 1);
        assert!(f.element_at(0, 3, 7).is_ok());
        assert!(matches!(
            f.element_at(0, 4, 0),
            Err(SolverError::ElementOutOfRange { .. })
        ));
        assert!(f.element_at(0, 0, 8).is_err());
    }

    #[test]
    fn set_element_edits_host_then_uploads() {
        let mut f = field(4, 6, 2);
        f.set_element(1, 2, 3, 5.5).expect("write host");
        assert_eq!(f.element_at(1, 2, 3).expect("read host"), 5.5);
        // Not visible on the compute side until an explicit upload.
        assert_eq!(f.device_level(1).expect("level")[2 * 8 + 3], 0.0);
        f.copy_to_device();
        assert_eq!(f.device_level(1).expect("level")[2 * 8 + 3], 5.5);
        assert!(f.set_element(2, 0, 0, 1.0).is_err(), "level bound enforced");
    }

    #[test]
    fn copy_roundtrip_bit_identical() {
        let mut f = field(8, 8, 2);
        f.evaluate(|n, m, g| (g.x(n) * 1.7).sin() + (m as f64).cos(), 0)
            .expect("populate");
        f.evaluate(|n, m, _| (n as f64) - 0.25 * (m as f64), 1)
            .expect("populate");
        f.copy_to_host();
        let before: Vec<f64> = (0..2)
            .flat_map(|t| {
                let lvl = f.host_level(t).expect("level");
                lvl.to_vec()
            })
            .collect();
        f.copy_to_device();
        f.copy_to_host();
        let after: Vec<f64> = (0..2)
            .flat_map(|t| f.host_level(t).expect("level").to_vec())
            .collect();
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after.iter()) {
            assert!(a.to_bits() == b.to_bits(), "round-trip must be bit-exact");
        }
    }

    #[test]
    fn advance_rotates_without_copy() {
        let mut f = field(2, 2, 3);
        for t in 0..3 {
            f.fill_level(t, (t + 1) as f64).expect("fill");
        }
        f.advance_time_levels();
        // Old oldest (level 2, payload 3.0) is now logical level 0.
        f.copy_to_host();
        assert_eq!(f.element_at(0, 0, 0).expect("read"), 3.0);
        assert_eq!(f.element_at(1, 0, 0).expect("read"), 1.0);
        assert_eq!(f.element_at(2, 0, 0).expect("read"), 2.0);
    }

    #[test]
    fn advance_cycle_law() {
        let mut f = field(2, 2, 4);
        for t in 0..4 {
            f.fill_level(t, t as f64).expect("fill");
        }
        for _ in 0..4 {
            f.advance_time_levels();
        }
        f.copy_to_host();
        for t in 0..4 {
            assert_eq!(
                f.element_at(t, 1, 1).expect("read"),
                t as f64,
                "tlevs rotations must restore the original assignment"
            );
        }
    }

    #[test]
    fn copy_and_move_levels() {
        let mut f = field(2, 2, 3);
        f.fill_level(2, 9.0).expect("fill");
        f.copy_level(0, 2).expect("copy");
        f.copy_to_host();
        assert_eq!(f.element_at(0, 0, 0).expect("read"), 9.0);
        assert_eq!(f.element_at(2, 0, 0).expect("read"), 9.0);

        f.move_level(1, 2).expect("move");
        f.copy_to_host();
        assert_eq!(f.element_at(1, 0, 0).expect("read"), 9.0);
        assert_eq!(f.element_at(2, 0, 0).expect("read"), 0.0, "move zeroes source");
    }

    #[test]
    fn normalize_divides_by_row_count_for_bounded_x() {
        let mut f = field(4, 8, 1);
        f.fill_level(0, 16.0).expect("fill");
        f.normalize(0).expect("normalize");
        f.copy_to_host();
        assert_eq!(f.element_at(0, 2, 3).expect("read"), 2.0);
    }

    #[test]
    fn normalize_divides_by_cell_count_for_periodic_x() {
        let mut f =
            SlabField::<f64>::new(layout(4, 8), BoundarySet::periodic(), 1).expect("field");
        f.fill_level(0, 64.0).expect("fill");
        f.normalize(0).expect("normalize");
        f.copy_to_host();
        assert_eq!(f.element_at(0, 2, 3).expect("read"), 2.0);
    }

    #[test]
    fn l2_norm_of_constant() {
        let mut f = field(6, 10, 1);
        f.evaluate(|_, _, _| 3.0, 0).expect("fill interior");
        let l2 = f.l2_norm(0).expect("l2");
        assert!((l2 - 3.0).abs() < 1e-14, "RMS of a constant is the constant");
    }
}
