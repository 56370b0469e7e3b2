// SPDX-License-Identifier: AGPL-3.0-only

//! Quark fields and their parity views.
//!
//! A [`SpinorField`] owns a flat `Vec<Complex64>` laid out as
//!
//!   `((s · Vh + cb) · n_spin + spin) · 3 + color`
//!
//! per parity, where `Vh` is the 4D half volume and `s` the fifth-dimension
//! slice (`ls = 1` for 4D fields). A full field stores the even half and
//! then the odd half, so a parity sub-field is a contiguous slice and can be
//! borrowed as a [`SpinorView`] / [`SpinorViewMut`] without copying.
//!
//! Which 4D sites a slice holds depends on the checkerboard convention: with
//! [`Checkerboard::FourD`] every slice of parity `p` holds the 4D sites of
//! parity `p`; with [`Checkerboard::FiveD`] the 5D parity `(Σx + s) mod 2`
//! is `p`, so odd slices hold the opposite 4D parity.

use std::fmt;

use rayon::prelude::*;

use crate::error::{DiracError, Result};
use crate::lattice::complex_f64::Complex64;
use crate::lattice::constants::{lcg_gaussian, N_COLORS, N_SPIN_STAGGERED, N_SPIN_WILSON};
use crate::lattice::gamma::{SpinColor, ZERO_SPINOR};
use crate::lattice::geometry::{LatticeGeometry, Parity};
use crate::lattice::su3::ColorVector;

/// Which sites a field is defined on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SiteSubset {
    Full,
    Parity(Parity),
}

impl fmt::Display for SiteSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::Parity(p) => write!(f, "{p}"),
        }
    }
}

/// Even-odd convention for fields with a fifth dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Checkerboard {
    /// Parity from the 4D coordinates only.
    FourD,
    /// Parity from the 4D coordinates plus the slice index.
    FiveD,
}

/// Shape of a quark field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldLayout {
    pub geometry: LatticeGeometry,
    /// Spin components per site: 4 (Wilson-like) or 1 (staggered).
    pub n_spin: usize,
    /// Fifth-dimension extent (flavor index for doublets), 1 for 4D fields.
    pub ls: usize,
    pub checkerboard: Checkerboard,
    pub subset: SiteSubset,
}

impl FieldLayout {
    /// Four-spinor 4D field.
    #[must_use]
    pub const fn wilson(geometry: LatticeGeometry, subset: SiteSubset) -> Self {
        Self {
            geometry,
            n_spin: N_SPIN_WILSON,
            ls: 1,
            checkerboard: Checkerboard::FourD,
            subset,
        }
    }

    /// Color-only 4D field.
    #[must_use]
    pub const fn staggered(geometry: LatticeGeometry, subset: SiteSubset) -> Self {
        Self {
            geometry,
            n_spin: N_SPIN_STAGGERED,
            ls: 1,
            checkerboard: Checkerboard::FourD,
            subset,
        }
    }

    /// Four-spinor field with `ls` stacked 4D slices.
    #[must_use]
    pub const fn five_d(
        geometry: LatticeGeometry,
        ls: usize,
        checkerboard: Checkerboard,
        subset: SiteSubset,
    ) -> Self {
        Self {
            geometry,
            n_spin: N_SPIN_WILSON,
            ls,
            checkerboard,
            subset,
        }
    }

    #[must_use]
    pub const fn with_subset(self, subset: SiteSubset) -> Self {
        Self { subset, ..self }
    }

    #[must_use]
    pub const fn with_checkerboard(self, checkerboard: Checkerboard) -> Self {
        Self {
            checkerboard,
            ..self
        }
    }

    /// Complex numbers per site.
    #[inline]
    #[must_use]
    pub const fn site_len(&self) -> usize {
        self.n_spin * N_COLORS
    }

    /// Complex numbers in one parity.
    #[inline]
    #[must_use]
    pub const fn parity_len(&self) -> usize {
        self.ls * self.geometry.half_volume() * self.site_len()
    }

    /// Complex numbers in the whole field.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        match self.subset {
            SiteSubset::Full => 2 * self.parity_len(),
            SiteSubset::Parity(_) => self.parity_len(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parity of a single-parity field.
    #[must_use]
    pub const fn parity(&self) -> Option<Parity> {
        match self.subset {
            SiteSubset::Full => None,
            SiteSubset::Parity(p) => Some(p),
        }
    }

    /// 4D parity of the sites held in slice `s` of a parity-`p` half.
    #[inline]
    #[must_use]
    pub const fn slice_site_parity(&self, p: Parity, s: usize) -> Parity {
        match self.checkerboard {
            Checkerboard::FourD => p,
            Checkerboard::FiveD => {
                if s & 1 == 0 {
                    p
                } else {
                    p.opposite()
                }
            }
        }
    }

    /// Parity half that holds 4D site `x` in slice `s`.
    #[inline]
    #[must_use]
    pub const fn half_of(&self, x: [usize; 4], s: usize) -> Parity {
        let p4 = self.geometry.site_parity(x);
        match self.checkerboard {
            Checkerboard::FourD => p4,
            Checkerboard::FiveD => Parity::from_sum(p4.index() + s),
        }
    }

    /// Offset of `(s, cb)` inside one parity half.
    #[inline]
    #[must_use]
    pub const fn site_offset(&self, s: usize, cb: usize) -> usize {
        (s * self.geometry.half_volume() + cb) * self.site_len()
    }

    /// Offset of 4D site `x` in slice `s` inside this field, `None` if the
    /// field does not contain it.
    #[must_use]
    pub fn offset_of(&self, x: [usize; 4], s: usize) -> Option<usize> {
        if s >= self.ls {
            return None;
        }
        let half = self.half_of(x, s);
        let base = match self.subset {
            SiteSubset::Full => half.index() * self.parity_len(),
            SiteSubset::Parity(p) if p == half => 0,
            SiteSubset::Parity(_) => return None,
        };
        Some(base + self.site_offset(s, self.geometry.cb_index(x)))
    }

    /// Same geometry, spin, extent and checkerboard (subset may differ).
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.geometry == other.geometry
            && self.n_spin == other.n_spin
            && self.ls == other.ls
            && self.checkerboard == other.checkerboard
    }

    /// Require `other` to match this layout exactly.
    ///
    /// # Errors
    ///
    /// [`DiracError::ShapeMismatch`] or [`DiracError::ParityMismatch`].
    pub fn ensure_matches(&self, operation: &'static str, other: &Self) -> Result<()> {
        if !self.same_shape(other) {
            return Err(DiracError::ShapeMismatch(format!(
                "{operation}: {self} vs {other}"
            )));
        }
        if self.subset != other.subset {
            return Err(DiracError::ParityMismatch {
                operation,
                expected: self.subset,
                found: other.subset,
            });
        }
        Ok(())
    }

    /// Require a given subset.
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] when the subset differs.
    pub fn ensure_subset(&self, operation: &'static str, expected: SiteSubset) -> Result<()> {
        if self.subset == expected {
            Ok(())
        } else {
            Err(DiracError::ParityMismatch {
                operation,
                expected,
                found: self.subset,
            })
        }
    }
}

impl fmt::Display for FieldLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ns={} ls={} {:?} {}",
            self.geometry, self.n_spin, self.ls, self.checkerboard, self.subset
        )
    }
}

/// Owned quark field.
#[derive(Clone, Debug, PartialEq)]
pub struct SpinorField {
    layout: FieldLayout,
    data: Vec<Complex64>,
}

impl SpinorField {
    #[must_use]
    pub fn zeros(layout: FieldLayout) -> Self {
        Self {
            layout,
            data: vec![Complex64::ZERO; layout.len()],
        }
    }

    /// Gaussian random entries from the LCG, deterministic in `seed`.
    #[must_use]
    pub fn random(layout: FieldLayout, seed: u64) -> Self {
        let mut rng = seed;
        let data = (0..layout.len())
            .map(|_| {
                let re = lcg_gaussian(&mut rng);
                let im = lcg_gaussian(&mut rng);
                Complex64::new(re, im)
            })
            .collect();
        Self { layout, data }
    }

    /// Unit impulse at site `x`, slice `s`, given spin and color.
    ///
    /// # Errors
    ///
    /// [`DiracError::ShapeMismatch`] if the field does not hold that site.
    pub fn point_source(
        layout: FieldLayout,
        x: [usize; 4],
        s: usize,
        spin: usize,
        color: usize,
    ) -> Result<Self> {
        let mut f = Self::zeros(layout);
        let off = layout
            .offset_of(x, s)
            .filter(|_| spin < layout.n_spin && color < N_COLORS)
            .ok_or_else(|| {
                DiracError::ShapeMismatch(format!(
                    "point source {x:?} s={s} spin={spin} color={color} not in {layout}"
                ))
            })?;
        f.data[off + spin * N_COLORS + color] = Complex64::ONE;
        Ok(f)
    }

    #[must_use]
    pub const fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    #[must_use]
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Complex64] {
        &mut self.data
    }

    #[must_use]
    pub fn view(&self) -> SpinorView<'_> {
        SpinorView {
            layout: self.layout,
            data: &self.data,
        }
    }

    pub fn view_mut(&mut self) -> SpinorViewMut<'_> {
        SpinorViewMut {
            layout: self.layout,
            data: &mut self.data,
        }
    }

    /// Leading storage viewed as `layout`, if the shapes agree and the field
    /// holds at least `layout.len()` values. Lets a full-size buffer stand in
    /// for a single-parity temporary.
    pub fn view_as_mut(&mut self, layout: FieldLayout) -> Option<SpinorViewMut<'_>> {
        if !self.layout.same_shape(&layout) || self.data.len() < layout.len() {
            return None;
        }
        Some(SpinorViewMut {
            layout,
            data: &mut self.data[..layout.len()],
        })
    }

    /// Read-only parity half of a full field.
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] if the field is not full.
    pub fn parity(&self, p: Parity) -> Result<SpinorView<'_>> {
        self.view().into_parity(p)
    }

    /// Mutable parity half of a full field.
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] if the field is not full.
    pub fn parity_mut(&mut self, p: Parity) -> Result<SpinorViewMut<'_>> {
        self.view_mut().into_parity_mut(p)
    }

    /// Both halves of a full field, `(even, odd)`.
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] if the field is not full.
    pub fn split_parity_mut(&mut self) -> Result<(SpinorViewMut<'_>, SpinorViewMut<'_>)> {
        self.view_mut().into_split()
    }

    /// Spin-color content of site `x`, slice `s` (zero spinor for staggered
    /// fields beyond the first spin).
    #[must_use]
    pub fn site(&self, x: [usize; 4], s: usize) -> Option<SpinColor> {
        let off = self.layout.offset_of(x, s)?;
        Some(load_site(&self.data, off, self.layout.n_spin))
    }

    pub fn norm2(&self) -> f64 {
        self.view().norm2()
    }

    /// `<self | other>`
    ///
    /// # Errors
    ///
    /// Layout mismatch.
    pub fn dot(&self, other: &Self) -> Result<Complex64> {
        self.view().dot(other.view())
    }

    /// # Errors
    ///
    /// Layout mismatch.
    pub fn copy_from(&mut self, src: SpinorView<'_>) -> Result<()> {
        self.view_mut().copy_from(src)
    }

    /// Same full field re-laid out under another checkerboard convention.
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] for single-parity fields (the site set
    /// of a parity changes with the convention).
    pub fn to_checkerboard(&self, checkerboard: Checkerboard) -> Result<Self> {
        self.layout.ensure_subset("to_checkerboard", SiteSubset::Full)?;
        let target = self.layout.with_checkerboard(checkerboard);
        let mut out = Self::zeros(target);
        let geom = self.layout.geometry;
        let sl = self.layout.site_len();
        for s in 0..self.layout.ls {
            for lex in 0..geom.volume() {
                let x = geom.lex_coords(lex);
                if let (Some(from), Some(to)) =
                    (self.layout.offset_of(x, s), target.offset_of(x, s))
                {
                    out.data[to..to + sl].copy_from_slice(&self.data[from..from + sl]);
                }
            }
        }
        Ok(out)
    }
}

/// Borrowed read-only field (whole field or one parity).
#[derive(Clone, Copy, Debug)]
pub struct SpinorView<'a> {
    layout: FieldLayout,
    data: &'a [Complex64],
}

impl<'a> SpinorView<'a> {
    /// # Errors
    ///
    /// [`DiracError::ShapeMismatch`] when the slice length disagrees with the
    /// layout.
    pub fn new(layout: FieldLayout, data: &'a [Complex64]) -> Result<Self> {
        if data.len() != layout.len() {
            return Err(DiracError::ShapeMismatch(format!(
                "{} values for {layout}",
                data.len()
            )));
        }
        Ok(Self { layout, data })
    }

    #[must_use]
    pub const fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    #[must_use]
    pub const fn data(&self) -> &'a [Complex64] {
        self.data
    }

    /// Parity half of a full view.
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] if the view is not full.
    pub fn into_parity(self, p: Parity) -> Result<SpinorView<'a>> {
        self.layout.ensure_subset("parity", SiteSubset::Full)?;
        let n = self.layout.parity_len();
        let start = p.index() * n;
        Ok(SpinorView {
            layout: self.layout.with_subset(SiteSubset::Parity(p)),
            data: &self.data[start..start + n],
        })
    }

    /// Same storage viewed as parity `p`.
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] for a full view.
    pub fn relabeled(self, p: Parity) -> Result<SpinorView<'a>> {
        if self.layout.parity().is_none() {
            return Err(DiracError::ParityMismatch {
                operation: "relabel",
                expected: SiteSubset::Parity(p),
                found: SiteSubset::Full,
            });
        }
        Ok(SpinorView {
            layout: self.layout.with_subset(SiteSubset::Parity(p)),
            data: self.data,
        })
    }

    /// `Σ |ψ|²`
    #[must_use]
    pub fn norm2(&self) -> f64 {
        self.data.par_iter().map(|z| z.abs_sq()).sum()
    }

    /// `<self | other>`
    ///
    /// # Errors
    ///
    /// Layout mismatch.
    pub fn dot(&self, other: SpinorView<'_>) -> Result<Complex64> {
        self.layout.ensure_matches("dot", &other.layout)?;
        Ok(self
            .data
            .par_iter()
            .zip(other.data.par_iter())
            .map(|(a, b)| a.conj_mul(*b))
            .sum())
    }

    /// Spin-color vector at `(s, cb)` of a parity view.
    #[inline]
    #[must_use]
    pub fn load(&self, s: usize, cb: usize) -> SpinColor {
        load_site(self.data, self.layout.site_offset(s, cb), self.layout.n_spin)
    }

    /// Color vector at `(s, cb)` of a staggered parity view.
    #[inline]
    #[must_use]
    pub fn load_color(&self, s: usize, cb: usize) -> ColorVector {
        let o = self.layout.site_offset(s, cb);
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }
}

/// Borrowed mutable field (whole field or one parity).
#[derive(Debug)]
pub struct SpinorViewMut<'a> {
    layout: FieldLayout,
    data: &'a mut [Complex64],
}

impl<'a> SpinorViewMut<'a> {
    /// # Errors
    ///
    /// [`DiracError::ShapeMismatch`] when the slice length disagrees with the
    /// layout.
    pub fn new(layout: FieldLayout, data: &'a mut [Complex64]) -> Result<Self> {
        if data.len() != layout.len() {
            return Err(DiracError::ShapeMismatch(format!(
                "{} values for {layout}",
                data.len()
            )));
        }
        Ok(Self { layout, data })
    }

    #[must_use]
    pub const fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    #[must_use]
    pub fn data(&self) -> &[Complex64] {
        &*self.data
    }

    pub fn data_mut(&mut self) -> &mut [Complex64] {
        &mut *self.data
    }

    /// Shorter-lived mutable view of the same storage.
    pub fn reborrow(&mut self) -> SpinorViewMut<'_> {
        SpinorViewMut {
            layout: self.layout,
            data: &mut *self.data,
        }
    }

    #[must_use]
    pub fn as_view(&self) -> SpinorView<'_> {
        SpinorView {
            layout: self.layout,
            data: &*self.data,
        }
    }

    /// Give up mutability for the rest of the borrow.
    #[must_use]
    pub fn into_view(self) -> SpinorView<'a> {
        SpinorView {
            layout: self.layout,
            data: self.data,
        }
    }

    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] if the view is not full.
    pub fn parity_mut(&mut self, p: Parity) -> Result<SpinorViewMut<'_>> {
        self.reborrow().into_parity_mut(p)
    }

    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] if the view is not full.
    pub fn parity(&self, p: Parity) -> Result<SpinorView<'_>> {
        self.as_view().into_parity(p)
    }

    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] if the view is not full.
    pub fn into_parity_mut(self, p: Parity) -> Result<SpinorViewMut<'a>> {
        self.layout.ensure_subset("parity", SiteSubset::Full)?;
        let n = self.layout.parity_len();
        let start = p.index() * n;
        let data = self.data;
        Ok(SpinorViewMut {
            layout: self.layout.with_subset(SiteSubset::Parity(p)),
            data: &mut data[start..start + n],
        })
    }

    /// Same storage viewed as parity `p`. Parity halves of one shape have
    /// equal length, so a buffer of one parity can hold the other.
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] for a full view.
    pub fn into_relabeled(self, p: Parity) -> Result<SpinorViewMut<'a>> {
        if self.layout.parity().is_none() {
            return Err(DiracError::ParityMismatch {
                operation: "relabel",
                expected: SiteSubset::Parity(p),
                found: SiteSubset::Full,
            });
        }
        Ok(SpinorViewMut {
            layout: self.layout.with_subset(SiteSubset::Parity(p)),
            data: self.data,
        })
    }

    /// `(even, odd)` halves of a full view.
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] if the view is not full.
    pub fn into_split(self) -> Result<(SpinorViewMut<'a>, SpinorViewMut<'a>)> {
        self.layout.ensure_subset("split_parity", SiteSubset::Full)?;
        let n = self.layout.parity_len();
        let layout = self.layout;
        let (even, odd) = self.data.split_at_mut(n);
        Ok((
            SpinorViewMut {
                layout: layout.with_subset(SiteSubset::Parity(Parity::Even)),
                data: even,
            },
            SpinorViewMut {
                layout: layout.with_subset(SiteSubset::Parity(Parity::Odd)),
                data: odd,
            },
        ))
    }

    /// `(p, opposite(p))` halves of a full view.
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] if the view is not full.
    pub fn split_by(&mut self, p: Parity) -> Result<(SpinorViewMut<'_>, SpinorViewMut<'_>)> {
        self.reborrow().into_split_by(p)
    }

    /// Consuming form of [`Self::split_by`].
    ///
    /// # Errors
    ///
    /// [`DiracError::ParityMismatch`] if the view is not full.
    pub fn into_split_by(self, p: Parity) -> Result<(SpinorViewMut<'a>, SpinorViewMut<'a>)> {
        let (even, odd) = self.into_split()?;
        Ok(match p {
            Parity::Even => (even, odd),
            Parity::Odd => (odd, even),
        })
    }

    /// # Errors
    ///
    /// Layout mismatch.
    pub fn copy_from(&mut self, src: SpinorView<'_>) -> Result<()> {
        self.layout.ensure_matches("copy", &src.layout)?;
        self.data.copy_from_slice(src.data);
        Ok(())
    }

    pub fn zero(&mut self) {
        self.data.fill(Complex64::ZERO);
    }

    /// Write a spin-color vector at `(s, cb)` of a parity view.
    #[inline]
    pub fn store(&mut self, s: usize, cb: usize, v: &SpinColor) {
        let o = self.layout.site_offset(s, cb);
        store_site(self.data, o, self.layout.n_spin, v);
    }
}

/// Read `n_spin` color vectors starting at `off`.
#[inline]
#[must_use]
pub fn load_site(data: &[Complex64], off: usize, n_spin: usize) -> SpinColor {
    let mut v = ZERO_SPINOR;
    for (spin, row) in v.iter_mut().enumerate().take(n_spin) {
        let o = off + spin * N_COLORS;
        row.copy_from_slice(&data[o..o + N_COLORS]);
    }
    v
}

/// Write `n_spin` color vectors starting at `off`.
#[inline]
pub fn store_site(data: &mut [Complex64], off: usize, n_spin: usize, v: &SpinColor) {
    for (spin, row) in v.iter().enumerate().take(n_spin) {
        let o = off + spin * N_COLORS;
        data[o..o + N_COLORS].copy_from_slice(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom() -> LatticeGeometry {
        LatticeGeometry::new([4, 2, 2, 4]).unwrap()
    }

    #[test]
    fn parity_halves_are_contiguous() {
        let layout = FieldLayout::wilson(geom(), SiteSubset::Full);
        let mut f = SpinorField::random(layout, 7);
        let n = layout.parity_len();
        let odd_first = f.data()[n];
        let odd = f.parity(Parity::Odd).unwrap();
        assert_eq!(odd.layout().subset, SiteSubset::Parity(Parity::Odd));
        assert_eq!(odd.data()[0], odd_first);

        let (mut e, o) = f.split_parity_mut().unwrap();
        e.zero();
        assert_eq!(o.data().len(), n);
        assert!(f.parity(Parity::Even).unwrap().norm2() == 0.0);
    }

    #[test]
    fn parity_of_parity_is_rejected() {
        let layout = FieldLayout::wilson(geom(), SiteSubset::Parity(Parity::Even));
        let f = SpinorField::zeros(layout);
        let err = f.parity(Parity::Even).unwrap_err();
        assert!(matches!(err, DiracError::ParityMismatch { .. }), "{err}");
    }

    #[test]
    fn point_source_lands_on_its_site() {
        let g = geom();
        let layout = FieldLayout::wilson(g, SiteSubset::Full);
        let x = [1, 0, 1, 3];
        let f = SpinorField::point_source(layout, x, 0, 2, 1).unwrap();
        assert!((f.norm2() - 1.0).abs() < 1e-15);
        let site = f.site(x, 0).unwrap();
        assert_eq!(site[2][1], Complex64::ONE);

        let wrong = FieldLayout::wilson(g, SiteSubset::Parity(Parity::Even));
        assert!(SpinorField::point_source(wrong, x, 0, 0, 0).is_err());
    }

    #[test]
    fn five_d_checkerboard_alternates_per_slice() {
        let layout = FieldLayout::five_d(geom(), 4, Checkerboard::FiveD, SiteSubset::Full);
        assert_eq!(layout.slice_site_parity(Parity::Even, 0), Parity::Even);
        assert_eq!(layout.slice_site_parity(Parity::Even, 1), Parity::Odd);
        assert_eq!(layout.half_of([1, 0, 0, 0], 1), Parity::Even);
    }

    #[test]
    fn checkerboard_conversion_roundtrip() {
        let layout = FieldLayout::five_d(geom(), 4, Checkerboard::FiveD, SiteSubset::Full);
        let f = SpinorField::random(layout, 3);
        let four = f.to_checkerboard(Checkerboard::FourD).unwrap();
        let x = [1, 1, 0, 2];
        assert_eq!(four.site(x, 3), f.site(x, 3));
        let back = four.to_checkerboard(Checkerboard::FiveD).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn dot_requires_matching_layouts() {
        let g = geom();
        let a = SpinorField::random(FieldLayout::wilson(g, SiteSubset::Full), 1);
        let b = SpinorField::random(FieldLayout::staggered(g, SiteSubset::Full), 2);
        assert!(matches!(a.dot(&b), Err(DiracError::ShapeMismatch(_))));
        let n = a.dot(&a).unwrap();
        assert!((n.re - a.norm2()).abs() < 1e-9 * a.norm2());
        assert!(n.im.abs() < 1e-9 * a.norm2());
    }
}
