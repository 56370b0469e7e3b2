// SPDX-License-Identifier: AGPL-3.0-only

//! Lattice constants, per-site kernel flop counts, and the LCG used for
//! deterministic field initialization.

/// Number of colors in QCD (SU(3)).
pub const N_COLORS: usize = 3;

/// Number of spacetime dimensions.
pub const N_DIM: usize = 4;

/// Spin components of a Wilson-like (four-spinor) field.
pub const N_SPIN_WILSON: usize = 4;

/// Spin components of a staggered field (color only).
pub const N_SPIN_STAGGERED: usize = 1;

/// Largest supported fifth-dimension extent.
pub const MAX_LS: usize = 32;

/// LCG multiplier (Knuth MMIX).
pub const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;

/// LCG increment (Knuth MMIX).
pub const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// 53-bit mantissa divisor for LCG → uniform [0, 1).
pub const LCG_53_DIVISOR: f64 = (1u64 << 53) as f64;

/// Division guard for norms and Gram-Schmidt.
pub const LATTICE_DIVISION_GUARD: f64 = 1e-30;

/// Per-site flop counts of the reference stencil kernels.
///
/// Counted per output site (per fifth-dimension slice for 5D fields), in
/// the convention of the device kernels these mirror: a complex multiply-add
/// is 8 flops, a real-complex multiply-add is 4.
pub mod flops {
    /// Wilson hop: 8 directions, projection, SU(3) multiply, reconstruct.
    pub const WILSON_DSLASH: u64 = 1320;
    /// Wilson hop fused with `x + k·D in`.
    pub const WILSON_DSLASH_XPAY: u64 = 1368;
    /// Clover block multiply (two 6×6 blocks).
    pub const CLOVER: u64 = 504;
    /// Twist `1 + i a γ5`.
    pub const TWIST: u64 = 24;
    /// Non-degenerate twist (flavor mixing), per flavor.
    pub const TWIST_DOUBLET: u64 = 48;
    /// Fifth-dimension hop `(1∓γ5)ψ(s±1)`.
    pub const DSLASH5: u64 = 48;
    /// Fifth-dimension dense matrix, per slice of the summation.
    pub const DSLASH5_DENSE_PER_LS: u64 = 48;
    /// Fused accumulate `x + k·y` per Wilson site.
    pub const XPAY_WILSON: u64 = 48;
    /// Naive staggered one-hop.
    pub const STAGGERED_DSLASH: u64 = 570;
    /// Improved staggered (fat one-hop + long three-hop).
    pub const IMPROVED_STAGGERED_DSLASH: u64 = 1146;
    /// Fused accumulate `k·x + y` per staggered site.
    pub const XPAY_STAGGERED: u64 = 12;
}

/// Advance the LCG state by one step.
#[inline]
pub fn lcg_step(seed: &mut u64) {
    *seed = seed
        .wrapping_mul(LCG_MULTIPLIER)
        .wrapping_add(LCG_INCREMENT);
}

/// Generate a uniform f64 in [0, 1) from 53 bits of LCG state.
#[inline]
pub fn lcg_uniform_f64(seed: &mut u64) -> f64 {
    lcg_step(seed);
    (*seed >> 11) as f64 / LCG_53_DIVISOR
}

/// Box-Muller Gaussian deviate N(0, 1) from two LCG draws.
#[inline]
pub fn lcg_gaussian(seed: &mut u64) -> f64 {
    let u1 = lcg_uniform_f64(seed);
    let u2 = lcg_uniform_f64(seed);
    (-2.0 * u1.max(LATTICE_DIVISION_GUARD).ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcg_step_deterministic() {
        let mut a = 42u64;
        let mut b = 42u64;
        lcg_step(&mut a);
        lcg_step(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn lcg_uniform_in_range() {
        let mut seed = 12345u64;
        for _ in 0..1000 {
            let v = lcg_uniform_f64(&mut seed);
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn lcg_gaussian_mean_near_zero() {
        let mut seed = 42u64;
        let n = 10_000;
        let sum: f64 = (0..n).map(|_| lcg_gaussian(&mut seed)).sum();
        let mean = sum / f64::from(n);
        assert!(mean.abs() < 0.1, "mean should be near 0, got {mean}");
    }

    #[test]
    #[allow(clippy::assertions_on_constants)]
    fn xpay_variants_cost_more_than_plain_hop() {
        assert!(flops::WILSON_DSLASH_XPAY > flops::WILSON_DSLASH);
        assert!(flops::IMPROVED_STAGGERED_DSLASH > flops::STAGGERED_DSLASH);
    }
}
