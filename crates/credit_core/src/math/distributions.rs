//! Standard normal distribution functions.
//!
//! This module provides:
//! - `norm_cdf`: Cumulative distribution function (CDF)
//! - `norm_pdf`: Probability density function (PDF)
//! - `inverse_norm_cdf`: Quantile function, used for default thresholds
//!
//! `norm_cdf` and `norm_pdf` are generic over `T: Float`; the quantile
//! function is `f64`-only because it sits on the simulation hot path.

use num_traits::Float;

/// Square root of 2.
const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Complementary error function approximation using Horner's method.
///
/// Uses the Abramowitz and Stegun approximation (formula 7.1.26) which provides
/// maximum error of 1.5e-7 for all x.
#[inline]
fn erfc_approx<T: Float>(x: T) -> T {
    let one = T::one();
    let zero = T::zero();
    let abs_x = x.abs();

    let a1 = constant::<T>(0.254829592);
    let a2 = constant::<T>(-0.284496736);
    let a3 = constant::<T>(1.421413741);
    let a4 = constant::<T>(-1.453152027);
    let a5 = constant::<T>(1.061405429);
    let p = constant::<T>(0.3275911);

    let t = one / (one + p * abs_x);
    let poly = a1 + t * (a2 + t * (a3 + t * (a4 + t * a5)));
    let erfc_abs = t * poly * (-abs_x * abs_x).exp();

    // erfc(-x) = 2 - erfc(x)
    if x < zero {
        constant::<T>(2.0) - erfc_abs
    } else {
        erfc_abs
    }
}

#[inline]
fn constant<T: Float>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::nan)
}

/// Standard normal cumulative distribution function.
///
/// Computes P(X <= x) for X ~ N(0, 1) as `0.5 * erfc(-x / sqrt(2))`.
/// Accurate to about 1e-7; infinite arguments map to exactly 0 or 1.
///
/// # Examples
/// ```
/// use credit_core::math::norm_cdf;
///
/// assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-7);
/// assert!(norm_cdf(-3.0_f64) < 0.01);
/// assert_eq!(norm_cdf(f64::NEG_INFINITY), 0.0);
/// ```
#[inline]
pub fn norm_cdf<T: Float>(x: T) -> T {
    if x.is_infinite() {
        return if x > T::zero() { T::one() } else { T::zero() };
    }
    constant::<T>(0.5) * erfc_approx(-x / constant::<T>(SQRT_2))
}

/// Standard normal probability density function.
///
/// # Examples
/// ```
/// use credit_core::math::norm_pdf;
///
/// assert!((norm_pdf(0.0_f64) - 0.398_942_280_401_432_7).abs() < 1e-15);
/// ```
#[inline]
pub fn norm_pdf<T: Float>(x: T) -> T {
    constant::<T>(FRAC_1_SQRT_2PI) * (-x * x / constant::<T>(2.0)).exp()
}

// Wichura (1988), Algorithm AS241 PPND16.
const A: [f64; 8] = [
    3.387_132_872_796_366_608e0,
    1.331_416_678_917_843_774_5e2,
    1.971_590_950_306_551_442_7e3,
    1.373_169_376_550_946_112_5e4,
    4.592_195_393_154_987_145_7e4,
    6.726_577_092_700_870_085_3e4,
    3.343_057_558_358_812_810_5e4,
    2.509_080_928_730_122_672_7e3,
];
const B: [f64; 8] = [
    1.0,
    4.231_333_070_160_091_125_2e1,
    6.871_870_074_920_579_083_0e2,
    5.394_196_021_424_751_107_7e3,
    2.121_379_430_158_659_586_7e4,
    3.930_789_580_009_271_061_0e4,
    2.872_908_573_572_194_267_4e4,
    5.226_495_278_852_854_561_0e3,
];
const C: [f64; 8] = [
    1.423_437_110_749_683_577_34e0,
    4.630_337_846_156_545_295_90e0,
    5.769_497_221_460_691_405_50e0,
    3.647_848_324_763_204_605_04e0,
    1.270_458_252_452_368_382_58e0,
    2.417_807_251_774_506_117_70e-1,
    2.272_384_498_926_918_458_33e-2,
    7.745_450_142_783_414_076_40e-4,
];
const D: [f64; 8] = [
    1.0,
    2.053_191_626_637_758_821_87e0,
    1.676_384_830_183_803_849_40e0,
    6.897_673_349_851_000_045_50e-1,
    1.481_039_764_274_800_745_90e-1,
    1.519_866_656_361_645_719_66e-2,
    5.475_938_084_995_344_946_00e-4,
    1.050_750_071_644_416_843_24e-9,
];
const E: [f64; 8] = [
    6.657_904_643_501_103_777_20e0,
    5.463_784_911_164_114_369_90e0,
    1.784_826_539_917_291_335_80e0,
    2.965_605_718_285_048_912_30e-1,
    2.653_218_952_657_612_309_30e-2,
    1.242_660_947_388_078_438_60e-3,
    2.711_555_568_743_487_578_15e-5,
    2.010_334_399_292_288_132_65e-7,
];
const F: [f64; 8] = [
    1.0,
    5.998_322_065_558_879_376_90e-1,
    1.369_298_809_227_358_053_10e-1,
    1.487_536_129_085_061_485_25e-2,
    7.868_691_311_456_132_591_00e-4,
    1.846_318_317_510_054_681_80e-5,
    1.421_511_758_316_445_888_70e-7,
    2.044_263_103_389_939_785_64e-15,
];

#[inline(always)]
fn horner(c: &[f64; 8], r: f64) -> f64 {
    ((((((c[7] * r + c[6]) * r + c[5]) * r + c[4]) * r + c[3]) * r + c[2]) * r + c[1]) * r + c[0]
}

/// Standard normal quantile function Φ⁻¹(p).
///
/// Implements Wichura's AS241 (PPND16), accurate to about 1e-16 over the
/// whole open interval. The endpoints map to infinities rather than errors:
/// `p <= 0` gives `-inf` and `p >= 1` gives `+inf`. A NaN input gives NaN.
///
/// # Examples
/// ```
/// use credit_core::math::inverse_norm_cdf;
///
/// assert!((inverse_norm_cdf(0.975) - 1.959_963_984_540_054).abs() < 1e-14);
/// assert_eq!(inverse_norm_cdf(0.0), f64::NEG_INFINITY);
/// assert_eq!(inverse_norm_cdf(1.0), f64::INFINITY);
/// ```
#[inline]
pub fn inverse_norm_cdf(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let q = p - 0.5;
    if q.abs() <= 0.425 {
        let r = 0.180625 - q * q;
        return q * horner(&A, r) / horner(&B, r);
    }

    let tail = if q < 0.0 { p } else { 1.0 - p };
    let mut r = (-tail.ln()).sqrt();
    let x = if r <= 5.0 {
        r -= 1.6;
        horner(&C, r) / horner(&D, r)
    } else {
        r -= 5.0;
        horner(&E, r) / horner(&F, r)
    };
    if q < 0.0 {
        -x
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    #[test]
    fn test_norm_cdf_reference_values() {
        assert_abs_diff_eq!(norm_cdf(0.0_f64), 0.5, epsilon = 1e-7);
        assert_abs_diff_eq!(norm_cdf(1.0_f64), 0.841_344_746_068_542_9, epsilon = 2e-7);
        assert_abs_diff_eq!(norm_cdf(-1.959_963_984_540_054_f64), 0.025, epsilon = 2e-7);
    }

    #[test]
    fn test_norm_cdf_infinities() {
        assert_eq!(norm_cdf(f64::INFINITY), 1.0);
        assert_eq!(norm_cdf(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_norm_pdf_symmetry() {
        assert_relative_eq!(norm_pdf(1.3_f64), norm_pdf(-1.3_f64));
    }

    #[test]
    fn test_inverse_reference_values() {
        // Reference quantiles to 16 significant digits.
        let cases = [
            (0.5, 0.0),
            (0.05, -1.644_853_626_951_472_6),
            (0.2, -0.841_621_233_572_914_2),
            (0.01, -2.326_347_874_040_840_8),
            (0.975, 1.959_963_984_540_053_6),
            (1e-20, -9.262_340_089_798_405),
        ];
        for (p, expected) in cases {
            assert_abs_diff_eq!(inverse_norm_cdf(p), expected, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_inverse_extreme_tail() {
        let x = inverse_norm_cdf(1e-300);
        assert!(x.is_finite());
        assert!(x < -37.0);
    }

    #[test]
    fn test_inverse_endpoints() {
        assert_eq!(inverse_norm_cdf(0.0), f64::NEG_INFINITY);
        assert_eq!(inverse_norm_cdf(1.0), f64::INFINITY);
        assert_eq!(inverse_norm_cdf(-0.5), f64::NEG_INFINITY);
        assert!(inverse_norm_cdf(f64::NAN).is_nan());
    }

    #[test]
    fn test_inverse_antisymmetry() {
        for p in [0.001, 0.1, 0.3, 0.45] {
            assert_abs_diff_eq!(inverse_norm_cdf(p), -inverse_norm_cdf(1.0 - p), epsilon = 1e-12);
        }
    }

    proptest! {
        #[test]
        fn prop_cdf_inverts_quantile(p in 1e-6_f64..(1.0 - 1e-6)) {
            let x = inverse_norm_cdf(p);
            prop_assert!((norm_cdf(x) - p).abs() < 5e-7);
        }

        #[test]
        fn prop_quantile_is_monotone(a in 1e-9_f64..0.999_999, b in 1e-9_f64..0.999_999) {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            prop_assert!(inverse_norm_cdf(lo) <= inverse_norm_cdf(hi));
        }
    }
}
