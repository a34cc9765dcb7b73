//! Single-factor structural default model.
//!
//! For obligor `j` in scenario `m`, draw `k`:
//!
//! ```text
//! X = r * Z + sqrt(1 - r^2) * eps
//! default  <=>  X < Phi^-1(PD)
//! loss     =    EAD * LGD  if default, else 0
//! ```
//!
//! Everything here is pure and allocation-free; it runs once per work unit
//! in the engine's inner loop.

use credit_core::math::{inverse_norm_cdf, norm_cdf};
use credit_core::types::Obligor;

/// Default threshold `Phi^-1(pd)`.
///
/// `pd == 0` maps to `-inf` (never defaults) and `pd == 1` to `+inf`
/// (always defaults).
///
/// # Examples
///
/// ```rust
/// use credit_kernel::loss::default_threshold;
///
/// assert_eq!(default_threshold(0.0), f64::NEG_INFINITY);
/// assert_eq!(default_threshold(1.0), f64::INFINITY);
/// assert!((default_threshold(0.5)).abs() < 1e-15);
/// ```
#[inline]
pub fn default_threshold(pd: f64) -> f64 {
    inverse_norm_cdf(pd)
}

/// Latent asset value `r * z + sqrt(1 - r^2) * eps`.
#[inline(always)]
pub fn latent_variable(loading: f64, factor: f64, idiosyncratic: f64) -> f64 {
    loading * factor + (1.0 - loading * loading).sqrt() * idiosyncratic
}

/// Vasicek conditional default probability given the factor:
/// `Phi((Phi^-1(pd) - r * z) / sqrt(1 - r^2))`.
///
/// For `|r| == 1` the obligor is fully systematic and the result is the
/// indicator `r * z < Phi^-1(pd)`.
pub fn conditional_default_probability(pd: f64, loading: f64, factor: f64) -> f64 {
    let threshold = default_threshold(pd);
    let idio = (1.0 - loading * loading).sqrt();
    let shifted = threshold - loading * factor;
    if idio == 0.0 {
        return if shifted > 0.0 { 1.0 } else { 0.0 };
    }
    norm_cdf(shifted / idio)
}

/// Per-obligor constants hoisted out of the simulation loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObligorTerms {
    threshold: f64,
    loss_on_default: f64,
}

impl ObligorTerms {
    /// Precomputes the default threshold and `EAD * LGD`.
    #[inline]
    pub fn new(obligor: &Obligor) -> Self {
        Self {
            threshold: default_threshold(obligor.probability_of_default()),
            loss_on_default: obligor.loss_on_default(),
        }
    }

    /// Default threshold `Phi^-1(PD)`.
    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Loss realised on default.
    #[inline]
    pub fn loss_on_default(&self) -> f64 {
        self.loss_on_default
    }

    /// Whether the latent variable falls below the threshold.
    #[inline(always)]
    pub fn defaults(&self, loading: f64, factor: f64, idiosyncratic: f64) -> bool {
        latent_variable(loading, factor, idiosyncratic) < self.threshold
    }

    /// Loss of one work unit: `EAD * LGD` on default, otherwise zero.
    #[inline(always)]
    pub fn loss(&self, loading: f64, factor: f64, idiosyncratic: f64) -> f64 {
        if self.defaults(loading, factor, idiosyncratic) {
            self.loss_on_default
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use credit_core::types::{ObligorId, RatingGroup};

    fn obligor(pd: f64) -> Obligor {
        Obligor::new(ObligorId::new(1), pd, 100.0, 0.6, 0.5, RatingGroup::new("BBB")).unwrap()
    }

    #[test]
    fn test_threshold_reference_values() {
        assert_relative_eq!(default_threshold(0.05), -1.644_853_626_951_472_2, epsilon = 1e-12);
        assert_relative_eq!(default_threshold(0.20), -0.841_621_233_572_914_3, epsilon = 1e-12);
    }

    #[test]
    fn test_latent_variable() {
        assert_relative_eq!(latent_variable(0.0, 3.0, -0.7), -0.7);
        assert_relative_eq!(latent_variable(1.0, 3.0, -0.7), 3.0);
        assert_relative_eq!(latent_variable(0.6, 1.0, 1.0), 0.6 + 0.8, epsilon = 1e-15);
    }

    #[test]
    fn test_loss_on_default_and_survival() {
        let terms = ObligorTerms::new(&obligor(0.05));
        assert_relative_eq!(terms.loss_on_default(), 60.0);
        // Deep negative latent value defaults, positive does not.
        assert_eq!(terms.loss(0.5, -3.0, -3.0), 60.0);
        assert_eq!(terms.loss(0.5, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_boundary_probabilities() {
        let never = ObligorTerms::new(&obligor(0.0));
        let always = ObligorTerms::new(&obligor(1.0));
        for eps in [-40.0, -8.0, 0.0, 8.0, 40.0] {
            assert_eq!(never.loss(0.5, -10.0, eps), 0.0);
            assert_eq!(always.loss(0.5, 10.0, eps), 60.0);
        }
    }

    #[test]
    fn test_conditional_default_probability() {
        // Zero loading: conditional PD equals the unconditional one.
        assert_relative_eq!(conditional_default_probability(0.05, 0.0, 2.0), 0.05, epsilon = 1e-6);
        // Adverse factor raises the conditional PD, favourable lowers it.
        let bad = conditional_default_probability(0.05, 0.5, -2.0);
        let good = conditional_default_probability(0.05, 0.5, 2.0);
        assert!(bad > 0.05 && good < 0.05);
        // Fully systematic obligor.
        assert_eq!(conditional_default_probability(0.05, 1.0, -2.0), 1.0);
        assert_eq!(conditional_default_probability(0.05, 1.0, 0.0), 0.0);
    }
}
