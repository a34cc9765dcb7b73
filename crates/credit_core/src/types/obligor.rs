//! Obligor records.

use super::ids::{ObligorId, RatingGroup};
use crate::error::NumericDomainError;

/// One row of a credit portfolio.
///
/// Obligors are immutable once constructed. All attributes are validated by
/// [`Obligor::new`]; out-of-domain values are rejected rather than clamped so
/// that a simulation never runs on silently altered inputs.
///
/// # Examples
///
/// ```
/// use credit_core::types::{Obligor, ObligorId, RatingGroup};
///
/// let obligor = Obligor::new(ObligorId::new(1), 0.02, 1_000.0, 0.45, 0.4, RatingGroup::new("A")).unwrap();
/// assert_eq!(obligor.loss_on_default(), 450.0);
///
/// let err = Obligor::new(ObligorId::new(2), 1.2, 1_000.0, 0.45, 0.4, RatingGroup::new("A"));
/// assert!(err.is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obligor {
    id: ObligorId,
    probability_of_default: f64,
    exposure_at_default: f64,
    loss_given_default: f64,
    factor_loading: f64,
    rating: RatingGroup,
}

impl Obligor {
    /// Creates a validated obligor.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique obligor identifier (stable across filtering)
    /// * `probability_of_default` - One-period PD in `[0, 1]`
    /// * `exposure_at_default` - Finite, non-negative exposure
    /// * `loss_given_default` - Loss fraction on default in `[0, 1]`
    /// * `factor_loading` - Systematic factor loading in `[-1, 1]`
    /// * `rating` - Rating bucket
    ///
    /// # Errors
    ///
    /// Returns [`NumericDomainError`] naming the obligor when any value is out
    /// of its domain or not finite.
    pub fn new(
        id: ObligorId,
        probability_of_default: f64,
        exposure_at_default: f64,
        loss_given_default: f64,
        factor_loading: f64,
        rating: RatingGroup,
    ) -> Result<Self, NumericDomainError> {
        if !(0.0..=1.0).contains(&probability_of_default) {
            return Err(NumericDomainError::ProbabilityOfDefault {
                obligor: id,
                value: probability_of_default,
            });
        }
        if !exposure_at_default.is_finite() || exposure_at_default < 0.0 {
            return Err(NumericDomainError::ExposureAtDefault {
                obligor: id,
                value: exposure_at_default,
            });
        }
        if !(0.0..=1.0).contains(&loss_given_default) {
            return Err(NumericDomainError::LossGivenDefault {
                obligor: id,
                value: loss_given_default,
            });
        }
        if !(-1.0..=1.0).contains(&factor_loading) {
            return Err(NumericDomainError::FactorLoading {
                obligor: id,
                scenario: None,
                value: factor_loading,
            });
        }

        Ok(Self {
            id,
            probability_of_default,
            exposure_at_default,
            loss_given_default,
            factor_loading,
            rating,
        })
    }

    /// Returns the obligor id.
    #[inline]
    pub fn id(&self) -> ObligorId {
        self.id
    }

    /// Returns the probability of default.
    #[inline]
    pub fn probability_of_default(&self) -> f64 {
        self.probability_of_default
    }

    /// Returns the exposure at default.
    #[inline]
    pub fn exposure_at_default(&self) -> f64 {
        self.exposure_at_default
    }

    /// Returns the loss given default.
    #[inline]
    pub fn loss_given_default(&self) -> f64 {
        self.loss_given_default
    }

    /// Returns the obligor-level factor loading.
    #[inline]
    pub fn factor_loading(&self) -> f64 {
        self.factor_loading
    }

    /// Returns the rating group.
    #[inline]
    pub fn rating(&self) -> &RatingGroup {
        &self.rating
    }

    /// Loss realised on default: `EAD * LGD`.
    #[inline]
    pub fn loss_on_default(&self) -> f64 {
        self.exposure_at_default * self.loss_given_default
    }

    /// Returns a copy with a different probability of default.
    ///
    /// The id is kept, so the copy consumes exactly the same random streams.
    pub fn with_probability_of_default(&self, pd: f64) -> Result<Self, NumericDomainError> {
        Self::new(
            self.id,
            pd,
            self.exposure_at_default,
            self.loss_given_default,
            self.factor_loading,
            self.rating.clone(),
        )
    }
}
