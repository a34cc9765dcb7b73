//! Portfolio container and sub-portfolio selection.
//!
//! A sub-portfolio is produced by selecting obligor positions; the obligors
//! keep their ids, so every random stream address stays stable between the
//! parent and the subset.

use std::collections::HashSet;

use super::ids::ObligorId;
use super::obligor::Obligor;
use crate::error::ConfigurationError;

/// Ordered, immutable collection of obligors with unique ids.
///
/// # Examples
///
/// ```
/// use credit_core::types::{Obligor, ObligorId, Portfolio, RatingGroup};
///
/// let portfolio = Portfolio::new(vec![
///     Obligor::new(ObligorId::new(1), 0.01, 10.0, 0.5, 0.3, RatingGroup::new("A")).unwrap(),
///     Obligor::new(ObligorId::new(2), 0.05, 20.0, 0.5, 0.3, RatingGroup::new("B")).unwrap(),
/// ]).unwrap();
///
/// let positions = portfolio.positions_where(|o| o.rating().as_str() == "B");
/// let sub = portfolio.subset(&positions).unwrap();
/// assert_eq!(sub.len(), 1);
/// assert_eq!(sub.obligors()[0].id(), ObligorId::new(2));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Portfolio {
    obligors: Vec<Obligor>,
}

impl Portfolio {
    /// Creates a portfolio, rejecting duplicate obligor ids.
    pub fn new(obligors: Vec<Obligor>) -> Result<Self, ConfigurationError> {
        let mut seen = HashSet::with_capacity(obligors.len());
        for obligor in &obligors {
            if !seen.insert(obligor.id()) {
                return Err(ConfigurationError::DuplicateObligor(obligor.id()));
            }
        }
        Ok(Self { obligors })
    }

    /// Number of obligors.
    #[inline]
    pub fn len(&self) -> usize {
        self.obligors.len()
    }

    /// Whether the portfolio has no obligors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.obligors.is_empty()
    }

    /// Obligors in portfolio order.
    #[inline]
    pub fn obligors(&self) -> &[Obligor] {
        &self.obligors
    }

    /// Iterator over obligor ids in portfolio order.
    pub fn ids(&self) -> impl Iterator<Item = ObligorId> + '_ {
        self.obligors.iter().map(Obligor::id)
    }

    /// Position of the obligor with the given id.
    pub fn position_of(&self, id: ObligorId) -> Option<usize> {
        self.obligors.iter().position(|o| o.id() == id)
    }

    /// Positions of all obligors matching a predicate, in portfolio order.
    pub fn positions_where<F>(&self, predicate: F) -> Vec<usize>
    where
        F: Fn(&Obligor) -> bool,
    {
        self.obligors
            .iter()
            .enumerate()
            .filter(|(_, o)| predicate(o))
            .map(|(i, _)| i)
            .collect()
    }

    /// Builds the sub-portfolio at the given positions.
    ///
    /// Positions are taken in the order supplied. Obligor ids are preserved.
    ///
    /// # Errors
    ///
    /// - `PositionOutOfBounds` if a position is not in the portfolio
    /// - `DuplicateObligor` if a position is repeated
    pub fn subset(&self, positions: &[usize]) -> Result<Self, ConfigurationError> {
        let mut obligors = Vec::with_capacity(positions.len());
        for &position in positions {
            let obligor = self
                .obligors
                .get(position)
                .ok_or(ConfigurationError::PositionOutOfBounds {
                    position,
                    len: self.obligors.len(),
                })?;
            obligors.push(obligor.clone());
        }
        Self::new(obligors)
    }

    /// Total loss if every obligor defaults.
    pub fn total_loss_on_default(&self) -> f64 {
        self.obligors.iter().map(Obligor::loss_on_default).sum()
    }

    /// Returns a copy where the obligor at `position` is replaced.
    ///
    /// Used for what-if runs (e.g. PD bumps) where every other obligor and
    /// all random streams must stay untouched.
    pub fn with_replaced(
        &self,
        position: usize,
        obligor: Obligor,
    ) -> Result<Self, ConfigurationError> {
        if position >= self.obligors.len() {
            return Err(ConfigurationError::PositionOutOfBounds {
                position,
                len: self.obligors.len(),
            });
        }
        let mut obligors = self.obligors.clone();
        obligors[position] = obligor;
        Self::new(obligors)
    }
}
