//! Portfolio and scenario model.
//!
//! - [`ObligorId`], [`RatingGroup`]: identifiers
//! - [`Obligor`]: validated, immutable portfolio row
//! - [`Portfolio`]: ordered obligors with unique ids and subset selection
//! - [`FactorMatrix`]: flat row-major scenario x obligor matrix
//! - [`ScenarioSet`]: systematic factors paired with loadings

mod ids;
mod matrix;
mod obligor;
mod portfolio;
mod scenario;

pub use ids::{ObligorId, RatingGroup};
pub use matrix::FactorMatrix;
pub use obligor::Obligor;
pub use portfolio::Portfolio;
pub use scenario::ScenarioSet;
