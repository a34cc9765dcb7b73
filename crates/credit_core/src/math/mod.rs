//! Mathematical utilities.
//!
//! - [`distributions`]: standard normal CDF, PDF and quantile function

pub mod distributions;

pub use distributions::{inverse_norm_cdf, norm_cdf, norm_pdf};
