//! Identifier types for portfolio entities.
//!
//! This module provides strongly-typed identifiers for obligors and rating
//! groups. Using newtypes ensures type safety and prevents accidental misuse
//! of identifiers.

use std::fmt;

/// Unique identifier for an obligor.
///
/// The numeric value doubles as the obligor's random sub-stream selector, so
/// it must survive portfolio filtering unchanged.
///
/// # Examples
///
/// ```
/// use credit_core::types::ObligorId;
///
/// let id = ObligorId::new(42);
/// assert_eq!(id.get(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObligorId(u64);

impl ObligorId {
    /// Creates a new obligor ID.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the 32-bit stream selector, or `None` if the id is too large
    /// to address a random sub-stream.
    #[inline]
    pub fn stream_selector(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }
}

impl fmt::Display for ObligorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ObligorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<u32> for ObligorId {
    fn from(id: u32) -> Self {
        Self(u64::from(id))
    }
}

/// Categorical rating bucket of an obligor.
///
/// # Examples
///
/// ```
/// use credit_core::types::RatingGroup;
///
/// let rating = RatingGroup::new("BBB");
/// assert_eq!(rating.as_str(), "BBB");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingGroup(String);

impl RatingGroup {
    /// Creates a new rating group.
    #[inline]
    pub fn new(rating: impl Into<String>) -> Self {
        Self(rating.into())
    }

    /// Returns the rating as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RatingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RatingGroup {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RatingGroup {
    fn from(s: String) -> Self {
        Self(s)
    }
}
