//! Reviews and their star ratings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ReviewId, StoreId, UserId};

/// A rating outside 1..=5.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between {min} and {max} (got {got})", min = Rating::MIN, max = Rating::MAX)]
pub struct RatingError {
    /// The rejected value.
    pub got: i64,
}

/// A star rating from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    /// Lowest rating.
    pub const MIN: u8 = 1;
    /// Highest rating.
    pub const MAX: u8 = 5;

    /// Create a rating.
    ///
    /// # Errors
    ///
    /// Returns `RatingError` when `value` is not in 1..=5.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingError { got: value })
    }

    /// The number of stars.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}

/// A review left on a store.
///
/// Reviews point at their store; the store never lists its reviews. Joins
/// happen at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Review ID.
    pub id: ReviewId,
    /// The reviewed store.
    pub store: StoreId,
    /// Who wrote it.
    pub author: UserId,
    /// Star rating.
    pub rating: Rating,
    /// Review body.
    pub text: String,
    /// When it was written.
    pub created: DateTime<Utc>,
}
