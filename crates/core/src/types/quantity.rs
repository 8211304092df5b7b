//! Line item quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero units were requested.
    #[error("quantity must be at least 1 (got 0)")]
    Zero,
    /// A negative amount was requested.
    #[error("quantity must be at least 1 (got {0})")]
    Negative(i64),
    /// The amount does not fit the store's quantity range.
    #[error("quantity must be at most {max} (got {got})", max = u32::MAX)]
    TooLarge {
        /// The rejected value.
        got: i64,
    },
}

/// A positive number of units of one product in a cart.
///
/// A line item can never hold zero units: dropping to zero means the entry
/// is removed from the cart instead.
///
/// ## Examples
///
/// ```
/// use cartsync_core::{Quantity, QuantityError};
///
/// assert_eq!(Quantity::new(3).map(Quantity::get), Ok(3));
/// assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
/// assert_eq!(Quantity::new(-1), Err(QuantityError::Negative(-1)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Validate a requested quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is zero, negative, or above `u32::MAX`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        match value {
            0 => Err(QuantityError::Zero),
            v if v < 0 => Err(QuantityError::Negative(v)),
            v => u32::try_from(v)
                .ok()
                .and_then(NonZeroU32::new)
                .map(Self)
                .ok_or(QuantityError::TooLarge { got: v }),
        }
    }

    /// Number of units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
