//! Billing period value type.
//!
//! A billing cycle is identified by a calendar (year, month) pair. The month
//! is validated at construction; the due-date rules themselves live on the
//! subscription.

use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};

/// A single (year, month) billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    /// Create a billing period.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidPeriod`] if `month` is outside 1-12.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(BillingError::InvalidPeriod { month });
        }
        Ok(Self { year, month })
    }

    /// The billing period containing the given date.
    #[must_use]
    pub fn from_date(date: impl Datelike) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year of the cycle.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month of the cycle (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
