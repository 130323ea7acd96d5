//! Error types for billing runs.
//!
//! Charge declines are never errors; they are business outcomes carried as
//! booleans and accumulated on the subscription. Errors cover collaborator
//! faults and the plan variants whose billing rules are not yet defined.

/// The main error type for billing operations.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// The plan variant has no billing rule defined yet.
    ///
    /// Raised for annual plans until their cadence rule is supplied.
    #[error("plan '{plan}' has no billing rule defined")]
    UnsupportedPlan { plan: String },

    /// A billing period with a month outside 1-12 was requested.
    #[error("invalid billing period: month {month} is out of range (1-12)")]
    InvalidPeriod { month: u32 },

    /// The customer repository failed to load or persist customers.
    #[error("customer repository error: {0}")]
    Repository(#[source] anyhow::Error),

    /// The card charger faulted (as opposed to declining a charge).
    #[error("card charger error: {0}")]
    Charger(#[source] anyhow::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BillingError {
    /// Wrap a repository fault.
    pub fn repository(err: impl Into<anyhow::Error>) -> Self {
        Self::Repository(err.into())
    }

    /// Wrap a charger fault.
    pub fn charger(err: impl Into<anyhow::Error>) -> Self {
        Self::Charger(err.into())
    }
}

/// Result type alias using [`BillingError`].
pub type Result<T> = std::result::Result<T, BillingError>;
