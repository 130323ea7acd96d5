//! Billing policy configuration.
//!
//! The failure threshold is configuration rather than a compiled-in
//! constant, so lapse policy can vary per plan type in future extensions.

use serde::{Deserialize, Serialize};

/// Default number of failed charges tolerated before a subscription lapses.
pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// Billing policy for subscription construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_max_failures")]
    max_failures: u32,
}

impl BillingConfig {
    /// Create a config with default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing a config.
    #[must_use]
    pub fn builder() -> BillingConfigBuilder {
        BillingConfigBuilder::new()
    }

    /// Failed charges tolerated before a subscription lapses.
    #[must_use]
    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
        }
    }
}

fn default_max_failures() -> u32 {
    DEFAULT_MAX_FAILURES
}

/// Builder for [`BillingConfig`].
#[derive(Debug, Clone)]
pub struct BillingConfigBuilder {
    max_failures: u32,
}

impl BillingConfigBuilder {
    /// Create a builder seeded with default policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_failures: DEFAULT_MAX_FAILURES,
        }
    }

    /// Set the failure threshold. Clamped to at least 1.
    #[must_use]
    pub fn max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures.max(1);
        self
    }

    /// Build the config.
    #[must_use]
    pub fn build(self) -> BillingConfig {
        BillingConfig {
            max_failures: self.max_failures,
        }
    }
}

impl Default for BillingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
