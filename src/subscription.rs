//! Subscription state machine.
//!
//! A subscription owes a charge when its paid-through marker falls behind
//! the cycle being billed. Every failed charge attempt accumulates; once the
//! count reaches the configured threshold the subscription lapses, and there
//! is no path back to good standing.

use serde::{Deserialize, Serialize};

use crate::config::{BillingConfig, DEFAULT_MAX_FAILURES};
use crate::error::{BillingError, Result};
use crate::period::BillingPeriod;

/// The last billing period a monthly subscription has already covered.
///
/// The month is assumed to be within 1-12 but not enforced here; the marker
/// is written by whichever collaborator finalizes successful charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidThrough {
    pub year: i32,
    pub month: u32,
}

/// Billing plan variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    /// Monthly auto-renewing plan.
    Monthly {
        /// Last period already covered. `None` means never billed, which
        /// makes the subscription due in any cycle.
        paid_through: Option<PaidThrough>,
    },
    /// Annual auto-renewing plan. Its billing cadence is not yet defined;
    /// asking whether it owes a charge is an error.
    Annual,
}

impl Plan {
    /// The plan kind without payload.
    #[must_use]
    pub fn kind(&self) -> PlanKind {
        match self {
            Self::Monthly { .. } => PlanKind::Monthly,
            Self::Annual => PlanKind::Annual,
        }
    }
}

/// Plan kind, for logging and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Monthly,
    Annual,
}

impl PlanKind {
    /// Convert to a string for logs and errors.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

impl std::fmt::Display for PlanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription lifecycle state, derived from the failure count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// In good standing; failures are below the threshold.
    Current,
    /// Failure threshold reached. Terminal: no reset path exists.
    Lapsed,
}

impl SubscriptionStatus {
    /// Convert to a string for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Lapsed => "lapsed",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer's subscription: a plan plus accumulated payment failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    plan: Plan,
    payment_failures: u32,
    max_failures: u32,
}

impl Subscription {
    /// Create a monthly subscription that has never been billed.
    ///
    /// With no paid-through history it is due in every cycle until the
    /// first successful charge is finalized.
    #[must_use]
    pub fn monthly() -> Self {
        Self {
            plan: Plan::Monthly { paid_through: None },
            payment_failures: 0,
            max_failures: DEFAULT_MAX_FAILURES,
        }
    }

    /// Create a monthly subscription paid through the given period.
    #[must_use]
    pub fn monthly_paid_through(year: i32, month: u32) -> Self {
        Self {
            plan: Plan::Monthly {
                paid_through: Some(PaidThrough { year, month }),
            },
            payment_failures: 0,
            max_failures: DEFAULT_MAX_FAILURES,
        }
    }

    /// Create an annual subscription.
    ///
    /// The annual billing rule is not yet defined; a billing run over a
    /// customer holding one fails with [`BillingError::UnsupportedPlan`].
    #[must_use]
    pub fn annual() -> Self {
        Self {
            plan: Plan::Annual,
            payment_failures: 0,
            max_failures: DEFAULT_MAX_FAILURES,
        }
    }

    /// Apply billing policy from a config.
    #[must_use]
    pub fn with_config(mut self, config: &BillingConfig) -> Self {
        self.max_failures = config.max_failures();
        self
    }

    /// Override the failure threshold. Clamped to at least 1.
    #[must_use]
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures.max(1);
        self
    }

    /// Whether this subscription owes a charge for `period`.
    ///
    /// Pure; no side effects. Monthly plans use a same-year window rule: due
    /// when the paid-through year is at or before the cycle year and the
    /// paid-through month is strictly before the cycle month. A plan paid
    /// through December is therefore not detected as due for January of the
    /// following year; callers relying on year rollover must advance the
    /// marker upstream. A monthly plan with no history is always due.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::UnsupportedPlan`] for annual plans.
    pub fn needs_billing(&self, period: BillingPeriod) -> Result<bool> {
        match self.plan {
            Plan::Monthly { paid_through: None } => Ok(true),
            Plan::Monthly {
                paid_through: Some(paid),
            } => Ok(paid.year <= period.year() && paid.month < period.month()),
            Plan::Annual => Err(BillingError::UnsupportedPlan {
                plan: PlanKind::Annual.to_string(),
            }),
        }
    }

    /// Record the outcome of a charge attempt.
    ///
    /// A declined charge increments the failure count; a successful charge
    /// leaves it unchanged. Crossing the threshold lapses the subscription
    /// permanently.
    pub fn record_charge_results(&mut self, charged: bool) {
        if !charged {
            self.payment_failures += 1;
        }
    }

    /// Whether the subscription is in good standing.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.payment_failures < self.max_failures
    }

    /// Whether the plan renews automatically.
    #[must_use]
    pub fn is_recurring(&self) -> bool {
        match self.plan {
            Plan::Monthly { .. } | Plan::Annual => true,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        if self.is_current() {
            SubscriptionStatus::Current
        } else {
            SubscriptionStatus::Lapsed
        }
    }

    /// The plan this subscription is on.
    #[must_use]
    pub fn plan(&self) -> Plan {
        self.plan
    }

    /// Accumulated failed charge attempts.
    #[must_use]
    pub fn payment_failures(&self) -> u32 {
        self.payment_failures
    }

    /// Failed charges tolerated before lapse.
    #[must_use]
    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }
}
