//! Credit-card charging collaborator.
//!
//! The charger performs one charge attempt per call. Declines are normal
//! business outcomes, not errors; faults (network, gateway) are errors and
//! abort the billing run.

use crate::customer::Customer;
use crate::error::Result;

/// Trait for attempting charges against a customer's card.
///
/// This abstraction allows testing without a real payment gateway and keeps
/// PCI concerns outside the billing core.
#[allow(async_fn_in_trait)]
pub trait CreditCardCharger: Send + Sync {
    /// Attempt one charge.
    ///
    /// Returns `Ok(true)` if the charge went through and `Ok(false)` if it
    /// was declined. An `Err` is a collaborator fault, not a decline, and
    /// is treated as fatal by the caller.
    async fn charge_customer(&self, customer: &Customer) -> Result<bool>;
}

/// Mock charger for testing.
#[cfg(any(test, feature = "test-billing"))]
pub mod test {
    use super::*;
    use crate::error::BillingError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, RwLock};

    /// Scriptable charger for testing.
    ///
    /// Approves every charge by default; outcomes can be scripted globally
    /// or per customer, and every attempt is recorded for assertions.
    /// Wraps state in `Arc` for cheap cloning.
    #[derive(Default, Clone)]
    pub struct MockCreditCardCharger {
        inner: Arc<MockChargerInner>,
    }

    #[derive(Default)]
    struct MockChargerInner {
        decline: AtomicBool,
        outcomes: RwLock<HashMap<String, bool>>,
        charges: RwLock<Vec<String>>,
        fault: RwLock<Option<String>>,
    }

    impl MockCreditCardCharger {
        /// Create a charger that approves everything.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent charge decline.
        pub fn decline_all(&self) {
            self.inner.decline.store(true, Ordering::SeqCst);
        }

        /// Make every subsequent charge succeed again.
        pub fn approve_all(&self) {
            self.inner.decline.store(false, Ordering::SeqCst);
        }

        /// Script the outcome for a single customer.
        pub fn set_outcome(&self, customer_id: &str, charged: bool) {
            self.inner
                .outcomes
                .write()
                .unwrap()
                .insert(customer_id.to_string(), charged);
        }

        /// Make the next charge attempt return a collaborator fault.
        pub fn inject_fault(&self, message: impl Into<String>) {
            *self.inner.fault.write().unwrap() = Some(message.into());
        }

        /// Customer IDs charged, in call order (for test assertions).
        pub fn charges(&self) -> Vec<String> {
            self.inner.charges.read().unwrap().clone()
        }

        /// Number of charge attempts made against one customer.
        #[must_use]
        pub fn charge_count(&self, customer_id: &str) -> usize {
            self.inner
                .charges
                .read()
                .unwrap()
                .iter()
                .filter(|id| id.as_str() == customer_id)
                .count()
        }
    }

    impl CreditCardCharger for MockCreditCardCharger {
        async fn charge_customer(&self, customer: &Customer) -> Result<bool> {
            if let Some(message) = self.inner.fault.write().unwrap().take() {
                return Err(BillingError::charger(anyhow::anyhow!(message)));
            }

            self.inner
                .charges
                .write()
                .unwrap()
                .push(customer.id().to_string());

            if let Some(&outcome) = self.inner.outcomes.read().unwrap().get(customer.id()) {
                return Ok(outcome);
            }
            Ok(!self.inner.decline.load(Ordering::SeqCst))
        }
    }
}
