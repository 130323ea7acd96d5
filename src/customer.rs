//! Customer entity.
//!
//! A customer holds at most one subscription. A customer without one is
//! never billed; beyond exposing the subscription to the processor there is
//! no behavior here.

use serde::{Deserialize, Serialize};

use crate::subscription::Subscription;

/// A customer who may hold at most one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: String,
    email: String,
    subscription: Option<Subscription>,
}

impl Customer {
    /// Create a customer with no subscription.
    #[must_use]
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            subscription: None,
        }
    }

    /// Create a customer holding the given subscription.
    #[must_use]
    pub fn with_subscription(
        id: impl Into<String>,
        email: impl Into<String>,
        subscription: Subscription,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            subscription: Some(subscription),
        }
    }

    /// Unique customer ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Customer email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The customer's subscription, if any.
    #[must_use]
    pub fn subscription(&self) -> Option<&Subscription> {
        self.subscription.as_ref()
    }

    /// Mutable access to the subscription, if any.
    pub fn subscription_mut(&mut self) -> Option<&mut Subscription> {
        self.subscription.as_mut()
    }

    /// Attach a subscription, replacing any existing one.
    pub fn set_subscription(&mut self, subscription: Subscription) {
        self.subscription = Some(subscription);
    }
}
