//! Customer repository collaborator.
//!
//! Implement [`CustomerRepository`] to supply the customer population for a
//! billing cycle and to persist subscription state mutated during the run.
//! An in-memory implementation is provided for testing.

use async_trait::async_trait;

use crate::customer::Customer;
use crate::error::Result;

/// Trait for loading and persisting customers.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// All candidate customers for a billing cycle.
    ///
    /// Ordering is irrelevant to correctness.
    async fn get_all(&self) -> Result<Vec<Customer>>;

    /// Persist a customer whose subscription state changed during a run.
    ///
    /// Called once per processed customer. This is also the hook where a
    /// production implementation advances the paid-through marker after a
    /// successful charge; the core never advances it itself.
    async fn save(&self, customer: &Customer) -> Result<()>;
}

/// In-memory customer repository for testing.
#[cfg(any(test, feature = "test-billing"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    /// In-memory customer repository for testing.
    ///
    /// Wraps data in `Arc` for cheap cloning, so tests can keep a handle
    /// for assertions after moving a clone into the processor.
    #[derive(Default, Clone)]
    pub struct InMemoryCustomerRepository {
        customers: Arc<RwLock<HashMap<String, Customer>>>,
    }

    impl InMemoryCustomerRepository {
        /// Create an empty repository.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a repository seeded with customers.
        #[must_use]
        pub fn with_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
            let repo = Self::new();
            for customer in customers {
                repo.insert(customer);
            }
            repo
        }

        /// Insert or replace a customer.
        pub fn insert(&self, customer: Customer) {
            self.customers
                .write()
                .unwrap()
                .insert(customer.id().to_string(), customer);
        }

        /// Fetch a stored customer by ID (for test assertions).
        #[must_use]
        pub fn get(&self, id: &str) -> Option<Customer> {
            self.customers.read().unwrap().get(id).cloned()
        }

        /// Number of stored customers.
        #[must_use]
        pub fn len(&self) -> usize {
            self.customers.read().unwrap().len()
        }

        /// Whether the repository is empty.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.customers.read().unwrap().is_empty()
        }
    }

    #[async_trait]
    impl CustomerRepository for InMemoryCustomerRepository {
        async fn get_all(&self) -> Result<Vec<Customer>> {
            Ok(self.customers.read().unwrap().values().cloned().collect())
        }

        async fn save(&self, customer: &Customer) -> Result<()> {
            self.customers
                .write()
                .unwrap()
                .insert(customer.id().to_string(), customer.clone());
            Ok(())
        }
    }
}
