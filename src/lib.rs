//! Billrun - recurring subscription billing runs
//!
//! Once per billing cycle, billrun decides which customers owe a charge,
//! attempts the charge through an external payment collaborator, and tracks
//! repeated failures until a subscription is involuntarily lapsed.
//!
//! The core is the subscription state machine: a due-for-billing rule over a
//! (year, month) cycle, a failure counter fed by charge outcomes, and a
//! terminal current-to-lapsed transition at a configurable threshold.
//! Customer storage and card charging are collaborator traits; swap in your
//! database and payment gateway behind [`CustomerRepository`] and
//! [`CreditCardCharger`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use billrun::{BillingProcessor, Customer, Subscription};
//!
//! // Your CustomerRepository and CreditCardCharger implementations.
//! let repo = PgCustomerRepository::connect(&database_url).await?;
//! let charger = GatewayCharger::new(api_key);
//!
//! let processor = BillingProcessor::new(repo, charger);
//! let summary = processor.process_month(2021, 10).await?;
//! println!("charged {} customers", summary.charges_succeeded);
//! ```

#![allow(async_fn_in_trait)] // collaborator traits carry explicit Send + Sync bounds

pub mod audit;
pub mod charger;
mod config;
pub mod customer;
mod error;
pub mod period;
pub mod processor;
pub mod storage;
pub mod subscription;

// Audit exports
pub use audit::{BillingAuditEvent, BillingAuditLogger, NoOpAuditLogger, TracingAuditLogger};

// Collaborator exports
pub use charger::CreditCardCharger;
pub use storage::CustomerRepository;

// Config exports
pub use config::{BillingConfig, BillingConfigBuilder, DEFAULT_MAX_FAILURES};

// Domain exports
pub use customer::Customer;
pub use period::BillingPeriod;
pub use subscription::{PaidThrough, Plan, PlanKind, Subscription, SubscriptionStatus};

// Processor exports
pub use processor::{BillingProcessor, BillingRunSummary};

// Error exports
pub use error::{BillingError, Result};

// Test exports
#[cfg(any(test, feature = "test-billing"))]
pub use charger::test::MockCreditCardCharger;

#[cfg(any(test, feature = "test-billing"))]
pub use storage::test::InMemoryCustomerRepository;
