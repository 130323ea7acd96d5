//! Billing-run orchestration.
//!
//! Once per cycle, [`BillingProcessor::process_month`] pulls the customer
//! population from the repository, charges everyone whose subscription is
//! due, and records each outcome back onto the subscription.

use serde::Serialize;

use crate::audit::{BillingAuditEvent, BillingAuditLogger, NoOpAuditLogger};
use crate::charger::CreditCardCharger;
use crate::error::Result;
use crate::period::BillingPeriod;
use crate::storage::CustomerRepository;

/// Outcome counts for one billing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BillingRunSummary {
    /// Customers fetched from the repository.
    pub customers_seen: u32,
    /// Charge attempts made, one per due customer.
    pub charges_attempted: u32,
    /// Attempts the charger approved.
    pub charges_succeeded: u32,
    /// Attempts the charger declined.
    pub charges_failed: u32,
    /// Subscriptions that crossed the failure threshold during this run.
    pub lapsed: u32,
}

/// Runs one billing cycle over the customer population.
///
/// Generic over the repository, the charger, and the audit backend so
/// implementations can be swapped without touching the run logic.
pub struct BillingProcessor<R, C, L = NoOpAuditLogger> {
    repo: R,
    charger: C,
    audit: L,
}

impl<R: CustomerRepository, C: CreditCardCharger> BillingProcessor<R, C> {
    /// Create a processor with audit logging disabled.
    #[must_use]
    pub fn new(repo: R, charger: C) -> Self {
        Self {
            repo,
            charger,
            audit: NoOpAuditLogger,
        }
    }
}

impl<R, C, L> BillingProcessor<R, C, L>
where
    R: CustomerRepository,
    C: CreditCardCharger,
    L: BillingAuditLogger,
{
    /// Create a processor with the given audit backend.
    #[must_use]
    pub fn with_audit_logger(repo: R, charger: C, audit: L) -> Self {
        Self {
            repo,
            charger,
            audit,
        }
    }

    /// Run the billing cycle for `(year, month)`.
    ///
    /// Fetches every customer, skips those without a subscription, charges
    /// the ones whose subscription is due, and feeds each boolean outcome
    /// into the subscription before persisting it. Customers are processed
    /// strictly sequentially; each charge attempt completes before the next
    /// customer is considered.
    ///
    /// Not idempotent per period: the core does not advance a monthly
    /// plan's paid-through marker, so re-invoking the same `(year, month)`
    /// re-bills every customer whose marker the storage collaborator has
    /// not advanced in the meantime. Invoke once per cycle.
    ///
    /// # Errors
    ///
    /// - [`BillingError::InvalidPeriod`] if `month` is outside 1-12.
    /// - [`BillingError::UnsupportedPlan`] if a customer holds an annual
    ///   subscription, whose cadence rule is not yet defined.
    /// - Repository and charger faults abort the run unrecovered; a
    ///   declined charge is a business outcome, never an error.
    ///
    /// [`BillingError::InvalidPeriod`]: crate::error::BillingError::InvalidPeriod
    /// [`BillingError::UnsupportedPlan`]: crate::error::BillingError::UnsupportedPlan
    pub async fn process_month(&self, year: i32, month: u32) -> Result<BillingRunSummary> {
        let period = BillingPeriod::new(year, month)?;

        self.audit
            .log(BillingAuditEvent::RunStarted { year, month })
            .await;
        tracing::debug!(target: "billrun", %period, "billing run started");

        let customers = self.repo.get_all().await?;
        let mut summary = BillingRunSummary {
            customers_seen: customers.len() as u32,
            ..BillingRunSummary::default()
        };

        for mut customer in customers {
            let due = match customer.subscription() {
                None => {
                    tracing::debug!(
                        target: "billrun",
                        customer_id = %customer.id(),
                        "no subscription, skipping"
                    );
                    continue;
                }
                Some(subscription) => subscription.needs_billing(period)?,
            };

            if !due {
                tracing::debug!(
                    target: "billrun",
                    customer_id = %customer.id(),
                    "not due, skipping"
                );
                continue;
            }

            summary.charges_attempted += 1;
            let charged = self.charger.charge_customer(&customer).await?;

            let customer_id = customer.id().to_string();
            if let Some(subscription) = customer.subscription_mut() {
                let was_current = subscription.is_current();
                subscription.record_charge_results(charged);

                if charged {
                    summary.charges_succeeded += 1;
                    tracing::info!(
                        target: "billrun",
                        customer_id = %customer_id,
                        "charge succeeded"
                    );
                    self.audit
                        .log(BillingAuditEvent::ChargeSucceeded {
                            customer_id: customer_id.clone(),
                        })
                        .await;
                } else {
                    summary.charges_failed += 1;
                    let payment_failures = subscription.payment_failures();
                    tracing::info!(
                        target: "billrun",
                        customer_id = %customer_id,
                        payment_failures,
                        "charge failed"
                    );
                    self.audit
                        .log(BillingAuditEvent::ChargeFailed {
                            customer_id: customer_id.clone(),
                            payment_failures,
                        })
                        .await;

                    if was_current && !subscription.is_current() {
                        summary.lapsed += 1;
                        tracing::warn!(
                            target: "billrun",
                            customer_id = %customer_id,
                            payment_failures,
                            "subscription lapsed"
                        );
                        self.audit
                            .log(BillingAuditEvent::SubscriptionLapsed {
                                customer_id: customer_id.clone(),
                                payment_failures,
                            })
                            .await;
                    }
                }
            }

            self.repo.save(&customer).await?;
        }

        self.audit
            .log(BillingAuditEvent::RunCompleted {
                year,
                month,
                charges_attempted: summary.charges_attempted,
                charges_failed: summary.charges_failed,
            })
            .await;
        tracing::debug!(
            target: "billrun",
            %period,
            charges_attempted = summary.charges_attempted,
            charges_succeeded = summary.charges_succeeded,
            charges_failed = summary.charges_failed,
            lapsed = summary.lapsed,
            "billing run completed"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::BillingAuditEvent;
    use crate::charger::test::MockCreditCardCharger;
    use crate::customer::Customer;
    use crate::error::BillingError;
    use crate::storage::test::InMemoryCustomerRepository;
    use crate::subscription::Subscription;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Audit logger that captures events for assertions.
    #[derive(Default, Clone)]
    struct CaptureAuditLogger {
        events: Arc<Mutex<Vec<BillingAuditEvent>>>,
    }

    impl CaptureAuditLogger {
        async fn events(&self) -> Vec<BillingAuditEvent> {
            self.events.lock().await.clone()
        }
    }

    impl BillingAuditLogger for CaptureAuditLogger {
        async fn log(&self, event: BillingAuditEvent) {
            self.events.lock().await.push(event);
        }
    }

    fn processor(
        customers: impl IntoIterator<Item = Customer>,
    ) -> (
        BillingProcessor<InMemoryCustomerRepository, MockCreditCardCharger>,
        InMemoryCustomerRepository,
        MockCreditCardCharger,
    ) {
        let repo = InMemoryCustomerRepository::with_customers(customers);
        let charger = MockCreditCardCharger::new();
        let processor = BillingProcessor::new(repo.clone(), charger.clone());
        (processor, repo, charger)
    }

    #[tokio::test]
    async fn test_customer_without_subscription_is_never_charged() {
        let (processor, _repo, charger) = processor([Customer::new("cust_1", "ada@example.com")]);

        let summary = processor.process_month(2011, 8).await.unwrap();

        assert_eq!(charger.charge_count("cust_1"), 0);
        assert_eq!(summary.customers_seen, 1);
        assert_eq!(summary.charges_attempted, 0);
    }

    #[tokio::test]
    async fn test_expired_subscription_is_charged_once() {
        let (processor, _repo, charger) = processor([Customer::with_subscription(
            "cust_1",
            "ada@example.com",
            Subscription::monthly(),
        )]);

        let summary = processor.process_month(2011, 8).await.unwrap();

        assert_eq!(charger.charge_count("cust_1"), 1);
        assert_eq!(summary.charges_attempted, 1);
        assert_eq!(summary.charges_succeeded, 1);
    }

    #[tokio::test]
    async fn test_current_subscription_is_not_charged() {
        let (processor, _repo, charger) = processor([Customer::with_subscription(
            "cust_1",
            "ada@example.com",
            Subscription::monthly_paid_through(2021, 9),
        )]);

        processor.process_month(2021, 9).await.unwrap();

        assert_eq!(charger.charge_count("cust_1"), 0);
    }

    #[tokio::test]
    async fn test_failed_charge_is_recorded_and_persisted() {
        let (processor, repo, charger) = processor([Customer::with_subscription(
            "cust_1",
            "ada@example.com",
            Subscription::monthly_paid_through(2021, 9),
        )]);
        charger.decline_all();

        let summary = processor.process_month(2021, 10).await.unwrap();

        assert_eq!(summary.charges_failed, 1);
        assert_eq!(summary.lapsed, 0);
        let stored = repo.get("cust_1").unwrap();
        let subscription = stored.subscription().unwrap();
        assert_eq!(subscription.payment_failures(), 1);
        assert!(subscription.is_current());
    }

    #[tokio::test]
    async fn test_three_failed_cycles_lapse_the_subscription() {
        let (processor, repo, charger) = processor([Customer::with_subscription(
            "cust_1",
            "ada@example.com",
            Subscription::monthly_paid_through(2021, 9),
        )]);
        charger.decline_all();

        for _ in 0..3 {
            processor.process_month(2021, 10).await.unwrap();
        }

        let stored = repo.get("cust_1").unwrap();
        let subscription = stored.subscription().unwrap();
        assert_eq!(subscription.payment_failures(), 3);
        assert!(!subscription.is_current());
        assert_eq!(charger.charge_count("cust_1"), 3);
    }

    #[tokio::test]
    async fn test_successful_charge_leaves_failures_unchanged() {
        let mut subscription = Subscription::monthly_paid_through(2021, 9);
        subscription.record_charge_results(false);
        let (processor, repo, charger) = processor([Customer::with_subscription(
            "cust_1",
            "ada@example.com",
            subscription,
        )]);

        processor.process_month(2021, 10).await.unwrap();

        assert_eq!(charger.charge_count("cust_1"), 1);
        let stored = repo.get("cust_1").unwrap();
        assert_eq!(stored.subscription().unwrap().payment_failures(), 1);
    }

    #[tokio::test]
    async fn test_mixed_population_only_due_customers_charged() {
        let (processor, _repo, charger) = processor([
            Customer::new("cust_none", "none@example.com"),
            Customer::with_subscription(
                "cust_due",
                "due@example.com",
                Subscription::monthly_paid_through(2021, 9),
            ),
            Customer::with_subscription(
                "cust_current",
                "current@example.com",
                Subscription::monthly_paid_through(2021, 10),
            ),
        ]);

        let summary = processor.process_month(2021, 10).await.unwrap();

        assert_eq!(summary.customers_seen, 3);
        assert_eq!(summary.charges_attempted, 1);
        assert_eq!(charger.charges(), vec!["cust_due"]);
    }

    #[tokio::test]
    async fn test_annual_subscription_aborts_the_run() {
        let (processor, _repo, charger) = processor([Customer::with_subscription(
            "cust_1",
            "ada@example.com",
            Subscription::annual(),
        )]);

        let err = processor.process_month(2021, 10).await.unwrap_err();

        assert!(matches!(err, BillingError::UnsupportedPlan { .. }));
        assert!(charger.charges().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_month_is_rejected_before_fetching() {
        let (processor, _repo, charger) = processor([Customer::with_subscription(
            "cust_1",
            "ada@example.com",
            Subscription::monthly(),
        )]);

        let err = processor.process_month(2021, 13).await.unwrap_err();

        assert!(matches!(err, BillingError::InvalidPeriod { month: 13 }));
        assert!(charger.charges().is_empty());
    }

    #[tokio::test]
    async fn test_charger_fault_aborts_the_run() {
        let (processor, repo, charger) = processor([Customer::with_subscription(
            "cust_1",
            "ada@example.com",
            Subscription::monthly_paid_through(2021, 9),
        )]);
        charger.inject_fault("gateway unreachable");

        let err = processor.process_month(2021, 10).await.unwrap_err();

        assert!(matches!(err, BillingError::Charger(_)));
        // The fault happened before any outcome was recorded.
        let stored = repo.get("cust_1").unwrap();
        assert_eq!(stored.subscription().unwrap().payment_failures(), 0);
    }

    #[tokio::test]
    async fn test_audit_events_for_a_lapsing_cycle() {
        let repo = InMemoryCustomerRepository::with_customers([Customer::with_subscription(
            "cust_1",
            "ada@example.com",
            Subscription::monthly_paid_through(2021, 9).with_max_failures(1),
        )]);
        let charger = MockCreditCardCharger::new();
        charger.decline_all();
        let audit = CaptureAuditLogger::default();
        let processor =
            BillingProcessor::with_audit_logger(repo.clone(), charger.clone(), audit.clone());

        processor.process_month(2021, 10).await.unwrap();

        let events = audit.events().await;
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], BillingAuditEvent::RunStarted { year: 2021, month: 10 }));
        assert!(matches!(
            &events[1],
            BillingAuditEvent::ChargeFailed { customer_id, payment_failures: 1 }
                if customer_id == "cust_1"
        ));
        assert!(matches!(
            &events[2],
            BillingAuditEvent::SubscriptionLapsed { customer_id, payment_failures: 1 }
                if customer_id == "cust_1"
        ));
        assert!(matches!(
            events[3],
            BillingAuditEvent::RunCompleted {
                charges_attempted: 1,
                charges_failed: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_summary_counts_over_mixed_outcomes() {
        let (processor, _repo, charger) = processor([
            Customer::with_subscription(
                "cust_ok",
                "ok@example.com",
                Subscription::monthly_paid_through(2021, 9),
            ),
            Customer::with_subscription(
                "cust_declined",
                "declined@example.com",
                Subscription::monthly_paid_through(2021, 9),
            ),
        ]);
        charger.set_outcome("cust_declined", false);

        let summary = processor.process_month(2021, 10).await.unwrap();

        assert_eq!(summary.customers_seen, 2);
        assert_eq!(summary.charges_attempted, 2);
        assert_eq!(summary.charges_succeeded, 1);
        assert_eq!(summary.charges_failed, 1);
        assert_eq!(summary.lapsed, 0);
    }
}
