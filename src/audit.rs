//! Audit logging for billing runs.
//!
//! Provides a trait-based audit logging system for tracking billing events.
//! Useful for compliance, dunning follow-up, and debugging a cycle after
//! the fact.

use std::fmt;

/// Audit event types for billing runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingAuditEvent {
    /// A billing run started.
    RunStarted { year: i32, month: u32 },
    /// A charge attempt succeeded.
    ChargeSucceeded { customer_id: String },
    /// A charge attempt was declined.
    ChargeFailed {
        customer_id: String,
        payment_failures: u32,
    },
    /// A subscription crossed the failure threshold and lapsed.
    SubscriptionLapsed {
        customer_id: String,
        payment_failures: u32,
    },
    /// A billing run completed.
    RunCompleted {
        year: i32,
        month: u32,
        charges_attempted: u32,
        charges_failed: u32,
    },
}

impl fmt::Display for BillingAuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunStarted { year, month } => {
                write!(f, "Billing run started: period={:04}-{:02}", year, month)
            }
            Self::ChargeSucceeded { customer_id } => {
                write!(f, "Charge succeeded: customer={}", customer_id)
            }
            Self::ChargeFailed {
                customer_id,
                payment_failures,
            } => {
                write!(
                    f,
                    "Charge failed: customer={}, failures={}",
                    customer_id, payment_failures
                )
            }
            Self::SubscriptionLapsed {
                customer_id,
                payment_failures,
            } => {
                write!(
                    f,
                    "Subscription lapsed: customer={}, failures={}",
                    customer_id, payment_failures
                )
            }
            Self::RunCompleted {
                year,
                month,
                charges_attempted,
                charges_failed,
            } => {
                write!(
                    f,
                    "Billing run completed: period={:04}-{:02}, attempted={}, failed={}",
                    year, month, charges_attempted, charges_failed
                )
            }
        }
    }
}

/// Trait for audit logging backends.
///
/// Implement this trait to integrate with your logging system (e.g.,
/// database, external service, file-based logging).
#[allow(async_fn_in_trait)]
pub trait BillingAuditLogger: Send + Sync {
    /// Log a billing audit event.
    ///
    /// Implementations should handle failures gracefully to avoid
    /// disrupting the billing run.
    async fn log(&self, event: BillingAuditEvent);
}

/// No-op audit logger that does nothing.
///
/// Use this when audit logging is not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditLogger;

impl BillingAuditLogger for NoOpAuditLogger {
    async fn log(&self, _event: BillingAuditEvent) {
        // No-op
    }
}

/// Tracing-based audit logger.
///
/// Logs audit events using the `tracing` crate at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl BillingAuditLogger for TracingAuditLogger {
    async fn log(&self, event: BillingAuditEvent) {
        tracing::info!(
            target: "billrun::audit",
            event_type = %event_kind(&event),
            "{}", event
        );
    }
}

/// Get the event kind as a string for structured logging.
fn event_kind(event: &BillingAuditEvent) -> &'static str {
    match event {
        BillingAuditEvent::RunStarted { .. } => "run_started",
        BillingAuditEvent::ChargeSucceeded { .. } => "charge_succeeded",
        BillingAuditEvent::ChargeFailed { .. } => "charge_failed",
        BillingAuditEvent::SubscriptionLapsed { .. } => "subscription_lapsed",
        BillingAuditEvent::RunCompleted { .. } => "run_completed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Test audit logger that captures events.
    #[derive(Default, Clone)]
    pub struct TestAuditLogger {
        pub events: Arc<Mutex<Vec<BillingAuditEvent>>>,
    }

    impl TestAuditLogger {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn events(&self) -> Vec<BillingAuditEvent> {
            self.events.lock().await.clone()
        }
    }

    impl BillingAuditLogger for TestAuditLogger {
        async fn log(&self, event: BillingAuditEvent) {
            self.events.lock().await.push(event);
        }
    }

    #[tokio::test]
    async fn test_noop_logger() {
        let logger = NoOpAuditLogger;
        logger
            .log(BillingAuditEvent::RunStarted {
                year: 2021,
                month: 10,
            })
            .await;
        // Just verifies it doesn't panic
    }

    #[tokio::test]
    async fn test_capture_logger() {
        let logger = TestAuditLogger::new();

        logger
            .log(BillingAuditEvent::ChargeFailed {
                customer_id: "cust_1".to_string(),
                payment_failures: 1,
            })
            .await;
        logger
            .log(BillingAuditEvent::SubscriptionLapsed {
                customer_id: "cust_1".to_string(),
                payment_failures: 3,
            })
            .await;

        let events = logger.events().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], BillingAuditEvent::ChargeFailed { .. }));
        assert!(matches!(
            events[1],
            BillingAuditEvent::SubscriptionLapsed { .. }
        ));
    }

    #[test]
    fn test_event_display() {
        let event = BillingAuditEvent::SubscriptionLapsed {
            customer_id: "cust_1".to_string(),
            payment_failures: 3,
        };
        let display = format!("{}", event);
        assert!(display.contains("cust_1"));
        assert!(display.contains("3"));

        let event = BillingAuditEvent::RunStarted {
            year: 2021,
            month: 9,
        };
        assert!(format!("{}", event).contains("2021-09"));
    }

    #[test]
    fn test_event_kind() {
        assert_eq!(
            event_kind(&BillingAuditEvent::RunStarted {
                year: 2021,
                month: 10,
            }),
            "run_started"
        );
        assert_eq!(
            event_kind(&BillingAuditEvent::ChargeFailed {
                customer_id: String::new(),
                payment_failures: 0,
            }),
            "charge_failed"
        );
    }
}
