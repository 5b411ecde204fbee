// service/gateway.rs
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::{config::Config, models::paymentmodel::PaymentMethod, service::error::ServiceError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GatewayOutcome {
    Approved { transaction_id: String },
    Declined { reason: String },
}

/// The payment processor. Transport failures come back as
/// `ServiceError::Network`; a declined charge is an `Ok` outcome.
#[async_trait]
pub trait PaymentGateway: std::fmt::Debug + Send + Sync {
    async fn attempt(&self, amount: f64, method: PaymentMethod) -> Result<GatewayOutcome, ServiceError>;

    async fn refund(&self, amount: f64) -> Result<GatewayOutcome, ServiceError>;
}

/// Stand-in processor that approves at fixed rates after a delay.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    pub payment_success_rate: f64,
    pub upi_success_rate: f64,
    pub refund_success_rate: f64,
    pub latency: Duration,
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self {
            payment_success_rate: 0.90,
            upi_success_rate: 0.95,
            refund_success_rate: 0.98,
            latency: Duration::from_millis(2000),
        }
    }
}

impl SimulatedGateway {
    pub fn from_config(config: &Config) -> Self {
        Self {
            payment_success_rate: config.payment_success_rate,
            upi_success_rate: config.upi_success_rate,
            refund_success_rate: config.refund_success_rate,
            latency: Duration::from_millis(config.gateway_latency_ms),
        }
    }

    async fn roll(&self, success_rate: f64, prefix: &str, decline: &str) -> GatewayOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let roll: f64 = rand::rng().random();
        if roll < success_rate {
            GatewayOutcome::Approved {
                transaction_id: format!("{}{}", prefix, Uuid::new_v4().simple()).to_uppercase(),
            }
        } else {
            GatewayOutcome::Declined {
                reason: decline.to_string(),
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn attempt(&self, amount: f64, method: PaymentMethod) -> Result<GatewayOutcome, ServiceError> {
        let rate = match method {
            PaymentMethod::Upi => self.upi_success_rate,
            _ => self.payment_success_rate,
        };
        tracing::debug!("Simulated gateway charging {:.2} via {}", amount, method.to_str());

        Ok(self.roll(rate, "txn", "Payment declined by the processor").await)
    }

    async fn refund(&self, amount: f64) -> Result<GatewayOutcome, ServiceError> {
        tracing::debug!("Simulated gateway refunding {:.2}", amount);

        Ok(self.roll(self.refund_success_rate, "rfd", "Refund rejected by the processor").await)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn instant(payment: f64, upi: f64, refund: f64) -> SimulatedGateway {
        SimulatedGateway {
            payment_success_rate: payment,
            upi_success_rate: upi,
            refund_success_rate: refund,
            latency: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn certain_success_always_approves() {
        let gateway = instant(1.0, 1.0, 1.0);
        for _ in 0..20 {
            let outcome = gateway.attempt(500.0, PaymentMethod::CreditCard).await.unwrap();
            assert!(matches!(outcome, GatewayOutcome::Approved { ref transaction_id } if transaction_id.starts_with("TXN")));
        }
    }

    #[tokio::test]
    async fn upi_uses_its_own_rate() {
        let gateway = instant(0.0, 1.0, 0.0);
        assert!(matches!(
            gateway.attempt(100.0, PaymentMethod::Upi).await.unwrap(),
            GatewayOutcome::Approved { .. }
        ));
        assert!(matches!(
            gateway.attempt(100.0, PaymentMethod::Wallet).await.unwrap(),
            GatewayOutcome::Declined { .. }
        ));
        assert!(matches!(gateway.refund(100.0).await.unwrap(), GatewayOutcome::Declined { .. }));
    }

    #[test]
    fn default_rates() {
        let gateway = SimulatedGateway::default();
        assert_eq!(gateway.payment_success_rate, 0.90);
        assert_eq!(gateway.upi_success_rate, 0.95);
        assert_eq!(gateway.refund_success_rate, 0.98);
    }
}
