// service/payment_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::store::Store,
    models::{bookingmodel::BookingStatus, paymentmodel::*},
    service::{
        booking_service::BookingService,
        error::ServiceError,
        gateway::{GatewayOutcome, PaymentGateway},
        locks::EntityLocks,
        notification_service::NotificationService,
    },
};

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub booking_id: Uuid,
    pub amount: f64,
    pub method: PaymentMethod,
    pub upi_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentService {
    store: Arc<dyn Store>,
    booking_service: Arc<BookingService>,
    notification_service: Arc<NotificationService>,
    gateway: Arc<dyn PaymentGateway>,
    locks: Arc<EntityLocks>,
}

fn payment_key(payment_id: Uuid) -> String {
    format!("payment:{}", payment_id)
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn Store>,
        booking_service: Arc<BookingService>,
        notification_service: Arc<NotificationService>,
        gateway: Arc<dyn PaymentGateway>,
        locks: Arc<EntityLocks>,
    ) -> Self {
        Self {
            store,
            booking_service,
            notification_service,
            gateway,
            locks,
        }
    }

    pub async fn initiate_payment(&self, payer_id: &str, new_payment: NewPayment) -> Result<Payment, ServiceError> {
        if !new_payment.amount.is_finite() || new_payment.amount <= 0.0 {
            return Err(ServiceError::Validation("Amount must be greater than zero".to_string()));
        }

        let upi_id = new_payment
            .upi_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        match (new_payment.method, &upi_id) {
            (PaymentMethod::Upi, None) => {
                return Err(ServiceError::Validation("UPI id is required for UPI payments".to_string()));
            }
            (method, Some(_)) if method != PaymentMethod::Upi => {
                return Err(ServiceError::Validation(format!(
                    "UPI id is not accepted for {} payments",
                    method.to_str()
                )));
            }
            _ => {}
        }

        let booking = self.booking_service.get_booking(new_payment.booking_id).await?;
        if booking.customer_id != payer_id {
            return Err(ServiceError::PermissionDenied(
                "Only the booking's customer can pay for it".to_string(),
            ));
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(ServiceError::InvalidState(format!(
                "Booking {} is cancelled",
                booking.id
            )));
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            payer_id: payer_id.to_string(),
            amount: new_payment.amount,
            method: new_payment.method,
            status: PaymentStatus::Pending,
            payment_date: now,
            transaction_id: None,
            upi_id,
            refund_amount: None,
            refund_date: None,
            updated_at: now,
        };

        let payment = self.store.insert_payment(&payment).await?;
        tracing::info!(
            "Payment {} initiated for booking {}: {:.2} via {}",
            payment.id,
            payment.booking_id,
            payment.amount,
            payment.method.to_str()
        );
        Ok(payment)
    }

    /// Runs one gateway attempt. The attempt row stays behind as the audit
    /// trail whatever the outcome; there is no retry.
    pub async fn process_payment(&self, actor_id: &str, payment_id: Uuid) -> Result<Payment, ServiceError> {
        let _guard = self.locks.lock(payment_key(payment_id)).await;

        let payment = self.owned_payment(actor_id, payment_id).await?;
        let processing = self
            .transition(&payment, PaymentStatus::Processing, None)
            .await?;

        let outcome = self.gateway.attempt(processing.amount, processing.method).await;

        match outcome {
            Ok(GatewayOutcome::Approved { transaction_id }) => {
                let completed = self
                    .transition(&processing, PaymentStatus::Completed, Some(transaction_id))
                    .await?;
                tracing::info!("Payment {} completed", completed.id);

                self.booking_service
                    .mark_paid(completed.booking_id, completed.id)
                    .await?;
                self.notification_service
                    .notify_payment(&completed.payer_id, &completed)
                    .await;

                Ok(completed)
            }
            Ok(GatewayOutcome::Declined { reason }) => {
                let failed = self.transition(&processing, PaymentStatus::Failed, None).await?;
                tracing::warn!("Payment {} declined: {}", failed.id, reason);
                self.notification_service.notify_payment(&failed.payer_id, &failed).await;

                Err(ServiceError::PaymentFailed(failed.id, reason))
            }
            Err(e) => {
                tracing::error!("Gateway error while charging payment {}: {}", payment_id, e);
                self.transition(&processing, PaymentStatus::Failed, None).await?;
                Err(e)
            }
        }
    }

    pub async fn cancel_payment(&self, actor_id: &str, payment_id: Uuid) -> Result<Payment, ServiceError> {
        let _guard = self.locks.lock(payment_key(payment_id)).await;

        let payment = self.owned_payment(actor_id, payment_id).await?;
        let cancelled = self.transition(&payment, PaymentStatus::Cancelled, None).await?;

        tracing::info!("Payment {} cancelled", payment_id);
        Ok(cancelled)
    }

    pub async fn initiate_refund(&self, actor_id: &str, payment_id: Uuid, reason: &str) -> Result<Refund, ServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::Validation("A refund reason is required".to_string()));
        }

        let _guard = self.locks.lock(payment_key(payment_id)).await;

        let payment = self.owned_payment(actor_id, payment_id).await?;
        if payment.status != PaymentStatus::Completed {
            return Err(ServiceError::RefundNotAllowed(
                payment_id,
                format!("payment is {}", payment.status.to_str()),
            ));
        }
        if let Some(open) = self.store.open_refund_for(payment_id).await? {
            return Err(ServiceError::RefundNotAllowed(
                payment_id,
                format!("refund {} is already {}", open.id, open.status.to_str()),
            ));
        }

        let now = Utc::now();
        let refund = Refund {
            id: Uuid::new_v4(),
            payment_id,
            amount: payment.amount,
            reason: reason.to_string(),
            status: RefundStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let refund = self.store.insert_refund(&refund).await?;
        tracing::info!("Refund {} opened for payment {}", refund.id, payment_id);
        Ok(refund)
    }

    /// Asks the gateway to return the money. On approval the refund and its
    /// payment settle in a single write.
    pub async fn process_refund(&self, actor_id: &str, refund_id: Uuid) -> Result<Refund, ServiceError> {
        let refund = self.get_refund(refund_id).await?;

        // refunds serialize with their payment
        let _guard = self.locks.lock(payment_key(refund.payment_id)).await;

        let refund = self.get_refund(refund_id).await?;
        self.owned_payment(actor_id, refund.payment_id).await?;

        if refund.status != RefundStatus::Pending {
            return Err(ServiceError::invalid_transition(
                "refund",
                refund_id,
                refund.status.to_str(),
                RefundStatus::Processing.to_str(),
            ));
        }

        let processing = self
            .store
            .transition_refund(refund_id, RefundStatus::Pending, RefundStatus::Processing)
            .await?
            .ok_or_else(|| ServiceError::conflict("refund", refund_id))?;

        match self.gateway.refund(processing.amount).await {
            Ok(GatewayOutcome::Approved { transaction_id }) => {
                let (completed, payment) = self
                    .store
                    .settle_refund(refund_id, processing.payment_id, Utc::now())
                    .await?
                    .ok_or_else(|| ServiceError::conflict("refund", refund_id))?;
                tracing::info!(
                    "Refund {} completed ({}), payment {} refunded",
                    completed.id,
                    transaction_id,
                    payment.id
                );

                self.notification_service
                    .notify_refund(&payment.payer_id, &completed)
                    .await;
                Ok(completed)
            }
            Ok(GatewayOutcome::Declined { reason }) => {
                let failed = self.fail_refund(refund_id).await?;
                tracing::warn!("Refund {} declined: {}", refund_id, reason);

                if let Ok(payment) = self.get_payment(failed.payment_id).await {
                    self.notification_service.notify_refund(&payment.payer_id, &failed).await;
                }
                Err(ServiceError::RefundFailed(refund_id, reason))
            }
            Err(e) => {
                tracing::error!("Gateway error while refunding {}: {}", refund_id, e);
                self.fail_refund(refund_id).await?;
                Err(e)
            }
        }
    }

    pub async fn get_payment(&self, payment_id: Uuid) -> Result<Payment, ServiceError> {
        self.store
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("payment", payment_id))
    }

    pub async fn get_refund(&self, refund_id: Uuid) -> Result<Refund, ServiceError> {
        self.store
            .get_refund(refund_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("refund", refund_id))
    }

    pub async fn payment_history(&self, payer_id: &str) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.store.list_payments_for(payer_id).await?)
    }

    pub async fn get_analytics(&self, payer_id: &str) -> Result<PaymentAnalytics, ServiceError> {
        let payments = self.store.list_payments_for(payer_id).await?;
        Ok(PaymentAnalytics::from_payments(&payments))
    }

    async fn owned_payment(&self, actor_id: &str, payment_id: Uuid) -> Result<Payment, ServiceError> {
        let payment = self.get_payment(payment_id).await?;
        if payment.payer_id != actor_id {
            return Err(ServiceError::PermissionDenied(format!(
                "Payment {} belongs to another party",
                payment_id
            )));
        }
        Ok(payment)
    }

    async fn transition(
        &self,
        payment: &Payment,
        to: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<Payment, ServiceError> {
        if !payment.status.can_transition_to(to) {
            return Err(ServiceError::invalid_transition(
                "payment",
                payment.id,
                payment.status.to_str(),
                to.to_str(),
            ));
        }

        self.store
            .transition_payment(payment.id, payment.status, to, transaction_id)
            .await?
            .ok_or_else(|| ServiceError::conflict("payment", payment.id))
    }

    async fn fail_refund(&self, refund_id: Uuid) -> Result<Refund, ServiceError> {
        self.store
            .transition_refund(refund_id, RefundStatus::Processing, RefundStatus::Failed)
            .await?
            .ok_or_else(|| ServiceError::conflict("refund", refund_id))
    }
}
