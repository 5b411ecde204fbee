// service/notification_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::store::Store,
    models::{
        bookingmodel::Booking,
        chatmodel::ChatMessage,
        notificationmodel::{Notification, NotificationKind},
        paymentmodel::{Payment, Refund},
    },
    service::error::ServiceError,
};

/// Records "tell party X about Y" requests. Delivery happens elsewhere, so a
/// failure here is logged and never reaches the caller.
#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn Store>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn notify_booking_created(&self, booking: &Booking) {
        tracing::info!(
            "New booking notification: worker {} booked for {} on {}",
            booking.worker_id,
            booking.service_type.to_str(),
            booking.scheduled_date
        );

        self.notify(
            &booking.worker_id,
            NotificationKind::BookingStatus,
            "New booking request".to_string(),
            format!(
                "{} job on {} at {}",
                booking.service_type.label(),
                booking.scheduled_date,
                booking.scheduled_time.format("%H:%M")
            ),
            Some(booking.id.to_string()),
        )
        .await;
    }

    pub async fn notify_booking_status(&self, recipient_id: &str, booking: &Booking) {
        tracing::info!(
            "Booking status notification: booking {} is now {}",
            booking.id,
            booking.status.to_str()
        );

        self.notify(
            recipient_id,
            NotificationKind::BookingStatus,
            "Booking updated".to_string(),
            format!("Your {} booking is now {}", booking.service_type.label(), booking.status.to_str()),
            Some(booking.id.to_string()),
        )
        .await;
    }

    pub async fn notify_new_message(&self, message: &ChatMessage) {
        let preview: String = message.content.chars().take(80).collect();

        self.notify(
            &message.receiver_id,
            NotificationKind::NewMessage,
            "New message".to_string(),
            preview,
            Some(message.thread_id.clone()),
        )
        .await;
    }

    pub async fn notify_payment(&self, recipient_id: &str, payment: &Payment) {
        tracing::info!(
            "Payment notification: payment {} is {}",
            payment.id,
            payment.status.to_str()
        );

        self.notify(
            recipient_id,
            NotificationKind::Payment,
            "Payment update".to_string(),
            format!("Payment of {:.2} is {}", payment.amount, payment.status.to_str()),
            Some(payment.id.to_string()),
        )
        .await;
    }

    pub async fn notify_refund(&self, recipient_id: &str, refund: &Refund) {
        self.notify(
            recipient_id,
            NotificationKind::Refund,
            "Refund update".to_string(),
            format!("Refund of {:.2} is {}", refund.amount, refund.status.to_str()),
            Some(refund.id.to_string()),
        )
        .await;
    }

    pub async fn list_notifications(&self, party_id: &str) -> Result<Vec<Notification>, ServiceError> {
        Ok(self.store.list_notifications(party_id).await?)
    }

    async fn notify(
        &self,
        party_id: &str,
        kind: NotificationKind,
        title: String,
        body: String,
        reference_id: Option<String>,
    ) {
        let notification = Notification {
            id: Uuid::new_v4(),
            party_id: party_id.to_string(),
            kind,
            title,
            body,
            reference_id,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_notification(&notification).await {
            tracing::warn!("Failed to store notification for {}: {}", party_id, e);
        }
    }
}
