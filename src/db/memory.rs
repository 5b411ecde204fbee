// db/memory.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    bookingdb::BookingExt, chatdb::ChatExt, notificationdb::NotificationExt, partydb::PartyExt,
    paymentdb::PaymentExt,
};
use crate::models::{
    bookingmodel::*, chatmodel::*, notificationmodel::Notification, partymodel::*, paymentmodel::*,
};

#[derive(Debug, Default)]
struct Tables {
    parties: HashMap<String, Party>,
    bookings: HashMap<Uuid, Booking>,
    payments: HashMap<Uuid, Payment>,
    refunds: HashMap<Uuid, Refund>,
    messages: Vec<MessageRecord>,
    summaries: HashMap<(String, String), ChatSummary>,
    notifications: Vec<Notification>,
    next_seq: i64,
}

/// Process-local store behind one lock, so every multi-row write is atomic.
/// Used when no database is configured and throughout the tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a record as-is, bypassing every check. Lets tests plant
    /// malformed log entries.
    #[cfg(test)]
    pub async fn insert_raw_record(&self, record: MessageRecord) {
        self.tables.write().await.messages.push(record);
    }
}

#[async_trait]
impl PartyExt for MemoryStore {
    async fn save_party(&self, party: &Party) -> Result<Party, Error> {
        let mut tables = self.tables.write().await;
        if tables.parties.contains_key(&party.id) {
            return Err(Error::Protocol(format!("duplicate party id {}", party.id)));
        }
        tables.parties.insert(party.id.clone(), party.clone());
        Ok(party.clone())
    }

    async fn get_party(&self, party_id: &str) -> Result<Option<Party>, Error> {
        Ok(self.tables.read().await.parties.get(party_id).cloned())
    }

    async fn update_party_profile(
        &self,
        party_id: &str,
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<Option<Party>, Error> {
        let mut tables = self.tables.write().await;
        let Some(party) = tables.parties.get_mut(party_id) else {
            return Ok(None);
        };

        if let Some(name) = name {
            party.name = name;
        }
        if let Some(email) = email {
            party.email = email;
        }
        if let Some(phone) = phone {
            party.phone = phone;
        }
        if let Some(address) = address {
            party.address = address;
        }
        Ok(Some(party.clone()))
    }

    async fn set_party_active(&self, party_id: &str, is_active: bool) -> Result<Option<Party>, Error> {
        let mut tables = self.tables.write().await;
        Ok(tables.parties.get_mut(party_id).map(|party| {
            party.is_active = is_active;
            party.clone()
        }))
    }

    async fn increment_total_jobs(&self, party_id: &str) -> Result<Option<Party>, Error> {
        let mut tables = self.tables.write().await;
        Ok(tables.parties.get_mut(party_id).map(|party| {
            party.total_jobs += 1;
            party.clone()
        }))
    }

    async fn record_party_rating(&self, party_id: &str, rating: i32) -> Result<Option<Party>, Error> {
        let mut tables = self.tables.write().await;
        Ok(tables.parties.get_mut(party_id).map(|party| {
            let count = party.review_count as f64;
            party.rating = (party.rating * count + rating as f64) / (count + 1.0);
            party.review_count += 1;
            party.clone()
        }))
    }

    async fn list_active_workers(&self, service_type: Option<ServiceType>) -> Result<Vec<Party>, Error> {
        let tables = self.tables.read().await;
        let mut workers: Vec<Party> = tables
            .parties
            .values()
            .filter(|p| p.is_worker() && p.is_active)
            .filter(|p| service_type.map_or(true, |s| p.offers(s)))
            .cloned()
            .collect();
        workers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(workers)
    }
}

#[async_trait]
impl BookingExt for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, Error> {
        let mut tables = self.tables.write().await;
        tables.bookings.insert(booking.id, booking.clone());
        Ok(booking.clone())
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, Error> {
        Ok(self.tables.read().await.bookings.get(&booking_id).cloned())
    }

    async fn transition_booking(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        actual_cost: Option<f64>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Booking>, Error> {
        let mut tables = self.tables.write().await;
        let Some(booking) = tables.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if booking.status != from {
            return Ok(None);
        }

        booking.status = to;
        if actual_cost.is_some() {
            booking.actual_cost = actual_cost;
        }
        if completed_at.is_some() {
            booking.completed_at = completed_at;
        }
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn attach_booking_review(
        &self,
        booking_id: Uuid,
        rating: i32,
        review: Option<String>,
    ) -> Result<Option<Booking>, Error> {
        let mut tables = self.tables.write().await;
        let Some(booking) = tables.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if booking.status != BookingStatus::Completed || booking.rating.is_some() {
            return Ok(None);
        }

        booking.rating = Some(rating);
        booking.review = review;
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn mark_booking_paid(&self, booking_id: Uuid, payment_id: Uuid) -> Result<Option<Booking>, Error> {
        let mut tables = self.tables.write().await;
        Ok(tables.bookings.get_mut(&booking_id).map(|booking| {
            booking.payment_status = BookingPaymentStatus::Paid;
            booking.payment_id = Some(payment_id);
            booking.updated_at = Utc::now();
            booking.clone()
        }))
    }

    async fn list_bookings_for(&self, party_id: &str, role: PartyType) -> Result<Vec<Booking>, Error> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| match role {
                PartyType::Customer => b.customer_id == party_id,
                PartyType::Worker => b.worker_id == party_id,
            })
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}

#[async_trait]
impl PaymentExt for MemoryStore {
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, Error> {
        let mut tables = self.tables.write().await;
        tables.payments.insert(payment.id, payment.clone());
        Ok(payment.clone())
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, Error> {
        Ok(self.tables.read().await.payments.get(&payment_id).cloned())
    }

    async fn transition_payment(
        &self,
        payment_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<Option<Payment>, Error> {
        let mut tables = self.tables.write().await;
        let Some(payment) = tables.payments.get_mut(&payment_id) else {
            return Ok(None);
        };
        if payment.status != from {
            return Ok(None);
        }

        payment.status = to;
        if transaction_id.is_some() {
            payment.transaction_id = transaction_id;
        }
        payment.updated_at = Utc::now();
        Ok(Some(payment.clone()))
    }

    async fn list_payments_for(&self, payer_id: &str) -> Result<Vec<Payment>, Error> {
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.payer_id == payer_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(payments)
    }

    async fn insert_refund(&self, refund: &Refund) -> Result<Refund, Error> {
        let mut tables = self.tables.write().await;
        tables.refunds.insert(refund.id, refund.clone());
        Ok(refund.clone())
    }

    async fn get_refund(&self, refund_id: Uuid) -> Result<Option<Refund>, Error> {
        Ok(self.tables.read().await.refunds.get(&refund_id).cloned())
    }

    async fn open_refund_for(&self, payment_id: Uuid) -> Result<Option<Refund>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .refunds
            .values()
            .find(|r| r.payment_id == payment_id && r.status.is_open())
            .cloned())
    }

    async fn transition_refund(
        &self,
        refund_id: Uuid,
        from: RefundStatus,
        to: RefundStatus,
    ) -> Result<Option<Refund>, Error> {
        let mut tables = self.tables.write().await;
        let Some(refund) = tables.refunds.get_mut(&refund_id) else {
            return Ok(None);
        };
        if refund.status != from {
            return Ok(None);
        }

        refund.status = to;
        refund.updated_at = Utc::now();
        Ok(Some(refund.clone()))
    }

    async fn settle_refund(
        &self,
        refund_id: Uuid,
        payment_id: Uuid,
        refunded_at: DateTime<Utc>,
    ) -> Result<Option<(Refund, Payment)>, Error> {
        let mut tables = self.tables.write().await;

        let refund_ready = tables
            .refunds
            .get(&refund_id)
            .is_some_and(|r| r.payment_id == payment_id && r.status == RefundStatus::Processing);
        let Some(amount) = tables.refunds.get(&refund_id).map(|r| r.amount) else {
            return Ok(None);
        };
        let payment_ready = tables
            .payments
            .get(&payment_id)
            .is_some_and(|p| p.status == PaymentStatus::Completed && amount <= p.amount);
        if !refund_ready || !payment_ready {
            return Ok(None);
        }

        let now = Utc::now();
        let Some(refund) = tables.refunds.get_mut(&refund_id) else {
            return Ok(None);
        };
        refund.status = RefundStatus::Completed;
        refund.updated_at = now;
        let refund = refund.clone();

        let Some(payment) = tables.payments.get_mut(&payment_id) else {
            return Ok(None);
        };
        payment.status = PaymentStatus::Refunded;
        payment.refund_amount = Some(amount);
        payment.refund_date = Some(refunded_at);
        payment.updated_at = now;

        Ok(Some((refund, payment.clone())))
    }
}

#[async_trait]
impl ChatExt for MemoryStore {
    async fn append_message(&self, thread_id: &str, message: NewMessage) -> Result<ChatMessage, Error> {
        let mut tables = self.tables.write().await;

        tables.next_seq += 1;
        let seq = tables.next_seq;
        // never behind an earlier message of the thread
        let latest = tables
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .filter_map(|m| m.sent_at)
            .max();
        let now = Utc::now();
        let sent_at = latest.map_or(now, |latest| latest.max(now));
        let id = Uuid::new_v4();

        tables.messages.push(MessageRecord {
            id,
            thread_id: thread_id.to_string(),
            seq,
            sender_id: Some(message.sender_id.clone()),
            receiver_id: Some(message.receiver_id.clone()),
            content: Some(message.content.clone()),
            message_type: Some(message.message_type.to_str().to_string()),
            sent_at: Some(sent_at),
            is_read: Some(false),
        });

        for (owner, other, unread) in [
            (&message.sender_id, &message.receiver_id, 0),
            (&message.receiver_id, &message.sender_id, 1),
        ] {
            let summary = tables
                .summaries
                .entry((thread_id.to_string(), owner.clone()))
                .or_insert_with(|| ChatSummary {
                    thread_id: thread_id.to_string(),
                    party_id: owner.clone(),
                    other_party_id: other.clone(),
                    last_message: String::new(),
                    last_message_time: sent_at,
                    unread_count: 0,
                });
            summary.other_party_id = other.clone();
            summary.last_message = message.content.clone();
            summary.last_message_time = sent_at;
            summary.unread_count += unread;
        }

        Ok(ChatMessage {
            id,
            thread_id: thread_id.to_string(),
            seq,
            content: message.content,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            timestamp: sent_at,
            is_read: false,
            message_type: message.message_type,
        })
    }

    async fn load_message_records(&self, thread_id: &str) -> Result<Vec<MessageRecord>, Error> {
        let tables = self.tables.read().await;
        let mut records: Vec<MessageRecord> = tables
            .messages
            .iter()
            .filter(|r| r.thread_id == thread_id)
            .cloned()
            .collect();
        // rows without a timestamp sort last, like NULLS LAST
        records.sort_by(|a, b| match (a.sent_at, b.sent_at) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.seq.cmp(&b.seq)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.seq.cmp(&b.seq),
        });
        Ok(records)
    }

    async fn mark_message_read(&self, thread_id: &str, message_id: Uuid) -> Result<Option<bool>, Error> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables
            .messages
            .iter_mut()
            .find(|r| r.id == message_id && r.thread_id == thread_id)
        else {
            return Ok(None);
        };
        if record.is_read == Some(true) {
            return Ok(Some(false));
        }

        record.is_read = Some(true);
        if let Some(receiver_id) = record.receiver_id.clone() {
            if let Some(summary) = tables.summaries.get_mut(&(thread_id.to_string(), receiver_id)) {
                summary.unread_count = (summary.unread_count - 1).max(0);
            }
        }
        Ok(Some(true))
    }

    async fn mark_thread_read(&self, thread_id: &str, reader: Option<&str>) -> Result<u64, Error> {
        let mut tables = self.tables.write().await;

        let mut flipped = 0;
        for record in tables.messages.iter_mut().filter(|r| r.thread_id == thread_id) {
            let addressed = reader.map_or(true, |reader| record.receiver_id.as_deref() == Some(reader));
            if addressed && record.is_read != Some(true) {
                record.is_read = Some(true);
                flipped += 1;
            }
        }

        for summary in tables.summaries.values_mut() {
            if summary.thread_id == thread_id && reader.map_or(true, |reader| summary.party_id == reader) {
                summary.unread_count = 0;
            }
        }

        Ok(flipped)
    }

    async fn list_summaries(&self, party_id: &str) -> Result<Vec<ChatSummary>, Error> {
        let tables = self.tables.read().await;
        let mut summaries: Vec<ChatSummary> = tables
            .summaries
            .values()
            .filter(|s| s.party_id == party_id)
            .cloned()
            .collect();
        summaries.sort_by(|a, b| {
            b.last_message_time
                .cmp(&a.last_message_time)
                .then_with(|| a.thread_id.cmp(&b.thread_id))
        });
        Ok(summaries)
    }
}

#[async_trait]
impl NotificationExt for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<Notification, Error> {
        self.tables.write().await.notifications.push(notification.clone());
        Ok(notification.clone())
    }

    async fn list_notifications(&self, party_id: &str) -> Result<Vec<Notification>, Error> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.party_id == party_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_message(from: &str, to: &str, content: &str) -> NewMessage {
        NewMessage {
            sender_id: from.to_string(),
            receiver_id: to.to_string(),
            content: content.to_string(),
            message_type: MessageType::Text,
        }
    }

    #[tokio::test]
    async fn concurrent_appends_keep_timestamp_and_seq_in_step() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let thread = thread_id("u1", "u2");

        // an earlier row stamped slightly ahead of the local clock
        store
            .insert_raw_record(MessageRecord {
                id: Uuid::new_v4(),
                thread_id: thread.clone(),
                seq: 0,
                sender_id: Some("u1".to_string()),
                receiver_id: Some("u2".to_string()),
                content: Some("early".to_string()),
                message_type: Some("text".to_string()),
                sent_at: Some(Utc::now() + chrono::Duration::seconds(5)),
                is_read: Some(false),
            })
            .await;

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                let thread = thread.clone();
                tokio::spawn(async move {
                    let (from, to) = if i % 2 == 0 { ("u1", "u2") } else { ("u2", "u1") };
                    store.append_message(&thread, new_message(from, to, &format!("m{}", i))).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let records = store.load_message_records(&thread).await.unwrap();
        assert_eq!(records.len(), 21);
        assert!(records.windows(2).all(|w| w[0].seq < w[1].seq));
        assert!(records.windows(2).all(|w| w[0].sent_at <= w[1].sent_at));
    }

    #[tokio::test]
    async fn append_assigns_increasing_seq_and_mirrors_summaries() {
        let store = MemoryStore::new();
        let thread = thread_id("u1", "u2");

        let first = store.append_message(&thread, new_message("u1", "u2", "hello")).await.unwrap();
        let second = store.append_message(&thread, new_message("u2", "u1", "hi")).await.unwrap();
        assert!(second.seq > first.seq);

        let u1 = store.list_summaries("u1").await.unwrap();
        let u2 = store.list_summaries("u2").await.unwrap();
        assert_eq!(u1[0].other_party_id, "u2");
        assert_eq!(u2[0].other_party_id, "u1");
        assert_eq!(u1[0].last_message, "hi");
        assert_eq!(u1[0].unread_count, 1);
        assert_eq!(u2[0].unread_count, 1);
    }

    #[tokio::test]
    async fn refund_settlement_needs_processing_refund_and_completed_payment() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            payer_id: "c1".to_string(),
            amount: 900.0,
            method: PaymentMethod::Wallet,
            status: PaymentStatus::Completed,
            payment_date: now,
            transaction_id: Some("TXN1".to_string()),
            upi_id: None,
            refund_amount: None,
            refund_date: None,
            updated_at: now,
        };
        let refund = Refund {
            id: Uuid::new_v4(),
            payment_id: payment.id,
            amount: 900.0,
            reason: "no show".to_string(),
            status: RefundStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        store.insert_payment(&payment).await.unwrap();
        store.insert_refund(&refund).await.unwrap();

        // still pending
        assert!(store.settle_refund(refund.id, payment.id, now).await.unwrap().is_none());

        store
            .transition_refund(refund.id, RefundStatus::Pending, RefundStatus::Processing)
            .await
            .unwrap();
        let (refund, payment) = store.settle_refund(refund.id, payment.id, now).await.unwrap().unwrap();
        assert_eq!(refund.status, RefundStatus::Completed);
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert_eq!(payment.refund_amount, Some(900.0));
        assert_eq!(payment.refund_date, Some(now));
    }
}
