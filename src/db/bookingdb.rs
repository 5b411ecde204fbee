// db/bookingdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{bookingmodel::*, partymodel::PartyType};

#[async_trait]
pub trait BookingExt {
    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, Error>;

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, Error>;

    /// Compare-and-set on status. `None` when the booking is gone or its
    /// status is no longer `from`.
    async fn transition_booking(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        actual_cost: Option<f64>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Booking>, Error>;

    /// Only succeeds on a completed booking that has no review yet.
    async fn attach_booking_review(
        &self,
        booking_id: Uuid,
        rating: i32,
        review: Option<String>,
    ) -> Result<Option<Booking>, Error>;

    async fn mark_booking_paid(&self, booking_id: Uuid, payment_id: Uuid) -> Result<Option<Booking>, Error>;

    /// Newest first.
    async fn list_bookings_for(&self, party_id: &str, role: PartyType) -> Result<Vec<Booking>, Error>;
}

const BOOKING_COLUMNS: &str = r#"
    id, customer_id, worker_id, service_type, scheduled_date, scheduled_time,
    description, address, status, estimated_cost_min, estimated_cost_max,
    created_at, actual_cost, completed_at, rating, review, payment_status,
    payment_id, updated_at
"#;

#[async_trait]
impl BookingExt for DBClient {
    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings
                (id, customer_id, worker_id, service_type, scheduled_date, scheduled_time,
                 description, address, status, estimated_cost_min, estimated_cost_max,
                 created_at, payment_status, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking.id)
        .bind(&booking.customer_id)
        .bind(&booking.worker_id)
        .bind(booking.service_type)
        .bind(booking.scheduled_date)
        .bind(booking.scheduled_time)
        .bind(&booking.description)
        .bind(&booking.address)
        .bind(booking.status)
        .bind(booking.estimated_cost.min)
        .bind(booking.estimated_cost.max)
        .bind(booking.created_at)
        .bind(booking.payment_status)
        .bind(booking.updated_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, Error> {
        sqlx::query_as::<_, Booking>(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn transition_booking(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        actual_cost: Option<f64>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Booking>, Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET status = $3,
                actual_cost = COALESCE($4, actual_cost),
                completed_at = COALESCE($5, completed_at),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .bind(actual_cost)
        .bind(completed_at)
        .fetch_optional(&self.pool)
        .await
    }

    async fn attach_booking_review(
        &self,
        booking_id: Uuid,
        rating: i32,
        review: Option<String>,
    ) -> Result<Option<Booking>, Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET rating = $2, review = $3, updated_at = NOW()
            WHERE id = $1
              AND status = 'completed'::booking_status
              AND rating IS NULL
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .bind(rating)
        .bind(review)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_booking_paid(&self, booking_id: Uuid, payment_id: Uuid) -> Result<Option<Booking>, Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET payment_status = 'paid'::booking_payment_status,
                payment_id = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_bookings_for(&self, party_id: &str, role: PartyType) -> Result<Vec<Booking>, Error> {
        let column = match role {
            PartyType::Customer => "customer_id",
            PartyType::Worker => "worker_id",
        };

        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {} FROM bookings WHERE {} = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS, column
        ))
        .bind(party_id)
        .fetch_all(&self.pool)
        .await
    }
}
