// db/paymentdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::paymentmodel::*;

#[async_trait]
pub trait PaymentExt {
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, Error>;

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, Error>;

    /// Compare-and-set on status; `transaction_id` is kept when `None`.
    async fn transition_payment(
        &self,
        payment_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<Option<Payment>, Error>;

    /// Newest first.
    async fn list_payments_for(&self, payer_id: &str) -> Result<Vec<Payment>, Error>;

    async fn insert_refund(&self, refund: &Refund) -> Result<Refund, Error>;

    async fn get_refund(&self, refund_id: Uuid) -> Result<Option<Refund>, Error>;

    /// A pending or processing refund of the payment, if any.
    async fn open_refund_for(&self, payment_id: Uuid) -> Result<Option<Refund>, Error>;

    async fn transition_refund(
        &self,
        refund_id: Uuid,
        from: RefundStatus,
        to: RefundStatus,
    ) -> Result<Option<Refund>, Error>;

    /// Completes a processing refund and moves its payment to refunded in
    /// one atomic write. `None` when either side has moved on.
    async fn settle_refund(
        &self,
        refund_id: Uuid,
        payment_id: Uuid,
        refunded_at: DateTime<Utc>,
    ) -> Result<Option<(Refund, Payment)>, Error>;
}

const PAYMENT_COLUMNS: &str = r#"
    id, booking_id, payer_id, amount, method, status, payment_date, transaction_id,
    upi_id, refund_amount, refund_date, updated_at
"#;

const REFUND_COLUMNS: &str = "id, payment_id, amount, reason, status, created_at, updated_at";

#[async_trait]
impl PaymentExt for DBClient {
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments
                (id, booking_id, payer_id, amount, method, status, payment_date,
                 transaction_id, upi_id, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(&payment.payer_id)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(payment.status)
        .bind(payment.payment_date)
        .bind(&payment.transaction_id)
        .bind(&payment.upi_id)
        .bind(payment.updated_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!("SELECT {} FROM payments WHERE id = $1", PAYMENT_COLUMNS))
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn transition_payment(
        &self,
        payment_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<Option<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = $3,
                transaction_id = COALESCE($4, transaction_id),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .bind(from)
        .bind(to)
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_payments_for(&self, payer_id: &str) -> Result<Vec<Payment>, Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE payer_id = $1 ORDER BY payment_date DESC",
            PAYMENT_COLUMNS
        ))
        .bind(payer_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert_refund(&self, refund: &Refund) -> Result<Refund, Error> {
        sqlx::query_as::<_, Refund>(&format!(
            r#"
            INSERT INTO refunds (id, payment_id, amount, reason, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            REFUND_COLUMNS
        ))
        .bind(refund.id)
        .bind(refund.payment_id)
        .bind(refund.amount)
        .bind(&refund.reason)
        .bind(refund.status)
        .bind(refund.created_at)
        .bind(refund.updated_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_refund(&self, refund_id: Uuid) -> Result<Option<Refund>, Error> {
        sqlx::query_as::<_, Refund>(&format!("SELECT {} FROM refunds WHERE id = $1", REFUND_COLUMNS))
            .bind(refund_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn open_refund_for(&self, payment_id: Uuid) -> Result<Option<Refund>, Error> {
        sqlx::query_as::<_, Refund>(&format!(
            r#"
            SELECT {}
            FROM refunds
            WHERE payment_id = $1
              AND status IN ('pending'::refund_status, 'processing'::refund_status)
            LIMIT 1
            "#,
            REFUND_COLUMNS
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn transition_refund(
        &self,
        refund_id: Uuid,
        from: RefundStatus,
        to: RefundStatus,
    ) -> Result<Option<Refund>, Error> {
        sqlx::query_as::<_, Refund>(&format!(
            r#"
            UPDATE refunds
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            REFUND_COLUMNS
        ))
        .bind(refund_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    async fn settle_refund(
        &self,
        refund_id: Uuid,
        payment_id: Uuid,
        refunded_at: DateTime<Utc>,
    ) -> Result<Option<(Refund, Payment)>, Error> {
        let mut tx = self.pool.begin().await?;

        let refund = sqlx::query_as::<_, Refund>(&format!(
            r#"
            UPDATE refunds
            SET status = 'completed'::refund_status, updated_at = NOW()
            WHERE id = $1 AND payment_id = $2 AND status = 'processing'::refund_status
            RETURNING {}
            "#,
            REFUND_COLUMNS
        ))
        .bind(refund_id)
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(refund) = refund else {
            tx.rollback().await?;
            return Ok(None);
        };

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'refunded'::payment_status,
                refund_amount = $2,
                refund_date = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'completed'::payment_status AND $2 <= amount
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(payment_id)
        .bind(refund.amount)
        .bind(refunded_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(payment) = payment else {
            tx.rollback().await?;
            return Ok(None);
        };

        tx.commit().await?;
        Ok(Some((refund, payment)))
    }
}
