// models/paymentmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Upi,
    NetBanking,
    Wallet,
    Cash,
}

impl PaymentMethod {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::NetBanking => "net_banking",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Cash => "cash",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
    Cancelled,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 6] = [
        PaymentStatus::Pending,
        PaymentStatus::Processing,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
        PaymentStatus::Cancelled,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, to: PaymentStatus) -> bool {
        match (self, to) {
            (PaymentStatus::Pending, PaymentStatus::Processing) => true,
            (PaymentStatus::Pending, PaymentStatus::Cancelled) => true,
            (PaymentStatus::Processing, PaymentStatus::Completed) => true,
            (PaymentStatus::Processing, PaymentStatus::Failed) => true,
            (PaymentStatus::Completed, PaymentStatus::Refunded) => true,
            _ => false,
        }
    }
}

// upi_id is present iff method is Upi. refund_amount and refund_date are
// present iff status is Refunded, with refund_amount <= amount.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payer_id: String,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub transaction_id: Option<String>,
    pub upi_id: Option<String>,
    pub refund_amount: Option<f64>,
    pub refund_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "refund_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RefundStatus {
    pub fn to_str(&self) -> &str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Processing => "processing",
            RefundStatus::Completed => "completed",
            RefundStatus::Failed => "failed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, RefundStatus::Pending | RefundStatus::Processing)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Refund {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub amount: f64,
    pub reason: String,
    pub status: RefundStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentAnalytics {
    pub total_payments: usize,
    pub total_amount: f64,
    pub completed_count: usize,
    pub failed_count: usize,
    pub refunded_count: usize,
    pub success_rate: f64,
}

impl PaymentAnalytics {
    pub fn from_payments(payments: &[Payment]) -> Self {
        let count = |status: PaymentStatus| payments.iter().filter(|p| p.status == status).count();

        let total_payments = payments.len();
        let completed_count = count(PaymentStatus::Completed);

        Self {
            total_payments,
            total_amount: payments.iter().map(|p| p.amount).sum(),
            completed_count,
            failed_count: count(PaymentStatus::Failed),
            refunded_count: count(PaymentStatus::Refunded),
            success_rate: if total_payments == 0 {
                0.0
            } else {
                completed_count as f64 / total_payments as f64
            },
        }
    }
}
