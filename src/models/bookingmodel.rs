// models/bookingmodel.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::partymodel::ServiceType;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn can_transition_to(&self, to: BookingStatus) -> bool {
        match (self, to) {
            (BookingStatus::Pending, BookingStatus::Confirmed) => true,
            (BookingStatus::Pending, BookingStatus::Cancelled) => true,
            (BookingStatus::Confirmed, BookingStatus::InProgress) => true,
            (BookingStatus::Confirmed, BookingStatus::Cancelled) => true,
            (BookingStatus::InProgress, BookingStatus::Completed) => true,
            (BookingStatus::InProgress, BookingStatus::Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingPaymentStatus {
    Unpaid,
    Paid,
}

/// Closed quote range, `min <= max`.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, Copy, PartialEq)]
pub struct CostRange {
    #[sqlx(rename = "estimated_cost_min")]
    pub min: f64,
    #[sqlx(rename = "estimated_cost_max")]
    pub max: f64,
}

impl CostRange {
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

// actual_cost and completed_at are set exactly when status is Completed;
// rating and review only ever on a Completed booking.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: String,
    pub worker_id: String,
    pub service_type: ServiceType,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub description: String,
    pub address: String,
    pub status: BookingStatus,
    #[sqlx(flatten)]
    pub estimated_cost: CostRange,
    pub created_at: DateTime<Utc>,
    pub actual_cost: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rating: Option<i32>,
    pub review: Option<String>,
    pub payment_status: BookingPaymentStatus,
    pub payment_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn involves(&self, party_id: &str) -> bool {
        self.customer_id == party_id || self.worker_id == party_id
    }

    /// The other side of the booking from `party_id`'s point of view.
    pub fn counterpart_of(&self, party_id: &str) -> &str {
        if self.customer_id == party_id {
            &self.worker_id
        } else {
            &self.customer_id
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorkerStats {
    pub total_bookings: usize,
    pub completed_bookings: usize,
    pub total_earnings: f64,
    pub average_rating: f64,
    pub total_reviews: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CustomerStats {
    pub total_bookings: usize,
    pub completed_bookings: usize,
    pub pending_bookings: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_is_exactly_the_lifecycle_graph() {
        let allowed = [
            (BookingStatus::Pending, BookingStatus::Confirmed),
            (BookingStatus::Pending, BookingStatus::Cancelled),
            (BookingStatus::Confirmed, BookingStatus::InProgress),
            (BookingStatus::Confirmed, BookingStatus::Cancelled),
            (BookingStatus::InProgress, BookingStatus::Completed),
            (BookingStatus::InProgress, BookingStatus::Cancelled),
        ];

        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from.to_str(),
                    to.to_str()
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for from in BookingStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            assert!(BookingStatus::ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn status_wire_format() {
        let json = serde_json::to_string(&BookingStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: BookingStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, BookingStatus::Cancelled);
    }
}
