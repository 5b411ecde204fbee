// service/booking_service.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    db::store::Store,
    models::{bookingmodel::*, partymodel::*},
    service::{error::ServiceError, locks::EntityLocks, notification_service::NotificationService},
};

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub worker_id: String,
    pub service_type: ServiceType,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub description: String,
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct BookingService {
    store: Arc<dyn Store>,
    notification_service: Arc<NotificationService>,
    locks: Arc<EntityLocks>,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn Store>,
        notification_service: Arc<NotificationService>,
        locks: Arc<EntityLocks>,
    ) -> Self {
        Self {
            store,
            notification_service,
            locks,
        }
    }

    pub async fn create_booking(&self, customer_id: &str, new_booking: NewBooking) -> Result<Booking, ServiceError> {
        if customer_id == new_booking.worker_id {
            return Err(ServiceError::Validation("You cannot book yourself".to_string()));
        }
        if new_booking.description.trim().is_empty() {
            return Err(ServiceError::Validation("Description is required".to_string()));
        }
        if new_booking.address.trim().is_empty() {
            return Err(ServiceError::Validation("Address is required".to_string()));
        }

        let customer = self
            .store
            .get_party(customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", customer_id))?;
        if customer.party_type != PartyType::Customer {
            return Err(ServiceError::Validation(format!(
                "{} is registered as a worker and cannot book",
                customer.id
            )));
        }

        let worker = self
            .store
            .get_party(&new_booking.worker_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("worker", &new_booking.worker_id))?;

        if !worker.is_worker() {
            return Err(ServiceError::Validation(format!("{} is not a worker", worker.id)));
        }
        if !worker.is_active {
            return Err(ServiceError::Validation(format!("Worker {} is not taking bookings", worker.id)));
        }
        if !worker.offers(new_booking.service_type) {
            return Err(ServiceError::Validation(format!(
                "Worker {} does not offer {}",
                worker.id,
                new_booking.service_type.label()
            )));
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            customer_id: customer_id.to_string(),
            worker_id: worker.id,
            service_type: new_booking.service_type,
            scheduled_date: new_booking.scheduled_date,
            scheduled_time: new_booking.scheduled_time,
            description: new_booking.description.trim().to_string(),
            address: new_booking.address.trim().to_string(),
            status: BookingStatus::Pending,
            estimated_cost: new_booking.service_type.estimated_cost(),
            created_at: now,
            actual_cost: None,
            completed_at: None,
            rating: None,
            review: None,
            payment_status: BookingPaymentStatus::Unpaid,
            payment_id: None,
            updated_at: now,
        };

        let booking = self.store.insert_booking(&booking).await?;
        tracing::info!(
            "Booking {} created: {} -> {} ({})",
            booking.id,
            booking.customer_id,
            booking.worker_id,
            booking.service_type.to_str()
        );

        self.notification_service.notify_booking_created(&booking).await;

        Ok(booking)
    }

    /// Moves a booking along its lifecycle on behalf of one of its parties.
    /// Completing it stamps `completed_at`, settles `actual_cost` (the top of
    /// the estimate unless given) and credits the worker with a finished job.
    pub async fn update_status(
        &self,
        actor_id: &str,
        booking_id: Uuid,
        new_status: BookingStatus,
        actual_cost: Option<f64>,
    ) -> Result<Booking, ServiceError> {
        if let Some(cost) = actual_cost {
            if new_status != BookingStatus::Completed {
                return Err(ServiceError::Validation(
                    "Actual cost can only be set when completing a booking".to_string(),
                ));
            }
            if !cost.is_finite() || cost < 0.0 {
                return Err(ServiceError::Validation("Actual cost must be zero or more".to_string()));
            }
        }

        let _guard = self.locks.lock(format!("booking:{}", booking_id)).await;

        let booking = self.get_booking(booking_id).await?;
        if !booking.involves(actor_id) {
            return Err(ServiceError::PermissionDenied(format!(
                "{} is not a party to booking {}",
                actor_id, booking_id
            )));
        }
        if !booking.status.can_transition_to(new_status) {
            return Err(ServiceError::invalid_transition(
                "booking",
                booking_id,
                booking.status.to_str(),
                new_status.to_str(),
            ));
        }

        let (actual_cost, completed_at) = if new_status == BookingStatus::Completed {
            (Some(actual_cost.unwrap_or(booking.estimated_cost.max)), Some(Utc::now()))
        } else {
            (None, None)
        };

        let updated = self
            .store
            .transition_booking(booking_id, booking.status, new_status, actual_cost, completed_at)
            .await?
            .ok_or_else(|| ServiceError::conflict("booking", booking_id))?;

        tracing::info!(
            "Booking {} moved from {} to {} by {}",
            booking_id,
            booking.status.to_str(),
            new_status.to_str(),
            actor_id
        );

        if new_status == BookingStatus::Completed
            && self.store.increment_total_jobs(&updated.worker_id).await?.is_none()
        {
            tracing::warn!("Worker {} vanished before job count update", updated.worker_id);
        }

        self.notification_service
            .notify_booking_status(updated.counterpart_of(actor_id), &updated)
            .await;

        Ok(updated)
    }

    /// One review per completed booking, by its customer. Folds the rating
    /// into the worker's running average.
    pub async fn attach_review(
        &self,
        actor_id: &str,
        booking_id: Uuid,
        rating: i32,
        review: Option<String>,
    ) -> Result<Booking, ServiceError> {
        if !(1..=5).contains(&rating) {
            return Err(ServiceError::Validation("Rating must be between 1 and 5".to_string()));
        }
        let review = review.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());

        let _guard = self.locks.lock(format!("booking:{}", booking_id)).await;

        let booking = self.get_booking(booking_id).await?;
        if booking.customer_id != actor_id {
            return Err(ServiceError::PermissionDenied(
                "Only the customer can review a booking".to_string(),
            ));
        }
        if booking.status != BookingStatus::Completed {
            return Err(ServiceError::InvalidState(format!(
                "Booking {} is {}, only completed bookings can be reviewed",
                booking_id,
                booking.status.to_str()
            )));
        }
        if booking.rating.is_some() {
            return Err(ServiceError::InvalidState(format!(
                "Booking {} has already been reviewed",
                booking_id
            )));
        }

        let updated = self
            .store
            .attach_booking_review(booking_id, rating, review)
            .await?
            .ok_or_else(|| ServiceError::conflict("booking", booking_id))?;

        match self.store.record_party_rating(&updated.worker_id, rating).await? {
            Some(worker) => tracing::info!(
                "Worker {} rated {} ({} reviews, average {:.2})",
                worker.id,
                rating,
                worker.review_count,
                worker.rating
            ),
            None => tracing::warn!("Worker {} vanished before rating update", updated.worker_id),
        }

        Ok(updated)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, ServiceError> {
        self.store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("booking", booking_id))
    }

    pub async fn list_bookings(&self, party_id: &str, role: PartyType) -> Result<Vec<Booking>, ServiceError> {
        Ok(self.store.list_bookings_for(party_id, role).await?)
    }

    /// Records the settling payment. Never touches the lifecycle status.
    pub async fn mark_paid(&self, booking_id: Uuid, payment_id: Uuid) -> Result<Booking, ServiceError> {
        let _guard = self.locks.lock(format!("booking:{}", booking_id)).await;

        self.store
            .mark_booking_paid(booking_id, payment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("booking", booking_id))
    }

    pub async fn worker_stats(&self, worker_id: &str) -> Result<WorkerStats, ServiceError> {
        let bookings = self.store.list_bookings_for(worker_id, PartyType::Worker).await?;

        let completed: Vec<&Booking> = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .collect();
        let ratings: Vec<i32> = bookings.iter().filter_map(|b| b.rating).collect();

        let average_rating = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().map(|&r| r as f64).sum::<f64>() / ratings.len() as f64
        };

        Ok(WorkerStats {
            total_bookings: bookings.len(),
            completed_bookings: completed.len(),
            total_earnings: completed.iter().filter_map(|b| b.actual_cost).sum(),
            average_rating,
            total_reviews: ratings.len(),
        })
    }

    pub async fn customer_stats(&self, customer_id: &str) -> Result<CustomerStats, ServiceError> {
        let bookings = self.store.list_bookings_for(customer_id, PartyType::Customer).await?;
        let count = |status: BookingStatus| bookings.iter().filter(|b| b.status == status).count();

        Ok(CustomerStats {
            total_bookings: bookings.len(),
            completed_bookings: count(BookingStatus::Completed),
            pending_bookings: count(BookingStatus::Pending),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::notificationmodel::NotificationKind;
    use crate::service::party_service::{fixtures as parties, PartyService};

    struct Harness {
        store: Arc<dyn Store>,
        bookings: BookingService,
        notifications: Arc<NotificationService>,
    }

    async fn harness() -> Harness {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let party_service = PartyService::new(store.clone());
        parties::customer(&party_service, "c1").await;
        parties::worker(&party_service, "w1", "Ravi", vec![ServiceType::Plumber]).await;

        let notifications = Arc::new(NotificationService::new(store.clone()));
        let bookings = BookingService::new(store.clone(), notifications.clone(), Arc::new(EntityLocks::new()));
        Harness {
            store,
            bookings,
            notifications,
        }
    }

    async fn walk_to(h: &Harness, booking_id: Uuid, path: &[BookingStatus]) {
        for status in path {
            h.bookings.update_status("w1", booking_id, *status, None).await.unwrap();
        }
    }

    #[tokio::test]
    async fn new_booking_is_pending_with_table_estimate() {
        let h = harness().await;
        let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.estimated_cost, CostRange { min: 500.0, max: 1500.0 });
        assert_eq!(booking.payment_status, BookingPaymentStatus::Unpaid);
        assert!(booking.actual_cost.is_none() && booking.completed_at.is_none());

        let worker_log = h.notifications.list_notifications("w1").await.unwrap();
        assert_eq!(worker_log.len(), 1);
        assert_eq!(worker_log[0].kind, NotificationKind::BookingStatus);

        // job count moves on completion only
        assert_eq!(h.store.get_party("w1").await.unwrap().unwrap().total_jobs, 0);
    }

    #[tokio::test]
    async fn create_rejects_bad_worker_or_input() {
        let h = harness().await;

        let mut job = fixtures::plumbing_job("ghost");
        assert!(matches!(
            h.bookings.create_booking("c1", job.clone()).await,
            Err(ServiceError::NotFound { .. })
        ));

        job.worker_id = "w1".to_string();
        job.service_type = ServiceType::Gardener;
        assert!(matches!(
            h.bookings.create_booking("c1", job.clone()).await,
            Err(ServiceError::Validation(_))
        ));

        job.service_type = ServiceType::Plumber;
        job.address = "  ".to_string();
        assert!(matches!(
            h.bookings.create_booking("c1", job).await,
            Err(ServiceError::Validation(_))
        ));

        assert!(matches!(
            h.bookings.create_booking("w1", fixtures::plumbing_job("w1")).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn only_registered_customers_can_book() {
        let h = harness().await;

        assert!(matches!(
            h.bookings.create_booking("ghost", fixtures::plumbing_job("w1")).await,
            Err(ServiceError::NotFound { .. })
        ));

        let party_service = PartyService::new(h.store.clone());
        parties::worker(&party_service, "w2", "Kiran", vec![ServiceType::Painter]).await;
        assert!(matches!(
            h.bookings.create_booking("w2", fixtures::plumbing_job("w1")).await,
            Err(ServiceError::Validation(_))
        ));

        assert!(h.bookings.list_bookings("w1", PartyType::Worker).await.unwrap().is_empty());
        assert!(h.notifications.list_notifications("w1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inactive_worker_cannot_be_booked() {
        let h = harness().await;
        h.store.set_party_active("w1", false).await.unwrap();

        assert!(matches!(
            h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn full_lifecycle_completes_with_default_cost() {
        let h = harness().await;
        let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();

        walk_to(&h, booking.id, &[BookingStatus::Confirmed, BookingStatus::InProgress]).await;
        let done = h
            .bookings
            .update_status("w1", booking.id, BookingStatus::Completed, None)
            .await
            .unwrap();

        assert_eq!(done.status, BookingStatus::Completed);
        assert_eq!(done.actual_cost, Some(1500.0));
        assert!(done.completed_at.is_some());
        assert_eq!(h.store.get_party("w1").await.unwrap().unwrap().total_jobs, 1);

        // customer hears about each step taken by the worker
        let customer_log = h.notifications.list_notifications("c1").await.unwrap();
        assert_eq!(customer_log.len(), 3);
    }

    #[tokio::test]
    async fn explicit_actual_cost_is_kept() {
        let h = harness().await;
        let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();
        walk_to(&h, booking.id, &[BookingStatus::Confirmed, BookingStatus::InProgress]).await;

        let done = h
            .bookings
            .update_status("c1", booking.id, BookingStatus::Completed, Some(1200.0))
            .await
            .unwrap();
        assert_eq!(done.actual_cost, Some(1200.0));
    }

    #[tokio::test]
    async fn actual_cost_outside_completion_is_rejected() {
        let h = harness().await;
        let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();

        assert!(matches!(
            h.bookings
                .update_status("w1", booking.id, BookingStatus::Confirmed, Some(100.0))
                .await,
            Err(ServiceError::Validation(_))
        ));
        walk_to(&h, booking.id, &[BookingStatus::Confirmed, BookingStatus::InProgress]).await;
        assert!(matches!(
            h.bookings
                .update_status("w1", booking.id, BookingStatus::Completed, Some(-1.0))
                .await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn illegal_transition_leaves_booking_untouched() {
        let h = harness().await;
        let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();
        walk_to(&h, booking.id, &[BookingStatus::Confirmed]).await;

        let err = h
            .bookings
            .update_status("w1", booking.id, BookingStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));

        let reloaded = h.bookings.get_booking(booking.id).await.unwrap();
        assert_eq!(reloaded.status, BookingStatus::Confirmed);
        assert!(reloaded.actual_cost.is_none());
    }

    #[tokio::test]
    async fn terminal_states_accept_nothing() {
        let h = harness().await;
        let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();
        walk_to(&h, booking.id, &[BookingStatus::Cancelled]).await;

        for status in BookingStatus::ALL {
            assert!(h.bookings.update_status("w1", booking.id, status, None).await.is_err());
        }
        assert_eq!(h.bookings.get_booking(booking.id).await.unwrap().status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn outsiders_cannot_move_a_booking() {
        let h = harness().await;
        let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();

        assert!(matches!(
            h.bookings
                .update_status("stranger", booking.id, BookingStatus::Cancelled, None)
                .await,
            Err(ServiceError::PermissionDenied(_))
        ));
        assert!(matches!(
            h.bookings
                .update_status("w1", Uuid::new_v4(), BookingStatus::Cancelled, None)
                .await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_updates_let_exactly_one_through() {
        let h = harness().await;
        let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();

        let confirm = {
            let bookings = h.bookings.clone();
            tokio::spawn(async move {
                bookings
                    .update_status("w1", booking.id, BookingStatus::Confirmed, None)
                    .await
            })
        };
        let confirm_again = {
            let bookings = h.bookings.clone();
            tokio::spawn(async move {
                bookings
                    .update_status("c1", booking.id, BookingStatus::Confirmed, None)
                    .await
            })
        };

        let results = [confirm.await.unwrap(), confirm_again.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ServiceError::InvalidTransition { .. }))));

        let final_status = h.bookings.get_booking(booking.id).await.unwrap().status;
        assert_eq!(final_status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn review_updates_running_average_once() {
        let h = harness().await;

        for rating in [4, 5] {
            let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();
            walk_to(
                &h,
                booking.id,
                &[BookingStatus::Confirmed, BookingStatus::InProgress, BookingStatus::Completed],
            )
            .await;
            let reviewed = h
                .bookings
                .attach_review("c1", booking.id, rating, Some("Good work".to_string()))
                .await
                .unwrap();
            assert_eq!(reviewed.rating, Some(rating));

            let again = h.bookings.attach_review("c1", booking.id, 1, None).await;
            assert!(matches!(again, Err(ServiceError::InvalidState(_))));
        }

        let worker = h.store.get_party("w1").await.unwrap().unwrap();
        assert_eq!(worker.review_count, 2);
        assert!((worker.rating - 4.5).abs() < 1e-9);
        assert_eq!(worker.total_jobs, 2);
    }

    #[tokio::test]
    async fn review_rules() {
        let h = harness().await;
        let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();

        assert!(matches!(
            h.bookings.attach_review("c1", booking.id, 5, None).await,
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            h.bookings.attach_review("c1", booking.id, 6, None).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            h.bookings.attach_review("c1", booking.id, 0, None).await,
            Err(ServiceError::Validation(_))
        ));

        walk_to(
            &h,
            booking.id,
            &[BookingStatus::Confirmed, BookingStatus::InProgress, BookingStatus::Completed],
        )
        .await;
        assert!(matches!(
            h.bookings.attach_review("w1", booking.id, 5, None).await,
            Err(ServiceError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn mark_paid_keeps_lifecycle_status() {
        let h = harness().await;
        let booking = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();
        let payment_id = Uuid::new_v4();

        let paid = h.bookings.mark_paid(booking.id, payment_id).await.unwrap();
        assert_eq!(paid.status, BookingStatus::Pending);
        assert_eq!(paid.payment_status, BookingPaymentStatus::Paid);
        assert_eq!(paid.payment_id, Some(payment_id));
    }

    #[tokio::test]
    async fn listing_and_stats() {
        let h = harness().await;
        let first = h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();
        h.bookings.create_booking("c1", fixtures::plumbing_job("w1")).await.unwrap();
        walk_to(
            &h,
            first.id,
            &[BookingStatus::Confirmed, BookingStatus::InProgress],
        )
        .await;
        h.bookings
            .update_status("w1", first.id, BookingStatus::Completed, Some(1000.0))
            .await
            .unwrap();
        h.bookings.attach_review("c1", first.id, 3, None).await.unwrap();

        let as_customer = h.bookings.list_bookings("c1", PartyType::Customer).await.unwrap();
        assert_eq!(as_customer.len(), 2);
        assert!(as_customer[0].created_at >= as_customer[1].created_at);
        assert!(h.bookings.list_bookings("c1", PartyType::Worker).await.unwrap().is_empty());

        let stats = h.bookings.worker_stats("w1").await.unwrap();
        assert_eq!(stats.total_bookings, 2);
        assert_eq!(stats.completed_bookings, 1);
        assert_eq!(stats.total_earnings, 1000.0);
        assert_eq!(stats.average_rating, 3.0);
        assert_eq!(stats.total_reviews, 1);

        let stats = h.bookings.customer_stats("c1").await.unwrap();
        assert_eq!(stats.total_bookings, 2);
        assert_eq!(stats.completed_bookings, 1);
        assert_eq!(stats.pending_bookings, 1);
    }
}
