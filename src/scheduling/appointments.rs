//! Appointment request lifecycle
//!
//! ```text
//! pending ──respond──▶ confirmed
//!    │  └───respond──▶ cancelled
//!    └─requester cancel─▶ cancelled
//! ```
//!
//! `completed` is set by an external process once the meeting has taken
//! place and is never reached from here.

use super::notifications::{self, NotificationDispatcher};
use crate::db::SchedulingRepository;
use crate::error::{SchedulingError, SchedulingResult};
use crate::models::{AppointmentRequest, AppointmentStatus, Decision, ValidBooking};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppointmentStateMachine {
    repo: Arc<dyn SchedulingRepository>,
    notifier: NotificationDispatcher,
}

impl AppointmentStateMachine {
    pub fn new(repo: Arc<dyn SchedulingRepository>, notifier: NotificationDispatcher) -> Self {
        Self { repo, notifier }
    }

    /// Store a new pending request and notify the pastor
    pub async fn create(
        &self,
        requester_id: Uuid,
        booking: &ValidBooking,
    ) -> SchedulingResult<AppointmentRequest> {
        let appointment = self.repo.insert_appointment(requester_id, booking).await?;
        tracing::info!(
            "Appointment {} requested by {} with pastor {} on {}",
            appointment.id,
            appointment.user_id,
            appointment.pastor_id,
            appointment.appointment_date
        );

        self.notifier.enqueue(notifications::new_request(&appointment)).await;
        Ok(appointment)
    }

    /// Confirm or refuse a pending request addressed to `acting_person_id`.
    ///
    /// Unknown ids, requests for another pastor and requests that are no
    /// longer pending all yield `NotFoundOrAlreadyProcessed`.
    pub async fn respond(
        &self,
        appointment_id: Uuid,
        acting_person_id: Uuid,
        decision: Decision,
        response_message: Option<&str>,
    ) -> SchedulingResult<AppointmentRequest> {
        let message = response_message.map(str::trim).filter(|m| !m.is_empty());

        let appointment = self
            .repo
            .respond_appointment(appointment_id, acting_person_id, decision.status(), message)
            .await?
            .ok_or(SchedulingError::NotFoundOrAlreadyProcessed)?;

        tracing::info!(
            "Pastor {} set appointment {} to {:?}",
            acting_person_id,
            appointment.id,
            appointment.status
        );

        self.notifier.enqueue(notifications::response(&appointment)).await;
        Ok(appointment)
    }

    /// Cancel on behalf of the requester from any non-completed status.
    /// Cancelling twice does not notify the pastor again.
    pub async fn cancel_by_requester(
        &self,
        appointment_id: Uuid,
        requester_id: Uuid,
    ) -> SchedulingResult<AppointmentRequest> {
        let cancelled = self
            .repo
            .cancel_appointment(appointment_id, requester_id)
            .await?
            .ok_or(SchedulingError::NotFoundOrAlreadyProcessed)?;

        if cancelled.previous_status == AppointmentStatus::Cancelled {
            tracing::debug!("Appointment {} was already cancelled", appointment_id);
        } else {
            tracing::info!(
                "Requester {} cancelled appointment {} (was {:?})",
                requester_id,
                appointment_id,
                cancelled.previous_status
            );
            self.notifier
                .enqueue(notifications::cancelled_by_requester(&cancelled.appointment))
                .await;
        }

        Ok(cancelled.appointment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersonRole;
    use crate::testing::{booking_fixture, FailingSink, InMemoryRepository, RecordingSink};
    use std::time::Duration;

    struct Fixture {
        repo: Arc<InMemoryRepository>,
        sink: Arc<RecordingSink>,
        machine: AppointmentStateMachine,
        member: Uuid,
        pastor: Uuid,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryRepository::new());
        let sink = Arc::new(RecordingSink::default());
        let machine = AppointmentStateMachine::new(
            repo.clone(),
            NotificationDispatcher::new(sink.clone(), Duration::from_secs(1)),
        );
        let member = repo.add_person("Jean", PersonRole::Member);
        let pastor = repo.add_person("Pasteur Martin", PersonRole::Pastor);
        Fixture {
            repo,
            sink,
            machine,
            member,
            pastor,
        }
    }

    #[tokio::test]
    async fn test_create_starts_pending_and_notifies_pastor() {
        let f = fixture();
        let appointment = f
            .machine
            .create(f.member, &booking_fixture(f.pastor))
            .await
            .unwrap();

        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.user_id, f.member);
        assert_eq!(appointment.pastor_id, f.pastor);
        assert_eq!(f.sink.recipients(), vec![f.pastor]);
    }

    #[tokio::test]
    async fn test_respond_only_once() {
        let f = fixture();
        let appointment = f.machine.create(f.member, &booking_fixture(f.pastor)).await.unwrap();

        let confirmed = f
            .machine
            .respond(appointment.id, f.pastor, Decision::Confirmed, Some("À bientôt"))
            .await
            .unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
        assert_eq!(confirmed.response_message.as_deref(), Some("À bientôt"));

        let second = f
            .machine
            .respond(appointment.id, f.pastor, Decision::Cancelled, None)
            .await;
        assert!(matches!(second, Err(SchedulingError::NotFoundOrAlreadyProcessed)));
        assert_eq!(
            f.repo.appointment(appointment.id).unwrap().status,
            AppointmentStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_respond_by_other_pastor_is_hidden() {
        let f = fixture();
        let other = f.repo.add_person("Pasteur Durand", PersonRole::Pastor);
        let appointment = f.machine.create(f.member, &booking_fixture(f.pastor)).await.unwrap();

        let result = f
            .machine
            .respond(appointment.id, other, Decision::Confirmed, None)
            .await;
        assert!(matches!(result, Err(SchedulingError::NotFoundOrAlreadyProcessed)));

        let unknown = f
            .machine
            .respond(Uuid::new_v4(), f.pastor, Decision::Confirmed, None)
            .await;
        assert!(matches!(unknown, Err(SchedulingError::NotFoundOrAlreadyProcessed)));
        assert_eq!(
            f.repo.appointment(appointment.id).unwrap().status,
            AppointmentStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_blank_response_message_is_dropped() {
        let f = fixture();
        let appointment = f.machine.create(f.member, &booking_fixture(f.pastor)).await.unwrap();
        let refused = f
            .machine
            .respond(appointment.id, f.pastor, Decision::Cancelled, Some("  "))
            .await
            .unwrap();
        assert_eq!(refused.status, AppointmentStatus::Cancelled);
        assert_eq!(refused.response_message, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_responses_have_single_winner() {
        let f = fixture();
        let appointment = f.machine.create(f.member, &booking_fixture(f.pastor)).await.unwrap();
        let id = appointment.id;

        let confirm = {
            let machine = f.machine.clone();
            let pastor = f.pastor;
            tokio::spawn(async move {
                machine
                    .respond(id, pastor, Decision::Confirmed, None)
                    .await
            })
        };
        let refuse = {
            let machine = f.machine.clone();
            let pastor = f.pastor;
            tokio::spawn(async move {
                machine
                    .respond(id, pastor, Decision::Cancelled, None)
                    .await
            })
        };

        let (a, b) = tokio::join!(confirm, refuse);
        let results = [a.unwrap(), b.unwrap()];
        let winners: Vec<&AppointmentRequest> =
            results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let losers = results
            .iter()
            .filter(|r| matches!(r, Err(SchedulingError::NotFoundOrAlreadyProcessed)))
            .count();

        assert_eq!(winners.len(), 1);
        assert_eq!(losers, 1);
        assert_eq!(f.repo.appointment(id).unwrap().status, winners[0].status);
    }

    #[tokio::test]
    async fn test_requester_can_cancel_pending_and_confirmed() {
        let f = fixture();
        let pending = f.machine.create(f.member, &booking_fixture(f.pastor)).await.unwrap();
        let cancelled = f.machine.cancel_by_requester(pending.id, f.member).await.unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

        let confirmed = f.machine.create(f.member, &booking_fixture(f.pastor)).await.unwrap();
        f.machine
            .respond(confirmed.id, f.pastor, Decision::Confirmed, None)
            .await
            .unwrap();
        let cancelled = f.machine.cancel_by_requester(confirmed.id, f.member).await.unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_notifies_once() {
        let f = fixture();
        let appointment = f.machine.create(f.member, &booking_fixture(f.pastor)).await.unwrap();

        f.machine.cancel_by_requester(appointment.id, f.member).await.unwrap();
        let again = f.machine.cancel_by_requester(appointment.id, f.member).await.unwrap();
        assert_eq!(again.status, AppointmentStatus::Cancelled);

        // one for the request, one for the first cancellation
        assert_eq!(f.sink.recipients(), vec![f.pastor, f.pastor]);
    }

    #[tokio::test]
    async fn test_only_requester_may_cancel() {
        let f = fixture();
        let appointment = f.machine.create(f.member, &booking_fixture(f.pastor)).await.unwrap();

        for actor in [f.pastor, Uuid::new_v4()] {
            assert!(matches!(
                f.machine.cancel_by_requester(appointment.id, actor).await,
                Err(SchedulingError::NotFoundOrAlreadyProcessed)
            ));
        }
        assert_eq!(
            f.repo.appointment(appointment.id).unwrap().status,
            AppointmentStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_completed_cannot_be_cancelled() {
        let f = fixture();
        let appointment = f.machine.create(f.member, &booking_fixture(f.pastor)).await.unwrap();
        f.repo.force_status(appointment.id, AppointmentStatus::Completed);

        assert!(matches!(
            f.machine.cancel_by_requester(appointment.id, f.member).await,
            Err(SchedulingError::NotFoundOrAlreadyProcessed)
        ));
    }

    #[tokio::test]
    async fn test_transitions_survive_failing_notifications() {
        let repo = Arc::new(InMemoryRepository::new());
        let machine = AppointmentStateMachine::new(
            repo.clone(),
            NotificationDispatcher::new(Arc::new(FailingSink), Duration::from_secs(1)),
        );
        let member = repo.add_person("Jean", PersonRole::Member);
        let pastor = repo.add_person("Pasteur Martin", PersonRole::Pastor);

        let created = machine.create(member, &booking_fixture(pastor)).await.unwrap();
        let confirmed = machine
            .respond(created.id, pastor, Decision::Confirmed, None)
            .await
            .unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
        let cancelled = machine.cancel_by_requester(created.id, member).await.unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(
            repo.appointment(created.id).unwrap().status,
            AppointmentStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_swallowed() {
        let f = fixture();
        f.repo.set_unavailable(true);

        assert!(matches!(
            f.machine.create(f.member, &booking_fixture(f.pastor)).await,
            Err(SchedulingError::DependencyFailure(_))
        ));
        assert!(f.sink.recipients().is_empty());
    }
}
