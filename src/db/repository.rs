//! Repository port for scheduling data
//!
//! All slot, period and appointment state lives behind this trait. The
//! conditional mutations (`respond_appointment`, `cancel_appointment`,
//! `delete_slot`, `delete_period`) must each run as a single atomic
//! read-modify-write in the backing store.

use crate::models::{
    AppointmentRequest, AppointmentStatus, AvailabilitySlot, CancelledAppointment,
    NewAvailabilitySlot, NewUnavailabilityPeriod, Person, UnavailabilityPeriod, ValidBooking,
};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Postgres exclusion constraint violation
const EXCLUSION_VIOLATION: &str = "23P01";
/// Postgres unique constraint violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A storage-level constraint rejected the write as overlapping
    #[error("Conflicting record")]
    Conflict,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err)
                if matches!(
                    db_err.code().as_deref(),
                    Some(EXCLUSION_VIOLATION | UNIQUE_VIOLATION)
                ) =>
            {
                RepositoryError::Conflict
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                RepositoryError::Unavailable(err.to_string())
            }
            other => RepositoryError::Database(other),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait SchedulingRepository: Send + Sync {
    /// Look up a person by id
    async fn find_person(&self, id: Uuid) -> RepositoryResult<Option<Person>>;

    /// Active persons who can be booked (pastors and admins), ordered by name
    async fn list_pastors(&self) -> RepositoryResult<Vec<Person>>;

    /// Slots of one pastor ordered by `(day_of_week, start_time)`
    async fn list_slots(&self, pastor_id: Uuid) -> RepositoryResult<Vec<AvailabilitySlot>>;

    /// Slots of one pastor on one weekday ordered by `start_time`
    async fn list_slots_for_day(
        &self,
        pastor_id: Uuid,
        day_of_week: i16,
    ) -> RepositoryResult<Vec<AvailabilitySlot>>;

    /// Insert a slot; overlapping slots for the same pastor and day yield `Conflict`
    async fn insert_slot(&self, slot: &NewAvailabilitySlot) -> RepositoryResult<AvailabilitySlot>;

    /// Delete a slot owned by `pastor_id`, returning whether a row was removed
    async fn delete_slot(&self, id: Uuid, pastor_id: Uuid) -> RepositoryResult<bool>;

    /// Unavailability periods of one pastor ordered by `start_date`
    async fn list_periods(&self, pastor_id: Uuid) -> RepositoryResult<Vec<UnavailabilityPeriod>>;

    async fn insert_period(
        &self,
        period: &NewUnavailabilityPeriod,
    ) -> RepositoryResult<UnavailabilityPeriod>;

    /// Delete a period owned by `pastor_id`, returning whether a row was removed
    async fn delete_period(&self, id: Uuid, pastor_id: Uuid) -> RepositoryResult<bool>;

    /// Persist a new `pending` appointment
    async fn insert_appointment(
        &self,
        user_id: Uuid,
        booking: &ValidBooking,
    ) -> RepositoryResult<AppointmentRequest>;

    /// Appointments requested by `user_id`, latest first
    async fn list_appointments_for_user(
        &self,
        user_id: Uuid,
    ) -> RepositoryResult<Vec<AppointmentRequest>>;

    /// Appointments addressed to `pastor_id`, earliest first
    async fn list_appointments_for_pastor(
        &self,
        pastor_id: Uuid,
    ) -> RepositoryResult<Vec<AppointmentRequest>>;

    /// Move a `pending` appointment addressed to `pastor_id` to `status`.
    ///
    /// Returns `None` when no row matched (unknown id, other pastor, or no
    /// longer pending).
    async fn respond_appointment(
        &self,
        id: Uuid,
        pastor_id: Uuid,
        status: AppointmentStatus,
        response_message: Option<&str>,
    ) -> RepositoryResult<Option<AppointmentRequest>>;

    /// Cancel an appointment on behalf of its requester.
    ///
    /// Any status except `completed` is accepted: a completed meeting is an
    /// immutable record. Returns `None` when no row matched.
    async fn cancel_appointment(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> RepositoryResult<Option<CancelledAppointment>>;
}
