//! Pastoral appointment scheduling
//!
//! [`SchedulingService`] is the entry point for every operation. It checks
//! the caller's role once, then delegates to the calendar, the booking
//! validator and the appointment state machine. Pastors only ever act on
//! their own calendar: the caller id is used as the pastor id.

pub mod appointments;
pub mod booking;
pub mod calendar;
pub mod notifications;

use crate::db::SchedulingRepository;
use crate::error::{SchedulingError, SchedulingResult};
use crate::models::*;
use crate::validation::{validate_decision, validate_period, validate_slot, ValidationError};
use appointments::AppointmentStateMachine;
use booking::BookingValidator;
use calendar::AvailabilityCalendar;
use chrono::{DateTime, Utc};
use notifications::NotificationDispatcher;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Reject callers whose role is not in `allowed`
pub fn require_role(caller: &Caller, allowed: &[PersonRole]) -> SchedulingResult<()> {
    if allowed.contains(&caller.role) {
        Ok(())
    } else {
        tracing::debug!(
            "Person {} ({:?}, {:?}) denied, requires one of {:?}",
            caller.person_id,
            caller.role,
            caller.status,
            allowed
        );
        Err(SchedulingError::Forbidden)
    }
}

#[derive(Clone)]
pub struct SchedulingService {
    repo: Arc<dyn SchedulingRepository>,
    calendar: AvailabilityCalendar,
    validator: BookingValidator,
    appointments: AppointmentStateMachine,
}

impl SchedulingService {
    pub fn new(repo: Arc<dyn SchedulingRepository>, notifier: NotificationDispatcher) -> Self {
        Self {
            calendar: AvailabilityCalendar::new(repo.clone()),
            validator: BookingValidator::new(repo.clone()),
            appointments: AppointmentStateMachine::new(repo.clone(), notifier),
            repo,
        }
    }

    // -------------------------------------------------------------------------
    // Appointments
    // -------------------------------------------------------------------------

    pub async fn list_my_appointments(
        &self,
        caller: &Caller,
    ) -> SchedulingResult<Vec<AppointmentRequest>> {
        Ok(self.repo.list_appointments_for_user(caller.person_id).await?)
    }

    pub async fn list_pastor_appointments(
        &self,
        caller: &Caller,
    ) -> SchedulingResult<Vec<AppointmentRequest>> {
        require_role(caller, PersonRole::PASTORAL)?;
        Ok(self.repo.list_appointments_for_pastor(caller.person_id).await?)
    }

    pub async fn request_appointment(
        &self,
        caller: &Caller,
        input: &CreateAppointment,
    ) -> SchedulingResult<AppointmentRequest> {
        let booking = self.validator.validate(input).await?;
        self.appointments.create(caller.person_id, &booking).await
    }

    pub async fn respond_to_appointment(
        &self,
        caller: &Caller,
        appointment_id: Uuid,
        input: &RespondToAppointment,
    ) -> SchedulingResult<AppointmentRequest> {
        require_role(caller, PersonRole::PASTORAL)?;
        input.validate().map_err(ValidationError::from)?;
        let decision = validate_decision(input.status)?;

        self.appointments
            .respond(
                appointment_id,
                caller.person_id,
                decision,
                input.response_message.as_deref(),
            )
            .await
    }

    pub async fn cancel_appointment(
        &self,
        caller: &Caller,
        appointment_id: Uuid,
    ) -> SchedulingResult<AppointmentRequest> {
        self.appointments
            .cancel_by_requester(appointment_id, caller.person_id)
            .await
    }

    // -------------------------------------------------------------------------
    // Own calendar management
    // -------------------------------------------------------------------------

    pub async fn list_my_slots(&self, caller: &Caller) -> SchedulingResult<Vec<AvailabilitySlot>> {
        require_role(caller, PersonRole::PASTORAL)?;
        self.calendar.list_slots(caller.person_id).await
    }

    pub async fn add_slot(
        &self,
        caller: &Caller,
        input: &CreateAvailabilitySlot,
    ) -> SchedulingResult<AvailabilitySlot> {
        require_role(caller, PersonRole::PASTORAL)?;
        let slot = validate_slot(caller.person_id, input)?;
        self.calendar.add_slot(slot).await
    }

    pub async fn remove_slot(&self, caller: &Caller, slot_id: Uuid) -> SchedulingResult<()> {
        require_role(caller, PersonRole::PASTORAL)?;
        self.calendar.remove_slot(slot_id, caller.person_id).await
    }

    pub async fn list_my_unavailability(
        &self,
        caller: &Caller,
    ) -> SchedulingResult<Vec<UnavailabilityPeriod>> {
        require_role(caller, PersonRole::PASTORAL)?;
        self.calendar.list_periods(caller.person_id).await
    }

    pub async fn add_unavailability(
        &self,
        caller: &Caller,
        input: &CreateUnavailabilityPeriod,
    ) -> SchedulingResult<UnavailabilityPeriod> {
        require_role(caller, PersonRole::PASTORAL)?;
        let period = validate_period(caller.person_id, input)?;
        self.calendar.add_unavailability_period(period).await
    }

    pub async fn remove_unavailability(
        &self,
        caller: &Caller,
        period_id: Uuid,
    ) -> SchedulingResult<()> {
        require_role(caller, PersonRole::PASTORAL)?;
        self.calendar
            .remove_unavailability_period(period_id, caller.person_id)
            .await
    }

    // -------------------------------------------------------------------------
    // Pastor directory (read-only, any member)
    // -------------------------------------------------------------------------

    pub async fn list_pastors(&self) -> SchedulingResult<Vec<Person>> {
        Ok(self.repo.list_pastors().await?)
    }

    pub async fn pastor_calendar(&self, pastor_id: Uuid) -> SchedulingResult<PastorCalendar> {
        self.ensure_bookable(pastor_id).await?;
        Ok(PastorCalendar {
            pastor_id,
            slots: self.calendar.list_slots(pastor_id).await?,
            unavailability: self.calendar.list_periods(pastor_id).await?,
        })
    }

    pub async fn is_pastor_open(
        &self,
        pastor_id: Uuid,
        at: DateTime<Utc>,
    ) -> SchedulingResult<OpenAtResponse> {
        self.ensure_bookable(pastor_id).await?;
        let open = self.calendar.is_open(pastor_id, at).await?;
        Ok(OpenAtResponse {
            pastor_id,
            at,
            open,
        })
    }

    async fn ensure_bookable(&self, pastor_id: Uuid) -> SchedulingResult<()> {
        match self.repo.find_person(pastor_id).await? {
            Some(p) if p.role.is_pastoral() && p.status == PersonStatus::Active => Ok(()),
            _ => Err(SchedulingError::PastorNotFound),
        }
    }
}
