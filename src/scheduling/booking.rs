//! Shape and ownership checks for incoming appointment requests

use crate::db::SchedulingRepository;
use crate::error::{SchedulingError, SchedulingResult};
use crate::models::{CreateAppointment, PersonStatus, ValidBooking};
use crate::validation::{
    combine, parse_date, parse_time_of_day, parse_uuid, require_field, ValidationError,
};
use std::sync::Arc;
use validator::Validate;

/// Validates booking requests before they reach the state machine.
///
/// The pastor's published slots and block-out periods are not consulted,
/// and `start_time < end_time` is not enforced for appointments.
#[derive(Clone)]
pub struct BookingValidator {
    repo: Arc<dyn SchedulingRepository>,
}

impl BookingValidator {
    pub fn new(repo: Arc<dyn SchedulingRepository>) -> Self {
        Self { repo }
    }

    pub async fn validate(&self, input: &CreateAppointment) -> SchedulingResult<ValidBooking> {
        let pastor_id = require_field("pastor_id", input.pastor_id.as_deref())?;
        let date = require_field("appointment_date", input.appointment_date.as_deref())?;
        let start = require_field("start_time", input.start_time.as_deref())?;
        let end = require_field("end_time", input.end_time.as_deref())?;
        let reason = require_field("reason", input.reason.as_deref())?;
        input.validate().map_err(ValidationError::from)?;

        let pastor_id = parse_uuid("pastor_id", pastor_id)?;
        let appointment_date = parse_date("appointment_date", date)?;
        let start_time = combine(appointment_date, parse_time_of_day("start_time", start)?);
        let end_time = combine(appointment_date, parse_time_of_day("end_time", end)?);

        let pastor = self.repo.find_person(pastor_id).await?;
        match pastor {
            Some(p) if p.role.is_pastoral() && p.status == PersonStatus::Active => {}
            _ => return Err(SchedulingError::PastorNotFound),
        }

        Ok(ValidBooking {
            pastor_id,
            appointment_date,
            start_time,
            end_time,
            reason: reason.to_string(),
        })
    }
}
