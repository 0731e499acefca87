//! Input validation module

use crate::models::{
    AppointmentStatus, CreateAvailabilitySlot, CreateUnavailabilityPeriod, Decision,
    NewAvailabilitySlot, NewUnavailabilityPeriod,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    MissingField { field: String },

    #[error("Field '{field}' has an invalid format")]
    InvalidFormat { field: String },

    #[error("Day of week must be between 0 (Sunday) and 6 (Saturday)")]
    DayOfWeekOutOfRange,

    #[error("End time must be after start time")]
    InvalidTimeRange,

    #[error("End date must be after start date")]
    InvalidDateRange,

    #[error("Response status must be 'confirmed' or 'cancelled'")]
    InvalidDecision,

    #[error("{0}")]
    Rules(String),
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ValidationError::Rules(errors.to_string())
    }
}

/// Return the trimmed value of a required text field
pub fn require_field<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField {
            field: field.to_string(),
        }),
    }
}

/// Parse a calendar date: `YYYY-MM-DD` or the date part of a timestamp
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.naive_local().date());
    }
    if let Some(ts) = parse_naive_datetime(value) {
        return Ok(ts.date());
    }
    Err(invalid(field))
}

/// Parse a wall-clock time: `HH:MM`, `HH:MM:SS` or the time part of a timestamp
pub fn parse_time_of_day(field: &str, value: &str) -> Result<NaiveTime, ValidationError> {
    for format in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(value, format) {
            return Ok(time);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.naive_local().time());
    }
    if let Some(ts) = parse_naive_datetime(value) {
        return Ok(ts.time());
    }
    Err(invalid(field))
}

/// Parse an absolute instant: RFC 3339, a naive timestamp (UTC) or a bare date (midnight UTC)
pub fn parse_instant(field: &str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Some(ts) = parse_naive_datetime(value) {
        return Ok(Utc.from_utc_datetime(&ts));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(combine(date, NaiveTime::MIN));
    }
    Err(invalid(field))
}

/// Parse an identifier sent as text
pub fn parse_uuid(field: &str, value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value).map_err(|_| invalid(field))
}

/// Combine a calendar date with a time of day into a UTC instant
pub fn combine(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(time))
}

pub fn validate_day_of_week(day_of_week: i16) -> Result<(), ValidationError> {
    if !(0..=6).contains(&day_of_week) {
        return Err(ValidationError::DayOfWeekOutOfRange);
    }
    Ok(())
}

/// Validate a slot body and bind it to the pastor who owns it
pub fn validate_slot(
    pastor_id: Uuid,
    input: &CreateAvailabilitySlot,
) -> Result<NewAvailabilitySlot, ValidationError> {
    validate_day_of_week(input.day_of_week)?;
    input.validate()?;

    let start = require_field("start_time", Some(&input.start_time))?;
    let end = require_field("end_time", Some(&input.end_time))?;
    let start_time = parse_time_of_day("start_time", start)?;
    let end_time = parse_time_of_day("end_time", end)?;
    if start_time >= end_time {
        return Err(ValidationError::InvalidTimeRange);
    }

    Ok(NewAvailabilitySlot {
        pastor_id,
        day_of_week: input.day_of_week,
        start_time,
        end_time,
        is_available: input.is_available.unwrap_or(true),
    })
}

/// Validate an unavailability body; ordering is the only structural rule
pub fn validate_period(
    pastor_id: Uuid,
    input: &CreateUnavailabilityPeriod,
) -> Result<NewUnavailabilityPeriod, ValidationError> {
    input.validate()?;

    let start = require_field("start_date", Some(&input.start_date))?;
    let end = require_field("end_date", Some(&input.end_date))?;
    let start_date = parse_instant("start_date", start)?;
    let end_date = parse_instant("end_date", end)?;
    if start_date >= end_date {
        return Err(ValidationError::InvalidDateRange);
    }

    Ok(NewUnavailabilityPeriod {
        pastor_id,
        start_date,
        end_date,
        reason: input
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
    })
}

pub fn validate_decision(status: AppointmentStatus) -> Result<Decision, ValidationError> {
    Decision::try_from(status).map_err(|_| ValidationError::InvalidDecision)
}

fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

fn invalid(field: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
    }
}
