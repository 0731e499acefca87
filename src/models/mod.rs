//! Data models for the scheduling service

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "person_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    Member,
    Pastor,
    Admin,
    Worker,
}

impl PersonRole {
    /// Roles that can receive appointment requests and manage a calendar
    pub const PASTORAL: &'static [PersonRole] = &[PersonRole::Pastor, PersonRole::Admin];

    pub fn is_pastoral(self) -> bool {
        Self::PASTORAL.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "person_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PersonStatus {
    Active,
    Inactive,
    Banned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// Outcome a pastor may choose when answering a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Cancelled,
}

impl Decision {
    pub fn status(self) -> AppointmentStatus {
        match self {
            Decision::Confirmed => AppointmentStatus::Confirmed,
            Decision::Cancelled => AppointmentStatus::Cancelled,
        }
    }
}

impl TryFrom<AppointmentStatus> for Decision {
    type Error = AppointmentStatus;

    fn try_from(status: AppointmentStatus) -> Result<Self, Self::Error> {
        match status {
            AppointmentStatus::Confirmed => Ok(Decision::Confirmed),
            AppointmentStatus::Cancelled => Ok(Decision::Cancelled),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Appointment,
}

// =============================================================================
// Person
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Person {
    pub id: Uuid,
    pub display_name: String,
    pub role: PersonRole,
    pub status: PersonStatus,
}

/// Resolved identity of the person making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub person_id: Uuid,
    pub role: PersonRole,
    pub status: PersonStatus,
}

// =============================================================================
// Availability
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub pastor_id: Uuid,
    /// 0 = Sunday
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAvailabilitySlot {
    #[validate(range(min = 0, max = 6, message = "day_of_week must be between 0 and 6"))]
    pub day_of_week: i16,
    pub start_time: String,
    pub end_time: String,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAvailabilitySlot {
    pub pastor_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UnavailabilityPeriod {
    pub id: Uuid,
    pub pastor_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUnavailabilityPeriod {
    pub start_date: String,
    pub end_date: String,
    #[validate(length(max = 1000, message = "reason is too long (max 1000 characters)"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUnavailabilityPeriod {
    pub pastor_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PastorCalendar {
    pub pastor_id: Uuid,
    pub slots: Vec<AvailabilitySlot>,
    pub unavailability: Vec<UnavailabilityPeriod>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAtQuery {
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenAtResponse {
    pub pastor_id: Uuid,
    pub at: DateTime<Utc>,
    pub open: bool,
}

// =============================================================================
// Appointment
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AppointmentRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pastor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: String,
    pub status: AppointmentStatus,
    pub response_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw booking body; every field is optional so missing ones can be reported by name
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateAppointment {
    pub pastor_id: Option<String>,
    pub appointment_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[validate(length(max = 2000, message = "reason is too long (max 2000 characters)"))]
    pub reason: Option<String>,
}

/// A booking that passed validation and is ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBooking {
    pub pastor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RespondToAppointment {
    pub status: AppointmentStatus,
    #[validate(length(max = 2000, message = "response_message is too long (max 2000 characters)"))]
    pub response_message: Option<String>,
}

/// Result of a requester cancellation, with the status it had before
#[derive(Debug, Clone, FromRow)]
pub struct CancelledAppointment {
    pub previous_status: AppointmentStatus,
    #[sqlx(flatten)]
    pub appointment: AppointmentRequest,
}

// =============================================================================
// Notification
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
}

// =============================================================================
// API Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
