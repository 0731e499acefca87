//! Appointment request handlers

use crate::error::SchedulingError;
use crate::models::*;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use super::AppState;

type HandlerResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), SchedulingError>;

/// List the caller's own requests, latest first
pub async fn list_my_appointments(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> HandlerResult<Vec<AppointmentRequest>> {
    let appointments = state.service.list_my_appointments(&caller).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(appointments))))
}

/// List requests addressed to the calling pastor, earliest first
pub async fn list_pastor_appointments(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> HandlerResult<Vec<AppointmentRequest>> {
    let appointments = state.service.list_pastor_appointments(&caller).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(appointments))))
}

/// Request an appointment with a pastor
pub async fn request_appointment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateAppointment>,
) -> HandlerResult<AppointmentRequest> {
    let appointment = state.service.request_appointment(&caller, &input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(appointment))))
}

/// Confirm or refuse a pending request (pastor)
pub async fn respond_to_appointment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(appointment_id): Path<Uuid>,
    Json(input): Json<RespondToAppointment>,
) -> HandlerResult<AppointmentRequest> {
    let appointment = state
        .service
        .respond_to_appointment(&caller, appointment_id, &input)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(appointment))))
}

/// Cancel one of the caller's own requests
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(appointment_id): Path<Uuid>,
) -> HandlerResult<AppointmentRequest> {
    let appointment = state
        .service
        .cancel_appointment(&caller, appointment_id)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(appointment))))
}
