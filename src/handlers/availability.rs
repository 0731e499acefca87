//! Availability calendar handlers

use crate::error::SchedulingError;
use crate::models::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use super::AppState;

type HandlerResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), SchedulingError>;

// =============================================================================
// Own calendar (pastor)
// =============================================================================

/// List the calling pastor's weekly slots
pub async fn list_my_slots(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> HandlerResult<Vec<AvailabilitySlot>> {
    let slots = state.service.list_my_slots(&caller).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(slots))))
}

/// Add a weekly slot to the calling pastor's calendar
pub async fn create_slot(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateAvailabilitySlot>,
) -> HandlerResult<AvailabilitySlot> {
    let slot = state.service.add_slot(&caller, &input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(slot))))
}

pub async fn delete_slot(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(slot_id): Path<Uuid>,
) -> HandlerResult<()> {
    state.service.remove_slot(&caller, slot_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(()))))
}

pub async fn list_my_unavailability(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> HandlerResult<Vec<UnavailabilityPeriod>> {
    let periods = state.service.list_my_unavailability(&caller).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(periods))))
}

/// Block out a date range on the calling pastor's calendar
pub async fn create_unavailability(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateUnavailabilityPeriod>,
) -> HandlerResult<UnavailabilityPeriod> {
    let period = state.service.add_unavailability(&caller, &input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(period))))
}

pub async fn delete_unavailability(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(period_id): Path<Uuid>,
) -> HandlerResult<()> {
    state.service.remove_unavailability(&caller, period_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(()))))
}

// =============================================================================
// Pastor directory
// =============================================================================

/// List pastors that can be booked
pub async fn list_pastors(State(state): State<AppState>) -> HandlerResult<Vec<Person>> {
    let pastors = state.service.list_pastors().await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(pastors))))
}

/// Published slots and block-out periods of one pastor
pub async fn get_pastor_calendar(
    State(state): State<AppState>,
    Path(pastor_id): Path<Uuid>,
) -> HandlerResult<PastorCalendar> {
    let calendar = state.service.pastor_calendar(pastor_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(calendar))))
}

/// Whether a pastor is open at a given instant
pub async fn get_pastor_open_at(
    State(state): State<AppState>,
    Path(pastor_id): Path<Uuid>,
    Query(query): Query<OpenAtQuery>,
) -> HandlerResult<OpenAtResponse> {
    let open = state.service.is_pastor_open(pastor_id, query.at).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(open))))
}
