//! Pastor availability calendar: recurring weekly slots and block-out periods

use crate::db::SchedulingRepository;
use crate::error::{SchedulingError, SchedulingResult};
use crate::models::{
    AvailabilitySlot, NewAvailabilitySlot, NewUnavailabilityPeriod, UnavailabilityPeriod,
};
use crate::validation::{validate_day_of_week, ValidationError};
use chrono::{DateTime, Datelike, NaiveTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Half-open overlap test between an existing slot and a candidate.
///
/// Slots that only touch at a boundary (`[09:00,10:00)` and `[10:00,11:00)`)
/// do not overlap.
pub fn slots_overlap(
    existing_start: NaiveTime,
    existing_end: NaiveTime,
    new_start: NaiveTime,
    new_end: NaiveTime,
) -> bool {
    // new start falls inside existing
    (existing_start <= new_start && new_start < existing_end)
        // new end falls inside existing
        || (existing_start < new_end && new_end <= existing_end)
        // new contains existing
        || (new_start <= existing_start && existing_end <= new_end)
}

/// Weekday index with Sunday = 0
pub fn day_of_week(at: DateTime<Utc>) -> i16 {
    at.weekday().num_days_from_sunday() as i16
}

#[derive(Clone)]
pub struct AvailabilityCalendar {
    repo: Arc<dyn SchedulingRepository>,
}

impl AvailabilityCalendar {
    pub fn new(repo: Arc<dyn SchedulingRepository>) -> Self {
        Self { repo }
    }

    /// Add a recurring slot, rejecting any overlap with the pastor's slots on that day.
    ///
    /// The read here is an early rejection only; the storage constraint is
    /// what settles two concurrent inserts.
    pub async fn add_slot(&self, slot: NewAvailabilitySlot) -> SchedulingResult<AvailabilitySlot> {
        validate_day_of_week(slot.day_of_week)?;
        if slot.start_time >= slot.end_time {
            return Err(ValidationError::InvalidTimeRange.into());
        }

        let existing = self
            .repo
            .list_slots_for_day(slot.pastor_id, slot.day_of_week)
            .await?;

        if let Some(clash) = existing
            .iter()
            .find(|s| slots_overlap(s.start_time, s.end_time, slot.start_time, slot.end_time))
        {
            tracing::info!(
                "Slot {}-{} on day {} for pastor {} overlaps slot {}",
                slot.start_time,
                slot.end_time,
                slot.day_of_week,
                slot.pastor_id,
                clash.id
            );
            return Err(SchedulingError::Conflict);
        }

        let created = self.repo.insert_slot(&slot).await?;
        tracing::info!(
            "Pastor {} added slot {} (day {}, {}-{})",
            created.pastor_id,
            created.id,
            created.day_of_week,
            created.start_time,
            created.end_time
        );
        Ok(created)
    }

    /// Delete a slot owned by the requesting pastor; anything else reads as not found
    pub async fn remove_slot(&self, slot_id: Uuid, pastor_id: Uuid) -> SchedulingResult<()> {
        if !self.repo.delete_slot(slot_id, pastor_id).await? {
            return Err(SchedulingError::NotFoundOrAlreadyProcessed);
        }
        tracing::info!("Pastor {} removed slot {}", pastor_id, slot_id);
        Ok(())
    }

    pub async fn add_unavailability_period(
        &self,
        period: NewUnavailabilityPeriod,
    ) -> SchedulingResult<UnavailabilityPeriod> {
        if period.start_date >= period.end_date {
            return Err(ValidationError::InvalidDateRange.into());
        }

        let created = self.repo.insert_period(&period).await?;
        tracing::info!(
            "Pastor {} blocked {} to {} ({})",
            created.pastor_id,
            created.start_date,
            created.end_date,
            created.id
        );
        Ok(created)
    }

    pub async fn remove_unavailability_period(
        &self,
        period_id: Uuid,
        pastor_id: Uuid,
    ) -> SchedulingResult<()> {
        if !self.repo.delete_period(period_id, pastor_id).await? {
            return Err(SchedulingError::NotFoundOrAlreadyProcessed);
        }
        tracing::info!("Pastor {} removed unavailability period {}", pastor_id, period_id);
        Ok(())
    }

    pub async fn list_slots(&self, pastor_id: Uuid) -> SchedulingResult<Vec<AvailabilitySlot>> {
        Ok(self.repo.list_slots(pastor_id).await?)
    }

    pub async fn list_periods(
        &self,
        pastor_id: Uuid,
    ) -> SchedulingResult<Vec<UnavailabilityPeriod>> {
        Ok(self.repo.list_periods(pastor_id).await?)
    }

    /// Whether the pastor has an open slot covering `at` and no block-out containing it
    pub async fn is_open(&self, pastor_id: Uuid, at: DateTime<Utc>) -> SchedulingResult<bool> {
        let time = at.time();
        let slots = self.repo.list_slots_for_day(pastor_id, day_of_week(at)).await?;
        let in_slot = slots
            .iter()
            .any(|s| s.is_available && s.start_time <= time && time < s.end_time);
        if !in_slot {
            return Ok(false);
        }

        let periods = self.repo.list_periods(pastor_id).await?;
        Ok(!periods
            .iter()
            .any(|p| p.start_date <= at && at < p.end_date))
    }
}
