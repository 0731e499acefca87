//! Postgres-backed repository

use super::repository::{RepositoryResult, SchedulingRepository};
use crate::models::*;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchedulingRepository for PgRepository {
    async fn find_person(&self, id: Uuid) -> RepositoryResult<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(
            "SELECT id, display_name, role, status FROM persons WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(person)
    }

    async fn list_pastors(&self) -> RepositoryResult<Vec<Person>> {
        let pastors = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, display_name, role, status FROM persons
            WHERE role IN ('pastor', 'admin') AND status = 'active'
            ORDER BY display_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pastors)
    }

    async fn list_slots(&self, pastor_id: Uuid) -> RepositoryResult<Vec<AvailabilitySlot>> {
        let slots = sqlx::query_as::<_, AvailabilitySlot>(
            r#"
            SELECT * FROM availability_slots
            WHERE pastor_id = $1
            ORDER BY day_of_week ASC, start_time ASC
            "#,
        )
        .bind(pastor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    async fn list_slots_for_day(
        &self,
        pastor_id: Uuid,
        day_of_week: i16,
    ) -> RepositoryResult<Vec<AvailabilitySlot>> {
        let slots = sqlx::query_as::<_, AvailabilitySlot>(
            r#"
            SELECT * FROM availability_slots
            WHERE pastor_id = $1 AND day_of_week = $2
            ORDER BY start_time ASC
            "#,
        )
        .bind(pastor_id)
        .bind(day_of_week)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    async fn insert_slot(&self, slot: &NewAvailabilitySlot) -> RepositoryResult<AvailabilitySlot> {
        // availability_slots_no_overlap rejects concurrent overlapping inserts
        let created = sqlx::query_as::<_, AvailabilitySlot>(
            r#"
            INSERT INTO availability_slots
                (pastor_id, day_of_week, start_time, end_time, is_available)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(slot.pastor_id)
        .bind(slot.day_of_week)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(slot.is_available)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn delete_slot(&self, id: Uuid, pastor_id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM availability_slots WHERE id = $1 AND pastor_id = $2")
            .bind(id)
            .bind(pastor_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_periods(&self, pastor_id: Uuid) -> RepositoryResult<Vec<UnavailabilityPeriod>> {
        let periods = sqlx::query_as::<_, UnavailabilityPeriod>(
            r#"
            SELECT * FROM unavailability_periods
            WHERE pastor_id = $1
            ORDER BY start_date ASC
            "#,
        )
        .bind(pastor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(periods)
    }

    async fn insert_period(
        &self,
        period: &NewUnavailabilityPeriod,
    ) -> RepositoryResult<UnavailabilityPeriod> {
        let created = sqlx::query_as::<_, UnavailabilityPeriod>(
            r#"
            INSERT INTO unavailability_periods (pastor_id, start_date, end_date, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(period.pastor_id)
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(&period.reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn delete_period(&self, id: Uuid, pastor_id: Uuid) -> RepositoryResult<bool> {
        let result =
            sqlx::query("DELETE FROM unavailability_periods WHERE id = $1 AND pastor_id = $2")
                .bind(id)
                .bind(pastor_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_appointment(
        &self,
        user_id: Uuid,
        booking: &ValidBooking,
    ) -> RepositoryResult<AppointmentRequest> {
        let created = sqlx::query_as::<_, AppointmentRequest>(
            r#"
            INSERT INTO appointment_requests
                (user_id, pastor_id, appointment_date, start_time, end_time, reason, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(booking.pastor_id)
        .bind(booking.appointment_date)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(&booking.reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list_appointments_for_user(
        &self,
        user_id: Uuid,
    ) -> RepositoryResult<Vec<AppointmentRequest>> {
        let appointments = sqlx::query_as::<_, AppointmentRequest>(
            r#"
            SELECT * FROM appointment_requests
            WHERE user_id = $1
            ORDER BY appointment_date DESC, start_time DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    async fn list_appointments_for_pastor(
        &self,
        pastor_id: Uuid,
    ) -> RepositoryResult<Vec<AppointmentRequest>> {
        let appointments = sqlx::query_as::<_, AppointmentRequest>(
            r#"
            SELECT * FROM appointment_requests
            WHERE pastor_id = $1
            ORDER BY appointment_date ASC, start_time ASC
            "#,
        )
        .bind(pastor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(appointments)
    }

    async fn respond_appointment(
        &self,
        id: Uuid,
        pastor_id: Uuid,
        status: AppointmentStatus,
        response_message: Option<&str>,
    ) -> RepositoryResult<Option<AppointmentRequest>> {
        // Status check and update in one statement: only one responder can match
        let updated = sqlx::query_as::<_, AppointmentRequest>(
            r#"
            UPDATE appointment_requests
            SET status = $3, response_message = $4, updated_at = NOW()
            WHERE id = $1 AND pastor_id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(pastor_id)
        .bind(status)
        .bind(response_message)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn cancel_appointment(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> RepositoryResult<Option<CancelledAppointment>> {
        let cancelled = sqlx::query_as::<_, CancelledAppointment>(
            r#"
            WITH prev AS (
                SELECT id, status FROM appointment_requests
                WHERE id = $1 AND user_id = $2 AND status <> 'completed'
                FOR UPDATE
            )
            UPDATE appointment_requests AS a
            SET status = 'cancelled', updated_at = NOW()
            FROM prev
            WHERE a.id = prev.id
            RETURNING prev.status AS previous_status, a.*
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cancelled)
    }
}
