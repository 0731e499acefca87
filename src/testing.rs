//! In-memory doubles for tests
//!
//! `InMemoryRepository` honours the same atomicity contract as the Postgres
//! repository: every conditional mutation happens under one lock.

use crate::db::repository::RepositoryResult;
use crate::db::{RepositoryError, SchedulingRepository};
use crate::models::*;
use crate::scheduling::calendar::slots_overlap;
use crate::scheduling::notifications::{NotificationError, NotificationSink};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// Booking for 2025-11-10 14:00-15:00, reason "conseil"
pub fn booking_fixture(pastor_id: Uuid) -> ValidBooking {
    ValidBooking {
        pastor_id,
        appointment_date: NaiveDate::from_ymd_opt(2025, 11, 10).unwrap(),
        start_time: Utc.with_ymd_and_hms(2025, 11, 10, 14, 0, 0).unwrap(),
        end_time: Utc.with_ymd_and_hms(2025, 11, 10, 15, 0, 0).unwrap(),
        reason: "conseil".to_string(),
    }
}

pub fn appointment_fixture(user_id: Uuid, pastor_id: Uuid) -> AppointmentRequest {
    let booking = booking_fixture(pastor_id);
    let now = Utc::now();
    AppointmentRequest {
        id: Uuid::new_v4(),
        user_id,
        pastor_id,
        appointment_date: booking.appointment_date,
        start_time: booking.start_time,
        end_time: booking.end_time,
        reason: booking.reason,
        status: AppointmentStatus::Pending,
        response_message: None,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Default)]
struct Store {
    persons: HashMap<Uuid, Person>,
    slots: Vec<AvailabilitySlot>,
    periods: Vec<UnavailabilityPeriod>,
    appointments: Vec<AppointmentRequest>,
}

#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
    unavailable: AtomicBool,
    hide_slots: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_person(&self, display_name: &str, role: PersonRole) -> Uuid {
        self.add_person_with_status(display_name, role, PersonStatus::Active)
    }

    pub fn add_person_with_status(
        &self,
        display_name: &str,
        role: PersonRole,
        status: PersonStatus,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.store.lock().unwrap().persons.insert(
            id,
            Person {
                id,
                display_name: display_name.to_string(),
                role,
                status,
            },
        );
        id
    }

    pub fn appointment(&self, id: Uuid) -> Option<AppointmentRequest> {
        let store = self.store.lock().unwrap();
        store.appointments.iter().find(|a| a.id == id).cloned()
    }

    /// Stand-in for the external process that marks meetings completed
    pub fn force_status(&self, id: Uuid, status: AppointmentStatus) {
        let mut store = self.store.lock().unwrap();
        if let Some(a) = store.appointments.iter_mut().find(|a| a.id == id) {
            a.status = status;
        }
    }

    /// Make every call fail as if the database were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make slot reads return nothing, so only the insert-time guard can catch overlaps
    pub fn hide_slots_from_reads(&self, hide: bool) {
        self.hide_slots.store(hide, Ordering::SeqCst);
    }

    fn check(&self) -> RepositoryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SchedulingRepository for InMemoryRepository {
    async fn find_person(&self, id: Uuid) -> RepositoryResult<Option<Person>> {
        self.check()?;
        Ok(self.store.lock().unwrap().persons.get(&id).cloned())
    }

    async fn list_pastors(&self) -> RepositoryResult<Vec<Person>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let mut pastors: Vec<Person> = store
            .persons
            .values()
            .filter(|p| p.role.is_pastoral() && p.status == PersonStatus::Active)
            .cloned()
            .collect();
        pastors.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(pastors)
    }

    async fn list_slots(&self, pastor_id: Uuid) -> RepositoryResult<Vec<AvailabilitySlot>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let mut slots: Vec<AvailabilitySlot> = store
            .slots
            .iter()
            .filter(|s| s.pastor_id == pastor_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.day_of_week, s.start_time));
        Ok(slots)
    }

    async fn list_slots_for_day(
        &self,
        pastor_id: Uuid,
        day_of_week: i16,
    ) -> RepositoryResult<Vec<AvailabilitySlot>> {
        if self.hide_slots.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        let slots = self.list_slots(pastor_id).await?;
        Ok(slots
            .into_iter()
            .filter(|s| s.day_of_week == day_of_week)
            .collect())
    }

    async fn insert_slot(&self, slot: &NewAvailabilitySlot) -> RepositoryResult<AvailabilitySlot> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let clash = store.slots.iter().any(|s| {
            s.pastor_id == slot.pastor_id
                && s.day_of_week == slot.day_of_week
                && slots_overlap(s.start_time, s.end_time, slot.start_time, slot.end_time)
        });
        if clash {
            return Err(RepositoryError::Conflict);
        }

        let created = AvailabilitySlot {
            id: Uuid::new_v4(),
            pastor_id: slot.pastor_id,
            day_of_week: slot.day_of_week,
            start_time: slot.start_time,
            end_time: slot.end_time,
            is_available: slot.is_available,
            created_at: Utc::now(),
        };
        store.slots.push(created.clone());
        Ok(created)
    }

    async fn delete_slot(&self, id: Uuid, pastor_id: Uuid) -> RepositoryResult<bool> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let before = store.slots.len();
        store
            .slots
            .retain(|s| !(s.id == id && s.pastor_id == pastor_id));
        Ok(store.slots.len() < before)
    }

    async fn list_periods(&self, pastor_id: Uuid) -> RepositoryResult<Vec<UnavailabilityPeriod>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let mut periods: Vec<UnavailabilityPeriod> = store
            .periods
            .iter()
            .filter(|p| p.pastor_id == pastor_id)
            .cloned()
            .collect();
        periods.sort_by_key(|p| p.start_date);
        Ok(periods)
    }

    async fn insert_period(
        &self,
        period: &NewUnavailabilityPeriod,
    ) -> RepositoryResult<UnavailabilityPeriod> {
        self.check()?;
        let created = UnavailabilityPeriod {
            id: Uuid::new_v4(),
            pastor_id: period.pastor_id,
            start_date: period.start_date,
            end_date: period.end_date,
            reason: period.reason.clone(),
            created_at: Utc::now(),
        };
        self.store.lock().unwrap().periods.push(created.clone());
        Ok(created)
    }

    async fn delete_period(&self, id: Uuid, pastor_id: Uuid) -> RepositoryResult<bool> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let before = store.periods.len();
        store
            .periods
            .retain(|p| !(p.id == id && p.pastor_id == pastor_id));
        Ok(store.periods.len() < before)
    }

    async fn insert_appointment(
        &self,
        user_id: Uuid,
        booking: &ValidBooking,
    ) -> RepositoryResult<AppointmentRequest> {
        self.check()?;
        let now = Utc::now();
        let created = AppointmentRequest {
            id: Uuid::new_v4(),
            user_id,
            pastor_id: booking.pastor_id,
            appointment_date: booking.appointment_date,
            start_time: booking.start_time,
            end_time: booking.end_time,
            reason: booking.reason.clone(),
            status: AppointmentStatus::Pending,
            response_message: None,
            created_at: now,
            updated_at: now,
        };
        self.store.lock().unwrap().appointments.push(created.clone());
        Ok(created)
    }

    async fn list_appointments_for_user(
        &self,
        user_id: Uuid,
    ) -> RepositoryResult<Vec<AppointmentRequest>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let mut appointments: Vec<AppointmentRequest> = store
            .appointments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        appointments.sort_by(|a, b| {
            (b.appointment_date, b.start_time).cmp(&(a.appointment_date, a.start_time))
        });
        Ok(appointments)
    }

    async fn list_appointments_for_pastor(
        &self,
        pastor_id: Uuid,
    ) -> RepositoryResult<Vec<AppointmentRequest>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let mut appointments: Vec<AppointmentRequest> = store
            .appointments
            .iter()
            .filter(|a| a.pastor_id == pastor_id)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| (a.appointment_date, a.start_time));
        Ok(appointments)
    }

    async fn respond_appointment(
        &self,
        id: Uuid,
        pastor_id: Uuid,
        status: AppointmentStatus,
        response_message: Option<&str>,
    ) -> RepositoryResult<Option<AppointmentRequest>> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let Some(appointment) = store.appointments.iter_mut().find(|a| {
            a.id == id && a.pastor_id == pastor_id && a.status == AppointmentStatus::Pending
        }) else {
            return Ok(None);
        };

        appointment.status = status;
        appointment.response_message = response_message.map(str::to_string);
        appointment.updated_at = Utc::now();
        Ok(Some(appointment.clone()))
    }

    async fn cancel_appointment(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> RepositoryResult<Option<CancelledAppointment>> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let Some(appointment) = store.appointments.iter_mut().find(|a| {
            a.id == id && a.user_id == user_id && a.status != AppointmentStatus::Completed
        }) else {
            return Ok(None);
        };

        let previous_status = appointment.status;
        appointment.status = AppointmentStatus::Cancelled;
        appointment.updated_at = Utc::now();
        Ok(Some(CancelledAppointment {
            previous_status,
            appointment: appointment.clone(),
        }))
    }
}

// =============================================================================
// Notification sinks
// =============================================================================

#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<NewNotification>>,
}

impl RecordingSink {
    pub fn notifications(&self) -> Vec<NewNotification> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<Uuid> {
        self.notifications().iter().map(|n| n.user_id).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, notification: &NewNotification) -> Result<(), NotificationError> {
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Sink whose every delivery fails
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn deliver(&self, _notification: &NewNotification) -> Result<(), NotificationError> {
        Err(NotificationError::Database(sqlx::Error::PoolClosed))
    }
}

/// Sink that never completes
pub struct HangingSink;

#[async_trait]
impl NotificationSink for HangingSink {
    async fn deliver(&self, _notification: &NewNotification) -> Result<(), NotificationError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}
