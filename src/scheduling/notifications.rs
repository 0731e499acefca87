//! Best-effort notifications for appointment lifecycle events
//!
//! The dispatcher never reports failure to its caller: a booking that was
//! stored stays stored whether or not the counterpart could be told.

use crate::models::{AppointmentRequest, AppointmentStatus, NewNotification, NotificationType};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Destination that records or forwards a notification
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &NewNotification) -> Result<(), NotificationError>;
}

/// Writes notifications to the portal's `notifications` table
pub struct PgNotificationSink {
    pool: PgPool,
}

impl PgNotificationSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn deliver(&self, notification: &NewNotification) -> Result<(), NotificationError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, title, message, type, is_read)
            VALUES ($1, $2, $3, $4, false)
            "#,
        )
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.notification_type)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    /// Deliver a notification, logging and discarding any failure
    pub async fn enqueue(&self, notification: NewNotification) {
        match tokio::time::timeout(self.timeout, self.sink.deliver(&notification)).await {
            Ok(Ok(())) => {
                tracing::debug!(
                    "Notification '{}' queued for user {}",
                    notification.title,
                    notification.user_id
                );
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    "Failed to queue notification '{}' for user {}: {}",
                    notification.title,
                    notification.user_id,
                    e
                );
            }
            Err(_) => {
                tracing::warn!(
                    "Notification '{}' for user {} timed out after {:?}",
                    notification.title,
                    notification.user_id,
                    self.timeout
                );
            }
        }
    }
}

// =============================================================================
// Message templates
// =============================================================================

fn date_of(appointment: &AppointmentRequest) -> String {
    appointment.appointment_date.format("%d/%m/%Y").to_string()
}

fn time_of(appointment: &AppointmentRequest) -> String {
    appointment.start_time.format("%H:%M").to_string()
}

fn appointment_notification(user_id: uuid::Uuid, title: &str, message: String) -> NewNotification {
    NewNotification {
        user_id,
        title: title.to_string(),
        message,
        notification_type: NotificationType::Appointment,
    }
}

/// Tell the pastor a new request is waiting
pub fn new_request(appointment: &AppointmentRequest) -> NewNotification {
    appointment_notification(
        appointment.pastor_id,
        "Nouvelle demande de rendez-vous",
        format!(
            "Vous avez reçu une demande de rendez-vous pour le {} à {}. Motif : {}",
            date_of(appointment),
            time_of(appointment),
            appointment.reason
        ),
    )
}

/// Tell the requester how the pastor answered
pub fn response(appointment: &AppointmentRequest) -> NewNotification {
    let note = appointment
        .response_message
        .as_deref()
        .filter(|m| !m.is_empty());

    match appointment.status {
        AppointmentStatus::Cancelled => {
            let mut message = format!(
                "Votre demande de rendez-vous du {} a été refusée.",
                date_of(appointment)
            );
            if let Some(reason) = note {
                message.push_str(&format!(" Raison : {}", reason));
            }
            appointment_notification(appointment.user_id, "Rendez-vous annulé", message)
        }
        _ => {
            let mut message = format!(
                "Votre rendez-vous du {} à {} a été confirmé.",
                date_of(appointment),
                time_of(appointment)
            );
            if let Some(text) = note {
                message.push_str(&format!(" Message du pasteur : {}", text));
            }
            appointment_notification(appointment.user_id, "Rendez-vous confirmé", message)
        }
    }
}

/// Tell the pastor the requester withdrew
pub fn cancelled_by_requester(appointment: &AppointmentRequest) -> NewNotification {
    appointment_notification(
        appointment.pastor_id,
        "Rendez-vous annulé",
        format!(
            "Le rendez-vous du {} à {} a été annulé par le demandeur.",
            date_of(appointment),
            time_of(appointment)
        ),
    )
}
