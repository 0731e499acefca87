//! HTTP request handlers

pub mod appointments;
pub mod availability;
pub mod middleware;

pub use appointments::*;
pub use availability::*;

use crate::scheduling::SchedulingService;
use sqlx::PgPool;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub service: SchedulingService,
    pub is_production: bool,
    /// Cookie carrying the portal session token
    pub session_cookie: String,
}
