//! Persistence layer

mod pool;
mod postgres;
pub(crate) mod repository;

pub use pool::{create_pool, run_migrations};
pub use postgres::PgRepository;
pub use repository::{RepositoryError, SchedulingRepository};
