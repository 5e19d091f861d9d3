//! SQLite persistence for participants and interviews.
//!
//! Provides the `r2d2` connection pool, the embedded migrations and plain
//! query functions over `&Connection`. Callers run them on a blocking thread
//! with a pooled connection.

mod error;
mod interviews;
mod migrations;
mod participants;
mod pool;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use error::StoreError;
pub use interviews::{
    append_turn, create_interview, get_report, list_interviews, load_interview, save_report,
    sync_transcript, update_progress, InterviewRecord, StoredInterview, StoredReport,
};
pub use migrations::{run_migrations, MigrationError};
pub use participants::{create_participant, get_participant, StoredParticipant};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};

pub(crate) fn parse_uuid(table: &'static str, value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::corrupt(table, format!("bad id {value:?}: {e}")))
}

pub(crate) fn parse_time(table: &'static str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(table, format!("bad timestamp {value:?}: {e}")))
}
