//! Record store contract for the `requests` and `locations` tables.
//!
//! Writes are single statements with no optimistic-concurrency checks: two
//! acknowledgers racing on the same row both succeed and the later write
//! wins.

pub mod memory;
pub mod postgres;
pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::StoreBackend;
use crate::db::models::location::{LocationRow, NewLocation};
use crate::db::models::requests::{
    Acknowledgement, NewRequest, Request, RequestType, StatusUpdate,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Record store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Record store rejected the call ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Record store returned no row for a write")]
    EmptyWrite,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn insert_request(&self, new: &NewRequest) -> StoreResult<Request>;

    async fn get_request(&self, id: Uuid) -> StoreResult<Option<Request>>;

    /// Exact match on `request_type`, newest first.
    async fn list_requests_by_type(&self, request_type: RequestType) -> StoreResult<Vec<Request>>;

    /// Case-insensitive substring match on email OR phone, newest first.
    async fn search_requests_by_contact(&self, needle: &str) -> StoreResult<Vec<Request>>;

    /// Unconditional: sets `acknowledged`, the donor fields and
    /// `acknowledged_at` whatever the current status is.
    async fn acknowledge_request(
        &self,
        id: Uuid,
        ack: &Acknowledgement,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Request>>;

    async fn update_request_status(
        &self,
        id: Uuid,
        update: &StatusUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Request>>;

    async fn insert_location(&self, new: &NewLocation) -> StoreResult<LocationRow>;

    /// Full scan, oldest first.
    async fn list_locations(&self) -> StoreResult<Vec<LocationRow>>;

    async fn ping(&self) -> StoreResult<()>;

    async fn close(&self) {}
}

/// Open the configured backend.
pub async fn connect(backend: &StoreBackend) -> StoreResult<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match backend {
        StoreBackend::Postgres { database_url } => {
            Arc::new(postgres::PgRecordStore::connect(database_url).await?)
        }
        StoreBackend::Rest { base_url, api_key } => {
            Arc::new(rest::RestRecordStore::new(base_url, api_key)?)
        }
        StoreBackend::Memory => Arc::new(memory::MemoryRecordStore::default()),
    };
    tracing::info!(backend = store.backend_tag(), "record store ready");
    Ok(store)
}
