use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{RecordStore, StoreResult};
use crate::db::models::location::{LocationRow, NewLocation};
use crate::db::models::requests::{
    Acknowledgement, NewRequest, Request, RequestStatus, RequestType, StatusUpdate,
};
use crate::db::pool::get_db_pool;

const REQUEST_COLUMNS: &str = "id, user_name, user_email, user_phone, request_type, status, \
    description, blood_type, units_needed, urgency, donor_name, donor_email, donor_phone, \
    acknowledged_at, pickup_at, in_transit_at, delivered_at, current_location, created_at, updated_at";

const LOCATION_COLUMNS: &str = "id, name, address, phone, email, hours, type, materials, lat, lng, \
    description, contact_person, pickup_schedule, created_at";

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = get_db_pool(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

/// `%needle%` with LIKE wildcards in the needle taken literally.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl RecordStore for PgRecordStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn insert_request(&self, new: &NewRequest) -> StoreResult<Request> {
        let sql = format!(
            "INSERT INTO requests (user_name, user_email, user_phone, request_type, status, \
             description, blood_type, units_needed, urgency) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {REQUEST_COLUMNS}"
        );
        let request = sqlx::query_as::<_, Request>(&sql)
            .bind(&new.user_name)
            .bind(&new.user_email)
            .bind(&new.user_phone)
            .bind(new.request_type)
            .bind(&new.status)
            .bind(&new.description)
            .bind(&new.blood_type)
            .bind(new.units_needed)
            .bind(&new.urgency)
            .fetch_one(&self.pool)
            .await?;
        Ok(request)
    }

    async fn get_request(&self, id: Uuid) -> StoreResult<Option<Request>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1");
        Ok(sqlx::query_as::<_, Request>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_requests_by_type(&self, request_type: RequestType) -> StoreResult<Vec<Request>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE request_type = $1 ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Request>(&sql)
            .bind(request_type)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn search_requests_by_contact(&self, needle: &str) -> StoreResult<Vec<Request>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM requests \
             WHERE user_email ILIKE $1 OR user_phone ILIKE $1 \
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Request>(&sql)
            .bind(like_pattern(needle))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn acknowledge_request(
        &self,
        id: Uuid,
        ack: &Acknowledgement,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Request>> {
        let sql = format!(
            "UPDATE requests \
             SET status = $1, donor_name = $2, donor_email = $3, donor_phone = $4, \
                 acknowledged_at = $5, updated_at = $5 \
             WHERE id = $6 RETURNING {REQUEST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Request>(&sql)
            .bind(RequestStatus::Acknowledged.as_str())
            .bind(&ack.donor_name)
            .bind(&ack.donor_email)
            .bind(&ack.donor_phone)
            .bind(at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_request_status(
        &self,
        id: Uuid,
        update: &StatusUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Request>> {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE requests SET status = ");
        query_builder.push_bind(update.status.as_str());
        query_builder.push(", updated_at = ").push_bind(at);

        if let Some(column) = update.status.timestamp_column() {
            query_builder.push(format!(", {column} = ")).push_bind(at);
        }
        if let Some(location) = &update.current_location {
            query_builder.push(", current_location = ").push_bind(location.clone());
        }

        query_builder.push(" WHERE id = ").push_bind(id);
        query_builder.push(format!(" RETURNING {REQUEST_COLUMNS}"));

        Ok(query_builder
            .build_query_as::<Request>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_location(&self, new: &NewLocation) -> StoreResult<LocationRow> {
        let sql = format!(
            "INSERT INTO locations (name, address, phone, email, hours, type, materials, lat, lng, \
             description, contact_person, pickup_schedule) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {LOCATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, LocationRow>(&sql)
            .bind(&new.name)
            .bind(&new.address)
            .bind(&new.phone)
            .bind(&new.email)
            .bind(&new.hours)
            .bind(&new.location_type)
            .bind(&new.materials)
            .bind(new.lat)
            .bind(new.lng)
            .bind(&new.description)
            .bind(&new.contact_person)
            .bind(Json(&new.pickup_schedule))
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_locations(&self) -> StoreResult<Vec<LocationRow>> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM locations ORDER BY created_at");
        Ok(sqlx::query_as::<_, LocationRow>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        tracing::info!("closing database pool");
        self.pool.close().await;
    }
}
