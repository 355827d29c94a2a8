use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult};
use crate::db::models::location::{LocationRow, NewLocation};
use crate::db::models::requests::{
    Acknowledgement, NewRequest, Request, RequestStatus, RequestType, StatusUpdate,
};

const REQUESTS: &str = "requests";
const LOCATIONS: &str = "locations";

/// Talks to a hosted PostgREST endpoint over `{base_url}/rest/v1/{table}`.
pub struct RestRecordStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestRecordStore {
    pub fn new(base_url: &str, api_key: &str) -> StoreResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn select(&self, table: &str) -> RequestBuilder {
        self.authorized(self.client.get(self.table_url(table)))
            .query(&[("select", "*")])
    }

    fn write(&self, builder: RequestBuilder) -> RequestBuilder {
        self.authorized(builder)
            .header("Prefer", "return=representation")
    }

    /// Rows that do not decode are logged and skipped.
    async fn rows<T: DeserializeOwned>(builder: RequestBuilder) -> StoreResult<Vec<T>> {
        let response = checked(builder.send().await?).await?;
        let raw = response.json::<Vec<serde_json::Value>>().await?;
        Ok(raw
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<T>(row) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable store row");
                    None
                }
            })
            .collect())
    }

    /// Writes return the affected rows; an update that matched nothing is `None`.
    async fn first_row<T: DeserializeOwned>(builder: RequestBuilder) -> StoreResult<Option<T>> {
        Ok(Self::rows::<T>(builder).await?.into_iter().next())
    }
}

async fn checked(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// PostgREST `or` filter: case-insensitive substring on email or phone.
///
/// `%` `_` `\` get the ILIKE escape, itself backslash-quoted inside the
/// double-quoted value. `*` has no literal form there, so it becomes `_`
/// and callers recheck rows with [`Request::contact_contains`].
pub(crate) fn contact_filter(needle: &str) -> String {
    let mut quoted = String::with_capacity(needle.len() + 4);
    for c in needle.chars() {
        match c {
            '%' | '_' => {
                quoted.push_str("\\\\");
                quoted.push(c);
            }
            '\\' => quoted.push_str("\\\\\\\\"),
            '"' => quoted.push_str("\\\""),
            '*' => quoted.push('_'),
            _ => quoted.push(c),
        }
    }
    format!("(user_email.ilike.\"*{quoted}*\",user_phone.ilike.\"*{quoted}*\")")
}

#[async_trait]
impl RecordStore for RestRecordStore {
    fn backend_tag(&self) -> &'static str {
        "rest"
    }

    async fn insert_request(&self, new: &NewRequest) -> StoreResult<Request> {
        let builder = self
            .write(self.client.post(self.table_url(REQUESTS)))
            .json(new);
        Self::first_row(builder).await?.ok_or(StoreError::EmptyWrite)
    }

    async fn get_request(&self, id: Uuid) -> StoreResult<Option<Request>> {
        let builder = self
            .select(REQUESTS)
            .query(&[("id", format!("eq.{id}"))]);
        Self::first_row(builder).await
    }

    async fn list_requests_by_type(&self, request_type: RequestType) -> StoreResult<Vec<Request>> {
        let builder = self.select(REQUESTS).query(&[
            ("request_type", format!("eq.{}", request_type.as_str())),
            ("order", "created_at.desc".to_string()),
        ]);
        Self::rows(builder).await
    }

    async fn search_requests_by_contact(&self, needle: &str) -> StoreResult<Vec<Request>> {
        let builder = self.select(REQUESTS).query(&[
            ("or", contact_filter(needle)),
            ("order", "created_at.desc".to_string()),
        ]);
        let needle = needle.to_lowercase();
        let mut found: Vec<Request> = Self::rows(builder).await?;
        found.retain(|r| r.contact_contains(&needle));
        Ok(found)
    }

    async fn acknowledge_request(
        &self,
        id: Uuid,
        ack: &Acknowledgement,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Request>> {
        let body = json!({
            "status": RequestStatus::Acknowledged.as_str(),
            "donor_name": ack.donor_name,
            "donor_email": ack.donor_email,
            "donor_phone": ack.donor_phone,
            "acknowledged_at": at,
            "updated_at": at,
        });
        let builder = self
            .write(self.client.patch(self.table_url(REQUESTS)))
            .query(&[("id", format!("eq.{id}"))])
            .json(&body);
        Self::first_row(builder).await
    }

    async fn update_request_status(
        &self,
        id: Uuid,
        update: &StatusUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Request>> {
        let mut body = serde_json::Map::new();
        body.insert("status".to_string(), json!(update.status.as_str()));
        body.insert("updated_at".to_string(), json!(at));
        if let Some(column) = update.status.timestamp_column() {
            body.insert(column.to_string(), json!(at));
        }
        if let Some(location) = &update.current_location {
            body.insert("current_location".to_string(), json!(location));
        }

        let builder = self
            .write(self.client.patch(self.table_url(REQUESTS)))
            .query(&[("id", format!("eq.{id}"))])
            .json(&body);
        Self::first_row(builder).await
    }

    async fn insert_location(&self, new: &NewLocation) -> StoreResult<LocationRow> {
        let builder = self
            .write(self.client.post(self.table_url(LOCATIONS)))
            .json(new);
        Self::first_row(builder).await?.ok_or(StoreError::EmptyWrite)
    }

    async fn list_locations(&self) -> StoreResult<Vec<LocationRow>> {
        let builder = self
            .select(LOCATIONS)
            .query(&[("order", "created_at.asc")]);
        Self::rows(builder).await
    }

    async fn ping(&self) -> StoreResult<()> {
        let builder = self
            .select(LOCATIONS)
            .query(&[("limit", "1")]);
        checked(builder.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, Method, StatusCode, Uri};
    use axum::routing::any;
    use axum::{Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    /// One call as the hosted store saw it.
    #[derive(Debug, Clone)]
    struct Seen {
        method: Method,
        path: String,
        query: Vec<(String, String)>,
        headers: HeaderMap,
        body: Value,
    }

    impl Seen {
        fn param(&self, key: &str) -> Option<&str> {
            self.query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }

        fn header(&self, key: &str) -> Option<&str> {
            self.headers.get(key).and_then(|v| v.to_str().ok())
        }
    }

    #[derive(Clone)]
    struct Stub {
        reply: Arc<(StatusCode, Value)>,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    async fn record(
        State(stub): State<Stub>,
        method: Method,
        uri: Uri,
        Query(query): Query<Vec<(String, String)>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, Json<Value>) {
        stub.seen.lock().unwrap().push(Seen {
            method,
            path: uri.path().to_string(),
            query,
            headers,
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        });
        (stub.reply.0, Json(stub.reply.1.clone()))
    }

    /// Serves `reply` for every call on an ephemeral port.
    async fn hosted_store(status: StatusCode, reply: Value) -> (RestRecordStore, Arc<Mutex<Vec<Seen>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let stub = Stub {
            reply: Arc::new((status, reply)),
            seen: seen.clone(),
        };
        let app = Router::new()
            .route("/rest/v1/{table}", any(record))
            .with_state(stub);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let store = RestRecordStore::new(&format!("http://{addr}/"), "anon-key").unwrap();
        (store, seen)
    }

    fn row(id: Uuid, email: &str, request_type: &str) -> Value {
        json!({
            "id": id,
            "user_name": "Meera Iyer",
            "user_email": email,
            "user_phone": "+91 98400 12345",
            "request_type": request_type,
            "status": "pending",
            "description": null,
            "blood_type": "O-",
            "units_needed": 2,
            "urgency": "Critical",
            "donor_name": null,
            "donor_email": null,
            "donor_phone": null,
            "acknowledged_at": null,
            "pickup_at": null,
            "in_transit_at": null,
            "delivered_at": null,
            "current_location": null,
            "created_at": "2025-03-01T10:00:00Z",
            "updated_at": "2025-03-01T10:00:00Z"
        })
    }

    fn new_blood_request() -> NewRequest {
        NewRequest {
            user_name: "Meera Iyer".to_string(),
            user_email: "meera@example.org".to_string(),
            user_phone: "+91 98400 12345".to_string(),
            request_type: RequestType::BloodRequest,
            status: RequestStatus::Pending.as_str().to_string(),
            description: None,
            blood_type: Some("O-".to_string()),
            units_needed: Some(2),
            urgency: Some("Critical".to_string()),
        }
    }

    #[test]
    fn contact_filter_quotes_the_needle() {
        assert_eq!(
            contact_filter("98400"),
            "(user_email.ilike.\"*98400*\",user_phone.ilike.\"*98400*\")"
        );
        assert_eq!(
            contact_filter("a\"b"),
            "(user_email.ilike.\"*a\\\"b*\",user_phone.ilike.\"*a\\\"b*\")"
        );
    }

    #[test]
    fn contact_filter_takes_wildcards_literally() {
        assert_eq!(
            contact_filter("50%_off"),
            "(user_email.ilike.\"*50\\\\%\\\\_off*\",user_phone.ilike.\"*50\\\\%\\\\_off*\")"
        );
        assert_eq!(
            contact_filter("a*b"),
            "(user_email.ilike.\"*a_b*\",user_phone.ilike.\"*a_b*\")"
        );
        assert_eq!(
            contact_filter("x\\y"),
            "(user_email.ilike.\"*x\\\\\\\\y*\",user_phone.ilike.\"*x\\\\\\\\y*\")"
        );
    }

    #[test]
    fn table_urls_drop_trailing_slash() {
        let store = RestRecordStore::new("https://store.example.org/", "key").unwrap();
        assert_eq!(
            store.table_url(REQUESTS),
            "https://store.example.org/rest/v1/requests"
        );
    }

    #[tokio::test]
    async fn insert_sends_key_and_asks_for_the_row() {
        let id = Uuid::new_v4();
        let (store, seen) =
            hosted_store(StatusCode::CREATED, json!([row(id, "meera@example.org", "blood_request")])).await;

        let created = store.insert_request(&new_blood_request()).await.unwrap();
        assert_eq!(created.id, id);
        assert_eq!(created.request_type, RequestType::BloodRequest);

        let calls = seen.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.method, Method::POST);
        assert_eq!(call.path, "/rest/v1/requests");
        assert_eq!(call.header("apikey"), Some("anon-key"));
        assert_eq!(call.header("authorization"), Some("Bearer anon-key"));
        assert_eq!(call.header("prefer"), Some("return=representation"));
        assert_eq!(call.body["request_type"], "blood_request");
        assert_eq!(call.body["status"], "pending");
    }

    #[tokio::test]
    async fn insert_without_a_row_is_an_empty_write() {
        let (store, _) = hosted_store(StatusCode::CREATED, json!([])).await;
        let result = store.insert_request(&new_blood_request()).await;
        assert!(matches!(result, Err(StoreError::EmptyWrite)));
    }

    #[tokio::test]
    async fn status_patch_matching_nothing_is_none() {
        let (store, seen) = hosted_store(StatusCode::OK, json!([])).await;
        let id = Uuid::new_v4();
        let update = StatusUpdate {
            status: RequestStatus::InTransit,
            current_location: Some("Guindy depot".to_string()),
        };

        let updated = tokio_test::assert_ok!(store.update_request_status(id, &update, Utc::now()).await);
        assert!(updated.is_none());

        let calls = seen.lock().unwrap().clone();
        let call = &calls[0];
        assert_eq!(call.method, Method::PATCH);
        assert_eq!(call.param("id"), Some(format!("eq.{id}").as_str()));
        assert_eq!(call.header("prefer"), Some("return=representation"));
        assert_eq!(call.body["status"], "in_transit");
        assert!(call.body.get("in_transit_at").is_some());
        assert!(call.body.get("pickup_at").is_none());
        assert_eq!(call.body["current_location"], "Guindy depot");
    }

    #[tokio::test]
    async fn get_filters_by_id() {
        let id = Uuid::new_v4();
        let (store, seen) =
            hosted_store(StatusCode::OK, json!([row(id, "meera@example.org", "waste_pickup")])).await;

        let found = store.get_request(id).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(id));

        let calls = seen.lock().unwrap().clone();
        assert_eq!(calls[0].method, Method::GET);
        assert_eq!(calls[0].param("id"), Some(format!("eq.{id}").as_str()));
        assert_eq!(calls[0].param("select"), Some("*"));
    }

    #[tokio::test]
    async fn contact_search_matches_literally() {
        let wanted = Uuid::new_v4();
        let (store, seen) = hosted_store(
            StatusCode::OK,
            json!([
                row(wanted, "deal-50%_off@example.org", "blood_request"),
                row(Uuid::new_v4(), "5000off@example.org", "blood_request"),
            ]),
        )
        .await;

        let found = store.search_requests_by_contact("50%_OFF").await.unwrap();
        assert_eq!(found.iter().map(|r| r.id).collect::<Vec<_>>(), vec![wanted]);

        let calls = seen.lock().unwrap().clone();
        assert_eq!(calls[0].param("or"), Some(contact_filter("50%_OFF").as_str()));
        assert_eq!(calls[0].param("order"), Some("created_at.desc"));
    }

    #[tokio::test]
    async fn undecodable_rows_are_skipped() {
        let good = Uuid::new_v4();
        let (store, _) = hosted_store(
            StatusCode::OK,
            json!([
                row(good, "meera@example.org", "blood_request"),
                row(Uuid::new_v4(), "meera@example.org", "furniture_pickup"),
            ]),
        )
        .await;

        let found = store.search_requests_by_contact("meera").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, good);
    }

    #[tokio::test]
    async fn rejected_calls_keep_status_and_body() {
        let (store, _) =
            hosted_store(StatusCode::UNAUTHORIZED, json!({ "message": "Invalid API key" })).await;

        match store.list_requests_by_type(RequestType::BloodRequest).await {
            Err(StoreError::Rejected { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
        assert!(store.ping().await.is_err());
    }
}
