use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RecordStore, StoreResult};
use crate::db::models::location::{LocationRow, NewLocation};
use crate::db::models::requests::{
    Acknowledgement, NewRequest, Request, RequestStatus, RequestType, StatusUpdate,
};

/// Process-local store used by tests and `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryRecordStore {
    requests: RwLock<Vec<Request>>,
    locations: RwLock<Vec<LocationRow>>,
}

fn newest_first(mut found: Vec<Request>) -> Vec<Request> {
    // Insertion order breaks created_at ties, later rows first.
    found.reverse();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    found
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert_request(&self, new: &NewRequest) -> StoreResult<Request> {
        let now = Utc::now();
        let request = Request {
            id: Uuid::new_v4(),
            user_name: new.user_name.clone(),
            user_email: new.user_email.clone(),
            user_phone: new.user_phone.clone(),
            request_type: new.request_type,
            status: new.status.clone(),
            description: new.description.clone(),
            blood_type: new.blood_type.clone(),
            units_needed: new.units_needed,
            urgency: new.urgency.clone(),
            donor_name: None,
            donor_email: None,
            donor_phone: None,
            acknowledged_at: None,
            pickup_at: None,
            in_transit_at: None,
            delivered_at: None,
            current_location: None,
            created_at: now,
            updated_at: now,
        };
        self.requests.write().await.push(request.clone());
        Ok(request)
    }

    async fn get_request(&self, id: Uuid) -> StoreResult<Option<Request>> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests_by_type(&self, request_type: RequestType) -> StoreResult<Vec<Request>> {
        let requests = self.requests.read().await;
        let found = requests
            .iter()
            .filter(|r| r.request_type == request_type)
            .cloned()
            .collect();
        Ok(newest_first(found))
    }

    async fn search_requests_by_contact(&self, needle: &str) -> StoreResult<Vec<Request>> {
        let needle = needle.to_lowercase();
        let requests = self.requests.read().await;
        let found = requests
            .iter()
            .filter(|r| r.contact_contains(&needle))
            .cloned()
            .collect();
        Ok(newest_first(found))
    }

    async fn acknowledge_request(
        &self,
        id: Uuid,
        ack: &Acknowledgement,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Request>> {
        let mut requests = self.requests.write().await;
        let Some(request) = requests.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        request.status = RequestStatus::Acknowledged.as_str().to_string();
        request.donor_name = Some(ack.donor_name.clone());
        request.donor_email = Some(ack.donor_email.clone());
        request.donor_phone = Some(ack.donor_phone.clone());
        request.acknowledged_at = Some(at);
        request.updated_at = at;
        Ok(Some(request.clone()))
    }

    async fn update_request_status(
        &self,
        id: Uuid,
        update: &StatusUpdate,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Request>> {
        let mut requests = self.requests.write().await;
        let Some(request) = requests.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        request.status = update.status.as_str().to_string();
        request.updated_at = at;
        match update.status {
            RequestStatus::Pending => {}
            RequestStatus::Acknowledged => request.acknowledged_at = Some(at),
            RequestStatus::Pickup => request.pickup_at = Some(at),
            RequestStatus::InTransit => request.in_transit_at = Some(at),
            RequestStatus::Delivered => request.delivered_at = Some(at),
        }
        if let Some(location) = &update.current_location {
            request.current_location = Some(location.clone());
        }
        Ok(Some(request.clone()))
    }

    async fn insert_location(&self, new: &NewLocation) -> StoreResult<LocationRow> {
        let row = LocationRow {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            address: new.address.clone(),
            phone: new.phone.clone(),
            email: new.email.clone(),
            hours: new.hours.clone(),
            location_type: new.location_type.clone(),
            materials: Some(new.materials.clone()),
            lat: new.lat,
            lng: new.lng,
            description: new.description.clone(),
            contact_person: new.contact_person.clone(),
            pickup_schedule: Some(Json(new.pickup_schedule.clone())),
            created_at: Utc::now(),
        };
        self.locations.write().await.push(row.clone());
        Ok(row)
    }

    async fn list_locations(&self) -> StoreResult<Vec<LocationRow>> {
        Ok(self.locations.read().await.clone())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
