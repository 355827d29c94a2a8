use async_graphql::{Context, ErrorExtensions, Object, Result, SimpleObject};
use chrono::{DateTime, Utc};

use crate::app_state::AppState;
use crate::db::models::location::{BloodBank, Location};
use crate::db::models::requests::{Request, RequestType, TrackQuery};
use crate::listing::filter::{filter_listings, ListingFilter, ListingPage, ALL_CATEGORIES};
use crate::listing::impact;
use crate::store::StoreError;
use crate::tracking::timeline::{Timeline, TimelineView};

#[derive(SimpleObject, Clone)]
#[graphql(rename_args = "camelCase")]
pub struct RequestGQL {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub request_type: String,
    pub type_label: String,
    pub status: String,
    pub description: Option<String>,
    pub blood_type: Option<String>,
    pub units_needed: Option<i32>,
    pub urgency: Option<String>,
    pub donor_name: Option<String>,
    pub current_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Request> for RequestGQL {
    fn from(r: &Request) -> Self {
        RequestGQL {
            id: r.id.to_string(),
            user_name: r.user_name.clone(),
            user_email: r.user_email.clone(),
            user_phone: r.user_phone.clone(),
            request_type: r.request_type.as_str().to_string(),
            type_label: r.request_type.label().to_string(),
            status: r.status.clone(),
            description: r.description.clone(),
            blood_type: r.blood_type.clone(),
            units_needed: r.units_needed,
            urgency: r.urgency.clone(),
            donor_name: r.donor_name.clone(),
            current_location: r.current_location.clone(),
            created_at: r.created_at,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct StepGQL {
    pub key: String,
    pub label: String,
    pub description: String,
    pub completed: bool,
    pub current: bool,
}

#[derive(SimpleObject, Clone)]
pub struct TimelineGQL {
    pub recognized: bool,
    pub current_index: i64,
    pub progress: f64,
    pub steps: Vec<StepGQL>,
}

impl From<Timeline> for TimelineGQL {
    fn from(t: Timeline) -> Self {
        TimelineGQL {
            recognized: t.recognized,
            current_index: t.current_index as i64,
            progress: t.progress,
            steps: t
                .steps
                .into_iter()
                .map(|s| StepGQL {
                    key: s.key,
                    label: s.label,
                    description: s.description,
                    completed: s.completed,
                    current: s.current,
                })
                .collect(),
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct TrackedRequestGQL {
    pub request: RequestGQL,
    pub timeline: TimelineGQL,
}

#[derive(SimpleObject, Clone)]
pub struct LocationGQL {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub hours: String,
    pub location_type: String,
    pub category: String,
    pub materials: Vec<String>,
    pub lat: f64,
    pub lng: f64,
}

impl From<Location> for LocationGQL {
    fn from(l: Location) -> Self {
        LocationGQL {
            id: l.id,
            name: l.name,
            address: l.address,
            phone: l.phone,
            hours: l.hours,
            location_type: l.location_type,
            category: l.category,
            materials: l.materials,
            lat: l.lat,
            lng: l.lng,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct BloodBankGQL {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub hours: String,
    pub blood_types: Vec<String>,
    pub lat: f64,
    pub lng: f64,
}

impl From<BloodBank> for BloodBankGQL {
    fn from(b: BloodBank) -> Self {
        BloodBankGQL {
            id: b.id,
            name: b.name,
            address: b.address,
            phone: b.phone,
            hours: b.hours,
            blood_types: b.blood_types,
            lat: b.lat,
            lng: b.lng,
        }
    }
}

#[derive(SimpleObject)]
#[graphql(rename_args = "camelCase")]
pub struct PaginatedLocations {
    pub total: i64,
    pub hidden: i64,
    pub items: Vec<LocationGQL>,
}

#[derive(SimpleObject)]
#[graphql(rename_args = "camelCase")]
pub struct PaginatedBloodBanks {
    pub total: i64,
    pub hidden: i64,
    pub items: Vec<BloodBankGQL>,
}

#[derive(SimpleObject)]
pub struct TypeCountGQL {
    pub location_type: String,
    pub count: i64,
}

#[derive(SimpleObject)]
pub struct ImpactGQL {
    pub collection_points: i64,
    pub waste_categories: i64,
    pub by_type: Vec<TypeCountGQL>,
}

fn store_error(message: &'static str) -> impl FnOnce(StoreError) -> async_graphql::Error {
    move |e| {
        tracing::error!(error = %e, "{message}");
        message.extend_with(|_, ext| ext.set("code", "STORE_UNAVAILABLE"))
    }
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Requests whose email or phone contains `q`, with tracking timelines.
    async fn track_requests(&self, ctx: &Context<'_>, q: String) -> Result<Vec<TrackedRequestGQL>> {
        let state = ctx.data::<AppState>()?;
        let query = TrackQuery { q: Some(q) };
        let needle = query.needle().ok_or_else(|| {
            "Enter search query".extend_with(|_, e| e.set("code", "BAD_REQUEST"))
        })?;

        let found = state
            .store
            .search_requests_by_contact(needle)
            .await
            .map_err(store_error("Failed to search requests. Please try again."))?;

        Ok(found
            .iter()
            .map(|r| TrackedRequestGQL {
                request: RequestGQL::from(r),
                timeline: TimelineView::Tracking.project(&r.status).into(),
            })
            .collect())
    }

    async fn blood_requests(&self, ctx: &Context<'_>) -> Result<Vec<RequestGQL>> {
        let state = ctx.data::<AppState>()?;
        let found = state
            .store
            .list_requests_by_type(RequestType::BloodRequest)
            .await
            .map_err(store_error("Failed to load requests. Please try again."))?;
        Ok(found.iter().map(RequestGQL::from).collect())
    }

    async fn locations(
        &self,
        ctx: &Context<'_>,
        category: Option<String>,
        q: Option<String>,
        show_all: Option<bool>,
    ) -> Result<PaginatedLocations> {
        let state = ctx.data::<AppState>()?;
        let filter = ListingFilter { category, q, show_all };

        let all = state
            .directory
            .all_locations(state.store.as_ref())
            .await
            .map_err(store_error("Failed to load locations. Please try again."))?;
        let page = ListingPage::new(filter.apply(&all), state.config.listing_page_size, filter.show_all());

        Ok(PaginatedLocations {
            total: page.total as i64,
            hidden: page.hidden as i64,
            items: page.items.into_iter().map(LocationGQL::from).collect(),
        })
    }

    async fn blood_banks(
        &self,
        ctx: &Context<'_>,
        q: Option<String>,
        show_all: Option<bool>,
    ) -> Result<PaginatedBloodBanks> {
        let state = ctx.data::<AppState>()?;
        let filter = ListingFilter { category: None, q, show_all };

        let matched = filter_listings(state.directory.blood_banks(), ALL_CATEGORIES, filter.query());
        let page = ListingPage::new(matched, state.config.listing_page_size, filter.show_all());

        Ok(PaginatedBloodBanks {
            total: page.total as i64,
            hidden: page.hidden as i64,
            items: page.items.into_iter().map(BloodBankGQL::from).collect(),
        })
    }

    async fn impact(&self, ctx: &Context<'_>) -> Result<ImpactGQL> {
        let state = ctx.data::<AppState>()?;
        let rows = state
            .store
            .list_locations()
            .await
            .map_err(store_error("Failed to load locations. Please try again."))?;
        let summary = impact::summarize(&rows);

        Ok(ImpactGQL {
            collection_points: summary.collection_points as i64,
            waste_categories: summary.waste_categories as i64,
            by_type: summary
                .by_type
                .into_iter()
                .map(|t| TypeCountGQL {
                    location_type: t.location_type,
                    count: t.count as i64,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::app_state::AppState;
    use crate::db::models::requests::{NewRequest, RequestType};
    use crate::graphql::graph_schema::create_schema;

    #[tokio::test]
    async fn track_requests_projects_timelines() {
        let state = AppState::for_tests();
        state
            .store
            .insert_request(&NewRequest {
                user_name: "Farah".to_string(),
                user_email: "farah@example.org".to_string(),
                user_phone: "+91 93333 44444".to_string(),
                request_type: RequestType::WastePickup,
                status: "in_transit".to_string(),
                description: Some("Two sacks of coconut husk".to_string()),
                blood_type: None,
                units_needed: None,
                urgency: None,
            })
            .await
            .unwrap();

        let schema = create_schema(state);
        let response = schema
            .execute(r#"{ trackRequests(q: "FARAH") { request { typeLabel } timeline { currentIndex steps { current } } } }"#)
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let data = response.data.into_json().unwrap();
        let tracked = &data["trackRequests"][0];
        assert_eq!(tracked["request"]["typeLabel"], "Waste Pickup");
        assert_eq!(tracked["timeline"]["currentIndex"], 2);
        assert_eq!(tracked["timeline"]["steps"][2]["current"], true);
    }

    #[tokio::test]
    async fn blank_search_is_an_error() {
        let schema = create_schema(AppState::for_tests());
        let response = schema.execute(r#"{ trackRequests(q: " ") { timeline { progress } } }"#).await;
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "Enter search query");
    }

    #[tokio::test]
    async fn locations_filter_by_category() {
        let schema = create_schema(AppState::for_tests());
        let response = schema
            .execute(r#"{ locations(category: "coconut") { total hidden items { name category } } }"#)
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["locations"]["total"], 2);
        assert_eq!(data["locations"]["items"][0]["category"], "coconut");
    }
}
