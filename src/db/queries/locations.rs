use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::app_state::AppState;
use crate::db::models::location::{
    BloodBank, CategoryInfo, JoinNetworkForm, Location, LocationCategory, PickupSlot,
};
use crate::listing::filter::{filter_listings, ListingFilter, ListingPage, ALL_CATEGORIES};
use crate::listing::impact::{self, ImpactSummary, TypeCount};
use crate::listing::map::MapEmbed;
use crate::utils::api_response::ApiResponse;

const LOAD_FAILED: &str = "Failed to load locations. Please try again.";
const JOIN_FAILED: &str = "Failed to submit request. Please try again.";

#[derive(OpenApi)]
#[openapi(
    paths(
        list_locations,
        list_categories,
        get_location,
        join_network,
        list_blood_banks,
        impact_summary,
    ),
    components(schemas(
        Location,
        LocationListing,
        LocationDetail,
        BloodBank,
        BloodBankListing,
        CategoryInfo,
        JoinNetworkForm,
        PickupSlot,
        MapEmbed,
        ImpactSummary,
        TypeCount,
    )),
    tags((name = "Locations", description = "Collection points, blood banks and impact figures"))
)]
pub struct LocationDoc;

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationListing {
    pub category: String,
    pub query: String,
    pub items: Vec<Location>,
    pub total: usize,
    /// Matches left out of `items` until `show_all` is set.
    pub hidden: usize,
    /// Pinned on the first item, or the country overview when nothing matched.
    pub map: MapEmbed,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationDetail {
    pub location: Location,
    pub map: MapEmbed,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BloodBankListing {
    pub query: String,
    pub items: Vec<BloodBank>,
    pub total: usize,
    pub hidden: usize,
}

#[utoipa::path(
    get,
    path = "/locations",
    params(ListingFilter),
    responses(
        (status = 200, description = "Filtered collection points", body = LocationListing),
        (status = 500, description = "Failed to load locations")
    ),
    tag = "Locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(filter): Query<ListingFilter>,
) -> Result<ApiResponse<LocationListing>, ApiResponse<()>> {
    let all = state
        .directory
        .all_locations(state.store.as_ref())
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(LOAD_FAILED, &e))?;

    let matched = filter.apply(&all);
    let page = ListingPage::new(matched, state.config.listing_page_size, filter.show_all());
    let map = match page.items.first() {
        Some(first) => MapEmbed::pin(first.lat, first.lng, state.map_token()),
        None => MapEmbed::overview(state.map_token()),
    };

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Locations retrieved",
        LocationListing {
            category: filter.active_category().to_string(),
            query: filter.query().to_string(),
            items: page.items,
            total: page.total,
            hidden: page.hidden,
            map,
        },
    ))
}

/// Category tabs, `all` first.
#[utoipa::path(
    get,
    path = "/locations/categories",
    responses((status = 200, description = "Category tabs", body = [CategoryInfo])),
    tag = "Locations"
)]
pub async fn list_categories() -> ApiResponse<Vec<CategoryInfo>> {
    let mut categories = vec![CategoryInfo {
        id: ALL_CATEGORIES.to_string(),
        name: "All Locations".to_string(),
    }];
    categories.extend(LocationCategory::ALL.iter().map(|c| CategoryInfo {
        id: c.tag().to_string(),
        name: c.display_name().to_string(),
    }));
    ApiResponse::success(StatusCode::OK, "Categories retrieved", categories)
}

#[utoipa::path(
    get,
    path = "/locations/{id}",
    params(("id" = String, Path, description = "Static id or store UUID")),
    responses(
        (status = 200, description = "Location with a map pin", body = LocationDetail),
        (status = 404, description = "Location not found"),
        (status = 500, description = "Failed to load locations")
    ),
    tag = "Locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<LocationDetail>, ApiResponse<()>> {
    let location = state
        .directory
        .find(state.store.as_ref(), &id)
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(LOAD_FAILED, &e))?
        .ok_or_else(|| ApiResponse::<()>::not_found("Location not found"))?;

    let map = MapEmbed::pin(location.lat, location.lng, state.map_token());
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Location retrieved",
        LocationDetail { location, map },
    ))
}

/// "Join the network": registers a new collection point.
#[utoipa::path(
    post,
    path = "/locations",
    request_body = JoinNetworkForm,
    responses(
        (status = 201, description = "Location registered", body = Location),
        (status = 400, description = "Missing Information"),
        (status = 500, description = "Failed to submit request")
    ),
    tag = "Locations"
)]
pub async fn join_network(
    State(state): State<AppState>,
    payload: Result<Json<JoinNetworkForm>, JsonRejection>,
) -> Result<ApiResponse<Location>, ApiResponse<()>> {
    let Json(form) = payload?;
    let new = form.into_new_location()?;

    let row = state
        .store
        .insert_location(&new)
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(JOIN_FAILED, &e))?;
    state.directory.invalidate();

    tracing::info!(id = %row.id, location_type = %row.location_type, "location registered");
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Location registered",
        Location::from(row),
    ))
}

#[utoipa::path(
    get,
    path = "/blood-banks",
    params(ListingFilter),
    responses((status = 200, description = "Filtered blood banks", body = BloodBankListing)),
    tag = "Locations"
)]
pub async fn list_blood_banks(
    State(state): State<AppState>,
    Query(filter): Query<ListingFilter>,
) -> ApiResponse<BloodBankListing> {
    // Blood banks share one category; only the search box applies.
    let matched = filter_listings(state.directory.blood_banks(), ALL_CATEGORIES, filter.query());
    let page = ListingPage::new(matched, state.config.listing_page_size, filter.show_all());

    ApiResponse::success(
        StatusCode::OK,
        "Blood banks retrieved",
        BloodBankListing {
            query: filter.query().to_string(),
            items: page.items,
            total: page.total,
            hidden: page.hidden,
        },
    )
}

#[utoipa::path(
    get,
    path = "/impact",
    responses(
        (status = 200, description = "Registered collection points by type", body = ImpactSummary),
        (status = 500, description = "Failed to load locations")
    ),
    tag = "Locations"
)]
pub async fn impact_summary(
    State(state): State<AppState>,
) -> Result<ApiResponse<ImpactSummary>, ApiResponse<()>> {
    let rows = state
        .store
        .list_locations()
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(LOAD_FAILED, &e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Impact retrieved",
        impact::summarize(&rows),
    ))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::api::locations::location_routes;
    use crate::app_state::AppState;

    fn router(state: &AppState) -> Router {
        location_routes().with_state(state.clone())
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (u16, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn join_body(name: &str, location_type: &str) -> Value {
        json!({
            "name": name,
            "address": "18 Anna Salai, Chennai, TN 600002",
            "phone": "+91 94440 33333",
            "type": location_type,
            "materials": ["Circuit Boards", "Batteries", "Batteries"],
            "lat": 13.0604,
            "lng": 80.2496
        })
    }

    #[tokio::test]
    async fn first_page_then_reveal() {
        let state = AppState::for_tests();

        let (status, body) = call(router(&state), Method::GET, "/locations", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["category"], "all");
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 6);
        assert_eq!(body["data"]["total"], 8);
        assert_eq!(body["data"]["hidden"], 2);
        assert_eq!(body["data"]["map"]["zoom"], 15);

        let (_, body) = call(router(&state), Method::GET, "/locations?show_all=true", None).await;
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 8);
        assert_eq!(body["data"]["hidden"], 0);
    }

    #[tokio::test]
    async fn empty_result_shows_overview_map() {
        let state = AppState::for_tests();
        let (status, body) =
            call(router(&state), Method::GET, "/locations?category=plastic", None).await;
        assert_eq!(status, 200);
        assert!(body["data"]["items"].as_array().unwrap().is_empty());
        assert_eq!(body["data"]["map"]["zoom"], 5);
        assert_eq!(body["data"]["map"]["lat"], 20.5937);
    }

    #[tokio::test]
    async fn joined_location_is_listed_after_static_ones() {
        let state = AppState::for_tests();

        let (status, created) = call(
            router(&state),
            Method::POST,
            "/locations",
            Some(join_body("CircuitBack Recyclers", "E-Waste")),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(created["data"]["category"], "ewaste");
        assert_eq!(created["data"]["materials"], json!(["Circuit Boards", "Batteries"]));

        let (_, body) = call(
            router(&state),
            Method::GET,
            "/locations?category=ewaste&show_all=true",
            None,
        )
        .await;
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["name"], "CircuitBack Recyclers");

        let id = created["data"]["id"].as_str().unwrap();
        let (status, body) =
            call(router(&state), Method::GET, &format!("/locations/{id}"), None).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["map"]["lat"], 13.0604);

        let (_, body) = call(router(&state), Method::GET, "/impact", None).await;
        assert_eq!(body["data"]["collection_points"], 1);
        assert_eq!(body["data"]["by_type"][0]["type"], "E-Waste");
    }

    #[tokio::test]
    async fn join_rejects_unknown_type() {
        let state = AppState::for_tests();
        let (status, body) = call(
            router(&state),
            Method::POST,
            "/locations",
            Some(join_body("Bottle Depot", "Plastic")),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["message"], "Missing Information");
        assert_eq!(body["errors"]["error"], "Unknown location type");
    }

    #[tokio::test]
    async fn static_location_and_missing_one() {
        let state = AppState::for_tests();
        let (status, body) = call(router(&state), Method::GET, "/locations/1", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["location"]["name"], "GreenBuild Demolition Yard");

        let (status, _) = call(router(&state), Method::GET, "/locations/999", None).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn categories_start_with_all() {
        let state = AppState::for_tests();
        let (_, body) = call(router(&state), Method::GET, "/locations/categories", None).await;
        let categories = body["data"].as_array().unwrap();
        assert_eq!(categories.len(), 6);
        assert_eq!(categories[0]["id"], "all");
        assert_eq!(categories[5]["id"], "food");
    }

    #[tokio::test]
    async fn blood_banks_ignore_category() {
        let state = AppState::for_tests();
        let (_, body) = call(
            router(&state),
            Method::GET,
            "/blood-banks?category=ewaste&show_all=true",
            None,
        )
        .await;
        assert_eq!(body["data"]["total"], 10);

        let (_, body) = call(router(&state), Method::GET, "/blood-banks", None).await;
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 6);
        assert_eq!(body["data"]["hidden"], 4);
    }
}
