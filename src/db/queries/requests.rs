use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::requests::{
    Acknowledgement, BloodRequestForm, DonorRegistrationForm, NewRequest, Request, RequestStatus,
    RequestType, StatusUpdate, TrackQuery, WastePickupForm,
};
use crate::middleware::auth::{Claims, SecurityAddon};
use crate::tracking::timeline::{Timeline, TimelineStep, TimelineView};
use crate::tracking::TrackedRequest;
use crate::utils::api_response::ApiResponse;

const SUBMIT_FAILED: &str = "Failed to submit request. Please try again.";
const SEARCH_FAILED: &str = "Failed to search requests. Please try again.";
const LOAD_FAILED: &str = "Failed to load requests. Please try again.";
const UPDATE_FAILED: &str = "Failed to update request. Please try again.";

#[derive(OpenApi)]
#[openapi(
    paths(
        submit_waste_pickup,
        submit_blood_request,
        register_donor,
        list_blood_requests,
        get_blood_request,
        acknowledge_request,
        track_requests,
        update_request_status,
    ),
    components(schemas(
        Request,
        RequestType,
        RequestStatus,
        WastePickupForm,
        BloodRequestForm,
        DonorRegistrationForm,
        Acknowledgement,
        StatusUpdate,
        TrackedRequest,
        Timeline,
        TimelineStep,
        TimelineView,
    )),
    tags((name = "Requests", description = "Waste pickup, blood request and donor records")),
    modifiers(&SecurityAddon)
)]
pub struct RequestDoc;

async fn insert(
    state: &AppState,
    new: NewRequest,
    created: &str,
) -> Result<ApiResponse<Request>, ApiResponse<()>> {
    let request = state
        .store
        .insert_request(&new)
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(SUBMIT_FAILED, &e))?;

    tracing::info!(
        id = %request.id,
        request_type = request.request_type.as_str(),
        "request submitted"
    );
    Ok(ApiResponse::success(StatusCode::CREATED, created, request))
}

#[utoipa::path(
    post,
    path = "/requests/waste-pickup",
    request_body = WastePickupForm,
    responses(
        (status = 201, description = "Pickup request submitted", body = Request),
        (status = 400, description = "Missing Information"),
        (status = 500, description = "Failed to submit request")
    ),
    tag = "Requests"
)]
pub async fn submit_waste_pickup(
    State(state): State<AppState>,
    payload: Result<Json<WastePickupForm>, JsonRejection>,
) -> Result<ApiResponse<Request>, ApiResponse<()>> {
    let Json(form) = payload?;
    let new = form.into_new_request()?;
    insert(&state, new, "Pickup request submitted").await
}

#[utoipa::path(
    post,
    path = "/blood-requests",
    request_body = BloodRequestForm,
    responses(
        (status = 201, description = "Blood request submitted", body = Request),
        (status = 400, description = "Missing Information"),
        (status = 500, description = "Failed to submit request")
    ),
    tag = "Requests"
)]
pub async fn submit_blood_request(
    State(state): State<AppState>,
    payload: Result<Json<BloodRequestForm>, JsonRejection>,
) -> Result<ApiResponse<Request>, ApiResponse<()>> {
    let Json(form) = payload?;
    let new = form.into_new_request()?;
    insert(&state, new, "Blood request submitted").await
}

#[utoipa::path(
    post,
    path = "/blood-donors",
    request_body = DonorRegistrationForm,
    responses(
        (status = 201, description = "Donor registered", body = Request),
        (status = 400, description = "Missing Information"),
        (status = 500, description = "Failed to submit request")
    ),
    tag = "Requests"
)]
pub async fn register_donor(
    State(state): State<AppState>,
    payload: Result<Json<DonorRegistrationForm>, JsonRejection>,
) -> Result<ApiResponse<Request>, ApiResponse<()>> {
    let Json(form) = payload?;
    let new = form.into_new_request()?;
    insert(&state, new, "Donor registered").await
}

/// Every blood request, newest first. Donor registrations are not included.
#[utoipa::path(
    get,
    path = "/blood-requests",
    responses(
        (status = 200, description = "Blood requests", body = [Request]),
        (status = 500, description = "Failed to load requests")
    ),
    tag = "Requests"
)]
pub async fn list_blood_requests(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Request>>, ApiResponse<()>> {
    let requests = state
        .store
        .list_requests_by_type(RequestType::BloodRequest)
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(LOAD_FAILED, &e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Blood requests retrieved",
        requests,
    ))
}

#[utoipa::path(
    get,
    path = "/blood-requests/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Blood request with its lifecycle timeline", body = TrackedRequest),
        (status = 404, description = "Request not found"),
        (status = 500, description = "Failed to load requests")
    ),
    tag = "Requests"
)]
pub async fn get_blood_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<TrackedRequest>, ApiResponse<()>> {
    let request = state
        .store
        .get_request(id)
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(LOAD_FAILED, &e))?
        .filter(|r| r.request_type == RequestType::BloodRequest)
        .ok_or_else(|| ApiResponse::<()>::not_found("Request not found"))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Blood request retrieved",
        TrackedRequest::new(request, TimelineView::BloodLifecycle),
    ))
}

/// Records the donor against a request. A later acknowledgement replaces an
/// earlier one.
#[utoipa::path(
    post,
    path = "/requests/{id}/acknowledge",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = Acknowledgement,
    responses(
        (status = 200, description = "Request acknowledged", body = Request),
        (status = 400, description = "Missing Information"),
        (status = 404, description = "Request not found"),
        (status = 500, description = "Failed to update request")
    ),
    tag = "Requests"
)]
pub async fn acknowledge_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<Acknowledgement>, JsonRejection>,
) -> Result<ApiResponse<Request>, ApiResponse<()>> {
    let Json(ack) = payload?;
    let ack = ack.validated()?;

    let previous = state
        .store
        .get_request(id)
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(UPDATE_FAILED, &e))?
        .ok_or_else(|| ApiResponse::<()>::not_found("Request not found"))?;

    if let Some(prior) = previous.donor_email.as_deref() {
        if prior != ack.donor_email {
            tracing::warn!(
                %id,
                previous_donor = prior,
                donor = %ack.donor_email,
                "overwriting an earlier acknowledgement"
            );
        }
    }

    let updated = state
        .store
        .acknowledge_request(id, &ack, Utc::now())
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(UPDATE_FAILED, &e))?
        .ok_or_else(|| ApiResponse::<()>::not_found("Request not found"))?;

    tracing::info!(%id, "request acknowledged");
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Request acknowledged",
        updated,
    ))
}

/// Contact search for the tracking page.
#[utoipa::path(
    get,
    path = "/requests/track",
    params(TrackQuery),
    responses(
        (status = 200, description = "Matching requests with tracking timelines", body = [TrackedRequest]),
        (status = 400, description = "Enter search query"),
        (status = 500, description = "Failed to search requests")
    ),
    tag = "Requests"
)]
pub async fn track_requests(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> Result<ApiResponse<Vec<TrackedRequest>>, ApiResponse<()>> {
    let needle = query.needle().ok_or_else(|| {
        ApiResponse::<()>::error(StatusCode::BAD_REQUEST, "Enter search query", None)
    })?;

    let found = state
        .store
        .search_requests_by_contact(needle)
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(SEARCH_FAILED, &e))?;

    let message = if found.is_empty() {
        "No requests found"
    } else {
        "Requests found"
    };
    let tracked = found
        .into_iter()
        .map(|r| TrackedRequest::new(r, TimelineView::Tracking))
        .collect();

    Ok(ApiResponse::success(StatusCode::OK, message, tracked))
}

#[utoipa::path(
    patch,
    path = "/requests/{id}/status",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Status updated", body = Request),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Request not found"),
        (status = 500, description = "Failed to update request")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn update_request_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<ApiResponse<Request>, ApiResponse<()>> {
    let Json(update) = payload?;

    let updated = state
        .store
        .update_request_status(id, &update, Utc::now())
        .await
        .map_err(|e| ApiResponse::<()>::store_failure(UPDATE_FAILED, &e))?
        .ok_or_else(|| ApiResponse::<()>::not_found("Request not found"))?;

    tracing::info!(
        %id,
        operator = %claims.sub,
        status = update.status.as_str(),
        "request status updated"
    );
    Ok(ApiResponse::success(StatusCode::OK, "Status updated", updated))
}
