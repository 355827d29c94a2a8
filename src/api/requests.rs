use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use crate::app_state::AppState;
use crate::db::queries::requests::*;
use crate::middleware::auth::operator_auth;

pub fn request_routes(state: AppState) -> Router<AppState> {
    let operator_routes = Router::new()
        .route("/requests/{id}/status", patch(update_request_status))
        .route_layer(from_fn_with_state(state, operator_auth));

    Router::new()
        .route("/requests/waste-pickup", post(submit_waste_pickup))
        .route("/requests/track", get(track_requests))
        .route("/requests/{id}/acknowledge", post(acknowledge_request))
        .route("/blood-requests", post(submit_blood_request).get(list_blood_requests))
        .route("/blood-requests/{id}", get(get_blood_request))
        .route("/blood-donors", post(register_donor))
        .merge(operator_routes)
}
