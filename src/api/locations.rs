use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::db::queries::locations::*;

pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations).post(join_network))
        .route("/locations/categories", get(list_categories))
        .route("/locations/{id}", get(get_location))
        .route("/blood-banks", get(list_blood_banks))
        .route("/impact", get(impact_summary))
}
