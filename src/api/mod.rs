pub mod graphql;
pub mod health;
pub mod locations;
pub mod requests;

use axum::{middleware::from_fn, Router};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;
use crate::db::queries::locations::LocationDoc;
use crate::db::queries::requests::RequestDoc;
use crate::graphql::graph_schema::create_schema;
use crate::middleware::request_logger::log_requests;

/// Submissions are small JSON forms.
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn api_doc() -> utoipa::openapi::OpenApi {
    RequestDoc::openapi().merge_from(LocationDoc::openapi())
}

/// Every route plus the shared middleware stack.
pub fn app_router(state: AppState) -> Router {
    let merged_doc = api_doc();
    let graphql_schema = create_schema(state.clone());

    Router::new()
        .merge(health::health_routes())
        .merge(requests::request_routes(state.clone()))
        .merge(locations::location_routes())
        .merge(graphql::graphql_routes(graphql_schema))
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", merged_doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", merged_doc).path("/rapidoc"))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
