use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::Modify;

use crate::app_state::AppState;
use crate::utils::api_response::ApiResponse;

/// Roles allowed to move a request through its lifecycle.
pub const OPERATOR_ROLES: [&str; 2] = ["operator", "admin"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Operator identifier.
    pub sub: String,
    pub role: String,
    /// Expiration (UNIX time).
    pub exp: usize,
}

impl Claims {
    /// Stand-in identity when `AUTH_DISABLED=true`.
    fn local_operator() -> Self {
        Claims {
            sub: "local".to_string(),
            role: "admin".to_string(),
            exp: usize::MAX,
        }
    }
}

fn reject(status: StatusCode, message: &str) -> Response {
    ApiResponse::<()>::error(status, message, None).into_response()
}

/// Bearer JWT check for operator routes; inserts `Claims` into extensions.
pub async fn operator_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    if state.config.auth_disabled {
        req.extensions_mut().insert(Claims::local_operator());
        return Ok(next.run(req).await);
    }

    let secret = state.config.jwt_secret.as_deref().ok_or_else(|| {
        tracing::error!("operator route called without JWT_SECRET configured");
        reject(StatusCode::INTERNAL_SERVER_ERROR, "Authentication is not configured")
    })?;

    let auth_header = req.headers().get("Authorization").ok_or_else(|| {
        tracing::warn!("Missing Authorization header");
        reject(StatusCode::UNAUTHORIZED, "Missing Authorization header")
    })?;

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            tracing::warn!("Invalid Authorization header format");
            reject(StatusCode::BAD_REQUEST, "Invalid Authorization header format")
        })?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::warn!("JWT decoding failed: {:?}", e);
        ApiResponse::<()>::error(
            StatusCode::UNAUTHORIZED,
            "Invalid token",
            Some(json!({ "error": e.to_string() })),
        )
        .into_response()
    })?;

    if !OPERATOR_ROLES.contains(&token_data.claims.role.as_str()) {
        tracing::warn!(sub = %token_data.claims.sub, role = %token_data.claims.role, "role may not update requests");
        return Err(reject(StatusCode::FORBIDDEN, "Access denied"));
    }

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Registers the `bearerAuth` scheme referenced by operator routes.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.clone().unwrap_or_default();
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
        openapi.components = Some(components);
    }
}
