use serde::Serialize;
use utoipa::ToSchema;

/// Center of India; shown when nothing is selected.
pub const OVERVIEW_CENTER: (f64, f64) = (20.5937, 78.9629);
pub const OVERVIEW_ZOOM: u8 = 5;
pub const PIN_ZOOM: u8 = 15;

/// What a client needs to render a map pin.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MapEmbed {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
    pub embed_url: String,
    /// Token for an interactive map widget, when one is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl MapEmbed {
    pub fn pin(lat: f64, lng: f64, api_token: Option<&str>) -> Self {
        Self::build(lat, lng, PIN_ZOOM, api_token)
    }

    pub fn overview(api_token: Option<&str>) -> Self {
        Self::build(OVERVIEW_CENTER.0, OVERVIEW_CENTER.1, OVERVIEW_ZOOM, api_token)
    }

    fn build(lat: f64, lng: f64, zoom: u8, api_token: Option<&str>) -> Self {
        MapEmbed {
            lat,
            lng,
            zoom,
            embed_url: embed_url(lat, lng, zoom),
            api_token: api_token.map(str::to_string),
        }
    }
}

pub fn embed_url(lat: f64, lng: f64, zoom: u8) -> String {
    format!("https://maps.google.com/maps?q={lat},{lng}&t=&z={zoom}&ie=UTF8&iwloc=&output=embed")
}
