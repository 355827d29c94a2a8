use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::utils::validation::{one_of, optional, trimmed};

/// Waste categories accepted by collection points. `all` is a filter value,
/// not a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    Demolition,
    Coconut,
    Ewaste,
    Textile,
    Food,
}

impl LocationCategory {
    pub const ALL: [LocationCategory; 5] = [
        LocationCategory::Demolition,
        LocationCategory::Coconut,
        LocationCategory::Ewaste,
        LocationCategory::Textile,
        LocationCategory::Food,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            LocationCategory::Demolition => "demolition",
            LocationCategory::Coconut => "coconut",
            LocationCategory::Ewaste => "ewaste",
            LocationCategory::Textile => "textile",
            LocationCategory::Food => "food",
        }
    }

    /// Value stored in the `type` column.
    pub fn type_label(&self) -> &'static str {
        match self {
            LocationCategory::Demolition => "Demolition",
            LocationCategory::Coconut => "Coconut",
            LocationCategory::Ewaste => "E-Waste",
            LocationCategory::Textile => "Textile",
            LocationCategory::Food => "Food Waste",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LocationCategory::Demolition => "Demolition Sites",
            LocationCategory::Coconut => "Coconut Shops",
            LocationCategory::Ewaste => "E-Waste",
            LocationCategory::Textile => "Textile Waste",
            LocationCategory::Food => "Food Waste",
        }
    }

    /// Matches a `type` label loosely: case, hyphens and spaces are ignored,
    /// and a trailing "waste" is optional ("Food Waste" -> food).
    pub fn from_type_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| !matches!(c, '-' | ' ' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        let stem = normalized
            .strip_suffix("waste")
            .filter(|s| !s.is_empty())
            .unwrap_or(&normalized);

        Self::ALL
            .into_iter()
            .find(|c| c.tag() == normalized || c.tag() == stem)
    }
}

/// Category tag for a `type` label; unknown labels keep their normalized form
/// so they only ever match the `all` filter.
pub fn category_for_type(label: &str) -> String {
    match LocationCategory::from_type_label(label) {
        Some(category) => category.tag().to_string(),
        None => label.to_lowercase().replace(['-', ' '], ""),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PickupSlot {
    pub day: String,
    pub time: String,
    pub available: bool,
}

/// Mon-Fri 9-5, Saturday mornings, closed Sunday.
pub fn default_pickup_schedule() -> Vec<PickupSlot> {
    let slot = |day: &str, time: &str| PickupSlot {
        day: day.to_string(),
        time: time.to_string(),
        available: time != "Closed",
    };
    vec![
        slot("Monday", "9:00 AM - 5:00 PM"),
        slot("Tuesday", "9:00 AM - 5:00 PM"),
        slot("Wednesday", "9:00 AM - 5:00 PM"),
        slot("Thursday", "9:00 AM - 5:00 PM"),
        slot("Friday", "9:00 AM - 5:00 PM"),
        slot("Saturday", "9:00 AM - 1:00 PM"),
        slot("Sunday", "Closed"),
    ]
}

/// A collection point as listed to clients, static or store-sourced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub hours: String,
    #[serde(rename = "type")]
    pub location_type: String,
    pub category: String,
    pub materials: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    pub description: String,
    pub pickup_schedule: Vec<PickupSlot>,
    pub contact_person: String,
    pub email: String,
    pub capacity: String,
    pub next_pickup: String,
}

/// Row of the store's `locations` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LocationRow {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub hours: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub location_type: String,
    pub materials: Option<Vec<String>>,
    pub lat: f64,
    pub lng: f64,
    pub description: Option<String>,
    pub contact_person: Option<String>,
    pub pickup_schedule: Option<Json<Vec<PickupSlot>>>,
    pub created_at: DateTime<Utc>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id.to_string(),
            category: category_for_type(&row.location_type),
            name: row.name,
            address: row.address,
            phone: row.phone,
            hours: row.hours.unwrap_or_default(),
            location_type: row.location_type,
            materials: row.materials.unwrap_or_default(),
            lat: row.lat,
            lng: row.lng,
            description: row.description.unwrap_or_default(),
            pickup_schedule: row.pickup_schedule.map(|j| j.0).unwrap_or_default(),
            contact_person: row.contact_person.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            capacity: String::new(),
            next_pickup: String::new(),
        }
    }
}

/// Insert payload for the `locations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub hours: Option<String>,
    #[serde(rename = "type")]
    pub location_type: String,
    pub materials: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    pub description: Option<String>,
    pub contact_person: Option<String>,
    pub pickup_schedule: Vec<PickupSlot>,
}

fn validate_type_label(value: &str) -> Result<(), ValidationError> {
    let labels: Vec<&str> = LocationCategory::ALL.iter().map(|c| c.type_label()).collect();
    one_of("type", "Unknown location type", value, &labels)
}

/// "Join the network" submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct JoinNetworkForm {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(email(message = "Invalid email address format"))]
    pub email: Option<String>,
    pub hours: Option<String>,
    #[serde(rename = "type")]
    #[validate(custom = "validate_type_label")]
    pub location_type: String,
    #[serde(default)]
    pub materials: Vec<String>,
    #[validate(required, range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub lat: Option<f64>,
    #[validate(required, range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub lng: Option<f64>,
    pub description: Option<String>,
    pub contact_person: Option<String>,
    pub pickup_schedule: Option<Vec<PickupSlot>>,
}

impl JoinNetworkForm {
    fn normalized(self) -> Self {
        JoinNetworkForm {
            name: trimmed(&self.name),
            address: trimmed(&self.address),
            phone: trimmed(&self.phone),
            email: optional(self.email.as_deref()),
            hours: optional(self.hours.as_deref()),
            location_type: trimmed(&self.location_type),
            materials: dedup_materials(self.materials),
            lat: self.lat,
            lng: self.lng,
            description: optional(self.description.as_deref()),
            contact_person: optional(self.contact_person.as_deref()),
            pickup_schedule: self.pickup_schedule.filter(|s| !s.is_empty()),
        }
    }

    pub fn into_new_location(self) -> Result<NewLocation, ValidationErrors> {
        let form = self.normalized();
        form.validate()?;

        Ok(NewLocation {
            name: form.name,
            address: form.address,
            phone: form.phone,
            email: form.email,
            hours: form.hours,
            location_type: form.location_type,
            materials: form.materials,
            // Presence checked by `required`.
            lat: form.lat.unwrap_or_default(),
            lng: form.lng.unwrap_or_default(),
            description: form.description,
            contact_person: form.contact_person,
            pickup_schedule: form.pickup_schedule.unwrap_or_else(default_pickup_schedule),
        })
    }
}

/// Trimmed, blank entries dropped, first occurrence kept.
fn dedup_materials(materials: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(materials.len());
    for material in materials {
        let material = material.trim();
        if !material.is_empty() && !kept.iter().any(|m| m == material) {
            kept.push(material.to_string());
        }
    }
    kept
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BloodBank {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub hours: String,
    pub blood_types: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    pub capacity: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryInfo {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::field_messages;

    #[test]
    fn type_labels_map_onto_categories() {
        assert_eq!(category_for_type("Demolition"), "demolition");
        assert_eq!(category_for_type("E-Waste"), "ewaste");
        assert_eq!(category_for_type("Food Waste"), "food");
        assert_eq!(category_for_type("textile"), "textile");
        assert_eq!(category_for_type("Plastic Bottles"), "plasticbottles");
        for category in LocationCategory::ALL {
            assert_eq!(
                LocationCategory::from_type_label(category.type_label()),
                Some(category)
            );
        }
    }

    fn form() -> JoinNetworkForm {
        JoinNetworkForm {
            name: "Shore Coir Works".to_string(),
            address: "4 Harbour Lane, Kochi, KL 682001".to_string(),
            phone: "+91 90000 11111".to_string(),
            email: Some("  ".to_string()),
            hours: None,
            location_type: "Coconut".to_string(),
            materials: vec![
                " Husk ".to_string(),
                "Coir".to_string(),
                "".to_string(),
                "Husk".to_string(),
            ],
            lat: Some(9.9312),
            lng: Some(76.2673),
            description: None,
            contact_person: None,
            pickup_schedule: None,
        }
    }

    #[test]
    fn join_network_normalizes_submission() {
        let new = form().into_new_location().unwrap();
        assert_eq!(new.materials, vec!["Husk".to_string(), "Coir".to_string()]);
        assert_eq!(new.email, None);
        assert_eq!(new.pickup_schedule.len(), 7);
        assert!(!new.pickup_schedule[6].available);
    }

    #[test]
    fn join_network_requires_coordinates_and_known_type() {
        let mut missing = form();
        missing.lat = None;
        let fields = field_messages(&missing.into_new_location().unwrap_err());
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["lat"]);

        let mut outside = form();
        outside.lng = Some(181.5);
        let fields = field_messages(&outside.into_new_location().unwrap_err());
        assert_eq!(fields["lng"], vec!["Longitude out of range".to_string()]);

        let mut unknown = form();
        unknown.location_type = "Plastic".to_string();
        let fields = field_messages(&unknown.into_new_location().unwrap_err());
        assert!(fields
            .values()
            .flatten()
            .any(|m| m == "Unknown location type"));
    }

    #[test]
    fn join_network_checks_a_given_email() {
        let mut bad = form();
        bad.email = Some("desk-at-coir".to_string());
        let fields = field_messages(&bad.into_new_location().unwrap_err());
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn store_rows_fill_missing_fields() {
        let row = LocationRow {
            id: Uuid::nil(),
            name: "Loop Textiles".to_string(),
            address: "12 Mill Road, Tiruppur".to_string(),
            phone: "+91 95000 22222".to_string(),
            email: None,
            hours: None,
            location_type: "Textile".to_string(),
            materials: None,
            lat: 11.1085,
            lng: 77.3411,
            description: None,
            contact_person: None,
            pickup_schedule: None,
            created_at: Utc::now(),
        };
        let location = Location::from(row);
        assert_eq!(location.category, "textile");
        assert_eq!(location.id, Uuid::nil().to_string());
        assert!(location.materials.is_empty());
        assert!(location.pickup_schedule.is_empty());
    }
}
