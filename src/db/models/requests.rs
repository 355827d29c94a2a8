// src/db/models/requests.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::utils::validation::{one_of, optional, trimmed};

pub const BLOOD_TYPES: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
pub const URGENCY_LEVELS: [&str; 3] = ["Normal", "Urgent", "Critical"];
pub const DEFAULT_DONOR_DESCRIPTION: &str = "Available to donate blood";

/// The three use cases sharing the `requests` table.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    WastePickup,
    BloodDonation,
    BloodRequest,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::WastePickup => "waste_pickup",
            RequestType::BloodDonation => "blood_donation",
            RequestType::BloodRequest => "blood_request",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestType::WastePickup => "Waste Pickup",
            RequestType::BloodDonation => "Blood Donation",
            RequestType::BloodRequest => "Blood Request",
        }
    }
}

/// Known status tags. The stored column stays free text, so a row can carry
/// a value outside this set.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Acknowledged,
    Pickup,
    InTransit,
    Delivered,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Acknowledged => "acknowledged",
            RequestStatus::Pickup => "pickup",
            RequestStatus::InTransit => "in_transit",
            RequestStatus::Delivered => "delivered",
        }
    }

    /// Lifecycle timestamp column stamped when a row moves into this status.
    pub fn timestamp_column(&self) -> Option<&'static str> {
        match self {
            RequestStatus::Pending => None,
            RequestStatus::Acknowledged => Some("acknowledged_at"),
            RequestStatus::Pickup => Some("pickup_at"),
            RequestStatus::InTransit => Some("in_transit_at"),
            RequestStatus::Delivered => Some("delivered_at"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Request {
    pub id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub request_type: RequestType,
    pub status: String,
    pub description: Option<String>,
    pub blood_type: Option<String>,
    pub units_needed: Option<i32>,
    pub urgency: Option<String>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_phone: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub pickup_at: Option<DateTime<Utc>>,
    pub in_transit_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub current_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Request {
    /// Case-insensitive literal substring test on email or phone;
    /// `needle_lower` must already be lowercased.
    pub fn contact_contains(&self, needle_lower: &str) -> bool {
        self.user_email.to_lowercase().contains(needle_lower)
            || self.user_phone.to_lowercase().contains(needle_lower)
    }
}

/// Insert payload; `id` and timestamps come from the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRequest {
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub request_type: RequestType,
    pub status: String,
    pub description: Option<String>,
    pub blood_type: Option<String>,
    pub units_needed: Option<i32>,
    pub urgency: Option<String>,
}

/// Name, email and phone are required on every form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ContactDetails {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

impl ContactDetails {
    fn normalized(self) -> Self {
        ContactDetails {
            name: trimmed(&self.name),
            email: trimmed(&self.email),
            phone: trimmed(&self.phone),
        }
    }

    fn into_pending(self, request_type: RequestType) -> NewRequest {
        NewRequest {
            user_name: self.name,
            user_email: self.email,
            user_phone: self.phone,
            request_type,
            status: RequestStatus::Pending.as_str().to_string(),
            description: None,
            blood_type: None,
            units_needed: None,
            urgency: None,
        }
    }
}

fn validate_blood_type(value: &str) -> Result<(), ValidationError> {
    one_of("blood_type", "Unknown blood type", value, &BLOOD_TYPES)
}

fn validate_urgency(value: &str) -> Result<(), ValidationError> {
    one_of("urgency", "Urgency must be Normal, Urgent or Critical", value, &URGENCY_LEVELS)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct BloodRequestForm {
    #[serde(flatten)]
    #[validate]
    pub contact: ContactDetails,
    #[validate(custom = "validate_blood_type")]
    pub blood_type: String,
    #[validate(range(min = 1, max = 10, message = "Units needed must be between 1 and 10"))]
    pub units_needed: Option<i32>,
    #[validate(custom = "validate_urgency")]
    pub urgency: Option<String>,
    pub description: Option<String>,
}

impl BloodRequestForm {
    pub fn into_new_request(self) -> Result<NewRequest, ValidationErrors> {
        let form = BloodRequestForm {
            contact: self.contact.normalized(),
            blood_type: trimmed(&self.blood_type),
            units_needed: self.units_needed,
            urgency: optional(self.urgency.as_deref()),
            description: optional(self.description.as_deref()),
        };
        form.validate()?;

        let mut new = form.contact.into_pending(RequestType::BloodRequest);
        new.blood_type = Some(form.blood_type);
        new.units_needed = Some(form.units_needed.unwrap_or(1));
        new.urgency = Some(
            form.urgency
                .unwrap_or_else(|| URGENCY_LEVELS[0].to_string()),
        );
        new.description = form.description;
        Ok(new)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct DonorRegistrationForm {
    #[serde(flatten)]
    #[validate]
    pub contact: ContactDetails,
    #[validate(custom = "validate_blood_type")]
    pub blood_type: String,
    pub description: Option<String>,
}

impl DonorRegistrationForm {
    pub fn into_new_request(self) -> Result<NewRequest, ValidationErrors> {
        let form = DonorRegistrationForm {
            contact: self.contact.normalized(),
            blood_type: trimmed(&self.blood_type),
            description: optional(self.description.as_deref()),
        };
        form.validate()?;

        let mut new = form.contact.into_pending(RequestType::BloodDonation);
        new.blood_type = Some(form.blood_type);
        new.description = Some(
            form.description
                .unwrap_or_else(|| DEFAULT_DONOR_DESCRIPTION.to_string()),
        );
        Ok(new)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct WastePickupForm {
    #[serde(flatten)]
    #[validate]
    pub contact: ContactDetails,
    /// Material, quantity and pickup address.
    pub description: Option<String>,
}

impl WastePickupForm {
    pub fn into_new_request(self) -> Result<NewRequest, ValidationErrors> {
        let form = WastePickupForm {
            contact: self.contact.normalized(),
            description: optional(self.description.as_deref()),
        };
        form.validate()?;

        let mut new = form.contact.into_pending(RequestType::WastePickup);
        new.description = form.description;
        Ok(new)
    }
}

/// Donor details written by the acknowledge action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema, Validate)]
pub struct Acknowledgement {
    #[validate(length(min = 1, message = "Donor name is required"))]
    pub donor_name: String,
    #[validate(email(message = "Invalid email address format"))]
    pub donor_email: String,
    #[validate(length(min = 1, message = "Donor phone is required"))]
    pub donor_phone: String,
}

impl Acknowledgement {
    pub fn validated(self) -> Result<Self, ValidationErrors> {
        let ack = Acknowledgement {
            donor_name: trimmed(&self.donor_name),
            donor_email: trimmed(&self.donor_email),
            donor_phone: trimmed(&self.donor_phone),
        };
        ack.validate()?;
        Ok(ack)
    }
}

/// Operator-side move to any known status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StatusUpdate {
    pub status: RequestStatus,
    pub current_location: Option<String>,
}

/// Tracking search box contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrackQuery {
    /// Email or phone number, matched case-insensitively as a substring.
    pub q: Option<String>,
}

impl TrackQuery {
    pub fn needle(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::field_messages;

    fn contact() -> ContactDetails {
        ContactDetails {
            name: "Meera Iyer".to_string(),
            email: "meera@example.org".to_string(),
            phone: "+91 98400 12345".to_string(),
        }
    }

    #[test]
    fn blood_request_defaults() {
        let new = BloodRequestForm {
            contact: contact(),
            blood_type: "O-".to_string(),
            units_needed: None,
            urgency: Some("  ".to_string()),
            description: None,
        }
        .into_new_request()
        .unwrap();

        assert_eq!(new.request_type, RequestType::BloodRequest);
        assert_eq!(new.status, "pending");
        assert_eq!(new.units_needed, Some(1));
        assert_eq!(new.urgency.as_deref(), Some("Normal"));
        assert_eq!(new.blood_type.as_deref(), Some("O-"));
    }

    #[test]
    fn blood_request_rejects_bad_fields() {
        let form = |blood: &str, units: i32| BloodRequestForm {
            contact: contact(),
            blood_type: blood.to_string(),
            units_needed: Some(units),
            urgency: Some("Critical".to_string()),
            description: None,
        };

        let fields = field_messages(&form("Z+", 2).into_new_request().unwrap_err());
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["blood_type"]);

        let fields = field_messages(&form("A+", 11).into_new_request().unwrap_err());
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["units_needed"]);

        assert!(form("A+", 0).into_new_request().is_err());
        assert!(form(" AB- ", 10).into_new_request().is_ok());
    }

    #[test]
    fn unknown_urgency_is_rejected() {
        let err = BloodRequestForm {
            contact: contact(),
            blood_type: "B+".to_string(),
            units_needed: None,
            urgency: Some("critical".to_string()),
            description: None,
        }
        .into_new_request()
        .unwrap_err();
        assert!(field_messages(&err).contains_key("urgency"));
    }

    #[test]
    fn donor_registration_fills_description() {
        let new = DonorRegistrationForm {
            contact: contact(),
            blood_type: "AB+".to_string(),
            description: None,
        }
        .into_new_request()
        .unwrap();

        assert_eq!(new.request_type, RequestType::BloodDonation);
        assert_eq!(new.description.as_deref(), Some(DEFAULT_DONOR_DESCRIPTION));
        assert_eq!(new.units_needed, None);
    }

    #[test]
    fn blank_contact_is_rejected() {
        let mut details = contact();
        details.phone = "   ".to_string();
        let err = WastePickupForm {
            contact: details,
            description: None,
        }
        .into_new_request()
        .unwrap_err();
        let fields = field_messages(&err);
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["phone"]);
    }

    #[test]
    fn acknowledgement_is_trimmed_and_checked() {
        let ack = Acknowledgement {
            donor_name: " Ravi ".to_string(),
            donor_email: "ravi@example.org ".to_string(),
            donor_phone: "+91 99400 55555".to_string(),
        }
        .validated()
        .unwrap();
        assert_eq!(ack.donor_name, "Ravi");
        assert_eq!(ack.donor_email, "ravi@example.org");

        let err = Acknowledgement {
            donor_name: "Ravi".to_string(),
            donor_email: "ravi-at-example".to_string(),
            donor_phone: "".to_string(),
        }
        .validated()
        .unwrap_err();
        let fields = field_messages(&err);
        assert!(fields.contains_key("donor_email"));
        assert!(fields.contains_key("donor_phone"));
    }

    #[test]
    fn status_tags_match_wire_names() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Acknowledged,
            RequestStatus::Pickup,
            RequestStatus::InTransit,
            RequestStatus::Delivered,
        ] {
            assert_eq!(serde_json::to_value(status).unwrap(), status.as_str());
        }
        assert!(serde_json::from_str::<RequestStatus>("\"bananas\"").is_err());
        assert_eq!(RequestStatus::Pending.timestamp_column(), None);
        assert_eq!(
            RequestStatus::InTransit.timestamp_column(),
            Some("in_transit_at")
        );
    }
}
