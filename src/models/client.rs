use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::Field;
use crate::error::ClientError;

pub const MISSING_REQUIRED_MESSAGE: &str = "Missing required fields: first_name, last_name, address_line1, city, state, zip_code are required.";
pub const EMPTY_REQUIRED_MESSAGE: &str = "Required fields cannot be empty if provided for update.";
pub const ACTIVE_NOT_BOOLEAN_MESSAGE: &str = "is_active must be a boolean value.";
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid client payload.";

const REQUIRED_FIELDS: [&str; 6] = [
    "first_name",
    "last_name",
    "address_line1",
    "city",
    "state",
    "zip_code",
];

/// A full row of the `clients` table.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Client {
    pub client_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub preferred_language: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub special_instructions: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns shown in the client list.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClientListing {
    pub client_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub city: String,
    pub state: String,
    pub is_active: bool,
}

impl From<&Client> for ClientListing {
    fn from(client: &Client) -> Self {
        Self {
            client_id: client.client_id,
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            phone_number: client.phone_number.clone(),
            email: client.email.clone(),
            city: client.city.clone(),
            state: client.state.clone(),
            is_active: client.is_active,
        }
    }
}

/// Confirmation returned after a deactivation.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClientSummary {
    pub client_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
}

impl From<&Client> for ClientSummary {
    fn from(client: &Client) -> Self {
        Self {
            client_id: client.client_id,
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            is_active: client.is_active,
        }
    }
}

/// Every writable column. Produced by validation, consumed by the stores.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientFields {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub preferred_language: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub special_instructions: Option<String>,
    pub is_active: bool,
}

/// Create payload. Required columns are optional here so a missing key
/// reports the validation message instead of a deserialization error.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct NewClient {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub preferred_language: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub special_instructions: Option<String>,
}

impl NewClient {
    pub fn from_json(value: Value) -> Result<Self, ClientError> {
        // A required column holding anything but a string counts as missing
        let wrong_type = REQUIRED_FIELDS
            .iter()
            .any(|key| value.get(key).is_some_and(|field| !field.is_string()));
        if wrong_type {
            return Err(ClientError::validation(MISSING_REQUIRED_MESSAGE));
        }

        parse_payload(value)
    }

    /// Check the required columns and produce an active record.
    pub fn validate(self) -> Result<ClientFields, ClientError> {
        let (
            Some(first_name),
            Some(last_name),
            Some(address_line1),
            Some(city),
            Some(state),
            Some(zip_code),
        ) = (
            non_empty(self.first_name),
            non_empty(self.last_name),
            non_empty(self.address_line1),
            non_empty(self.city),
            non_empty(self.state),
            non_empty(self.zip_code),
        )
        else {
            return Err(ClientError::validation(MISSING_REQUIRED_MESSAGE));
        };

        Ok(ClientFields {
            first_name,
            last_name,
            address_line1,
            address_line2: self.address_line2,
            city,
            state,
            zip_code,
            phone_number: self.phone_number,
            email: self.email,
            preferred_language: self.preferred_language,
            date_of_birth: self.date_of_birth,
            emergency_contact_name: self.emergency_contact_name,
            emergency_contact_phone: self.emergency_contact_phone,
            special_instructions: self.special_instructions,
            is_active: true,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Partial-update payload.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ClientPatch {
    #[serde(default)]
    pub first_name: Field<String>,
    #[serde(default)]
    pub last_name: Field<String>,
    #[serde(default)]
    pub address_line1: Field<String>,
    #[serde(default)]
    pub address_line2: Field<String>,
    #[serde(default)]
    pub city: Field<String>,
    #[serde(default)]
    pub state: Field<String>,
    #[serde(default)]
    pub zip_code: Field<String>,
    #[serde(default)]
    pub phone_number: Field<String>,
    #[serde(default)]
    pub email: Field<String>,
    #[serde(default)]
    pub preferred_language: Field<String>,
    #[serde(default)]
    pub date_of_birth: Field<NaiveDate>,
    #[serde(default)]
    pub emergency_contact_name: Field<String>,
    #[serde(default)]
    pub emergency_contact_phone: Field<String>,
    #[serde(default)]
    pub special_instructions: Field<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ClientPatch {
    /// Parse an update body. Blanked required columns are reported before a
    /// bad `is_active`, and both before any other type error.
    pub fn from_json(value: Value) -> Result<Self, ClientError> {
        let blanked = REQUIRED_FIELDS.iter().any(|key| {
            value
                .get(key)
                .is_some_and(|field| !matches!(field.as_str(), Some(s) if !s.is_empty()))
        });
        if blanked {
            return Err(ClientError::validation(EMPTY_REQUIRED_MESSAGE));
        }

        if let Some(active) = value.get("is_active") {
            if !active.is_boolean() {
                return Err(ClientError::validation(ACTIVE_NOT_BOOLEAN_MESSAGE));
            }
        }

        parse_payload(value)
    }

    /// Reject any attempt to blank or null a required column.
    pub fn validate(&self) -> Result<(), ClientError> {
        let required = [
            &self.first_name,
            &self.last_name,
            &self.address_line1,
            &self.city,
            &self.state,
            &self.zip_code,
        ];

        let blanked = required.iter().any(|field| match field {
            Field::Missing => false,
            Field::Null => true,
            Field::Value(value) => value.is_empty(),
        });

        if blanked {
            return Err(ClientError::validation(EMPTY_REQUIRED_MESSAGE));
        }

        Ok(())
    }

    /// Overlay this patch on the stored row. Call `validate` first.
    pub fn merge(self, current: &Client) -> ClientFields {
        ClientFields {
            first_name: keep_required(self.first_name, &current.first_name),
            last_name: keep_required(self.last_name, &current.last_name),
            address_line1: keep_required(self.address_line1, &current.address_line1),
            address_line2: self.address_line2.apply(current.address_line2.clone()),
            city: keep_required(self.city, &current.city),
            state: keep_required(self.state, &current.state),
            zip_code: keep_required(self.zip_code, &current.zip_code),
            phone_number: self.phone_number.apply(current.phone_number.clone()),
            email: self.email.apply(current.email.clone()),
            preferred_language: self
                .preferred_language
                .apply(current.preferred_language.clone()),
            date_of_birth: self.date_of_birth.apply(current.date_of_birth),
            emergency_contact_name: self
                .emergency_contact_name
                .apply(current.emergency_contact_name.clone()),
            emergency_contact_phone: self
                .emergency_contact_phone
                .apply(current.emergency_contact_phone.clone()),
            special_instructions: self
                .special_instructions
                .apply(current.special_instructions.clone()),
            is_active: self.is_active.unwrap_or(current.is_active),
        }
    }
}

fn parse_payload<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|err| {
        debug!(error = %err, "client payload did not deserialize");
        ClientError::validation(INVALID_PAYLOAD_MESSAGE)
    })
}

fn keep_required(field: Field<String>, current: &str) -> String {
    field
        .apply(Some(current.to_string()))
        .unwrap_or_else(|| current.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored() -> Client {
        let now = Utc::now();
        Client {
            client_id: 1,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            address_line1: "12 St James's Square".to_string(),
            address_line2: Some("Flat 2".to_string()),
            city: "London".to_string(),
            state: "LDN".to_string(),
            zip_code: "SW1Y".to_string(),
            phone_number: Some("555-0100".to_string()),
            email: Some("ada@example.com".to_string()),
            preferred_language: Some("English".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10),
            emergency_contact_name: None,
            emergency_contact_phone: None,
            special_instructions: Some("Prefers morning visits".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn full_payload() -> Value {
        json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "address_line1": "12 St James's Square",
            "city": "London",
            "state": "LDN",
            "zip_code": "SW1Y",
            "date_of_birth": "1815-12-10"
        })
    }

    #[test]
    fn complete_payload_validates_as_active() {
        let fields = NewClient::from_json(full_payload())
            .unwrap()
            .validate()
            .unwrap();
        assert!(fields.is_active);
        assert_eq!(fields.first_name, "Ada");
        assert_eq!(fields.date_of_birth, NaiveDate::from_ymd_opt(1815, 12, 10));
        assert_eq!(fields.address_line2, None);
    }

    #[test]
    fn each_required_field_is_enforced() {
        for key in [
            "first_name",
            "last_name",
            "address_line1",
            "city",
            "state",
            "zip_code",
        ] {
            let mut missing = full_payload();
            missing.as_object_mut().unwrap().remove(key);
            let err = NewClient::from_json(missing).unwrap().validate().unwrap_err();
            assert!(
                matches!(&err, ClientError::Validation(m) if m == MISSING_REQUIRED_MESSAGE),
                "{key} missing"
            );

            let mut empty = full_payload();
            empty[key] = json!("");
            let err = NewClient::from_json(empty).unwrap().validate().unwrap_err();
            assert!(matches!(err, ClientError::Validation(_)), "{key} empty");
        }
    }

    #[test]
    fn malformed_date_is_a_validation_error() {
        let mut payload = full_payload();
        payload["date_of_birth"] = json!("10/12/1815");
        let err = NewClient::from_json(payload).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn single_field_patch_leaves_the_rest() {
        let current = stored();
        let patch = ClientPatch::from_json(json!({ "phone_number": "555-0199" })).unwrap();
        patch.validate().unwrap();
        let merged = patch.merge(&current);

        assert_eq!(merged.phone_number.as_deref(), Some("555-0199"));
        assert_eq!(merged.first_name, current.first_name);
        assert_eq!(merged.address_line2, current.address_line2);
        assert_eq!(merged.special_instructions, current.special_instructions);
        assert_eq!(merged.date_of_birth, current.date_of_birth);
        assert!(merged.is_active);
    }

    #[test]
    fn null_clears_optional_fields() {
        let patch =
            ClientPatch::from_json(json!({ "address_line2": null, "email": null })).unwrap();
        patch.validate().unwrap();
        let merged = patch.merge(&stored());
        assert_eq!(merged.address_line2, None);
        assert_eq!(merged.email, None);
        assert_eq!(merged.phone_number.as_deref(), Some("555-0100"));
    }

    #[test]
    fn empty_or_null_required_field_is_rejected() {
        for bad in [json!(""), json!(null), json!(42)] {
            let err = ClientPatch::from_json(json!({ "last_name": bad })).unwrap_err();
            assert!(matches!(err, ClientError::Validation(m) if m == EMPTY_REQUIRED_MESSAGE));
        }

        let built = ClientPatch {
            city: Field::Null,
            ..ClientPatch::default()
        };
        assert!(built.validate().is_err());

        let built = ClientPatch {
            state: Field::Value(String::new()),
            ..ClientPatch::default()
        };
        assert!(matches!(
            built.validate(),
            Err(ClientError::Validation(m)) if m == EMPTY_REQUIRED_MESSAGE
        ));
    }

    #[test]
    fn blank_required_field_is_reported_before_bad_is_active() {
        let err = ClientPatch::from_json(json!({ "last_name": "", "is_active": "yes" }))
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(m) if m == EMPTY_REQUIRED_MESSAGE));
    }

    #[test]
    fn type_errors_do_not_leak_serde_wording() {
        let err = NewClient::from_json(json!({ "first_name": 42 })).unwrap_err();
        assert!(matches!(err, ClientError::Validation(m) if m == MISSING_REQUIRED_MESSAGE));

        let mut payload = full_payload();
        payload["phone_number"] = json!(5550100);
        let err = NewClient::from_json(payload).unwrap_err();
        assert!(matches!(err, ClientError::Validation(m) if m == INVALID_PAYLOAD_MESSAGE));

        let err = ClientPatch::from_json(json!({ "email": ["a@b.c"] })).unwrap_err();
        assert!(matches!(err, ClientError::Validation(m) if m == INVALID_PAYLOAD_MESSAGE));

        let err = ClientPatch::from_json(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ClientError::Validation(m) if m == INVALID_PAYLOAD_MESSAGE));
    }

    #[test]
    fn is_active_must_be_boolean() {
        for bad in [json!("false"), json!(0), json!(null)] {
            let err = ClientPatch::from_json(json!({ "is_active": bad })).unwrap_err();
            assert!(matches!(err, ClientError::Validation(m) if m == ACTIVE_NOT_BOOLEAN_MESSAGE));
        }

        let patch = ClientPatch::from_json(json!({ "is_active": false })).unwrap();
        assert!(!patch.merge(&stored()).is_active);
    }

    #[test]
    fn projections_copy_their_columns() {
        let client = stored();
        let listing = ClientListing::from(&client);
        assert_eq!(listing.last_name, "Lovelace");
        assert_eq!(listing.city, "London");

        let summary = ClientSummary::from(&client);
        assert_eq!(summary.client_id, 1);
        assert!(summary.is_active);
    }
}
