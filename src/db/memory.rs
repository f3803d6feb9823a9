use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::ClientStore;
use crate::error::ClientError;
use crate::models::{Client, ClientFields, ClientListing, ClientSummary};

/// Process-local store with the same guarantees as the clients table:
/// serial ids that are never reused and a conditional replace.
#[derive(Default)]
pub struct MemoryClientStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i32,
    rows: BTreeMap<i32, Client>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Next mutation time, strictly after `previous`.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn list(&self) -> Result<Vec<ClientListing>, ClientError> {
        let state = self.state.read().await;
        let mut clients = state.rows.values().map(ClientListing::from).collect::<Vec<_>>();

        clients.sort_by(|left, right| {
            left.last_name
                .cmp(&right.last_name)
                .then_with(|| left.first_name.cmp(&right.first_name))
                .then_with(|| left.client_id.cmp(&right.client_id))
        });

        Ok(clients)
    }

    async fn get(&self, id: i32) -> Result<Option<Client>, ClientError> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn insert(&self, fields: ClientFields) -> Result<Client, ClientError> {
        let mut state = self.state.write().await;
        let client_id = state
            .last_id
            .checked_add(1)
            .ok_or(ClientError::IdsExhausted)?;
        state.last_id = client_id;

        let now = Utc::now();
        let client = Client {
            client_id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            address_line1: fields.address_line1,
            address_line2: fields.address_line2,
            city: fields.city,
            state: fields.state,
            zip_code: fields.zip_code,
            phone_number: fields.phone_number,
            email: fields.email,
            preferred_language: fields.preferred_language,
            date_of_birth: fields.date_of_birth,
            emergency_contact_name: fields.emergency_contact_name,
            emergency_contact_phone: fields.emergency_contact_phone,
            special_instructions: fields.special_instructions,
            is_active: fields.is_active,
            created_at: now,
            updated_at: now,
        };

        state.rows.insert(client.client_id, client.clone());
        Ok(client)
    }

    async fn replace(
        &self,
        id: i32,
        fields: ClientFields,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<Option<Client>, ClientError> {
        let mut state = self.state.write().await;
        let Some(row) = state.rows.get_mut(&id) else {
            return Ok(None);
        };
        if row.updated_at != expected_updated_at {
            return Ok(None);
        }

        row.first_name = fields.first_name;
        row.last_name = fields.last_name;
        row.address_line1 = fields.address_line1;
        row.address_line2 = fields.address_line2;
        row.city = fields.city;
        row.state = fields.state;
        row.zip_code = fields.zip_code;
        row.phone_number = fields.phone_number;
        row.email = fields.email;
        row.preferred_language = fields.preferred_language;
        row.date_of_birth = fields.date_of_birth;
        row.emergency_contact_name = fields.emergency_contact_name;
        row.emergency_contact_phone = fields.emergency_contact_phone;
        row.special_instructions = fields.special_instructions;
        row.is_active = fields.is_active;
        row.updated_at = advance(row.updated_at);

        Ok(Some(row.clone()))
    }

    async fn deactivate(&self, id: i32) -> Result<Option<ClientSummary>, ClientError> {
        let mut state = self.state.write().await;
        let Some(row) = state.rows.get_mut(&id) else {
            return Ok(None);
        };

        row.is_active = false;
        row.updated_at = advance(row.updated_at);

        Ok(Some(ClientSummary::from(&*row)))
    }
}
