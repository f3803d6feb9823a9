use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::ClientStore;
use crate::error::{ClientError, map_sqlx_error};
use crate::models::{Client, ClientFields, ClientListing, ClientSummary};

#[derive(Clone)]
pub struct PgClientStore {
    pool: PgPool,
}

impl PgClientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientStore for PgClientStore {
    async fn list(&self) -> Result<Vec<ClientListing>, ClientError> {
        let clients = sqlx::query_as::<_, ClientListing>(
            r#"
            SELECT client_id, first_name, last_name, phone_number, email, city, state, is_active
            FROM clients
            ORDER BY last_name ASC, first_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(clients)
    }

    async fn get(&self, id: i32) -> Result<Option<Client>, ClientError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE client_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(client)
    }

    async fn insert(&self, fields: ClientFields) -> Result<Client, ClientError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                first_name, last_name, address_line1, address_line2, city, state, zip_code,
                phone_number, email, preferred_language, date_of_birth,
                emergency_contact_name, emergency_contact_phone, special_instructions,
                is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            RETURNING *
            "#,
        )
        .bind(fields.first_name)
        .bind(fields.last_name)
        .bind(fields.address_line1)
        .bind(fields.address_line2)
        .bind(fields.city)
        .bind(fields.state)
        .bind(fields.zip_code)
        .bind(fields.phone_number)
        .bind(fields.email)
        .bind(fields.preferred_language)
        .bind(fields.date_of_birth)
        .bind(fields.emergency_contact_name)
        .bind(fields.emergency_contact_phone)
        .bind(fields.special_instructions)
        .bind(fields.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(client)
    }

    async fn replace(
        &self,
        id: i32,
        fields: ClientFields,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<Option<Client>, ClientError> {
        // GREATEST keeps updated_at strictly increasing within one clock tick
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET
                first_name = $1,
                last_name = $2,
                address_line1 = $3,
                address_line2 = $4,
                city = $5,
                state = $6,
                zip_code = $7,
                phone_number = $8,
                email = $9,
                preferred_language = $10,
                date_of_birth = $11,
                emergency_contact_name = $12,
                emergency_contact_phone = $13,
                special_instructions = $14,
                is_active = $15,
                updated_at = GREATEST(CURRENT_TIMESTAMP, updated_at + INTERVAL '1 microsecond')
            WHERE client_id = $16 AND updated_at = $17
            RETURNING *
            "#,
        )
        .bind(fields.first_name)
        .bind(fields.last_name)
        .bind(fields.address_line1)
        .bind(fields.address_line2)
        .bind(fields.city)
        .bind(fields.state)
        .bind(fields.zip_code)
        .bind(fields.phone_number)
        .bind(fields.email)
        .bind(fields.preferred_language)
        .bind(fields.date_of_birth)
        .bind(fields.emergency_contact_name)
        .bind(fields.emergency_contact_phone)
        .bind(fields.special_instructions)
        .bind(fields.is_active)
        .bind(id)
        .bind(expected_updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(client)
    }

    async fn deactivate(&self, id: i32) -> Result<Option<ClientSummary>, ClientError> {
        let summary = sqlx::query_as::<_, ClientSummary>(
            r#"
            UPDATE clients
            SET is_active = FALSE,
                updated_at = GREATEST(CURRENT_TIMESTAMP, updated_at + INTERVAL '1 microsecond')
            WHERE client_id = $1
            RETURNING client_id, first_name, last_name, is_active
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(summary)
    }
}
