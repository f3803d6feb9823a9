use std::sync::Arc;

use tracing::debug;

use crate::db::ClientStore;
use crate::error::ClientError;
use crate::models::{Client, ClientListing, ClientPatch, ClientSummary, NewClient};

/// Client lifecycle on top of a store: validation runs before any store call.
#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn ClientStore>,
}

impl ClientService {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<ClientListing>, ClientError> {
        self.store.list().await
    }

    pub async fn get(&self, id: i32) -> Result<Client, ClientError> {
        self.store.get(id).await?.ok_or(ClientError::NotFound(id))
    }

    pub async fn create(&self, payload: NewClient) -> Result<Client, ClientError> {
        let fields = payload.validate()?;
        let client = self.store.insert(fields).await?;
        debug!(client_id = client.client_id, "client created");
        Ok(client)
    }

    /// Read the row, overlay the patch and write it back.
    ///
    /// The write only lands if the row is unchanged since the read;
    /// otherwise the caller gets `StaleWrite` and nothing is written.
    pub async fn update(&self, id: i32, patch: ClientPatch) -> Result<Client, ClientError> {
        patch.validate()?;

        let current = self.get(id).await?;
        let read_at = current.updated_at;
        let fields = patch.merge(&current);

        let updated = self
            .store
            .replace(id, fields, read_at)
            .await?
            .ok_or(ClientError::StaleWrite(id))?;

        debug!(client_id = id, "client updated");
        Ok(updated)
    }

    pub async fn deactivate(&self, id: i32) -> Result<ClientSummary, ClientError> {
        let summary = self
            .store
            .deactivate(id)
            .await?
            .ok_or(ClientError::NotFound(id))?;

        debug!(client_id = id, "client deactivated");
        Ok(summary)
    }
}
