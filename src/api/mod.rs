use std::sync::Arc;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::ClientService;

pub mod clients;
pub mod error;

use clients::{create_client, delete_client, get_client, list_clients, update_client};

#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<ClientService>,
}

impl AppState {
    pub fn new(clients: Arc<ClientService>) -> Self {
        Self { clients }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/api/clients", get(list_clients).post(create_client))
        .route(
            "/api/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Senior Service Management Application API!" }))
}
