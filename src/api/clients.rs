use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::AppState;
use super::error::{ApiError, ApiResult, Operation};
use crate::models::{Client, ClientListing, ClientPatch, ClientSummary, NewClient};

#[derive(Debug, Serialize)]
pub struct DeactivatedResponse {
    pub message: String,
    pub client: ClientSummary,
}

pub async fn list_clients(State(state): State<AppState>) -> ApiResult<Json<Vec<ClientListing>>> {
    let clients = state
        .clients
        .list()
        .await
        .map_err(|err| ApiError::from_client_error(Operation::List, None, err))?;

    Ok(Json(clients))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Client>> {
    let id = parse_id(&id)?;
    let client = state
        .clients
        .get(id)
        .await
        .map_err(|err| ApiError::from_client_error(Operation::Get, Some(id), err))?;

    Ok(Json(client))
}

pub async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let Json(body) = payload.map_err(reject_body)?;
    let new_client = NewClient::from_json(body)
        .map_err(|err| ApiError::from_client_error(Operation::Create, None, err))?;

    let client = state
        .clients
        .create(new_client)
        .await
        .map_err(|err| ApiError::from_client_error(Operation::Create, None, err))?;

    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Client>> {
    let id = parse_id(&id)?;
    let Json(body) = payload.map_err(reject_body)?;
    let patch = ClientPatch::from_json(body)
        .map_err(|err| ApiError::from_client_error(Operation::Update, Some(id), err))?;

    let client = state
        .clients
        .update(id, patch)
        .await
        .map_err(|err| ApiError::from_client_error(Operation::Update, Some(id), err))?;

    Ok(Json(client))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeactivatedResponse>> {
    let id = parse_id(&id)?;
    let client = state
        .clients
        .deactivate(id)
        .await
        .map_err(|err| ApiError::from_client_error(Operation::Deactivate, Some(id), err))?;

    Ok(Json(DeactivatedResponse {
        message: format!(
            "Client '{} {}' (ID: {}) has been marked as inactive.",
            client.first_name, client.last_name, id
        ),
        client,
    }))
}

fn parse_id(raw: &str) -> ApiResult<i32> {
    raw.parse::<i32>()
        .map_err(|_| ApiError::bad_request("Client id must be an integer."))
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    debug!(reason = %rejection.body_text(), "rejected request body");
    ApiError::bad_request("Request body must be valid JSON.")
}
