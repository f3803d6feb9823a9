use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::ClientError;

pub type ApiResult<T> = Result<T, ApiError>;

/// The operation a failure happened in; picks the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Deactivate,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::List => "list_clients",
            Operation::Get => "get_client",
            Operation::Create => "create_client",
            Operation::Update => "update_client",
            Operation::Deactivate => "deactivate_client",
        }
    }

    fn not_found_message(self) -> &'static str {
        match self {
            Operation::Update => "Client not found for update.",
            Operation::Deactivate => "Client not found for deletion.",
            Operation::List | Operation::Get | Operation::Create => "Client not found.",
        }
    }

    fn server_error_message(self) -> &'static str {
        match self {
            Operation::List => "Server error while fetching clients.",
            Operation::Get => "Server error while fetching client.",
            Operation::Create => "Server error while creating client.",
            Operation::Update => "Server error while updating client.",
            Operation::Deactivate => "Server error while deleting client.",
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            detail: None,
        }
    }

    /// Translate and log a failure of `operation` on client `id`.
    pub fn from_client_error(operation: Operation, id: Option<i32>, error: ClientError) -> Self {
        let op = operation.name();
        match error {
            ClientError::Validation(message) => {
                debug!(operation = op, client_id = ?id, %message, "rejected invalid request");
                Self::bad_request(message)
            }
            ClientError::NotFound(missing) => {
                debug!(operation = op, client_id = missing, "client not found");
                Self {
                    status: StatusCode::NOT_FOUND,
                    message: operation.not_found_message().to_string(),
                    detail: None,
                }
            }
            ClientError::UniqueViolation { detail } => {
                warn!(
                    operation = op,
                    client_id = ?id,
                    detail = ?detail,
                    "unique constraint violated"
                );
                Self {
                    status: StatusCode::CONFLICT,
                    message: "Client with this identifier already exists.".to_string(),
                    detail,
                }
            }
            ClientError::StaleWrite(stale) => {
                warn!(operation = op, client_id = stale, "concurrent modification detected");
                Self {
                    status: StatusCode::CONFLICT,
                    message: "Client was modified by another request; reload and retry the update."
                        .to_string(),
                    detail: None,
                }
            }
            ClientError::IdsExhausted => {
                error!(operation = op, "client id sequence exhausted");
                Self::server_error(operation)
            }
            ClientError::Storage(source) => {
                error!(operation = op, client_id = ?id, error = %source, "storage failure");
                Self::server_error(operation)
            }
        }
    }

    fn server_error(operation: Operation) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: operation.server_error_message().to_string(),
            detail: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message,
            detail: self.detail,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_wording_depends_on_the_operation() {
        let err = ApiError::from_client_error(Operation::Update, Some(9), ClientError::NotFound(9));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Client not found for update.");

        let err =
            ApiError::from_client_error(Operation::Deactivate, Some(9), ClientError::NotFound(9));
        assert_eq!(err.message(), "Client not found for deletion.");
    }

    #[test]
    fn storage_failures_hide_the_database_text() {
        let err = ApiError::from_client_error(
            Operation::List,
            None,
            ClientError::Storage(sqlx::Error::PoolTimedOut),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Server error while fetching clients.");
    }

    #[test]
    fn exhausted_ids_are_a_server_error() {
        let err = ApiError::from_client_error(Operation::Create, None, ClientError::IdsExhausted);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Server error while creating client.");
    }

    #[test]
    fn conflicts_are_409() {
        let unique = ApiError::from_client_error(
            Operation::Create,
            None,
            ClientError::UniqueViolation {
                detail: Some("Key (client_id)=(1) already exists.".to_string()),
            },
        );
        assert_eq!(unique.status(), StatusCode::CONFLICT);
        assert!(unique.detail.is_some());

        let stale =
            ApiError::from_client_error(Operation::Update, Some(1), ClientError::StaleWrite(1));
        assert_eq!(stale.status(), StatusCode::CONFLICT);
        assert!(stale.detail.is_none());
    }
}
