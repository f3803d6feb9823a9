use thiserror::Error;

/// Failures of the client operations, before they are shaped for HTTP.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("client {0} not found")]
    NotFound(i32),
    #[error("unique constraint violated")]
    UniqueViolation { detail: Option<String> },
    #[error("client {0} was modified concurrently")]
    StaleWrite(i32),
    #[error("client id sequence exhausted")]
    IdsExhausted,
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Map a sqlx failure, pulling out unique violations (SQLSTATE 23505).
pub fn map_sqlx_error(error: sqlx::Error) -> ClientError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.code().as_deref() == Some("23505") {
            let detail = db_error
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .and_then(|pg_error| pg_error.detail())
                .map(str::to_string);
            return ClientError::UniqueViolation { detail };
        }
    }
    ClientError::Storage(error)
}
