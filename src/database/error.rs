use thiserror::Error;

use super::validate::ValidationError;

/// Request-level error taxonomy. Every action is terminal per request;
/// the consuming server maps `status_code` onto its HTTP reply.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::PermissionDenied(_) => 403,
            Self::Internal(_) => 500,
        }
    }
}

impl warp::reject::Reject for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

enum QueryErrorKind {
    Conflict,
    NotFound,
    Other,
}

pub struct QueryError {
    kind: QueryErrorKind,
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            kind: QueryErrorKind::Other,
            info,
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) if e.is_unique_violation() => Self {
                kind: QueryErrorKind::Conflict,
                info: format!("{e}"),
            },
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self {
                kind: QueryErrorKind::NotFound,
                info: String::from("Row not found"),
            },
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::AnyDriverError(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(String::from("Unknown error")),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        match value.kind {
            QueryErrorKind::Conflict => Self::Conflict(value.info),
            QueryErrorKind::NotFound => Self::NotFound(value.info),
            QueryErrorKind::Other => {
                log::error!("query failed: {}", value.info);
                Self::Internal(value.info)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Validation(String::new()).status_code(), 400);
        assert_eq!(ApiError::NotFound(String::new()).status_code(), 404);
        assert_eq!(ApiError::Conflict(String::new()).status_code(), 409);
        assert_eq!(ApiError::PermissionDenied(String::new()).status_code(), 403);
        assert_eq!(ApiError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_validation_error_keeps_message() {
        let error: ApiError = ValidationError::NoTags.into();
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.to_string(), ValidationError::NoTags.to_string());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error: ApiError = QueryError::from(sqlx::Error::RowNotFound).into();
        assert_eq!(error.status_code(), 404);
    }
}
