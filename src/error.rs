use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Check constraint violated: {0}")]
    CheckViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Insufficient stock for item {item_id}")]
    OutOfStock { item_id: Uuid },

    #[error("Database error")]
    DbError(sqlx::Error),

    #[error("ORM error")]
    OrmError(sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

// Postgres SQLSTATE class 23 (integrity constraint violation) codes. The
// store reports these synchronously as typed errors; callers decide whether
// to retry.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let message = db_err.message().to_string();
            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    UNIQUE_VIOLATION => return AppError::UniqueViolation(message),
                    FOREIGN_KEY_VIOLATION => return AppError::ForeignKeyViolation(message),
                    CHECK_VIOLATION => return AppError::CheckViolation(message),
                    _ => {}
                }
            }
        }
        AppError::DbError(err)
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => {
                AppError::UniqueViolation(msg)
            }
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(msg)) => {
                AppError::ForeignKeyViolation(msg)
            }
            _ => AppError::OrmError(err),
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::UniqueViolation(_) => StatusCode::CONFLICT,
            AppError::OutOfStock { .. } => StatusCode::CONFLICT,
            AppError::CheckViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ForeignKeyViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::OrmError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::AppError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use uuid::Uuid;

    #[test]
    fn violation_variants_map_to_expected_statuses() {
        let cases = [
            (
                AppError::UniqueViolation("duplicate username".into()),
                StatusCode::CONFLICT,
            ),
            (
                AppError::OutOfStock {
                    item_id: Uuid::new_v4(),
                },
                StatusCode::CONFLICT,
            ),
            (
                AppError::CheckViolation("available >= 0".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::ForeignKeyViolation("missing parent".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
