use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::FailEnvelope;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("cannot find movie with id {0}")]
    NotFound(i32),

    #[error("no route for {0}")]
    NoRoute(String),

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("request timed out")]
    Timeout,

    #[error("store error: {0}")]
    Persistence(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::NoRoute(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<jiff::Error> for AppError {
    fn from(err: jiff::Error) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::NoRoute(_)
            | AppError::MethodNotAllowed(_) => {
                tracing::debug!(error = %self, "rejected request");
                self.to_string()
            },
            AppError::Timeout => {
                tracing::warn!("request timed out");
                self.to_string()
            },
            AppError::Persistence(err) => {
                tracing::error!(error = %err, "store operation failed");
                "failed to access the movie store".to_string()
            },
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                "internal error".to_string()
            },
        };

        (self.status(), Json(FailEnvelope::new(message))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
