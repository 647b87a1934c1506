use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hermes_core::errors::Error as CoreError;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Core(CoreError::InvalidInstrument(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_instrument")
            }
            ApiError::Core(CoreError::InvalidRequest(_)) | ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request")
            }
            ApiError::Core(CoreError::BacktestInput(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_backtest_input")
            }
            ApiError::Core(CoreError::MarketDataUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "market_data_unavailable")
            }
            ApiError::Core(CoreError::Configuration(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "Request failed");
        } else {
            tracing::debug!(code, error = %self, "Request rejected");
        }
        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
