use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use snafu::Snafu;

use crate::database::DatabaseError;
use crate::model::ParseVideoId;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("{message}"))]
    InvalidQuery { message: String },

    #[snafu(display("{source}"))]
    InvalidVideoId { source: ParseVideoId },

    #[snafu(display("no highlight stored for video `{video_id}`"))]
    NotFound { video_id: String },

    #[snafu(display("storage is unavailable"))]
    Storage { source: DatabaseError },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidQuery { .. } | ApiError::InvalidVideoId { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let ApiError::Storage { source } = &self {
            tracing::error!(error = %source, "query failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
