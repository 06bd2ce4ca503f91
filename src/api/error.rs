use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::leave::error::LeaveError;

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
            LeaveError::Overlap { .. } | LeaveError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            LeaveError::MissingReplacement => StatusCode::UNPROCESSABLE_ENTITY,
            LeaveError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            LeaveError::Store(e) => {
                tracing::error!(error = %e, "Leave store failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
