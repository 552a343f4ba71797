use actix_web::{HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug)]
pub enum NodeError {
    /// History is empty
    NoThoughts,
    /// Internal error
    Internal(String),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::NoThoughts => write!(f, "no thoughts in history"),
            NodeError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for NodeError {}

impl ResponseError for NodeError {
    fn error_response(&self) -> HttpResponse {
        match self {
            // Expected before the first thought lands, not an error worth logging.
            NodeError::NoThoughts => HttpResponse::NotFound().json(serde_json::json!({
                "error": "not_found",
                "message": "No thoughts in history"
            })),
            NodeError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                }))
            }
        }
    }
}
