//! Thought history endpoints (read-only).

use actix_web::{web, HttpResponse};

use crate::error::NodeError;
use crate::state::NodeState;

/// GET /thoughts - every recorded thought, oldest first
pub async fn list_thoughts(state: web::Data<NodeState>) -> HttpResponse {
    HttpResponse::Ok().json(state.history.list_all().await)
}

/// GET /thoughts/latest - the newest thought, 404 until one exists
pub async fn latest_thought(state: web::Data<NodeState>) -> Result<HttpResponse, NodeError> {
    let record = state
        .history
        .latest()
        .await
        .map_err(|_| NodeError::NoThoughts)?;
    Ok(HttpResponse::Ok().json(record))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/thoughts", web::get().to(list_thoughts))
        .route("/thoughts/latest", web::get().to(latest_thought));
}
