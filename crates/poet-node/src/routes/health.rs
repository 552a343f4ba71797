use actix_web::{web, HttpResponse};

use crate::error::NodeError;
use crate::metrics::{self, REGISTRY};
use crate::state::NodeState;

/// GET / - liveness banner, mounted only when no front-end is served
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "Poet API is running",
    }))
}

/// GET /health - service and thinker status
pub async fn health(state: web::Data<NodeState>) -> HttpResponse {
    let thoughts = state.history.len().await;
    let uptime_secs = (chrono::Utc::now() - state.started_at).num_seconds().max(0);

    let mut response = serde_json::json!({
        "status": "ok",
        "service": "poet",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime_secs,
        "dormant": state.is_dormant(),
        "thinking": false,
        "phase": null,
        "thoughts": thoughts,
        "cycles": 0,
        "failures": 0,
        "current_prompt": null,
    });

    if let Some(ref thinker) = state.thinker {
        let status = thinker.status();
        response["thinking"] = serde_json::json!(status.running);
        response["phase"] = serde_json::json!(status.phase);
        response["cycles"] = serde_json::json!(status.cycles);
        response["failures"] = serde_json::json!(status.failures);
        response["current_prompt"] = serde_json::json!(status.current_prompt);
        response["last_thought_at"] = serde_json::json!(status.last_thought_at);
    }

    HttpResponse::Ok().json(response)
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics(state: web::Data<NodeState>) -> Result<HttpResponse, NodeError> {
    use prometheus::Encoder;

    metrics::register_metrics();
    metrics::refresh(&state).await;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();

    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| NodeError::Internal(format!("failed to encode metrics: {e}")))?;

    Ok(HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics));
}
