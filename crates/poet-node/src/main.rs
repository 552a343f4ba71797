//! poet-node: serves the thought history over HTTP while the soul thinks.
//!
//! Loads configuration, builds the soul, starts its think loop, and runs the
//! actix-web server until shutdown.

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use poet_node::{metrics::register_metrics, routes, NodeConfig, NodeState};
use poet_soul::{Soul, SoulConfig};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = NodeConfig::from_env().expect("Failed to load configuration");

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting poet-node on {}:{}", config.host, config.port);

    // ── Soul init ───────────────────────────────────────────────────────
    // Soul failures are non-fatal: the node still serves an (empty) history.
    let soul = match SoulConfig::from_env() {
        Ok(soul_config) => {
            tracing::info!(
                provider = soul_config.provider.as_str(),
                model = %soul_config.llm_model,
                "Soul config loaded"
            );
            match Soul::new(&soul_config) {
                Ok(soul) => soul,
                Err(e) => {
                    tracing::warn!("Soul init failed (non-fatal): {e}");
                    Soul::with_model(&soul_config, None)
                }
            }
        }
        Err(e) => {
            tracing::warn!("Soul config failed (non-fatal): {e}");
            Soul::with_model(&SoulConfig::default(), None)
        }
    };

    let think_loop = soul.spawn();
    if soul.is_dormant() {
        tracing::warn!("Soul dormant (no LLM API key), history will stay empty");
    } else {
        tracing::info!("Soul spawned");
    }

    let node_state = NodeState::from_soul(&soul);
    let node_data = web::Data::new(node_state.clone());

    register_metrics();

    // ── Rate limiter ────────────────────────────────────────────────────
    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(config.rate_limit_rpm as u64)
        .finish()
        .expect("Failed to create rate limiter config");

    let static_dir = config
        .static_dir
        .clone()
        .filter(|dir| Path::new(dir).join("index.html").is_file());
    match (&config.static_dir, &static_dir) {
        (_, Some(dir)) => tracing::info!("Serving front-end from: {}", dir),
        (Some(dir), None) => tracing::info!("No front-end at {}, serving API only", dir),
        (None, None) => {}
    }

    let allowed_origins = config.allowed_origins.clone();

    // ── HTTP server ─────────────────────────────────────────────────────
    let result = HttpServer::new(move || {
        let cors = poet_node::cors::build_cors(&allowed_origins);

        let mut app = App::new()
            .app_data(node_data.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Governor::new(&governor_conf))
            .configure(routes::thoughts::configure)
            .configure(routes::health::configure);

        // Serve the front-end last (catch-all) if present
        if let Some(ref dir) = static_dir {
            app = app.service(actix_files::Files::new("/", dir).index_file("index.html"));
        } else {
            app = app.route("/", web::get().to(routes::health::root));
        }

        app
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    // ── Shutdown ────────────────────────────────────────────────────────
    if let Some(thinker) = &node_state.thinker {
        thinker.stop();
    }
    if let Some(handle) = think_loop {
        handle.abort();
    }
    tracing::info!("poet-node stopped");

    result
}
