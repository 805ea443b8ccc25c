//! Stand-in backend for exercising the supervisor
//!
//! Serves the health route and static files from STATIC_DIR. Flags make it
//! slow to become healthy, never healthy, or deaf to SIGTERM so each branch
//! of the supervisor can be driven against a real process.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use shared::{ComponentId, component_info, component_warn, logging};

#[derive(Parser, Debug)]
#[command(name = "stub_backend")]
#[command(about = "Minimal backend answering a health route")]
struct Args {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    #[arg(long, default_value = "/api/health")]
    health_path: String,

    /// Directory mounted at /static
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Answer 503 on the health route until this much time has passed
    #[arg(long, default_value_t = 0)]
    healthy_after_ms: u64,

    /// Never answer the health route with success
    #[arg(long)]
    never_healthy: bool,

    /// Keep running on SIGTERM (only SIGKILL stops it)
    #[arg(long)]
    ignore_sigterm: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

struct Readiness {
    started: Instant,
    healthy_after: Duration,
    never_healthy: bool,
}

impl Readiness {
    fn is_ready(&self) -> bool {
        !self.never_healthy && self.started.elapsed() >= self.healthy_after
    }
}

async fn health(State(readiness): State<Arc<Readiness>>) -> (StatusCode, Json<Value>) {
    if readiness.is_ready() {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "starting" })))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    ComponentId::init_stub_backend();
    logging::init_tracing_with_level(Some(&args.log_level));

    let readiness = Arc::new(Readiness {
        started: Instant::now(),
        healthy_after: Duration::from_millis(args.healthy_after_ms),
        never_healthy: args.never_healthy,
    });

    let mut app = Router::new()
        .route(&args.health_path, get(health))
        .with_state(readiness);
    if let Some(static_dir) = &args.static_dir {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    }
    let app = app.layer(CorsLayer::permissive());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    logging::log_startup(ComponentId::current(), &format!("stub backend on http://{addr}"));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(args.ignore_sigterm))
        .await?;

    logging::log_shutdown(ComponentId::current(), "signal received");
    Ok(())
}

async fn shutdown_signal(ignore_sigterm: bool) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                logging::log_error(ComponentId::current(), "Installing SIGTERM handler", &e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => return,
                _ = terminate.recv() => {
                    if ignore_sigterm {
                        component_warn!(ComponentId::current(), "🙉 Ignoring SIGTERM");
                        continue;
                    }
                    component_info!(ComponentId::current(), "📥 SIGTERM received");
                    return;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ignore_sigterm;
        let _ = tokio::signal::ctrl_c().await;
    }
}
