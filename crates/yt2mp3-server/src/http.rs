use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::Method;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use yt2mp3_core::protocol::{DownloadBody, DownloadReply, HealthReply};
use yt2mp3_core::{DownloadRequest, Pipeline, RequestId};

#[derive(Clone)]
pub struct HttpState {
    pipeline: Arc<Pipeline>,
}

impl HttpState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Routes plus a permissive CORS layer; the callers are browser extensions
/// with arbitrary origins.
pub fn router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/download", post(download))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(
    bind_address: &str,
    port: u16,
    state: HttpState,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind_address, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health() -> Json<HealthReply> {
    Json(HealthReply::online())
}

/// Every failure becomes `{"status":"error","reason":..}` with HTTP 200.
async fn download(
    State(state): State<HttpState>,
    body: Result<Json<DownloadBody>, JsonRejection>,
) -> Json<DownloadReply> {
    let started = Instant::now();

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("HTTP API: rejected download body: {}", rejection.body_text());
            return Json(DownloadReply::error(rejection.body_text()));
        }
    };

    let id = RequestId::derive(&body.url, body.title.as_deref());
    info!(id = %id, "HTTP API: download requested: {}, title: {:?}", body.url, body.title);

    let request = match DownloadRequest::with_id(body.url, body.title, id.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!(id = %id, "HTTP API: {}", e);
            return Json(DownloadReply::error(e.to_string()));
        }
    };
    info!(id = %id, "HTTP API: detected platform {}", request.platform);

    // Own task per request so slow downloads never hold up other requests
    let pipeline = Arc::clone(&state.pipeline);
    let task = tokio::spawn(async move { pipeline.run(&request).await });

    let elapsed = || started.elapsed().as_secs_f64();
    let reply = match task.await {
        Ok(Ok(outcome)) => {
            info!(
                id = %id,
                "HTTP API: download completed in {:.2}s: {}",
                elapsed(),
                outcome.path.display()
            );
            DownloadReply::success(format!("Download completed in {:.1}s", elapsed()))
        }
        Ok(Err(e)) => {
            error!(id = %id, "HTTP API: download failed after {:.2}s: {}", elapsed(), e);
            DownloadReply::error(e.to_string())
        }
        Err(e) => {
            error!(id = %id, "HTTP API: download task aborted: {}", e);
            DownloadReply::error(format!("download task aborted: {}", e))
        }
    };
    Json(reply)
}
