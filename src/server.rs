use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use std::time::Duration;

use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::cache::{CACHE_STATUS_HEADER, CachePolicy, CacheStatus};
use crate::config::AppConfig;
use crate::error::{RenderError, chain};
use crate::router::ViewStatus;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Start the HTTP front door with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = AppState::from_config(Arc::clone(&config)).await?;

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        mode = ?config.app.mode,
        cache = config.cache.enabled,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Build the full router: static assets, the optional API proxy, and the
/// catch-all render handler, wrapped in the timeout and trace layers.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let mut app = Router::new();

    if config.server.proxy_api {
        let prefix = config.data_api.strip_prefix.trim_end_matches('/');
        app = app
            .route(prefix, get(api_proxy))
            .route(&format!("{prefix}/{{*path}}"), get(api_proxy));
    }

    if config.app.mode.is_production() {
        app = app.nest_service(
            &config.paths.static_prefix,
            ServeDir::new(&config.paths.static_dir),
        );
    }

    let timeout_duration = Duration::from_secs(config.server.request_timeout_secs);

    app.fallback(ssr_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(
                    move |req: Request, next: Next| {
                        let duration = timeout_duration;
                        async move {
                            match tokio::time::timeout(duration, next.run(req)).await {
                                Ok(res) => res,
                                Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out")
                                    .into_response(),
                            }
                        }
                    },
                )),
        )
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Any path: serve from the render cache or render, then apply cache policy.
async fn ssr_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let key = CachePolicy::key(&uri);
    let bypass = state.policy.bypasses(uri.path());

    if !bypass {
        if let Some(html) = state.cache.get(&key).await {
            debug!(name: "render_cache.hit", key = %key, "Render cache hit");
            return html_response(&state, StatusCode::OK, CacheStatus::Hit, html.to_string());
        }
    }

    let cache_status = if bypass {
        CacheStatus::Bypass
    } else {
        CacheStatus::Miss
    };

    match state.pipeline.render_url(&key, None).await {
        Ok(page) => {
            let status = match page.status {
                ViewStatus::Found => StatusCode::OK,
                ViewStatus::NotFound => StatusCode::NOT_FOUND,
            };
            if !bypass && status == StatusCode::OK {
                state.cache.set(key.as_str(), page.html.as_str()).await;
            }
            debug!(
                name: "ssr.response",
                key = %key,
                route = page.route,
                status = status.as_u16(),
                cache = ?cache_status,
                "Page served"
            );
            html_response(&state, status, cache_status, page.html)
        }
        Err(err) => render_failure(&state, &key, &err, cache_status),
    }
}

/// GET under the proxy prefix: relay the Data API response as-is.
async fn api_proxy(State(state): State<AppState>, uri: Uri) -> Response {
    let path = CachePolicy::key(&uri);
    match state.api.get_raw(&path).await {
        Ok(upstream) => {
            let status =
                StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut response = (status, upstream.body).into_response();
            if let Some(value) = upstream
                .content_type
                .as_deref()
                .and_then(|ct| HeaderValue::from_str(ct).ok())
            {
                response.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            response
        }
        Err(err) => {
            warn!(name: "api_proxy.failed", path = %path, error = %chain(&err), "Data API proxy failed");
            (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
        }
    }
}

fn html_response(
    state: &AppState,
    status: StatusCode,
    cache_status: CacheStatus,
    body: String,
) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(HTML_CONTENT_TYPE),
    );
    if state.config.cache.debug_header {
        headers.insert(CACHE_STATUS_HEADER, cache_status.header_value());
    }
    response
}

/// 500 page. Production gets a generic body; development sees the cause chain.
fn render_failure(
    state: &AppState,
    key: &str,
    err: &RenderError,
    cache_status: CacheStatus,
) -> Response {
    let detail = chain(err);
    error!(name: "ssr.failed", key = %key, error = %detail, "Render failed");

    let body = if state.config.app.mode.is_production() {
        "<!doctype html><title>Server Error</title><h1>Internal Server Error</h1>".to_string()
    } else {
        format!(
            "<!doctype html><title>Server Error</title><h1>Render failed</h1><pre>{}</pre>",
            html_escape::encode_text(&detail)
        )
    };
    html_response(state, StatusCode::INTERNAL_SERVER_ERROR, cache_status, body)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!(name: "server.shutdown", "Shutdown signal received");
}
