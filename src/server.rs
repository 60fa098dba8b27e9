use crate::{
    api::{ApiResponse, ClipPayload, HealthResponse, SaveResult},
    config::Config,
    errors::{into_response, AppError, AppResult},
    security,
    vault::{SaveOutcome, SaveRequest, VaultWriter},
};
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub writer: Arc<VaultWriter>,
    pub rls: security::RateLimiters,
}

impl AppState {
    pub fn new(cfg: Config, writer: VaultWriter) -> Self {
        Self {
            rls: security::RateLimiters::from_limits(&cfg.limits),
            cfg: Arc::new(cfg),
            writer: Arc::new(writer),
        }
    }
}

pub async fn serve(cfg: Config, writer: VaultWriter) -> anyhow::Result<()> {
    let shared = AppState::new(cfg, writer);
    let app = build_router(shared.clone());

    let addr: std::net::SocketAddr = format!("{}:{}", shared.cfg.server.bind_addr, shared.cfg.server.port)
        .parse()
        .context("parsing bind address")?;
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

pub fn build_router(shared: AppState) -> Router {
    let limit_bytes = shared.cfg.max_body_bytes();
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(24 * 60 * 60));
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/save", post(save).layer(DefaultBodyLimit::max(limit_bytes)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

async fn save(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ClipPayload>, JsonRejection>,
) -> Response {
    use std::time::Instant;
    let started = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();
    let token_present = security::extract_bearer(&headers).is_some();

    let mut audit = Audit { request_id: &request_id, token_present, ..Audit::default() };
    let result = handle_save(&state, &headers, payload, &mut audit).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(outcome) => {
            audit.finish("allow", "OK", duration_ms, Some(&outcome));
            (StatusCode::OK, Json(ApiResponse::success(SaveResult::from(outcome)))).into_response()
        }
        Err(e) => {
            let decision = match e {
                AppError::Unauthorized(_) | AppError::RateLimited | AppError::RequestTooLarge => "deny",
                _ => "error",
            };
            audit.finish(decision, e.label(), duration_ms, None);
            into_response(e).into_response()
        }
    }
}

async fn handle_save(
    state: &AppState,
    headers: &HeaderMap,
    payload: Result<Json<ClipPayload>, JsonRejection>,
    audit: &mut Audit<'_>,
) -> AppResult<SaveOutcome> {
    security::require_bearer(headers, &state.cfg.auth.token)?;
    security::content_length_ok(headers, state.cfg.max_body_bytes())?;
    state.rls.check(security::extract_bearer(headers).as_deref())?;

    let Json(payload) = payload.map_err(AppError::from_rejection)?;
    audit.domain = payload.metadata.domain.clone();
    let request = SaveRequest::from(payload);
    audit.title_len = request.title.chars().count();
    audit.tags = request.tags.len();
    audit.assets = request.assets.len();

    // reject bad asset names before anything touches the vault
    for asset in &request.assets {
        state.writer.sanitizer().validate_asset_filename(&asset.filename)?;
    }

    let writer = state.writer.clone();
    let outcome = tokio::task::spawn_blocking(move || writer.save(&request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(outcome)
}

#[derive(Default)]
struct Audit<'a> {
    request_id: &'a str,
    token_present: bool,
    domain: String,
    title_len: usize,
    tags: usize,
    assets: usize,
}

impl Audit<'_> {
    fn finish(&self, decision: &str, code: &str, duration_ms: u64, outcome: Option<&SaveOutcome>) {
        tracing::info!(
            request_id = self.request_id,
            token_present = self.token_present,
            domain = %self.domain,
            title_len = self.title_len,
            tags = self.tags,
            assets = self.assets,
            decision = decision,
            code = code,
            duration_ms = duration_ms,
            article_dir = outcome.map(|o| o.article_dir.as_str()),
            "audit"
        );
    }
}
