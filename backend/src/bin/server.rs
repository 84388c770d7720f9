//! HTTP entrypoint: thin axum surface over the resolution pipeline, entity
//! lookups, review moderation, and monitoring reads. Admin routes sit behind
//! the internal API key middleware; everything else is public.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use ues_engine::config::Config;
use ues_engine::db::reader::{self, ReviewFilter};
use ues_engine::domain::EntityType;
use ues_engine::error::{ApiError, ApiResult};
use ues_engine::monitoring::generate_triage_report;
use ues_engine::qa::report::build_quality_report;
use ues_engine::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = Config::load()?;
    let host = config.server.host.clone();
    let port = config.server.port;
    let state = AppState::init(config).await?;

    let admin_routes = Router::new()
        .route("/validation/reviews", get(list_reviews))
        .route("/validation/reviews/:id", get(get_review))
        .route("/validation/reviews/:id/approve", post(approve_review))
        .route("/validation/reviews/:id/reject", post(reject_review))
        .route("/monitoring/anomalies", get(list_anomalies))
        .route("/monitoring/triage", post(run_triage))
        .route("/monitoring/report", get(monitoring_report))
        .layer(middleware::from_fn_with_state(state.clone(), require_internal_api_key));

    let app = Router::new()
        .route("/health", get(health))
        .route("/mapping/run", post(run_mapping))
        .route("/ues/player/:ues_id", get(get_player))
        .route("/ues/player/:ues_id/lineage", get(get_player_lineage))
        .route("/lookup/player/by-alpha/:id", get(lookup_player_by_alpha))
        .route("/lookup/player/by-beta/:id", get(lookup_player_by_beta))
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{host}:{port}");
    tracing::info!(%addr, "starting ues-server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Admin-route gate: compares `X-Internal-API-Key` against the configured
/// key. 500 when no key is configured at all (operator error, not a client
/// one), 401 on any mismatch or missing header.
async fn require_internal_api_key(State(state): State<AppState>, req: axum::extract::Request, next: Next) -> Result<Response, ApiError> {
    let expected = state.config.database.internal_api_key.as_deref().ok_or_else(|| {
        tracing::warn!("admin route requested but INTERNAL_API_KEY is not configured");
        ApiError::InternalApiKeyMissing
    })?;

    let provided = req
        .headers()
        .get("X-Internal-API-Key")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!(path = %req.uri(), "missing X-Internal-API-Key header");
            ApiError::Unauthorized
        })?;

    if provided != expected {
        tracing::warn!(path = %req.uri(), "X-Internal-API-Key mismatch");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct RunMappingResponse {
    run_id: String,
    status: String,
}

async fn run_mapping(State(state): State<AppState>) -> ApiResult<Json<RunMappingResponse>> {
    let outcome = state.run_pipeline(None).await?;
    Ok(Json(RunMappingResponse { run_id: outcome.run_id, status: outcome.quality_gate.status.as_str().to_string() }))
}

async fn get_player(State(state): State<AppState>, Path(ues_id): Path<String>) -> ApiResult<Response> {
    match reader::get_player(&state.pools.ues, &ues_id).await? {
        Some(player) => Ok(Json(player).into_response()),
        None => Err(ApiError::not_found(format!("player {ues_id}"))),
    }
}

async fn get_player_lineage(State(state): State<AppState>, Path(ues_id): Path<String>) -> ApiResult<Response> {
    let sources = reader::get_player_lineage(&state.pools.ues, &ues_id).await?;
    Ok(Json(sources).into_response())
}

#[derive(Debug, Serialize)]
struct LookupResponse {
    ues_id: Option<String>,
}

async fn lookup_player_by_alpha(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<LookupResponse>> {
    let ues_id = reader::lookup_player_by_alpha(&state.pools.ues, &id).await?;
    Ok(Json(LookupResponse { ues_id }))
}

async fn lookup_player_by_beta(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<LookupResponse>> {
    let ues_id = reader::lookup_player_by_beta(&state.pools.ues, &id).await?;
    Ok(Json(LookupResponse { ues_id }))
}

#[derive(Debug, Deserialize)]
struct ReviewQuery {
    status: Option<String>,
    entity_type: Option<EntityType>,
    run_id: Option<String>,
    min_score: Option<f64>,
    max_score: Option<f64>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_reviews(State(state): State<AppState>, Query(query): Query<ReviewQuery>) -> ApiResult<Response> {
    let filter = ReviewFilter {
        status: query.status,
        entity_type: query.entity_type,
        run_id: query.run_id,
        min_score: query.min_score,
        max_score: query.max_score,
        limit: query.limit.unwrap_or(50).clamp(1, 500),
        offset: query.offset.unwrap_or(0).max(0),
    };
    let reviews = reader::list_reviews(&state.pools.ues, &filter).await?;
    Ok(Json(reviews).into_response())
}

async fn get_review(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Response> {
    match reader::get_review(&state.pools.ues, id).await? {
        Some(review) => Ok(Json(review).into_response()),
        None => Err(ApiError::not_found(format!("review {id}"))),
    }
}

async fn approve_review(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    reader::update_review_status(&state.pools.ues, id, "approved").await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reject_review(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    reader::update_review_status(&state.pools.ues, id, "rejected").await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct AnomalyQuery {
    run_id: Option<String>,
}

async fn list_anomalies(State(state): State<AppState>, Query(query): Query<AnomalyQuery>) -> ApiResult<Response> {
    let anomalies = reader::list_anomalies(&state.pools.ues, query.run_id.as_deref()).await?;
    Ok(Json(anomalies).into_response())
}

#[derive(Debug, Deserialize)]
struct TriageQuery {
    run_id: String,
    entity_type: EntityType,
}

async fn run_triage(State(state): State<AppState>, Query(query): Query<TriageQuery>) -> ApiResult<Response> {
    let report = generate_triage_report(
        &state.pools.ues,
        state.llm_client.as_ref(),
        &state.config.llm_validation,
        &query.run_id,
        query.entity_type,
    )
    .await;
    Ok(Json(report).into_response())
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    run_id: String,
}

async fn monitoring_report(State(state): State<AppState>, Query(query): Query<ReportQuery>) -> ApiResult<Response> {
    let report = build_quality_report(&state.pools.ues, &query.run_id).await?;
    Ok(Json(report).into_response())
}
