use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::auth::Authenticator;
use super::criteria::BandSet;
use super::metric::{Metric, ScoreLevel, MAX_METRIC_SCORE, MAX_TOTAL_SCORE};
use super::record::ScoreTier;
use super::repository::SnapshotStore;
use super::resolver::resolve_score;
use super::service::{ScorecardService, ScorecardServiceError};

const LEDGER_FILENAME: &str = "my_partners_scorecard.csv";

#[derive(Debug, Deserialize)]
pub struct BandUpdateRequest {
    pub metric: Metric,
    pub level: ScoreLevel,
    #[serde(default)]
    pub definition: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub performance: String,
    #[serde(default)]
    pub bands: BandSet,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub score: u8,
    pub tier: ScoreTier,
}

#[derive(Debug, Deserialize)]
pub struct ScorePartnerRequest {
    pub partner_name: String,
    #[serde(default)]
    pub performance: BTreeMap<Metric, String>,
}

/// Router builder exposing the scorecard operations over HTTP. Every route
/// sits behind the authenticator.
pub fn scorecard_router<S>(
    service: Arc<ScorecardService<S>>,
    authenticator: Arc<dyn Authenticator>,
) -> Router
where
    S: SnapshotStore + 'static,
{
    Router::new()
        .route("/api/v1/scorecard/metrics", get(metrics_handler))
        .route(
            "/api/v1/scorecard/criteria",
            get(criteria_handler::<S>).put(restore_criteria_handler::<S>),
        )
        .route("/api/v1/scorecard/criteria/bands", post(set_band_handler::<S>))
        .route("/api/v1/scorecard/resolve", post(resolve_handler))
        .route("/api/v1/scorecard/partners", post(score_partner_handler::<S>))
        .route(
            "/api/v1/scorecard/ledger",
            get(ledger_handler::<S>).post(import_ledger_handler::<S>),
        )
        .route_layer(middleware::from_fn_with_state(authenticator, require_bearer))
        .with_state(service)
}

pub(crate) async fn require_bearer(
    State(authenticator): State<Arc<dyn Authenticator>>,
    request: Request,
    next: Next,
) -> Response {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    if authenticator.authorize(bearer) {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "rejected unauthenticated scorecard request");
    let payload = json!({ "error": "missing or invalid bearer token" });
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(payload),
    )
        .into_response()
}

pub(crate) async fn metrics_handler() -> Json<serde_json::Value> {
    let metrics: Vec<&'static str> = Metric::ordered().iter().map(|m| m.label()).collect();
    Json(json!({
        "metrics": metrics,
        "max_metric_score": MAX_METRIC_SCORE,
        "max_total_score": MAX_TOTAL_SCORE,
    }))
}

pub(crate) async fn criteria_handler<S>(
    State(service): State<Arc<ScorecardService<S>>>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
        service.criteria_snapshot(),
    )
        .into_response()
}

pub(crate) async fn restore_criteria_handler<S>(
    State(service): State<Arc<ScorecardService<S>>>,
    body: String,
) -> Response
where
    S: SnapshotStore + 'static,
{
    match service.restore_criteria(&body) {
        Ok(()) => {
            let configured = service.criteria().is_configured();
            (
                StatusCode::OK,
                Json(json!({ "status": "restored", "configured": configured })),
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn set_band_handler<S>(
    State(service): State<Arc<ScorecardService<S>>>,
    Json(update): Json<BandUpdateRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    match service.set_band(update.metric, update.level, &update.definition) {
        Ok(()) => {
            let bands = service.criteria().get(update.metric).clone();
            (
                StatusCode::OK,
                Json(json!({ "metric": update.metric, "bands": bands })),
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn resolve_handler(Json(request): Json<ResolveRequest>) -> Json<ResolveResponse> {
    let score = resolve_score(&request.performance, &request.bands);
    Json(ResolveResponse {
        score,
        tier: ScoreTier::for_score(score),
    })
}

pub(crate) async fn score_partner_handler<S>(
    State(service): State<Arc<ScorecardService<S>>>,
    Json(request): Json<ScorePartnerRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    match service.score_partner(&request.partner_name, &request.performance) {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn ledger_handler<S>(State(service): State<Arc<ScorecardService<S>>>) -> Response
where
    S: SnapshotStore + 'static,
{
    match service.ledger_snapshot() {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{LEDGER_FILENAME}\""),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn import_ledger_handler<S>(
    State(service): State<Arc<ScorecardService<S>>>,
    body: String,
) -> Response
where
    S: SnapshotStore + 'static,
{
    match service.import_ledger(&body) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: ScorecardServiceError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        warn!(error = %err, "scorecard request failed");
    }
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
