use crate::infra::{AppState, DashboardContext};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use opsboard::dashboard::aggregate::AggregatePolicy;
use opsboard::dashboard::dataset::{Dataset, DatasetError};
use opsboard::dashboard::filter::{FilterCriteria, MalformedRange, Selection};
use opsboard::dashboard::score::ScoringStrategy;
use opsboard::dashboard::DashboardReport;
use opsboard::error::AppError;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Filter, aggregation, and scoring choices for one report render. Dates
/// arrive as raw strings on purpose: a malformed range must fall back to the
/// unfiltered dataset (flagged in the response) instead of failing the
/// request.
#[derive(Debug, Deserialize)]
pub(crate) struct ReportRequest {
    #[serde(default)]
    pub(crate) date_start: Option<String>,
    #[serde(default)]
    pub(crate) date_end: Option<String>,
    #[serde(default)]
    pub(crate) agents: Selection,
    #[serde(default)]
    pub(crate) zones: Selection,
    #[serde(default)]
    pub(crate) strategy: ScoringStrategy,
    #[serde(default)]
    pub(crate) aggregation: PolicyPreset,
}

/// Named aggregation policy versions; both historical variants stay
/// selectable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PolicyPreset {
    #[default]
    Classic,
    RatingSum,
}

impl PolicyPreset {
    fn to_policy(self) -> AggregatePolicy {
        match self {
            PolicyPreset::Classic => AggregatePolicy::classic(),
            PolicyPreset::RatingSum => AggregatePolicy::rating_sum(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentPayload {
    pub(crate) comment: String,
}

pub(crate) fn with_dashboard_routes(context: Arc<DashboardContext>) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/dashboard/report",
            axum::routing::post(report_endpoint),
        )
        .route("/api/v1/comments", axum::routing::get(list_comments))
        .route("/api/v1/comments/:agent", axum::routing::put(save_comment))
        .layer(Extension(context))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn report_endpoint(
    Extension(context): Extension<Arc<DashboardContext>>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<DashboardReport>, AppError> {
    let dataset = context.dataset().await?;
    if dataset.is_empty() {
        return Err(DatasetError::EmptySource.into());
    }

    let criteria = build_criteria(&dataset, &payload);
    let policy = payload.aggregation.to_policy();
    let report = DashboardReport::build(&dataset, criteria, &policy, payload.strategy)?;

    Ok(Json(report))
}

fn build_criteria(
    dataset: &Dataset,
    payload: &ReportRequest,
) -> Result<FilterCriteria, MalformedRange> {
    match (payload.date_start.as_deref(), payload.date_end.as_deref()) {
        // No range submitted: span the whole dataset.
        (None, None) => {
            let mut criteria = FilterCriteria::unrestricted(dataset).ok_or(MalformedRange {
                raw: "(empty dataset)".to_string(),
            })?;
            criteria.agents = payload.agents.clone();
            criteria.zones = payload.zones.clone();
            Ok(criteria)
        }
        (Some(start), Some(end)) => FilterCriteria::from_raw_range(
            start,
            end,
            payload.agents.clone(),
            payload.zones.clone(),
        ),
        // A one-ended range is degenerate; the filter engine will fall back
        // to the unfiltered dataset and flag it.
        (Some(lonely), None) | (None, Some(lonely)) => Err(MalformedRange {
            raw: lonely.to_string(),
        }),
    }
}

pub(crate) async fn list_comments(
    Extension(context): Extension<Arc<DashboardContext>>,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    Ok(Json(context.comments.load()?))
}

pub(crate) async fn save_comment(
    Extension(context): Extension<Arc<DashboardContext>>,
    Path(agent): Path<String>,
    Json(payload): Json<CommentPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    context.comments.save(&agent, &payload.comment)?;
    Ok(Json(json!({ "status": "saved", "agent": agent })))
}
