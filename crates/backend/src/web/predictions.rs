use super::AppState;
use axum::{
    Router,
    extract::{Json, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use common::ApiResponse;
use common::types::{Paginated, Pagination, RiskLevel};
use forecast::GenerateError;
use forecast::engine::GenerationSummary;
use logging::*;
use persistence::prediction::{self, DbPrediction, PredictionFilter, RiskTotals};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/predictions", get(list_predictions))
        .route("/predictions/generate", post(generate_predictions))
        .route("/predictions/statistics", get(prediction_statistics))
}

#[derive(Debug, Deserialize)]
struct PredictionsQuery {
    disease_name: Option<String>,
    /// 予測日の前方一致（"2026" や "202603"）
    date_prefix: Option<String>,
    region: Option<String>,
    risk_level: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn list_predictions(
    State(_): State<Arc<AppState>>,
    Query(query): Query<PredictionsQuery>,
) -> Json<ApiResponse<Paginated<DbPrediction>, String>> {
    let log = DEFAULT.new(o!("function" => "list_predictions"));
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    info!(log, "start"; "page" => page, "limit" => limit);

    let risk_level = match query.risk_level {
        Some(raw) => match raw.parse::<RiskLevel>() {
            Ok(level) => Some(level),
            Err(e) => {
                info!(log, "invalid risk_level"; "value" => &raw);
                return Json(ApiResponse::Error(e.to_string()));
            }
        },
        None => None,
    };

    let filter = PredictionFilter {
        disease_name: query.disease_name,
        date_prefix: query.date_prefix,
        region: query.region,
        risk_level,
    };

    match prediction::find(filter, page, limit).await {
        Ok((list, total)) => {
            info!(log, "success"; "count" => list.len(), "total" => total);
            Json(ApiResponse::Success(Paginated {
                list,
                pagination: Pagination::new(total, page, limit),
            }))
        }
        Err(e) => {
            error!(log, "failed to list predictions"; "error" => ?e);
            Json(ApiResponse::Error(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    /// 予測対象の月数（省略時は設定値、0 は不可）
    months: Option<u32>,
}

async fn generate_predictions(
    State(_): State<Arc<AppState>>,
    body: Option<Json<GenerateBody>>,
) -> (StatusCode, Json<ApiResponse<GenerationSummary, String>>) {
    let log = DEFAULT.new(o!("function" => "generate_predictions"));
    let months = body.and_then(|Json(b)| b.months);
    info!(log, "start"; "months" => months);

    match forecast::regenerate(months).await {
        Ok(summary) => {
            info!(log, "success"; "created" => summary.created);
            (StatusCode::OK, Json(ApiResponse::Success(summary)))
        }
        Err(e @ GenerateError::InvalidHorizon) => {
            info!(log, "rejected"; "error" => %e);
            (StatusCode::BAD_REQUEST, Json(ApiResponse::Error(e.to_string())))
        }
        Err(GenerateError::AlreadyRunning) => {
            warn!(log, "generation already in progress");
            (
                StatusCode::CONFLICT,
                Json(ApiResponse::Error(
                    "prediction generation is already running".to_string(),
                )),
            )
        }
        Err(GenerateError::Storage(e)) => {
            error!(log, "generation failed"; "error" => ?e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::Error(e.to_string())),
            )
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct PredictionStatistics {
    total: i64,
    by_risk_level: Vec<RiskTotals>,
}

async fn prediction_statistics(
    State(_): State<Arc<AppState>>,
) -> Json<ApiResponse<PredictionStatistics, String>> {
    let log = DEFAULT.new(o!("function" => "prediction_statistics"));
    info!(log, "start");

    let total = match prediction::count_all().await {
        Ok(total) => total,
        Err(e) => {
            error!(log, "failed to count predictions"; "error" => ?e);
            return Json(ApiResponse::Error(e.to_string()));
        }
    };
    match prediction::stats_by_risk().await {
        Ok(by_risk_level) => {
            info!(log, "success"; "total" => total);
            Json(ApiResponse::Success(PredictionStatistics {
                total,
                by_risk_level,
            }))
        }
        Err(e) => {
            error!(log, "failed to aggregate by risk level"; "error" => ?e);
            Json(ApiResponse::Error(e.to_string()))
        }
    }
}
