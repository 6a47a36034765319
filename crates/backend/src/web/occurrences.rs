use super::AppState;
use axum::{
    Router,
    extract::{Json, Query, State},
    routing::get,
};
use common::ApiResponse;
use common::types::{Paginated, Pagination};
use logging::*;
use persistence::occurrence::{
    self, DailyTotals, DayStatsRange, DbOccurrence, DiseaseTotals, MonthlyTotals,
    OccurrenceFilter, YearlyTotals,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/occurrences", get(list_occurrences))
        .route("/occurrences/statistics/by-disease", get(stats_by_disease))
        .route("/occurrences/statistics/by-year", get(stats_by_year))
        .route("/occurrences/statistics/by-month", get(stats_by_month))
        .route("/occurrences/statistics/by-day", get(stats_by_day))
}

#[derive(Debug, Deserialize)]
struct OccurrencesQuery {
    disease_name: Option<String>,
    farm_name: Option<String>,
    species_name: Option<String>,
    occurrence_date: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn list_occurrences(
    State(_): State<Arc<AppState>>,
    Query(query): Query<OccurrencesQuery>,
) -> Json<ApiResponse<Paginated<DbOccurrence>, String>> {
    let log = DEFAULT.new(o!("function" => "list_occurrences"));
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    info!(log, "start"; "page" => page, "limit" => limit);

    let filter = OccurrenceFilter {
        disease_name: query.disease_name,
        farm_name: query.farm_name,
        species_name: query.species_name,
        occurrence_date: query.occurrence_date,
    };

    match occurrence::find(filter, page, limit).await {
        Ok((list, total)) => {
            info!(log, "success"; "count" => list.len(), "total" => total);
            Json(ApiResponse::Success(Paginated {
                list,
                pagination: Pagination::new(total, page, limit),
            }))
        }
        Err(e) => {
            error!(log, "failed to list occurrences"; "error" => ?e);
            Json(ApiResponse::Error(e.to_string()))
        }
    }
}

async fn stats_by_disease(
    State(_): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<DiseaseTotals>, String>> {
    let log = DEFAULT.new(o!("function" => "stats_by_disease"));
    info!(log, "start");

    match occurrence::stats_by_disease().await {
        Ok(rows) => {
            info!(log, "success"; "count" => rows.len());
            Json(ApiResponse::Success(rows))
        }
        Err(e) => {
            error!(log, "failed to aggregate by disease"; "error" => ?e);
            Json(ApiResponse::Error(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct YearQuery {
    year: Option<String>,
}

async fn stats_by_year(
    State(_): State<Arc<AppState>>,
    Query(query): Query<YearQuery>,
) -> Json<ApiResponse<Vec<YearlyTotals>, String>> {
    let log = DEFAULT.new(o!("function" => "stats_by_year"));
    info!(log, "start"; "year" => &query.year);

    match occurrence::stats_by_year(query.year).await {
        Ok(rows) => {
            info!(log, "success"; "count" => rows.len());
            Json(ApiResponse::Success(rows))
        }
        Err(e) => {
            error!(log, "failed to aggregate by year"; "error" => ?e);
            Json(ApiResponse::Error(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayQuery {
    year: Option<String>,
    month: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn stats_by_day(
    State(_): State<Arc<AppState>>,
    Query(query): Query<DayQuery>,
) -> Json<ApiResponse<Vec<DailyTotals>, String>> {
    let log = DEFAULT.new(o!("function" => "stats_by_day"));
    info!(log, "start";
        "year" => &query.year,
        "month" => &query.month,
        "start_date" => &query.start_date,
        "end_date" => &query.end_date,
    );

    // 期間指定を優先し、次いで年（＋月）指定。どちらもなければエラー
    let range = match (query.start_date, query.end_date, query.year) {
        (Some(start), Some(end), _) => DayStatsRange::Dates { start, end },
        (_, _, Some(year)) => DayStatsRange::Year {
            year,
            month: query.month,
        },
        _ => {
            return Json(ApiResponse::Error(
                "year or startDate/endDate is required".to_string(),
            ));
        }
    };

    match occurrence::stats_by_day(range).await {
        Ok(rows) => {
            info!(log, "success"; "count" => rows.len());
            Json(ApiResponse::Success(rows))
        }
        Err(e) => {
            error!(log, "failed to aggregate by day"; "error" => ?e);
            Json(ApiResponse::Error(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct MonthQuery {
    year: Option<String>,
    month: Option<String>,
}

async fn stats_by_month(
    State(_): State<Arc<AppState>>,
    Query(query): Query<MonthQuery>,
) -> Json<ApiResponse<Vec<MonthlyTotals>, String>> {
    let log = DEFAULT.new(o!("function" => "stats_by_month"));
    info!(log, "start"; "year" => &query.year, "month" => &query.month);

    // 月別集計は年の指定が必須
    let Some(year) = query.year else {
        return Json(ApiResponse::Error("year is required".to_string()));
    };

    match occurrence::stats_by_month(year, query.month).await {
        Ok(rows) => {
            info!(log, "success"; "count" => rows.len());
            Json(ApiResponse::Success(rows))
        }
        Err(e) => {
            error!(log, "failed to aggregate by month"; "error" => ?e);
            Json(ApiResponse::Error(e.to_string()))
        }
    }
}
