use crate::Result;
use crate::connection_pool;
use crate::schema::livestock_disease_prediction;
use anyhow::anyhow;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use common::types::RiskLevel;
use diesel::prelude::*;
use logging::*;
use serde::Serialize;
use serde_json::Value as JsonValue;

// データベース用モデル
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = livestock_disease_prediction)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbPrediction {
    pub id: i32,
    pub prediction_date: String,
    pub disease_name: String,
    pub predicted_livestock_count: Option<i32>,
    pub confidence_score: BigDecimal,
    pub prediction_basis: Option<JsonValue>,
    pub region: Option<String>,
    pub risk_level: Option<String>,
    pub created_at: NaiveDateTime,
}

// データベース挿入用モデル
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = livestock_disease_prediction)]
pub struct NewPrediction {
    pub prediction_date: String,
    pub disease_name: String,
    pub predicted_livestock_count: Option<i32>,
    pub confidence_score: BigDecimal,
    pub prediction_basis: Option<JsonValue>,
    pub region: Option<String>,
    pub risk_level: Option<String>,
}

/// 一覧取得のフィルタ条件
#[derive(Debug, Clone, Default)]
pub struct PredictionFilter {
    pub disease_name: Option<String>,
    pub date_prefix: Option<String>,
    pub region: Option<String>,
    pub risk_level: Option<RiskLevel>,
}

const INSERT_CHUNK_SIZE: usize = 1000;

/// 予測セット全体を 1 トランザクションで置き換える
///
/// delete-all と bulk insert を同一トランザクションにまとめることで、
/// 読み手が空の予測セットを観測する瞬間を作らない。
/// `(prediction_date, disease_name)` のユニーク制約に当たった行は黙って捨てる。
pub async fn replace_all(records: Vec<NewPrediction>) -> Result<usize> {
    let log = DEFAULT.new(o!(
        "function" => "prediction::replace_all",
        "records" => records.len(),
    ));
    trace!(log, "start");

    let conn = connection_pool::get().await?;

    let inserted = conn
        .interact(move |conn| {
            conn.transaction::<usize, diesel::result::Error, _>(|conn| {
                diesel::delete(livestock_disease_prediction::table).execute(conn)?;
                let mut inserted = 0;
                for chunk in records.chunks(INSERT_CHUNK_SIZE) {
                    inserted += diesel::insert_into(livestock_disease_prediction::table)
                        .values(chunk)
                        .on_conflict_do_nothing()
                        .execute(conn)?;
                }
                Ok(inserted)
            })
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    trace!(log, "finish"; "inserted" => inserted);
    Ok(inserted)
}

fn filtered(
    filter: &PredictionFilter,
) -> livestock_disease_prediction::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = livestock_disease_prediction::table.into_boxed();
    if let Some(name) = &filter.disease_name {
        query = query.filter(livestock_disease_prediction::disease_name.like(format!("%{name}%")));
    }
    if let Some(prefix) = &filter.date_prefix {
        query = query.filter(livestock_disease_prediction::prediction_date.like(format!("{prefix}%")));
    }
    if let Some(region) = &filter.region {
        query = query.filter(livestock_disease_prediction::region.eq(region.clone()));
    }
    if let Some(level) = filter.risk_level {
        query = query.filter(livestock_disease_prediction::risk_level.eq(level.as_str()));
    }
    query
}

/// フィルタ付きページング一覧（予測日昇順、同日のときは危険度降順）
pub async fn find(
    filter: PredictionFilter,
    page: i64,
    limit: i64,
) -> Result<(Vec<DbPrediction>, i64)> {
    use diesel::dsl::sql;
    use diesel::sql_types::Integer;

    let conn = connection_pool::get().await?;
    let offset = (page - 1).max(0) * limit;

    let count_filter = filter.clone();
    let total = conn
        .interact(move |conn| filtered(&count_filter).count().get_result::<i64>(conn))
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    let rows = conn
        .interact(move |conn| {
            filtered(&filter)
                .order((
                    livestock_disease_prediction::prediction_date.asc(),
                    // risk_level は文字列格納なので序数への変換を SQL 側で行う
                    sql::<Integer>(
                        "CASE risk_level \
                         WHEN 'CRITICAL' THEN 3 \
                         WHEN 'HIGH' THEN 2 \
                         WHEN 'MEDIUM' THEN 1 \
                         ELSE 0 END",
                    )
                    .desc(),
                ))
                .offset(offset)
                .limit(limit)
                .select(DbPrediction::as_select())
                .load::<DbPrediction>(conn)
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    Ok((rows, total))
}

/// 現在の予測件数
pub async fn count_all() -> Result<i64> {
    let conn = connection_pool::get().await?;

    let total = conn
        .interact(|conn| {
            livestock_disease_prediction::table
                .count()
                .get_result::<i64>(conn)
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    Ok(total)
}

/// 危険度ごとの予測件数
#[derive(Debug, Clone, QueryableByName, Serialize)]
pub struct RiskTotals {
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub risk_level: Option<String>,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub prediction_count: i64,
}

pub async fn stats_by_risk() -> Result<Vec<RiskTotals>> {
    let conn = connection_pool::get().await?;

    let rows = conn
        .interact(|conn| {
            diesel::sql_query(
                "SELECT
                    risk_level,
                    COUNT(*) AS prediction_count
                FROM livestock_disease_prediction
                GROUP BY risk_level
                ORDER BY prediction_count DESC",
            )
            .load::<RiskTotals>(conn)
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    Ok(rows)
}

#[cfg(test)]
mod tests;
