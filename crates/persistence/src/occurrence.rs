use crate::Result;
use crate::connection_pool;
use crate::schema::livestock_disease_occurrence;
use anyhow::anyhow;
use chrono::NaiveDateTime;
use common::types::DateStamp;
use diesel::prelude::*;
use logging::*;
use serde::Serialize;

// データベース用モデル
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = livestock_disease_occurrence)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DbOccurrence {
    pub id: i32,
    pub occurrence_no: String,
    pub disease_name: Option<String>,
    pub farm_name: Option<String>,
    pub farm_address: Option<String>,
    pub occurrence_date: Option<String>,
    pub species_code: Option<String>,
    pub species_name: Option<String>,
    pub livestock_count: Option<i32>,
    pub diagnosis_org: Option<String>,
    pub cessation_date: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// データベース挿入用モデル
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = livestock_disease_occurrence)]
pub struct NewOccurrence {
    pub occurrence_no: String,
    pub disease_name: Option<String>,
    pub farm_name: Option<String>,
    pub farm_address: Option<String>,
    pub occurrence_date: Option<String>,
    pub species_code: Option<String>,
    pub species_name: Option<String>,
    pub livestock_count: Option<i32>,
    pub diagnosis_org: Option<String>,
    pub cessation_date: Option<String>,
}

/// 予測エンジンが参照する履歴 1 件分（日付は非 NULL 保証）
#[derive(Debug, Clone)]
pub struct OccurrenceHistory {
    pub occurrence_date: DateStamp,
    pub livestock_count: Option<i32>,
}

/// 一覧取得のフィルタ条件
#[derive(Debug, Clone, Default)]
pub struct OccurrenceFilter {
    pub disease_name: Option<String>,
    pub farm_name: Option<String>,
    pub species_name: Option<String>,
    pub occurrence_date: Option<String>,
}

fn filtered(
    filter: &OccurrenceFilter,
) -> livestock_disease_occurrence::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = livestock_disease_occurrence::table.into_boxed();
    if let Some(name) = &filter.disease_name {
        query = query.filter(livestock_disease_occurrence::disease_name.like(format!("%{name}%")));
    }
    if let Some(name) = &filter.farm_name {
        query = query.filter(livestock_disease_occurrence::farm_name.like(format!("%{name}%")));
    }
    if let Some(name) = &filter.species_name {
        query = query.filter(livestock_disease_occurrence::species_name.like(format!("%{name}%")));
    }
    if let Some(date) = &filter.occurrence_date {
        query = query.filter(livestock_disease_occurrence::occurrence_date.eq(date.clone()));
    }
    query
}

/// 発生日を持つレコードが存在する病名の一覧
pub async fn distinct_disease_names() -> Result<Vec<String>> {
    let conn = connection_pool::get().await?;

    let names = conn
        .interact(|conn| {
            livestock_disease_occurrence::table
                .filter(livestock_disease_occurrence::disease_name.is_not_null())
                .filter(livestock_disease_occurrence::occurrence_date.is_not_null())
                .select(livestock_disease_occurrence::disease_name)
                .distinct()
                .load::<Option<String>>(conn)
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    Ok(names.into_iter().flatten().collect())
}

/// 指定した病名の全履歴（発生日が非 NULL のもの）
pub async fn history_for_disease(disease_name: &str) -> Result<Vec<OccurrenceHistory>> {
    let disease_name = disease_name.to_string();
    let conn = connection_pool::get().await?;

    let rows = conn
        .interact(move |conn| {
            livestock_disease_occurrence::table
                .filter(livestock_disease_occurrence::disease_name.eq(disease_name))
                .filter(livestock_disease_occurrence::occurrence_date.is_not_null())
                .select((
                    livestock_disease_occurrence::occurrence_date,
                    livestock_disease_occurrence::livestock_count,
                ))
                .load::<(Option<String>, Option<i32>)>(conn)
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    Ok(rows
        .into_iter()
        .filter_map(|(date, livestock_count)| {
            date.map(|date| OccurrenceHistory {
                occurrence_date: DateStamp::new(date),
                livestock_count,
            })
        })
        .collect())
}

/// フィルタ付きページング一覧（発生日降順・ID降順）
pub async fn find(
    filter: OccurrenceFilter,
    page: i64,
    limit: i64,
) -> Result<(Vec<DbOccurrence>, i64)> {
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
                    livestock_disease_occurrence::occurrence_date.desc(),
                    livestock_disease_occurrence::id.desc(),
                ))
                .offset(offset)
                .limit(limit)
                .select(DbOccurrence::as_select())
                .load::<DbOccurrence>(conn)
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    Ok((rows, total))
}

/// 外部の取り込み処理が使う一括 upsert（発生番号で重複判定）
pub async fn batch_upsert(records: &[NewOccurrence]) -> Result<usize> {
    use diesel::upsert::excluded;
    use livestock_disease_occurrence as t;

    let log = DEFAULT.new(o!(
        "function" => "occurrence::batch_upsert",
        "records" => records.len(),
    ));
    trace!(log, "start");

    if records.is_empty() {
        return Ok(0);
    }

    let records = records.to_vec();
    let conn = connection_pool::get().await?;

    let upserted = conn
        .interact(move |conn| {
            diesel::insert_into(t::table)
                .values(&records)
                .on_conflict(t::occurrence_no)
                .do_update()
                .set((
                    t::disease_name.eq(excluded(t::disease_name)),
                    t::farm_name.eq(excluded(t::farm_name)),
                    t::farm_address.eq(excluded(t::farm_address)),
                    t::occurrence_date.eq(excluded(t::occurrence_date)),
                    t::species_code.eq(excluded(t::species_code)),
                    t::species_name.eq(excluded(t::species_name)),
                    t::livestock_count.eq(excluded(t::livestock_count)),
                    t::diagnosis_org.eq(excluded(t::diagnosis_org)),
                    t::cessation_date.eq(excluded(t::cessation_date)),
                    t::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    trace!(log, "finish"; "upserted" => upserted);
    Ok(upserted)
}

/// 病名ごとの集計（発生回数・発生頭数合計・初回/最終発生日）
#[derive(Debug, Clone, QueryableByName, Serialize)]
pub struct DiseaseTotals {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub disease_name: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub occurrence_count: i64,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::BigInt>)]
    pub total_livestock_count: Option<i64>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub first_occurrence_date: Option<String>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub last_occurrence_date: Option<String>,
}

pub async fn stats_by_disease() -> Result<Vec<DiseaseTotals>> {
    let conn = connection_pool::get().await?;

    let rows = conn
        .interact(|conn| {
            diesel::sql_query(
                "SELECT
                    disease_name,
                    COUNT(*) AS occurrence_count,
                    SUM(livestock_count) AS total_livestock_count,
                    MIN(occurrence_date) AS first_occurrence_date,
                    MAX(occurrence_date) AS last_occurrence_date
                FROM livestock_disease_occurrence
                WHERE disease_name IS NOT NULL
                GROUP BY disease_name
                ORDER BY total_livestock_count DESC NULLS LAST",
            )
            .load::<DiseaseTotals>(conn)
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    Ok(rows)
}

/// 年別・病名別の集計
#[derive(Debug, Clone, QueryableByName, Serialize)]
pub struct YearlyTotals {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub year: String,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub disease_name: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub occurrence_count: i64,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::BigInt>)]
    pub total_livestock_count: Option<i64>,
}

pub async fn stats_by_year(year: Option<String>) -> Result<Vec<YearlyTotals>> {
    use diesel::sql_types::Text;

    let conn = connection_pool::get().await?;

    let rows = conn
        .interact(move |conn| {
            let base = "SELECT
                    SUBSTRING(occurrence_date, 1, 4) AS year,
                    disease_name,
                    COUNT(*) AS occurrence_count,
                    SUM(livestock_count) AS total_livestock_count
                FROM livestock_disease_occurrence
                WHERE occurrence_date IS NOT NULL AND disease_name IS NOT NULL";
            let tail = " GROUP BY SUBSTRING(occurrence_date, 1, 4), disease_name
                ORDER BY year DESC, total_livestock_count DESC NULLS LAST";
            match year {
                Some(year) => diesel::sql_query(format!(
                    "{base} AND SUBSTRING(occurrence_date, 1, 4) = $1{tail}"
                ))
                .bind::<Text, _>(year)
                .load::<YearlyTotals>(conn),
                None => diesel::sql_query(format!("{base}{tail}")).load::<YearlyTotals>(conn),
            }
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    Ok(rows)
}

/// 月別・病名別の集計（年は必須、月は任意）
#[derive(Debug, Clone, QueryableByName, Serialize)]
pub struct MonthlyTotals {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub year: String,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub month: String,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub disease_name: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub occurrence_count: i64,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::BigInt>)]
    pub total_livestock_count: Option<i64>,
}

/// 日別集計の絞り込み。期間か年のどちらかの指定が必須。
#[derive(Debug, Clone)]
pub enum DayStatsRange {
    /// 発生日の範囲（両端含む、YYYYMMDD）
    Dates { start: String, end: String },
    /// 年指定（月は任意）
    Year { year: String, month: Option<String> },
}

/// 日別・病名別の集計（発生日 × 病名の単位）
#[derive(Debug, Clone, QueryableByName, Serialize)]
pub struct DailyTotals {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub occurrence_date: String,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub disease_name: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub occurrence_count: i64,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::BigInt>)]
    pub total_livestock_count: Option<i64>,
}

pub async fn stats_by_day(range: DayStatsRange) -> Result<Vec<DailyTotals>> {
    use diesel::sql_types::Text;

    let conn = connection_pool::get().await?;

    let rows = conn
        .interact(move |conn| {
            let base = "SELECT
                    occurrence_date,
                    disease_name,
                    COUNT(*) AS occurrence_count,
                    SUM(livestock_count) AS total_livestock_count
                FROM livestock_disease_occurrence
                WHERE occurrence_date IS NOT NULL AND disease_name IS NOT NULL";
            let tail = " GROUP BY occurrence_date, disease_name
                ORDER BY occurrence_date DESC, total_livestock_count DESC NULLS LAST";
            match range {
                DayStatsRange::Dates { start, end } => diesel::sql_query(format!(
                    "{base} AND occurrence_date BETWEEN $1 AND $2{tail}"
                ))
                .bind::<Text, _>(start)
                .bind::<Text, _>(end)
                .load::<DailyTotals>(conn),
                DayStatsRange::Year {
                    year,
                    month: Some(month),
                } => diesel::sql_query(format!(
                    "{base} AND SUBSTRING(occurrence_date, 1, 4) = $1
                        AND SUBSTRING(occurrence_date, 5, 2) = $2{tail}"
                ))
                .bind::<Text, _>(year)
                .bind::<Text, _>(month)
                .load::<DailyTotals>(conn),
                DayStatsRange::Year { year, month: None } => {
                    diesel::sql_query(format!(
                        "{base} AND SUBSTRING(occurrence_date, 1, 4) = $1{tail}"
                    ))
                    .bind::<Text, _>(year)
                    .load::<DailyTotals>(conn)
                }
            }
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    Ok(rows)
}

pub async fn stats_by_month(year: String, month: Option<String>) -> Result<Vec<MonthlyTotals>> {
    use diesel::sql_types::Text;

    let conn = connection_pool::get().await?;

    let rows = conn
        .interact(move |conn| {
            let base = "SELECT
                    SUBSTRING(occurrence_date, 1, 4) AS year,
                    SUBSTRING(occurrence_date, 5, 2) AS month,
                    disease_name,
                    COUNT(*) AS occurrence_count,
                    SUM(livestock_count) AS total_livestock_count
                FROM livestock_disease_occurrence
                WHERE occurrence_date IS NOT NULL
                  AND disease_name IS NOT NULL
                  AND SUBSTRING(occurrence_date, 1, 4) = $1";
            let tail = " GROUP BY SUBSTRING(occurrence_date, 1, 4), SUBSTRING(occurrence_date, 5, 2), disease_name
                ORDER BY year DESC, month DESC, total_livestock_count DESC NULLS LAST";
            match month {
                Some(month) => diesel::sql_query(format!(
                    "{base} AND SUBSTRING(occurrence_date, 5, 2) = $2{tail}"
                ))
                .bind::<Text, _>(year)
                .bind::<Text, _>(month)
                .load::<MonthlyTotals>(conn),
                None => diesel::sql_query(format!("{base}{tail}"))
                    .bind::<Text, _>(year)
                    .load::<MonthlyTotals>(conn),
            }
        })
        .await
        .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;

    Ok(rows)
}

#[cfg(test)]
mod tests;
