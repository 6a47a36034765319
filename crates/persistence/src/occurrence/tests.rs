use crate::Result;
use crate::connection_pool;
use crate::occurrence::{self, DayStatsRange, NewOccurrence, OccurrenceFilter};
use crate::schema::livestock_disease_occurrence;
use anyhow::anyhow;
use diesel::RunQueryDsl;
use serial_test::serial;

// テスト用 DB にテーブルを用意し、全レコードを削除する補助関数
async fn setup() -> Result<()> {
    let conn = connection_pool::get().await?;
    conn.interact(|conn| {
        diesel::sql_query(
            "CREATE TABLE IF NOT EXISTS livestock_disease_occurrence (
                id SERIAL PRIMARY KEY,
                occurrence_no VARCHAR(50) NOT NULL UNIQUE,
                disease_name VARCHAR(100),
                farm_name VARCHAR(200),
                farm_address VARCHAR(500),
                occurrence_date VARCHAR(8),
                species_code VARCHAR(20),
                species_name VARCHAR(100),
                livestock_count INTEGER,
                diagnosis_org VARCHAR(200),
                cessation_date VARCHAR(8),
                created_at TIMESTAMP NOT NULL DEFAULT now(),
                updated_at TIMESTAMP NOT NULL DEFAULT now()
            )",
        )
        .execute(conn)?;
        diesel::delete(livestock_disease_occurrence::table).execute(conn)
    })
    .await
    .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;
    Ok(())
}

fn make_occurrence(
    no: &str,
    disease: Option<&str>,
    date: Option<&str>,
    count: Option<i32>,
) -> NewOccurrence {
    NewOccurrence {
        occurrence_no: no.to_string(),
        disease_name: disease.map(str::to_string),
        farm_name: Some("テスト牧場".to_string()),
        farm_address: None,
        occurrence_date: date.map(str::to_string),
        species_code: Some("412004".to_string()),
        species_name: Some("豚".to_string()),
        livestock_count: count,
        diagnosis_org: None,
        cessation_date: None,
    }
}

#[tokio::test]
#[serial]
async fn test_batch_upsert_inserts_and_updates() -> Result<()> {
    setup().await?;

    // 1. 新規挿入
    let records = vec![
        make_occurrence("no-001", Some("豚熱"), Some("20240305"), Some(10)),
        make_occurrence("no-002", Some("豚熱"), Some("20240310"), Some(20)),
    ];
    assert_eq!(occurrence::batch_upsert(&records).await?, 2);

    // 2. 同じ発生番号は更新になる（行は増えない）
    let updated = vec![make_occurrence(
        "no-002",
        Some("豚熱"),
        Some("20240310"),
        Some(99),
    )];
    occurrence::batch_upsert(&updated).await?;

    let (rows, total) = occurrence::find(OccurrenceFilter::default(), 1, 10).await?;
    assert_eq!(total, 2);
    let no_002 = rows.iter().find(|r| r.occurrence_no == "no-002").unwrap();
    assert_eq!(no_002.livestock_count, Some(99));

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_distinct_disease_names_requires_date() -> Result<()> {
    setup().await?;

    occurrence::batch_upsert(&[
        make_occurrence("no-001", Some("豚熱"), Some("20240305"), Some(1)),
        make_occurrence("no-002", Some("豚熱"), Some("20240310"), Some(1)),
        // 発生日なしの病名は列挙されない
        make_occurrence("no-003", Some("口蹄疫"), None, Some(1)),
        // 病名なしも対象外
        make_occurrence("no-004", None, Some("20240315"), Some(1)),
    ])
    .await?;

    let names = occurrence::distinct_disease_names().await?;
    assert_eq!(names, vec!["豚熱".to_string()]);

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_history_for_disease_returns_matching_rows() -> Result<()> {
    setup().await?;

    occurrence::batch_upsert(&[
        make_occurrence("no-001", Some("豚熱"), Some("20240305"), Some(10)),
        make_occurrence("no-002", Some("豚熱"), Some("20240310"), None),
        make_occurrence("no-003", Some("口蹄疫"), Some("20240315"), Some(5)),
    ])
    .await?;

    let mut history = occurrence::history_for_disease("豚熱").await?;
    history.sort_by(|a, b| a.occurrence_date.cmp(&b.occurrence_date));

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].occurrence_date.as_str(), "20240305");
    assert_eq!(history[0].livestock_count, Some(10));
    assert_eq!(history[1].livestock_count, None);

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_find_paginates_date_descending() -> Result<()> {
    setup().await?;

    occurrence::batch_upsert(&[
        make_occurrence("no-001", Some("豚熱"), Some("20240305"), Some(1)),
        make_occurrence("no-002", Some("豚熱"), Some("20240310"), Some(1)),
        make_occurrence("no-003", Some("豚熱"), Some("20240320"), Some(1)),
    ])
    .await?;

    let (page1, total) = occurrence::find(OccurrenceFilter::default(), 1, 2).await?;
    assert_eq!(total, 3);
    assert_eq!(page1.len(), 2);
    assert_eq!(page1[0].occurrence_date.as_deref(), Some("20240320"));

    let (page2, _) = occurrence::find(OccurrenceFilter::default(), 2, 2).await?;
    assert_eq!(page2.len(), 1);
    assert_eq!(page2[0].occurrence_date.as_deref(), Some("20240305"));

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_stats_by_day_with_date_range() -> Result<()> {
    setup().await?;

    occurrence::batch_upsert(&[
        make_occurrence("no-001", Some("豚熱"), Some("20240305"), Some(10)),
        make_occurrence("no-002", Some("豚熱"), Some("20240305"), Some(20)),
        make_occurrence("no-003", Some("口蹄疫"), Some("20240310"), Some(5)),
        // 範囲外
        make_occurrence("no-004", Some("豚熱"), Some("20240401"), Some(100)),
    ])
    .await?;

    let rows = occurrence::stats_by_day(DayStatsRange::Dates {
        start: "20240301".to_string(),
        end: "20240331".to_string(),
    })
    .await?;

    // 発生日降順
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].occurrence_date, "20240310");
    assert_eq!(rows[0].disease_name, "口蹄疫");
    assert_eq!(rows[0].occurrence_count, 1);
    assert_eq!(rows[1].occurrence_date, "20240305");
    assert_eq!(rows[1].occurrence_count, 2);
    assert_eq!(rows[1].total_livestock_count, Some(30));

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_stats_by_day_with_year_and_month() -> Result<()> {
    setup().await?;

    occurrence::batch_upsert(&[
        make_occurrence("no-001", Some("豚熱"), Some("20240305"), Some(10)),
        make_occurrence("no-002", Some("豚熱"), Some("20240405"), Some(10)),
        make_occurrence("no-003", Some("豚熱"), Some("20230305"), Some(10)),
    ])
    .await?;

    let march_2024 = occurrence::stats_by_day(DayStatsRange::Year {
        year: "2024".to_string(),
        month: Some("03".to_string()),
    })
    .await?;
    assert_eq!(march_2024.len(), 1);
    assert_eq!(march_2024[0].occurrence_date, "20240305");

    let year_2024 = occurrence::stats_by_day(DayStatsRange::Year {
        year: "2024".to_string(),
        month: None,
    })
    .await?;
    assert_eq!(year_2024.len(), 2);

    Ok(())
}
