use crate::Result;
use crate::connection_pool;
use crate::prediction::{self, NewPrediction, PredictionFilter};
use crate::schema::livestock_disease_prediction;
use anyhow::anyhow;
use bigdecimal::BigDecimal;
use common::types::RiskLevel;
use diesel::RunQueryDsl;
use serial_test::serial;

// テスト用 DB にテーブルを用意し、全レコードを削除する補助関数
async fn setup() -> Result<()> {
    let conn = connection_pool::get().await?;
    conn.interact(|conn| {
        diesel::sql_query(
            "CREATE TABLE IF NOT EXISTS livestock_disease_prediction (
                id SERIAL PRIMARY KEY,
                prediction_date VARCHAR(8) NOT NULL,
                disease_name VARCHAR(100) NOT NULL,
                predicted_livestock_count INTEGER,
                confidence_score NUMERIC NOT NULL,
                prediction_basis JSONB,
                region VARCHAR(100),
                risk_level VARCHAR(20),
                created_at TIMESTAMP NOT NULL DEFAULT now()
            )",
        )
        .execute(conn)?;
        diesel::sql_query(
            "CREATE UNIQUE INDEX IF NOT EXISTS livestock_disease_prediction_date_disease_idx
             ON livestock_disease_prediction (prediction_date, disease_name)",
        )
        .execute(conn)?;
        diesel::delete(livestock_disease_prediction::table).execute(conn)
    })
    .await
    .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;
    Ok(())
}

fn make_prediction(date: &str, disease: &str, risk: &str) -> NewPrediction {
    NewPrediction {
        prediction_date: date.to_string(),
        disease_name: disease.to_string(),
        predicted_livestock_count: None,
        confidence_score: BigDecimal::from(50),
        prediction_basis: Some(serde_json::json!({
            "method": "day_of_month_pattern",
            "reason": "past occurred on 3/5 2 times",
        })),
        region: None,
        risk_level: Some(risk.to_string()),
    }
}

#[tokio::test]
#[serial]
async fn test_replace_all_replaces_previous_set() -> Result<()> {
    setup().await?;

    // 1. 初回セットを投入
    let first = vec![
        make_prediction("20260305", "口蹄疫", "HIGH"),
        make_prediction("20260315", "豚熱", "LOW"),
    ];
    assert_eq!(prediction::replace_all(first).await?, 2);
    assert_eq!(prediction::count_all().await?, 2);

    // 2. 別のセットで置き換えると前回分は残らない
    let second = vec![
        make_prediction("20260405", "鳥インフルエンザ", "CRITICAL"),
        make_prediction("20260415", "鳥インフルエンザ", "CRITICAL"),
        make_prediction("20260415", "炭疽", "LOW"),
    ];
    assert_eq!(prediction::replace_all(second).await?, 3);
    assert_eq!(prediction::count_all().await?, 3);

    let (rows, total) = prediction::find(PredictionFilter::default(), 1, 10).await?;
    assert_eq!(total, 3);
    assert!(rows.iter().all(|r| r.disease_name != "口蹄疫"));

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_replace_all_drops_duplicate_rows() -> Result<()> {
    setup().await?;

    // 同一 (prediction_date, disease_name) はユニーク制約に当たり黙って捨てられる
    let records = vec![
        make_prediction("20260315", "口蹄疫", "HIGH"),
        make_prediction("20260315", "口蹄疫", "HIGH"),
        make_prediction("20260315", "豚熱", "LOW"),
    ];
    let inserted = prediction::replace_all(records).await?;
    assert_eq!(inserted, 2);
    assert_eq!(prediction::count_all().await?, 2);

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_replace_all_with_empty_set_clears_table() -> Result<()> {
    setup().await?;

    prediction::replace_all(vec![make_prediction("20260315", "口蹄疫", "LOW")]).await?;
    assert_eq!(prediction::count_all().await?, 1);

    assert_eq!(prediction::replace_all(Vec::new()).await?, 0);
    assert_eq!(prediction::count_all().await?, 0);

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_find_orders_by_date_then_risk() -> Result<()> {
    setup().await?;

    prediction::replace_all(vec![
        make_prediction("20260415", "豚熱", "LOW"),
        make_prediction("20260315", "炭疽", "LOW"),
        make_prediction("20260315", "鳥インフルエンザ", "CRITICAL"),
    ])
    .await?;

    let (rows, total) = prediction::find(PredictionFilter::default(), 1, 10).await?;
    assert_eq!(total, 3);
    // 予測日昇順、同日のときは危険度降順
    assert_eq!(rows[0].prediction_date, "20260315");
    assert_eq!(rows[0].disease_name, "鳥インフルエンザ");
    assert_eq!(rows[1].prediction_date, "20260315");
    assert_eq!(rows[1].disease_name, "炭疽");
    assert_eq!(rows[2].prediction_date, "20260415");

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_find_filters_by_risk_and_date_prefix() -> Result<()> {
    setup().await?;

    prediction::replace_all(vec![
        make_prediction("20260315", "口蹄疫", "CRITICAL"),
        make_prediction("20260415", "口蹄疫", "CRITICAL"),
        make_prediction("20260315", "豚熱", "LOW"),
    ])
    .await?;

    let filter = PredictionFilter {
        risk_level: Some(RiskLevel::Critical),
        date_prefix: Some("202603".to_string()),
        ..Default::default()
    };
    let (rows, total) = prediction::find(filter, 1, 10).await?;
    assert_eq!(total, 1);
    assert_eq!(rows[0].prediction_date, "20260315");
    assert_eq!(rows[0].disease_name, "口蹄疫");

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_stats_by_risk_counts_per_level() -> Result<()> {
    setup().await?;

    prediction::replace_all(vec![
        make_prediction("20260305", "口蹄疫", "CRITICAL"),
        make_prediction("20260310", "口蹄疫", "CRITICAL"),
        make_prediction("20260315", "豚熱", "LOW"),
    ])
    .await?;

    assert_eq!(prediction::count_all().await?, 3);

    let rows = prediction::stats_by_risk().await?;
    assert_eq!(rows.len(), 2);
    // 件数降順
    assert_eq!(rows[0].risk_level.as_deref(), Some("CRITICAL"));
    assert_eq!(rows[0].prediction_count, 2);
    assert_eq!(rows[1].risk_level.as_deref(), Some("LOW"));
    assert_eq!(rows[1].prediction_count, 1);

    Ok(())
}
