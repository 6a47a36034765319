use crate::Result;
use crate::engine::Prediction;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use common::types::DateStamp;
use persistence::prediction::NewPrediction;

/// 履歴レコード 1 件分（発生日は非 NULL、形式の検証は集計側で行う）
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalOccurrence {
    pub occurrence_date: DateStamp,
    pub livestock_count: Option<i32>,
}

/// 予測エンジンが依存するストレージの境界
///
/// 履歴は読み取り専用、予測セットは排他的に書き換える。
/// `replace_predictions` は delete-all + bulk insert を単一の
/// アトミックな置き換えとして実装しなければならない。
#[async_trait]
pub trait ForecastStore {
    async fn distinct_disease_names(&self) -> Result<Vec<String>>;

    async fn occurrences_by_disease(
        &self,
        disease_name: &str,
    ) -> Result<Vec<HistoricalOccurrence>>;

    /// 既存の予測セット全体を新しいセットで置き換え、挿入件数を返す
    async fn replace_predictions(&self, predictions: &[Prediction]) -> Result<usize>;
}

/// diesel 実装
pub struct DbForecastStore;

#[async_trait]
impl ForecastStore for DbForecastStore {
    async fn distinct_disease_names(&self) -> Result<Vec<String>> {
        persistence::occurrence::distinct_disease_names().await
    }

    async fn occurrences_by_disease(
        &self,
        disease_name: &str,
    ) -> Result<Vec<HistoricalOccurrence>> {
        let rows = persistence::occurrence::history_for_disease(disease_name).await?;
        Ok(rows
            .into_iter()
            .map(|r| HistoricalOccurrence {
                occurrence_date: r.occurrence_date,
                livestock_count: r.livestock_count,
            })
            .collect())
    }

    async fn replace_predictions(&self, predictions: &[Prediction]) -> Result<usize> {
        let records: Result<Vec<NewPrediction>> = predictions.iter().map(to_new_db).collect();
        persistence::prediction::replace_all(records?).await
    }
}

fn to_new_db(prediction: &Prediction) -> Result<NewPrediction> {
    Ok(NewPrediction {
        prediction_date: prediction.prediction_date.as_str().to_string(),
        disease_name: prediction.disease_name.clone(),
        predicted_livestock_count: prediction.predicted_livestock_count,
        confidence_score: BigDecimal::try_from(prediction.confidence_score)
            .unwrap_or_else(|_| BigDecimal::from(0)),
        prediction_basis: Some(serde_json::to_value(&prediction.prediction_basis)?),
        region: prediction.region.clone(),
        risk_level: Some(prediction.risk_level.as_str().to_string()),
    })
}
