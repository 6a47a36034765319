use crate::Result;
use crate::horizon::{self, YearMonth};
use crate::score::{self, ConfidenceFactors};
use crate::stats::DiseaseHistory;
use crate::store::{ForecastStore, HistoricalOccurrence};
use chrono::{DateTime, NaiveDate, Utc};
use common::types::{DateStamp, RiskLevel};
use logging::*;
use serde::{Deserialize, Serialize};

/// 日付パターンが得られない月に使う予測日
const MID_MONTH_DAY: u32 = 15;

/// 予測 1 件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction_date: DateStamp,
    pub disease_name: String,
    /// 予想発生頭数（機能無効のため常に None）
    pub predicted_livestock_count: Option<i32>,
    pub confidence_score: f64,
    pub prediction_basis: PredictionBasis,
    /// 地域（モデル化していないため常に None）
    pub region: Option<String>,
    pub risk_level: RiskLevel,
}

/// 予測根拠（下流には表示用途でのみ渡る）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBasis {
    pub method: String,
    pub total_occurrences: u32,
    pub avg_occurrences_per_month: f64,
    pub monthly_occurrence_count: u32,
    pub monthly_ratio: f64,
    pub occurrence_probability: f64,
    pub factors: Option<ConfidenceFactors>,
    pub historical_day_occurrences: Option<u32>,
    pub reason: String,
}

/// 1 回の生成の結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub created: usize,
    pub generated_at: DateTime<Utc>,
    pub horizon_months: u32,
}

/// 予測エンジン
///
/// 履歴全体から病名ごとに独立して予測を組み立て、最後に予測セット全体を
/// 1 回で置き換える。病名単位の計算は並行化できるが、コミットは直列。
pub struct ForecastGenerator<S> {
    store: S,
    concurrency: usize,
}

impl<S: ForecastStore + Sync> ForecastGenerator<S> {
    pub fn new(store: S) -> Self {
        let concurrency = common::config::get("FORECAST_DISEASE_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4);
        Self { store, concurrency }
    }

    pub async fn generate(&self, horizon_months: u32) -> Result<GenerationSummary> {
        self.generate_at(Utc::now().date_naive(), horizon_months)
            .await
    }

    /// 基準日を指定して生成する（スケジューラとテストの両方から使う）
    pub async fn generate_at(
        &self,
        today: NaiveDate,
        horizon_months: u32,
    ) -> Result<GenerationSummary> {
        use futures::stream::{self, StreamExt};

        let log = DEFAULT.new(o!(
            "function" => "ForecastGenerator::generate_at",
            "today" => today.to_string(),
            "horizon_months" => horizon_months,
        ));
        trace!(log, "start");

        let diseases = self.store.distinct_disease_names().await?;
        let months = horizon::months_in_horizon(today, horizon_months);

        info!(log, "loaded diseases";
            "diseases" => diseases.len(),
            "months" => months.len(),
        );

        let results: Vec<Result<Vec<Prediction>>> = stream::iter(diseases)
            .map(|disease| {
                let months = &months;
                async move {
                    let records = self.store.occurrences_by_disease(&disease).await?;
                    Ok(predictions_for_disease(&disease, &records, months))
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        // ストレージエラーはこの時点で実行全体の失敗にする（部分書き込みなし）
        let mut predictions = Vec::new();
        for result in results {
            predictions.extend(result?);
        }

        // 出力順を安定させる（病名、予測日の昇順）
        predictions.sort_by(|a, b| {
            a.disease_name
                .cmp(&b.disease_name)
                .then(a.prediction_date.cmp(&b.prediction_date))
        });

        let created = self.store.replace_predictions(&predictions).await?;

        info!(log, "success"; "created" => created);
        Ok(GenerationSummary {
            created,
            generated_at: Utc::now(),
            horizon_months,
        })
    }
}

/// 1 病名分の予測列を組み立てる（純粋計算）
///
/// 有効な履歴が 1 件もない病名は対象外（空を返す）。
pub fn predictions_for_disease(
    disease_name: &str,
    records: &[HistoricalOccurrence],
    months: &[YearMonth],
) -> Vec<Prediction> {
    let history = DiseaseHistory::new(records);
    if history.is_empty() {
        return Vec::new();
    }

    let overall = history.overall();
    let monthly = history.monthly();
    // 観測された月数ではなく常に 12 で割る（意図的にそのまま維持）
    let avg_occurrences_per_month = overall.total_occurrences as f64 / 12.0;

    let mut predictions = Vec::new();
    for target in months {
        let month_data = monthly
            .get(&target.month)
            .filter(|m| m.occurrence_count > 0);
        match month_data {
            Some(month_stats) => {
                let monthly_frequency = month_stats.occurrence_count;
                let monthly_ratio = monthly_frequency as f64 / avg_occurrences_per_month;
                let occurrence_probability = score::occurrence_probability(monthly_ratio);
                let factors = score::confidence_factors(
                    monthly_frequency,
                    overall.total_occurrences,
                    month_stats,
                );
                let confidence = score::confidence_score(&factors);
                let risk_level = RiskLevel::from_monthly_frequency(monthly_frequency);

                let pattern = history.day_pattern(target.month);
                if pattern.is_empty() {
                    // 日付パターンなし: 月央 15 日で 1 件
                    if let Some(date) =
                        DateStamp::from_ymd(target.year, target.month, MID_MONTH_DAY)
                    {
                        predictions.push(Prediction {
                            prediction_date: date,
                            disease_name: disease_name.to_string(),
                            predicted_livestock_count: None,
                            confidence_score: score::fallback_confidence(confidence),
                            prediction_basis: PredictionBasis {
                                method: "mid_month_fallback".to_string(),
                                total_occurrences: overall.total_occurrences,
                                avg_occurrences_per_month,
                                monthly_occurrence_count: monthly_frequency,
                                monthly_ratio,
                                occurrence_probability,
                                factors: Some(factors.clone()),
                                historical_day_occurrences: None,
                                reason: "mid-month fallback, no day pattern".to_string(),
                            },
                            region: None,
                            risk_level,
                        });
                    }
                } else {
                    // 日付パターンあり: 暦上有効な日付だけを採用し、
                    // 信頼度はこの月の全日付で共通（日別には変えない）
                    for (day, count) in pattern {
                        let Some(date) = DateStamp::from_ymd(target.year, target.month, day)
                        else {
                            continue;
                        };
                        predictions.push(Prediction {
                            prediction_date: date,
                            disease_name: disease_name.to_string(),
                            predicted_livestock_count: None,
                            confidence_score: confidence,
                            prediction_basis: PredictionBasis {
                                method: "day_of_month_pattern".to_string(),
                                total_occurrences: overall.total_occurrences,
                                avg_occurrences_per_month,
                                monthly_occurrence_count: monthly_frequency,
                                monthly_ratio,
                                occurrence_probability,
                                factors: Some(factors.clone()),
                                historical_day_occurrences: Some(count),
                                reason: format!(
                                    "past occurred on {}/{} {} times",
                                    target.month, day, count
                                ),
                            },
                            region: None,
                            risk_level,
                        });
                    }
                }
            }
            None => {
                // 対象月に履歴なし: 低信頼度の 15 日予測を 1 件
                if let Some(date) = DateStamp::from_ymd(target.year, target.month, MID_MONTH_DAY)
                {
                    predictions.push(Prediction {
                        prediction_date: date,
                        disease_name: disease_name.to_string(),
                        predicted_livestock_count: None,
                        confidence_score: score::low_data_confidence(overall.total_occurrences),
                        prediction_basis: PredictionBasis {
                            method: "low_confidence_prediction".to_string(),
                            total_occurrences: overall.total_occurrences,
                            avg_occurrences_per_month,
                            monthly_occurrence_count: 0,
                            monthly_ratio: 0.0,
                            occurrence_probability: 0.0,
                            factors: None,
                            historical_day_occurrences: None,
                            reason: format!("no historical data for month {}", target.month),
                        },
                        region: None,
                        risk_level: RiskLevel::Low,
                    });
                }
            }
        }
    }

    predictions
}
