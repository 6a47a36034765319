use crate::stats::MonthlyStats;
use serde::{Deserialize, Serialize};

/// 発生頻度ファクターの上限
const FREQUENCY_CAP: f64 = 40.0;
/// データ量ファクターの上限
const DATA_VOLUME_CAP: f64 = 30.0;
/// 安定度ファクターの上限
const CONSISTENCY_CAP: f64 = 30.0;

/// 日付パターンなしフォールバックの信頼度下限
const FALLBACK_FLOOR: f64 = 30.0;
const FALLBACK_PENALTY: f64 = 20.0;

/// 信頼度を構成する 3 ファクター（予測根拠として永続化される）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub frequency: f64,
    pub data_volume: f64,
    pub consistency: f64,
}

/// 月間統計から 3 ファクターを算出する
///
/// - 発生頻度: 月間発生回数 10 回で満点（上限 40）
/// - データ量: 全期間 200 件で満点（上限 30）
/// - 安定度: 変動係数 CV から減点。標準偏差か平均が 0 のときは一律 15
pub fn confidence_factors(
    monthly_frequency: u32,
    total_occurrences: u32,
    monthly: &MonthlyStats,
) -> ConfidenceFactors {
    let frequency = (monthly_frequency as f64 / 10.0 * FREQUENCY_CAP).min(FREQUENCY_CAP);
    let data_volume = (total_occurrences as f64 / 200.0 * DATA_VOLUME_CAP).min(DATA_VOLUME_CAP);
    let consistency = if monthly.std_dev_count > 0.0 && monthly.avg_count > 0.0 {
        let cv = monthly.std_dev_count / monthly.avg_count;
        (CONSISTENCY_CAP - cv * 15.0).max(0.0)
    } else {
        15.0
    };
    ConfidenceFactors {
        frequency,
        data_volume,
        consistency,
    }
}

/// 3 ファクターの合計を 0-100 に丸めた信頼度
///
/// 上限の合計が 40+30+30=100 なので正規化は実質合計そのもの。
pub fn confidence_score(factors: &ConfidenceFactors) -> f64 {
    let sum = factors.frequency + factors.data_volume + factors.consistency;
    let caps = FREQUENCY_CAP + DATA_VOLUME_CAP + CONSISTENCY_CAP;
    (sum / caps * 100.0).round()
}

/// 日付パターンが得られなかった月央フォールバックの信頼度
pub fn fallback_confidence(confidence: f64) -> f64 {
    (confidence - FALLBACK_PENALTY).max(FALLBACK_FLOOR)
}

/// 対象月に履歴がない場合の低信頼度スコア: min(30, round(total/500*30))
pub fn low_data_confidence(total_occurrences: u32) -> f64 {
    (total_occurrences as f64 / 500.0 * 30.0).round().min(30.0)
}

/// 発生確率（根拠表示用の参考値）: min(100, round(monthly_ratio * 50))
pub fn occurrence_probability(monthly_ratio: f64) -> f64 {
    (monthly_ratio * 50.0).round().min(100.0)
}
