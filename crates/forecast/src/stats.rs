use crate::store::HistoricalOccurrence;
use chrono::{Datelike, NaiveDate};
use common::types::DateStamp;
use std::collections::BTreeMap;

/// 日付パターンとして採用する上位日数
const DAY_PATTERN_LIMIT: usize = 5;

/// 病名単位の全期間統計
#[derive(Debug, Clone, PartialEq)]
pub struct OverallStats {
    pub total_occurrences: u32,
    pub overall_avg: f64,
    pub overall_std_dev: f64,
    pub min_count: Option<i32>,
    pub max_count: Option<i32>,
    pub first_occurrence_date: Option<DateStamp>,
    pub last_occurrence_date: Option<DateStamp>,
}

/// 暦月（1-12、年は合算）単位の統計
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStats {
    pub occurrence_count: u32,
    pub avg_count: f64,
    pub total_count: i64,
    pub std_dev_count: f64,
    pub min_count: Option<i32>,
    pub max_count: Option<i32>,
}

/// 1 病名分の履歴
///
/// 8桁の数字でない・暦上存在しない発生日のレコードは構築時に除外する。
/// 頭数ベースの統計（平均・標準偏差・最小・最大）には発生頭数が
/// 非 NULL のレコードのみが寄与する。
#[derive(Debug, Clone)]
pub struct DiseaseHistory {
    records: Vec<(NaiveDate, Option<i32>)>,
}

impl DiseaseHistory {
    pub fn new(records: &[HistoricalOccurrence]) -> Self {
        let records = records
            .iter()
            .filter_map(|r| r.occurrence_date.to_date().map(|d| (d, r.livestock_count)))
            .collect();
        DiseaseHistory { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn overall(&self) -> OverallStats {
        let counts: Vec<i32> = self.records.iter().filter_map(|(_, c)| *c).collect();
        let (avg, std_dev) = mean_and_std_dev(&counts);
        OverallStats {
            total_occurrences: self.records.len() as u32,
            overall_avg: avg,
            overall_std_dev: std_dev,
            min_count: counts.iter().min().copied(),
            max_count: counts.iter().max().copied(),
            first_occurrence_date: self
                .records
                .iter()
                .map(|(d, _)| *d)
                .min()
                .map(DateStamp::from_date),
            last_occurrence_date: self
                .records
                .iter()
                .map(|(d, _)| *d)
                .max()
                .map(DateStamp::from_date),
        }
    }

    /// 暦月ごとの統計。履歴のない月はエントリ自体を持たない。
    pub fn monthly(&self) -> BTreeMap<u32, MonthlyStats> {
        let mut by_month: BTreeMap<u32, Vec<Option<i32>>> = BTreeMap::new();
        for (date, count) in &self.records {
            by_month.entry(date.month()).or_default().push(*count);
        }

        by_month
            .into_iter()
            .map(|(month, entries)| {
                let counts: Vec<i32> = entries.iter().filter_map(|c| *c).collect();
                let (avg, std_dev) = mean_and_std_dev(&counts);
                let stats = MonthlyStats {
                    occurrence_count: entries.len() as u32,
                    avg_count: avg,
                    total_count: counts.iter().map(|c| *c as i64).sum(),
                    std_dev_count: std_dev,
                    min_count: counts.iter().min().copied(),
                    max_count: counts.iter().max().copied(),
                };
                (month, stats)
            })
            .collect()
    }

    /// 対象月の日付パターン: (日, 過去発生回数) の上位 5 件
    ///
    /// 回数降順、同数のときは日の昇順で安定に並べる。
    pub fn day_pattern(&self, month: u32) -> Vec<(u32, u32)> {
        let mut by_day: BTreeMap<u32, u32> = BTreeMap::new();
        for (date, _) in &self.records {
            if date.month() == month {
                *by_day.entry(date.day()).or_insert(0) += 1;
            }
        }

        let mut pattern: Vec<(u32, u32)> = by_day.into_iter().collect();
        pattern.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        pattern.truncate(DAY_PATTERN_LIMIT);
        pattern
    }
}

/// 平均と母標準偏差。空なら (0, 0)。
fn mean_and_std_dev(values: &[i32]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| {
            let diff = *v as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests;
