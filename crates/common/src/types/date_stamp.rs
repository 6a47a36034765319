use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// 8桁文字列 (YYYYMMDD) で表される日付
///
/// 外部フィードに由来する生の値をそのまま保持する。8桁の数字でない、
/// あるいは暦上存在しない値は `to_date()` が `None` を返し、
/// 集計からは除外される（エラーにはしない）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateStamp(String);

impl DateStamp {
    pub fn new(raw: impl Into<String>) -> Self {
        DateStamp(raw.into())
    }

    /// 暦上有効な日付からのみ構築する
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::from_date)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        DateStamp(format!(
            "{:04}{:02}{:02}",
            date.year(),
            date.month(),
            date.day()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 暦上有効な日付であれば `NaiveDate` に変換する
    pub fn to_date(&self) -> Option<NaiveDate> {
        if self.0.len() != 8 || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year: i32 = self.0[0..4].parse().ok()?;
        let month: u32 = self.0[4..6].parse().ok()?;
        let day: u32 = self.0[6..8].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    pub fn is_valid(&self) -> bool {
        self.to_date().is_some()
    }

    /// 1-12 の月（有効な日付のみ）
    pub fn month(&self) -> Option<u32> {
        self.to_date().map(|d| d.month())
    }

    pub fn day(&self) -> Option<u32> {
        self.to_date().map(|d| d.day())
    }

    pub fn year(&self) -> Option<i32> {
        self.to_date().map(|d| d.year())
    }
}

impl Display for DateStamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NaiveDate> for DateStamp {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}
