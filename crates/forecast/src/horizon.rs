use chrono::{Datelike, Months, NaiveDate};

/// 予測対象の年月
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

/// 予測対象月の列を生成する
///
/// 当月1日を起点に 1 ヶ月ずつ進め、`today + horizon_months`（暦月演算）を
/// 超えるまでの `(year, month)` を両端含みで返す。日数ベースの加算ではない。
pub fn months_in_horizon(today: NaiveDate, horizon_months: u32) -> Vec<YearMonth> {
    let Some(end) = today.checked_add_months(Months::new(horizon_months)) else {
        return Vec::new();
    };

    let mut months = Vec::new();
    let mut cursor = match today.with_day(1) {
        Some(first) => first,
        None => return Vec::new(),
    };
    while cursor <= end {
        months.push(YearMonth {
            year: cursor.year(),
            month: cursor.month(),
        });
        cursor = match cursor.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    months
}

#[cfg(test)]
mod tests;
