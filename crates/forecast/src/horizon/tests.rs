use super::*;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn test_mid_month_three_month_horizon() {
    // 月央開始: 当月を含めて終端月まで 4 ヶ月分
    let months = months_in_horizon(date(2026, 8, 23), 3);
    assert_eq!(
        months,
        vec![
            YearMonth {
                year: 2026,
                month: 8
            },
            YearMonth {
                year: 2026,
                month: 9
            },
            YearMonth {
                year: 2026,
                month: 10
            },
            YearMonth {
                year: 2026,
                month: 11
            },
        ]
    );
}

#[test]
fn test_crosses_year_boundary() {
    let months = months_in_horizon(date(2025, 11, 5), 3);
    let pairs: Vec<(i32, u32)> = months.iter().map(|m| (m.year, m.month)).collect();
    assert_eq!(
        pairs,
        vec![(2025, 11), (2025, 12), (2026, 1), (2026, 2)]
    );
}

#[test]
fn test_first_of_month_start() {
    // 1日開始でも当月は含まれる
    let months = months_in_horizon(date(2026, 4, 1), 1);
    let pairs: Vec<(i32, u32)> = months.iter().map(|m| (m.year, m.month)).collect();
    assert_eq!(pairs, vec![(2026, 4), (2026, 5)]);
}

#[test]
fn test_zero_horizon_yields_current_month() {
    let months = months_in_horizon(date(2026, 8, 23), 0);
    assert_eq!(
        months,
        vec![YearMonth {
            year: 2026,
            month: 8
        }]
    );
}

#[test]
fn test_restartable() {
    // 純粋関数なので同じ入力からは同じ列が得られる
    let a = months_in_horizon(date(2026, 2, 28), 12);
    let b = months_in_horizon(date(2026, 2, 28), 12);
    assert_eq!(a, b);
    assert_eq!(a.len(), 13);
}
