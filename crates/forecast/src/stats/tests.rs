use super::*;

fn occurrence(date: &str, count: Option<i32>) -> HistoricalOccurrence {
    HistoricalOccurrence {
        occurrence_date: DateStamp::new(date),
        livestock_count: count,
    }
}

#[test]
fn test_empty_history() {
    let history = DiseaseHistory::new(&[]);
    assert!(history.is_empty());
    assert_eq!(history.overall().total_occurrences, 0);
    assert!(history.monthly().is_empty());
}

#[test]
fn test_malformed_dates_are_excluded() {
    let history = DiseaseHistory::new(&[
        occurrence("20240315", Some(10)),
        occurrence("2024031", Some(10)),
        occurrence("abcdefgh", Some(10)),
        occurrence("20240231", Some(10)),
    ]);
    assert_eq!(history.overall().total_occurrences, 1);
}

#[test]
fn test_overall_stats() {
    let history = DiseaseHistory::new(&[
        occurrence("20230110", Some(10)),
        occurrence("20240320", Some(20)),
        occurrence("20250625", Some(30)),
        // 頭数 NULL は発生回数には数えるが頭数統計には含めない
        occurrence("20250701", None),
    ]);
    let overall = history.overall();
    assert_eq!(overall.total_occurrences, 4);
    assert_eq!(overall.overall_avg, 20.0);
    assert_eq!(overall.min_count, Some(10));
    assert_eq!(overall.max_count, Some(30));
    assert_eq!(
        overall.first_occurrence_date,
        Some(DateStamp::new("20230110"))
    );
    assert_eq!(
        overall.last_occurrence_date,
        Some(DateStamp::new("20250701"))
    );
    // 母標準偏差: sqrt(((10-20)^2+(20-20)^2+(30-20)^2)/3)
    assert!((overall.overall_std_dev - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
}

#[test]
fn test_monthly_merges_years() {
    let history = DiseaseHistory::new(&[
        occurrence("20230315", Some(4)),
        occurrence("20240310", Some(6)),
        occurrence("20240805", Some(100)),
    ]);
    let monthly = history.monthly();
    assert_eq!(monthly.len(), 2);

    let march = &monthly[&3];
    assert_eq!(march.occurrence_count, 2);
    assert_eq!(march.avg_count, 5.0);
    assert_eq!(march.total_count, 10);
    assert_eq!(march.min_count, Some(4));
    assert_eq!(march.max_count, Some(6));
    assert_eq!(march.std_dev_count, 1.0);

    let august = &monthly[&8];
    assert_eq!(august.occurrence_count, 1);
    assert_eq!(august.std_dev_count, 0.0);

    // 履歴のない月にはエントリがない
    assert!(!monthly.contains_key(&1));
}

#[test]
fn test_monthly_count_with_null_livestock() {
    let history = DiseaseHistory::new(&[
        occurrence("20240301", None),
        occurrence("20240302", None),
    ]);
    let march = &history.monthly()[&3];
    assert_eq!(march.occurrence_count, 2);
    assert_eq!(march.avg_count, 0.0);
    assert_eq!(march.total_count, 0);
    assert_eq!(march.min_count, None);
}

#[test]
fn test_day_pattern_ranking() {
    let history = DiseaseHistory::new(&[
        occurrence("20230305", Some(1)),
        occurrence("20240305", Some(1)),
        occurrence("20250305", Some(1)),
        occurrence("20230310", Some(1)),
        occurrence("20240310", Some(1)),
        occurrence("20240320", Some(1)),
        // 他の月は対象外
        occurrence("20240405", Some(1)),
    ]);
    let pattern = history.day_pattern(3);
    assert_eq!(pattern, vec![(5, 3), (10, 2), (20, 1)]);
}

#[test]
fn test_day_pattern_tie_break_is_day_ascending() {
    let history = DiseaseHistory::new(&[
        occurrence("20240325", Some(1)),
        occurrence("20240303", Some(1)),
        occurrence("20240315", Some(1)),
    ]);
    let pattern = history.day_pattern(3);
    assert_eq!(pattern, vec![(3, 1), (15, 1), (25, 1)]);
}

#[test]
fn test_day_pattern_truncates_to_five() {
    let records: Vec<_> = (1..=10)
        .map(|day| occurrence(&format!("202403{day:02}"), Some(1)))
        .collect();
    let history = DiseaseHistory::new(&records);
    let pattern = history.day_pattern(3);
    assert_eq!(pattern.len(), 5);
    assert_eq!(pattern[0], (1, 1));
    assert_eq!(pattern[4], (5, 1));
}

#[test]
fn test_day_pattern_empty_month() {
    let history = DiseaseHistory::new(&[occurrence("20240305", Some(1))]);
    assert!(history.day_pattern(7).is_empty());
}
