pub mod date_stamp;
pub mod risk_level;

pub use self::date_stamp::DateStamp;
pub use self::risk_level::RiskLevel;

use serde::{Deserialize, Serialize};

/// ページネーション情報（一覧系レスポンスの共通部分）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T>
where
    T: std::fmt::Debug + Clone,
{
    pub list: Vec<T>,
    pub pagination: Pagination,
}
