//! 台股上市(證交所)與上櫃(櫃買中心)報價爬蟲。
//!
//! 每次請求的流程：等待 [`RateLimiter`] 放行 → 送出請求 → 判斷回應結果
//! ([`classify`]) → 把欄位配對成紀錄或過濾純文字報表 → 轉成 [`Quote`]。
//!
//! [`RateLimiter`]: crate::util::http::throttle::RateLimiter

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::declare::{Quote, StockExchange};

pub use error::{DecodeError, FetchError};
pub use field::ZipMode;

/// 判斷回應是成功、查無資料、被封鎖或連線失敗
pub mod classify;
pub(crate) mod decode;
pub mod error;
pub(crate) mod field;
/// 台灣證券櫃檯買賣中心
pub mod tpex;
/// 台灣證券交易所
pub mod twse;

/// 一個交易所提供的四種報價查詢
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn exchange(&self) -> StockExchange;

    /// 指定日期全市場的收盤行情，以股票代號為 key；休市日回傳空的集合
    async fn fetch_day_quotes(&self, date: NaiveDate) -> Result<HashMap<String, Quote>, FetchError>;

    /// 個股指定月份每個交易日的行情，依日期由舊到新
    async fn fetch_daily_quotes(
        &self,
        code: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<Quote>, FetchError>;

    /// 個股指定年度每個月的統計
    async fn fetch_monthly_quotes(&self, code: &str, year: i32) -> Result<Vec<Quote>, FetchError>;

    /// 個股上市(櫃)以來每一年的統計
    async fn fetch_yearly_quotes(&self, code: &str) -> Result<Vec<Quote>, FetchError>;
}

/// 單一個股的查詢沒有任何資料列時視為查無資料
pub(crate) fn require_rows(quotes: Vec<Quote>, what: &str) -> Result<Vec<Quote>, FetchError> {
    if quotes.is_empty() {
        return Err(FetchError::NoData(format!("{} has no rows", what)));
    }

    Ok(quotes)
}

/// 查詢參數中使用的毫秒時間戳，避免拿到快取的舊資料
pub(crate) fn cache_buster() -> String {
    chrono::Local::now().timestamp_millis().to_string()
}
