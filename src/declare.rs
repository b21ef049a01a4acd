use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// 交易所
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum StockExchange {
    /// 臺灣證券交易所
    #[strum(serialize = "twse")]
    TWSE,
    /// 證券櫃檯買賣中心
    #[strum(serialize = "tpex")]
    TPEx,
}

/// 一檔股票在某一期間(日、月、年)的報價
///
/// 各種查詢共用同一個結構，不適用的欄位維持零值：
/// - `name` 只有單日全市場查詢才會有值
/// - 月資料的 `period_start` 日固定為 1 號，年資料的月、日固定為 1 月 1 號
/// - 月、年資料沒有開盤價與收盤價
/// - `date_of_high`、`date_of_low` 只有年資料才會有值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// 股票代號，例如 0050、2330
    pub code: String,
    pub name: String,
    pub period_start: NaiveDate,
    /// 成交股數
    pub volume: u64,
    /// 成交筆數
    pub transaction_count: u64,
    /// 成交金額
    pub turnover_value: u64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub close: f64,
    pub date_of_high: Option<NaiveDate>,
    pub date_of_low: Option<NaiveDate>,
}

impl Quote {
    pub fn new(code: impl Into<String>, period_start: NaiveDate) -> Self {
        Quote {
            code: code.into(),
            name: String::new(),
            period_start,
            volume: 0,
            transaction_count: 0,
            turnover_value: 0,
            high: 0.0,
            low: 0.0,
            open: 0.0,
            close: 0.0,
            date_of_high: None,
            date_of_low: None,
        }
    }

    /// 當期是否有成交
    pub fn has_trades(&self) -> bool {
        self.transaction_count > 0
    }
}
