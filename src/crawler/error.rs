use thiserror::Error;

/// 回應收到了，但內容無法轉成報價
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("key '{0}' does not exist")]
    MissingKey(String),
    #[error("field '{field}' does not exist in row {row}")]
    MissingField { field: String, row: usize },
    #[error("value {value} of field '{field}' in row {row} is not {expected}")]
    WrongKind {
        field: String,
        row: usize,
        expected: &'static str,
        value: String,
    },
    #[error("value '{value}' of field '{field}' is not a valid number: {reason}")]
    InvalidNumber {
        field: String,
        value: String,
        reason: String,
    },
    #[error("value '{value}' of field '{field}' is not a valid date")]
    InvalidDate { field: String, value: String },
    #[error("value {value} of field '{field}' overflows when scaled by {factor}")]
    Overflow {
        field: String,
        value: u64,
        factor: u64,
    },
    #[error("fields has {fields} elements but row {row} has {values}")]
    ArityMismatch {
        fields: usize,
        row: usize,
        values: usize,
    },
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// 抓取報價時的錯誤，呼叫端可依種類決定是否稍後重試
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// 查無資料：股票代號不存在、上市前的日期或休市日
    #[error("NoData: {0}")]
    NoData(String),
    /// 查詢太頻繁被交易所封鎖，通常約一小時後恢復
    #[error("QuotaExceeded: {0}")]
    QuotaExceeded(String),
    /// 無法連線到交易所
    #[error("ConnectionError: {0}")]
    Connection(String),
    #[error("DecodeError: {0}")]
    Decode(#[from] DecodeError),
}

impl FetchError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchError::NoData(_))
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, FetchError::QuotaExceeded(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, FetchError::Connection(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode(_))
    }
}
