use std::collections::HashMap;

use chrono::NaiveDate;

use crate::{
    crawler::{
        classify::JsonObject,
        decode,
        error::DecodeError,
        field::{self, RawRecord, ZipMode},
    },
    declare::Quote,
    util::datetime,
};

const CODE: &str = "證券代號";
const NAME: &str = "證券名稱";
const VOLUME: &str = "成交股數";
const TRANSACTIONS: &str = "成交筆數";
const TURNOVER: &str = "成交金額";
const OPEN: &str = "開盤價";
const HIGH: &str = "最高價";
const LOW: &str = "最低價";
const CLOSE: &str = "收盤價";
const DATE: &str = "日期";
const YEAR: &str = "年度";
const MONTH: &str = "月份";
const MONTHLY_TURNOVER: &str = "成交金額(A)";
const MONTHLY_VOLUME: &str = "成交股數(B)";
/// 年資料中第二個「日期」是最低價的日期
const DATE_OF_LOW: &str = "日期2";

/// 每日收盤行情(MI_INDEX)
pub(crate) fn decode_day_quotes(
    object: &JsonObject,
    date: NaiveDate,
    mode: ZipMode,
) -> Result<HashMap<String, Quote>, DecodeError> {
    let records = snapshot_records(object, mode)?;
    let mut quotes = HashMap::with_capacity(records.len());

    for record in records {
        let code = record.text(CODE)?.trim();
        if code.is_empty() {
            return Err(DecodeError::MissingField {
                field: CODE.to_string(),
                row: record.row(),
            });
        }

        let mut q = Quote::new(code, date);
        q.name = record.text(NAME)?.trim().to_string();
        q.volume = count(&record, VOLUME)?;
        q.transaction_count = count(&record, TRANSACTIONS)?;
        q.turnover_value = count(&record, TURNOVER)?;
        q.open = price(&record, OPEN)?;
        q.high = price(&record, HIGH)?;
        q.low = price(&record, LOW)?;
        q.close = price(&record, CLOSE)?;

        quotes.insert(q.code.clone(), q);
    }

    Ok(quotes)
}

/// 舊版回應把個股行情放在 `fields9`/`data9`，新版則是 `tables` 中欄位含有證券代號的那一個
fn snapshot_records(object: &JsonObject, mode: ZipMode) -> Result<Vec<RawRecord>, DecodeError> {
    if object.contains_key("fields9") {
        return field::zip_table(object, "fields9", "data9", mode);
    }

    if let Some(tables) = object.get("tables") {
        let tables: Vec<JsonObject> = field::from_value(tables, "tables")?;
        for table in &tables {
            let fields: Vec<String> = match table.get("fields") {
                Some(fields) if !fields.is_null() => field::from_value(fields, "fields")?,
                _ => continue,
            };

            if fields.iter().any(|f| f == CODE) {
                return field::zip_table(table, "fields", "data", mode);
            }
        }
    }

    Err(DecodeError::MissingKey("data9".to_string()))
}

/// 個股日成交資訊(STOCK_DAY)，依日期由舊到新
pub(crate) fn decode_daily_quotes(
    object: &JsonObject,
    code: &str,
    mode: ZipMode,
) -> Result<Vec<Quote>, DecodeError> {
    let records = field::zip_table(object, "fields", "data", mode)?;
    let mut quotes = Vec::with_capacity(records.len());

    for record in records {
        let mut q = Quote::new(code, decode::to_roc_date(DATE, record.text(DATE)?)?);
        q.volume = count(&record, VOLUME)?;
        q.turnover_value = count(&record, TURNOVER)?;
        q.transaction_count = count(&record, TRANSACTIONS)?;
        q.open = price(&record, OPEN)?;
        q.high = price(&record, HIGH)?;
        q.low = price(&record, LOW)?;
        q.close = price(&record, CLOSE)?;
        quotes.push(q);
    }

    quotes.sort_by_key(|q| q.period_start);

    Ok(quotes)
}

/// 個股月成交資訊(FMSRFK)，回應中的年度是民國年，直接採用查詢的年度
pub(crate) fn decode_monthly_quotes(
    object: &JsonObject,
    code: &str,
    year: i32,
    mode: ZipMode,
) -> Result<Vec<Quote>, DecodeError> {
    let records = field::zip_table(object, "fields", "data", mode)?;
    let mut quotes = Vec::with_capacity(records.len());

    for record in records {
        let month = decode::to_month(MONTH, record.integer(MONTH)?)?;
        let mut q = Quote::new(code, decode::to_date(MONTH, year, month, 1)?);
        q.high = price(&record, HIGH)?;
        q.low = price(&record, LOW)?;
        q.transaction_count = count(&record, TRANSACTIONS)?;
        q.turnover_value = count(&record, MONTHLY_TURNOVER)?;
        q.volume = count(&record, MONTHLY_VOLUME)?;
        quotes.push(q);
    }

    Ok(quotes)
}

/// 個股年成交資訊(FMNPTK)
pub(crate) fn decode_yearly_quotes(
    object: &JsonObject,
    code: &str,
    mode: ZipMode,
) -> Result<Vec<Quote>, DecodeError> {
    let records = field::zip_table(object, "fields", "data", mode)?;
    let mut quotes = Vec::with_capacity(records.len());

    for record in records {
        let roc_year = record.integer(YEAR)?;
        let year = datetime::to_gregorian_year(roc_year).ok_or_else(|| DecodeError::InvalidDate {
            field: YEAR.to_string(),
            value: roc_year.to_string(),
        })?;
        let mut q = Quote::new(code, decode::to_date(YEAR, year, 1, 1)?);
        q.volume = count(&record, VOLUME)?;
        q.turnover_value = count(&record, TURNOVER)?;
        q.transaction_count = count(&record, TRANSACTIONS)?;
        q.high = price(&record, HIGH)?;
        q.date_of_high = Some(decode::to_month_day(DATE, year, record.text(DATE)?)?);
        q.low = price(&record, LOW)?;
        q.date_of_low = Some(decode::to_month_day(
            DATE_OF_LOW,
            year,
            record.text(DATE_OF_LOW)?,
        )?);
        quotes.push(q);
    }

    Ok(quotes)
}

fn count(record: &RawRecord, field: &str) -> Result<u64, DecodeError> {
    decode::to_u64(field, record.text(field)?)
}

fn price(record: &RawRecord, field: &str) -> Result<f64, DecodeError> {
    decode::to_price(field, record.text(field)?)
}
