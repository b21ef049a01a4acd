use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    crawler::{
        classify::JsonObject,
        decode::{self, Row},
        error::DecodeError,
        field::{self, Scalar},
    },
    declare::Quote,
};

#[derive(Deserialize, Debug)]
struct Table {
    #[serde(default)]
    data: Option<Vec<Vec<Scalar>>>,
}

/// 取出 JSON 回應中的資料列
///
/// 舊版回應放在 `aaData`，新版放在 `tables[0].data`。
pub(crate) fn rows(object: &JsonObject) -> Result<Vec<Vec<String>>, DecodeError> {
    let rows: Vec<Vec<Scalar>> = if let Some(aa_data) = object.get("aaData") {
        field::from_value(aa_data, "aaData")?
    } else if let Some(tables) = object.get("tables") {
        let tables: Vec<Table> = field::from_value(tables, "tables")?;
        tables
            .into_iter()
            .next()
            .and_then(|table| table.data)
            .unwrap_or_default()
    } else {
        return Err(DecodeError::MissingKey("aaData".to_string()));
    };

    Ok(rows
        .into_iter()
        .map(|row| row.into_iter().map(Scalar::into_text).collect())
        .collect())
}

/// 上櫃股票每日收盤行情，價格與數量都是原始單位
pub(crate) fn decode_day_quotes(
    rows: &[Vec<String>],
    date: NaiveDate,
) -> Result<HashMap<String, Quote>, DecodeError> {
    let mut quotes = HashMap::with_capacity(rows.len());

    for (i, cells) in rows.iter().enumerate() {
        let row = Row::new(i, cells);
        let code = row.cell(0, "code")?;
        if code.is_empty() {
            return Err(DecodeError::MissingField {
                field: "code".to_string(),
                row: i,
            });
        }

        let mut q = Quote::new(code, date);
        q.name = row.cell(1, "name")?.to_string();
        q.close = row.price(2, "close")?;
        q.open = row.price(4, "open")?;
        q.high = row.price(5, "high")?;
        q.low = row.price(6, "low")?;
        q.volume = row.u64(8, "volume")?;
        q.turnover_value = row.u64(9, "turnover")?;
        q.transaction_count = row.u64(10, "transactions")?;

        quotes.insert(q.code.clone(), q);
    }

    Ok(quotes)
}

/// 個股日成交資訊(st43)，成交股數與金額以千為單位
pub(crate) fn decode_daily_quotes(rows: &[Vec<String>], code: &str) -> Result<Vec<Quote>, DecodeError> {
    let mut quotes = Vec::with_capacity(rows.len());

    for (i, cells) in rows.iter().enumerate() {
        let row = Row::new(i, cells);
        let mut q = Quote::new(code, decode::to_roc_date("date", row.cell(0, "date")?)?);
        q.volume = row.u64_thousands(1, "volume")?;
        q.turnover_value = row.u64_thousands(2, "turnover")?;
        q.open = row.price(3, "open")?;
        q.high = row.price(4, "high")?;
        q.low = row.price(5, "low")?;
        q.close = row.price(6, "close")?;
        q.transaction_count = row.u64(8, "transactions")?;
        quotes.push(q);
    }

    quotes.sort_by_key(|q| q.period_start);

    Ok(quotes)
}

/// 個股月成交資訊(st44 CSV)，成交股數與金額以千為單位
pub(crate) fn decode_monthly_quotes(text: &str, code: &str) -> Result<Vec<Quote>, DecodeError> {
    let rows = decode::split_csv_rows(&decode::filter_data_lines(text))?;
    let mut quotes = Vec::with_capacity(rows.len());

    for (i, cells) in rows.iter().enumerate() {
        let row = Row::new(i, cells);
        let year = row.integer(0, "year")?;
        let month = decode::to_month("month", row.integer(1, "month")?)?;

        let mut q = Quote::new(code, decode::to_date("month", year, month, 1)?);
        q.high = row.price(2, "high")?;
        q.low = row.price(3, "low")?;
        q.transaction_count = row.u64(5, "transactions")?;
        q.turnover_value = row.u64_thousands(6, "turnover")?;
        q.volume = row.u64_thousands(7, "volume")?;
        quotes.push(q);
    }

    Ok(quotes)
}

/// 個股年成交資訊(st42 CSV)，成交股數、金額與筆數都以千為單位
pub(crate) fn decode_yearly_quotes(text: &str, code: &str) -> Result<Vec<Quote>, DecodeError> {
    let rows = decode::split_csv_rows(&decode::filter_data_lines(text))?;
    let mut quotes = Vec::with_capacity(rows.len());

    for (i, cells) in rows.iter().enumerate() {
        let row = Row::new(i, cells);
        let year = row.integer(0, "year")?;

        let mut q = Quote::new(code, decode::to_date("year", year, 1, 1)?);
        q.volume = row.u64_thousands(1, "volume")?;
        q.turnover_value = row.u64_thousands(2, "turnover")?;
        q.transaction_count = row.u64_thousands(3, "transactions")?;
        q.high = row.price(4, "high")?;
        q.date_of_high = Some(decode::to_month_day(
            "date_of_high",
            year,
            row.cell(5, "date_of_high")?,
        )?);
        q.low = row.price(6, "low")?;
        q.date_of_low = Some(decode::to_month_day(
            "date_of_low",
            year,
            row.cell(7, "date_of_low")?,
        )?);
        quotes.push(q);
    }

    Ok(quotes)
}
