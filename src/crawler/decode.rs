//! 報價欄位的轉換規則，兩個交易所共用。

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    crawler::error::DecodeError,
    util::{datetime, text},
};

/// 部分資料以「千股」、「千元」為單位
pub(crate) const THOUSAND: u64 = 1000;

static ALPHABETIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]+").expect("Failed to compile alphabetic regex"));

/// 千分位整數，例︰`1,062,607` => 1062607
pub(crate) fn to_u64(field: &str, raw: &str) -> Result<u64, DecodeError> {
    text::parse_u64(raw, None).map_err(|why| DecodeError::InvalidNumber {
        field: field.to_string(),
        value: raw.to_string(),
        reason: why.to_string(),
    })
}

/// 以千為單位的千分位整數，轉回個位數
pub(crate) fn to_u64_thousands(field: &str, raw: &str) -> Result<u64, DecodeError> {
    scale(field, to_u64(field, raw)?, THOUSAND)
}

pub(crate) fn scale(field: &str, value: u64, factor: u64) -> Result<u64, DecodeError> {
    value.checked_mul(factor).ok_or_else(|| DecodeError::Overflow {
        field: field.to_string(),
        value,
        factor,
    })
}

/// 價格，無成交時的 `--`、`---` 視為 0
pub(crate) fn to_price(field: &str, raw: &str) -> Result<f64, DecodeError> {
    if text::is_dash_placeholder(raw) {
        return Ok(0.0);
    }

    let invalid = |reason: String| DecodeError::InvalidNumber {
        field: field.to_string(),
        value: raw.to_string(),
        reason,
    };

    let v = text::parse_f64(raw, None).map_err(|why| invalid(why.to_string()))?;
    if v < 0.0 {
        return Err(invalid("price must be non-negative".to_string()));
    }

    Ok(v)
}

/// 民國日期，例︰`110/03/30` => 2021-03-30
pub(crate) fn to_roc_date(field: &str, raw: &str) -> Result<NaiveDate, DecodeError> {
    datetime::parse_taiwan_date(raw).ok_or_else(|| invalid_date(field, raw))
}

/// 只有 `月/日` 的日期，年份由呼叫端提供
pub(crate) fn to_month_day(field: &str, year: i32, raw: &str) -> Result<NaiveDate, DecodeError> {
    datetime::parse_month_day(year, raw).ok_or_else(|| invalid_date(field, raw))
}

/// 月份欄位轉成 `u32`，負數視為無效
pub(crate) fn to_month(field: &str, value: i32) -> Result<u32, DecodeError> {
    u32::try_from(value).map_err(|why| DecodeError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
        reason: why.to_string(),
    })
}

pub(crate) fn to_date(field: &str, year: i32, month: u32, day: u32) -> Result<NaiveDate, DecodeError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| invalid_date(field, &format!("{}/{}/{}", year, month, day)))
}

fn invalid_date(field: &str, raw: &str) -> DecodeError {
    DecodeError::InvalidDate {
        field: field.to_string(),
        value: raw.to_string(),
    }
}

/// 以欄位位置存取的一列資料
pub(crate) struct Row<'a> {
    index: usize,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    pub(crate) fn new(index: usize, cells: &'a [String]) -> Self {
        Row { index, cells }
    }

    pub(crate) fn cell(&self, column: usize, field: &str) -> Result<&'a str, DecodeError> {
        self.cells
            .get(column)
            .map(|s| s.trim())
            .ok_or_else(|| DecodeError::MissingField {
                field: format!("{}(#{})", field, column),
                row: self.index,
            })
    }

    pub(crate) fn u64(&self, column: usize, field: &str) -> Result<u64, DecodeError> {
        to_u64(field, self.cell(column, field)?)
    }

    pub(crate) fn u64_thousands(&self, column: usize, field: &str) -> Result<u64, DecodeError> {
        to_u64_thousands(field, self.cell(column, field)?)
    }

    pub(crate) fn price(&self, column: usize, field: &str) -> Result<f64, DecodeError> {
        to_price(field, self.cell(column, field)?)
    }

    pub(crate) fn integer(&self, column: usize, field: &str) -> Result<i32, DecodeError> {
        let raw = self.cell(column, field)?;
        raw.parse::<i32>().map_err(|why| DecodeError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
            reason: why.to_string(),
        })
    }
}

/// 櫃買中心下載的 CSV 前後夾雜標題、欄位名稱與備註。
///
/// 從第一行沒有英文字母的行開始收，到下一行含有英文字母為止，空白行略過。
pub(crate) fn filter_data_lines(text: &str) -> String {
    let mut data_lines = Vec::new();
    let mut is_in_data_stage = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let has_letters = ALPHABETIC.is_match(line);
        if !is_in_data_stage {
            if has_letters {
                continue;
            }
            is_in_data_stage = true;
        } else if has_letters {
            break;
        }

        data_lines.push(line);
    }

    data_lines.join("\n")
}

/// 過濾後的 CSV 切成一列一列
pub(crate) fn split_csv_rows(text: &str) -> Result<Vec<Vec<String>>, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(String::from).collect())
                .map_err(|why| DecodeError::Malformed(format!("failed to read CSV: {}", why)))
        })
        .collect()
}
