use chrono::{Datelike, NaiveDate};

/// 民國年與西元年的差距
const ROC_YEAR_OFFSET: i32 = 1911;

/// Convert ROC year to Gregorian year, `None` on overflow.
pub fn to_gregorian_year(year: i32) -> Option<i32> {
    year.checked_add(ROC_YEAR_OFFSET)
}

/// Convert Gregorian year to ROC year, `None` on overflow.
pub fn gregorian_year_to_roc_year(year: i32) -> Option<i32> {
    year.checked_sub(ROC_YEAR_OFFSET)
}

/// 將日期轉為櫃買中心查詢用的民國日期，例︰2021-03-30 => 110/03/30
pub fn to_roc_date_string(date: NaiveDate) -> String {
    // NaiveDate 的年份範圍遠小於 i32，相減不會溢位
    format!(
        "{}/{:02}/{:02}",
        date.year() - ROC_YEAR_OFFSET,
        date.month(),
        date.day()
    )
}

/// Parse a date string in the format of ROC calendar
/// and return it as a NaiveDate in the Gregorian calendar.
///
/// `110/03/30` and `110-03-30` both yield 2021-03-30.
pub fn parse_taiwan_date(date_str: &str) -> Option<NaiveDate> {
    let split_date: Vec<&str> = date_str.trim().split(['/', '-']).collect();
    if split_date.len() != 3 {
        return None;
    }

    let year = to_gregorian_year(parse_date_part::<i32>(split_date[0])?)?;
    let month = parse_date_part::<u32>(split_date[1])?;
    let day = parse_date_part::<u32>(split_date[2])?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// 年度統計的最高、最低價日期只有 `月/日`，年份由同一列的年度補上
pub fn parse_month_day(year: i32, month_day: &str) -> Option<NaiveDate> {
    let split_date: Vec<&str> = month_day.trim().split('/').collect();
    if split_date.len() != 2 {
        return None;
    }

    let month = parse_date_part::<u32>(split_date[0])?;
    let day = parse_date_part::<u32>(split_date[1])?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Try to parse a string as a date part and return it as an Option.
fn parse_date_part<T: std::str::FromStr>(date_part_str: &str) -> Option<T> {
    date_part_str.trim().parse::<T>().ok()
}
