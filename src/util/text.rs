use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};

const NUMBER_ESCAPE_CHAR: &[char] = &['元', '%', ',', ' ', '"', '\n', '\r', '\t'];

/// Parses a `u64` value from a given string.
///
/// This function accepts a string representation of an unsigned number,
/// potentially containing commas as thousands separators, and attempts to
/// convert it into an `u64`. If the conversion fails, an error is returned.
///
/// # Arguments
///
/// * `s`: A string slice containing the representation of an `u64` number
///         that may include commas as thousands separators.
///
/// * `escape_chars`: A list of additional characters to be removed from the
///                   string before parsing.
///
/// # Example
///
/// ```
/// use stock_quote_crawler::util::text::parse_u64;
///
/// assert_eq!(parse_u64("1,062,607", None).unwrap(), 1_062_607);
/// ```
pub fn parse_u64(s: &str, escape_chars: Option<Vec<char>>) -> Result<u64> {
    let cleaned = clean_escape_chars(s, escape_chars);
    u64::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as u64 because: {:?}", cleaned, why))
}

/// Parses a `f64` value from a given string.
///
/// Thousands separators and the other escape characters are removed first.
/// Non-finite results such as `NaN` or `inf` are rejected.
pub fn parse_f64(s: &str, escape_chars: Option<Vec<char>>) -> Result<f64> {
    let cleaned = clean_escape_chars(s, escape_chars);
    let v = f64::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as f64 because: {:?}", cleaned, why))?;

    if !v.is_finite() {
        return Err(anyhow!("Failed to parse '{}' as f64 because it is not finite", cleaned));
    }

    Ok(v)
}

/// 無成交時交易所以一串 `-` 表示價格，例如 `--`、`---`
pub fn is_dash_placeholder(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c == '-')
}

/// Removes a set of escape characters from a given string.
///
/// # Example
///
/// ```
/// use stock_quote_crawler::util::text::clean_escape_chars;
///
/// let clean_s = clean_escape_chars("Hello$Wor^ld!@#", Some(vec!['$', '^', '@', '#']));
/// assert_eq!(clean_s, "HelloWorld!");
/// ```
pub fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.chars().filter(|c| !filters.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    // 注意這個慣用法：在 tests 模組中，從外部範疇匯入所有名字。
    use super::*;

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("1,062,607", None).unwrap(), 1_062_607);
        assert_eq!(parse_u64(" 54,765 ", None).unwrap(), 54_765);
        assert_eq!(parse_u64("0", None).unwrap(), 0);
        assert!(parse_u64("-5", None).is_err());
        assert!(parse_u64("", None).is_err());
        assert!(parse_u64("12.5", None).is_err());
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64("1,234.56", None).unwrap(), 1234.56);
        assert_eq!(parse_f64("19.51", None).unwrap(), 19.51);
        assert!(parse_f64("NaN", None).is_err());
        assert!(parse_f64("abc", None).is_err());
    }

    #[test]
    fn test_is_dash_placeholder() {
        assert!(is_dash_placeholder("--"));
        assert!(is_dash_placeholder(" --- "));
        assert!(is_dash_placeholder("-"));
        assert!(!is_dash_placeholder(""));
        assert!(!is_dash_placeholder("-1.5"));
    }

    #[test]
    fn test_clean_escape_chars() {
        let result = clean_escape_chars("台積電% 元 ,", Some(vec!['台']));
        assert_eq!(result, "積電");
    }
}
