//! 把 JSON 回應中的 `fields` 與 `data` 配對成以欄位名稱存取的紀錄。

use std::collections::{HashMap, HashSet};

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::crawler::{classify::JsonObject, error::DecodeError};

/// JSON 表格中的單一值
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Text(String),
    Number(f64),
}

impl Scalar {
    /// 數值轉成字串，供以欄位位置解析的資料使用
    pub(crate) fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Scalar::Text(s) => format!("'{}'", s),
            Scalar::Number(n) => n.to_string(),
        }
    }
}

/// 欄位數與資料筆數不一致時的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZipMode {
    /// 不一致就失敗
    #[default]
    Strict,
    /// 只配對到較短的一方為止
    Lenient,
}

/// 以欄位名稱存取的一筆資料
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRecord {
    row: usize,
    values: HashMap<String, Scalar>,
}

impl RawRecord {
    fn get(&self, field: &str) -> Result<&Scalar, DecodeError> {
        self.values.get(field).ok_or_else(|| DecodeError::MissingField {
            field: field.to_string(),
            row: self.row,
        })
    }

    pub(crate) fn text(&self, field: &str) -> Result<&str, DecodeError> {
        match self.get(field)? {
            Scalar::Text(s) => Ok(s),
            other => Err(self.wrong_kind(field, "string", other)),
        }
    }

    pub(crate) fn number(&self, field: &str) -> Result<f64, DecodeError> {
        match self.get(field)? {
            Scalar::Number(n) => Ok(*n),
            other => Err(self.wrong_kind(field, "number", other)),
        }
    }

    /// 整數欄位，例如月份、年度
    pub(crate) fn integer(&self, field: &str) -> Result<i32, DecodeError> {
        let n = self.number(field)?;
        if n.fract() != 0.0 || n < i32::MIN as f64 || n > i32::MAX as f64 {
            return Err(self.wrong_kind(field, "integer", &Scalar::Number(n)));
        }

        Ok(n as i32)
    }

    pub(crate) fn row(&self) -> usize {
        self.row
    }

    fn wrong_kind(&self, field: &str, expected: &'static str, value: &Scalar) -> DecodeError {
        DecodeError::WrongKind {
            field: field.to_string(),
            row: self.row,
            expected,
            value: value.describe(),
        }
    }
}

/// 證交所年資料的最高價與最低價日期都叫「日期」，
/// 第二次出現的欄位改名為 `日期2`，第三次為 `日期3`，依此類推。
/// 改名後仍與其他欄位同名時視為格式錯誤。
pub(crate) fn suffix_duplicate_fields(fields: &[String]) -> Result<Vec<String>, DecodeError> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(fields.len());
    let labels: Vec<String> = fields
        .iter()
        .map(|field| {
            let count = seen.entry(field.as_str()).or_insert(0);
            *count += 1;
            if *count == 1 {
                field.clone()
            } else {
                format!("{}{}", field, count)
            }
        })
        .collect();

    let mut unique = HashSet::with_capacity(labels.len());
    if let Some(label) = labels.iter().find(|label| !unique.insert(label.as_str())) {
        return Err(DecodeError::Malformed(format!(
            "duplicate field '{}' after suffixing",
            label
        )));
    }

    Ok(labels)
}

pub(crate) fn zip_fields_and_rows(
    fields: &[String],
    rows: Vec<Vec<Scalar>>,
    mode: ZipMode,
) -> Result<Vec<RawRecord>, DecodeError> {
    let fields = suffix_duplicate_fields(fields)?;
    let mut records = Vec::with_capacity(rows.len());

    for (row, values) in rows.into_iter().enumerate() {
        if mode == ZipMode::Strict && values.len() != fields.len() {
            return Err(DecodeError::ArityMismatch {
                fields: fields.len(),
                row,
                values: values.len(),
            });
        }

        let values = fields.iter().cloned().zip(values).collect::<HashMap<_, _>>();
        records.push(RawRecord { row, values });
    }

    Ok(records)
}

/// 取出 `fields_key` 與 `rows_key` 並配對
pub(crate) fn zip_table(
    object: &JsonObject,
    fields_key: &str,
    rows_key: &str,
    mode: ZipMode,
) -> Result<Vec<RawRecord>, DecodeError> {
    let fields: Vec<String> = retrieve(object, fields_key)?;
    let rows: Vec<Vec<Scalar>> = retrieve(object, rows_key)?;
    zip_fields_and_rows(&fields, rows, mode)
}

/// 從 JSON 物件取出指定的 key 並轉成 `T`
pub(crate) fn retrieve<T>(object: &JsonObject, key: &str) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    let value = object
        .get(key)
        .ok_or_else(|| DecodeError::MissingKey(key.to_string()))?;

    from_value(value, key)
}

pub(crate) fn from_value<T>(value: &Value, key: &str) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    T::deserialize(value)
        .map_err(|why| DecodeError::Malformed(format!("failed to unmarshal '{}': {}", key, why)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_suffix_duplicate_fields() {
        assert_eq!(
            suffix_duplicate_fields(&strings(&["a", "b", "c"])).unwrap(),
            strings(&["a", "b", "c"])
        );
        assert_eq!(
            suffix_duplicate_fields(&strings(&["a", "b", "c", "b", "b", "c"])).unwrap(),
            strings(&["a", "b", "c", "b2", "b3", "c2"])
        );
        assert_eq!(
            suffix_duplicate_fields(&strings(&["年度", "最高價", "日期", "最低價", "日期"])).unwrap(),
            strings(&["年度", "最高價", "日期", "最低價", "日期2"])
        );
    }

    #[test]
    fn test_suffix_duplicate_fields_collision() {
        assert_eq!(
            suffix_duplicate_fields(&strings(&["b", "b2", "b"])),
            Err(DecodeError::Malformed(
                "duplicate field 'b2' after suffixing".to_string()
            ))
        );

        let rows = vec![vec![
            Scalar::Text("1".to_string()),
            Scalar::Text("2".to_string()),
            Scalar::Text("3".to_string()),
        ]];
        assert!(matches!(
            zip_fields_and_rows(&strings(&["b", "b2", "b"]), rows, ZipMode::Lenient),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_zip_fields_and_rows() {
        let fields = strings(&["年度", "日期", "日期"]);
        let rows = vec![vec![
            Scalar::Number(108.0),
            Scalar::Text("11/26".to_string()),
            Scalar::Text("2/22".to_string()),
        ]];

        let records = zip_fields_and_rows(&fields, rows, ZipMode::Strict).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].integer("年度").unwrap(), 108);
        assert_eq!(records[0].text("日期").unwrap(), "11/26");
        assert_eq!(records[0].text("日期2").unwrap(), "2/22");
    }

    #[test]
    fn test_zip_strict_arity_mismatch() {
        let fields = strings(&["a", "b"]);
        let rows = vec![
            vec![Scalar::Text("1".to_string()), Scalar::Text("2".to_string())],
            vec![Scalar::Text("1".to_string())],
        ];

        assert_eq!(
            zip_fields_and_rows(&fields, rows, ZipMode::Strict),
            Err(DecodeError::ArityMismatch {
                fields: 2,
                row: 1,
                values: 1
            })
        );
    }

    #[test]
    fn test_zip_lenient_stops_early() {
        let fields = strings(&["a", "b"]);
        let rows = vec![vec![Scalar::Text("1".to_string())]];

        let records = zip_fields_and_rows(&fields, rows, ZipMode::Lenient).unwrap();
        assert_eq!(records[0].text("a").unwrap(), "1");
        assert!(matches!(
            records[0].text("b"),
            Err(DecodeError::MissingField { .. })
        ));
    }

    #[test]
    fn test_wrong_kind() {
        let fields = strings(&["月份", "最高價"]);
        let rows = vec![vec![
            Scalar::Text("12".to_string()),
            Scalar::Number(122.4),
        ]];
        let records = zip_fields_and_rows(&fields, rows, ZipMode::Strict).unwrap();

        assert!(matches!(
            records[0].integer("月份"),
            Err(DecodeError::WrongKind { expected: "number", .. })
        ));
        assert!(matches!(
            records[0].text("最高價"),
            Err(DecodeError::WrongKind { expected: "string", .. })
        ));
    }

    #[test]
    fn test_zip_table() {
        let object = json!({
            "fields": ["日期", "收盤價"],
            "data": [["110/02/01", "611.00"], ["110/02/02", "632.00"]],
        });
        let object = object.as_object().unwrap();

        let records = zip_table(object, "fields", "data", ZipMode::Strict).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].text("收盤價").unwrap(), "632.00");
        assert_eq!(records[1].row(), 1);

        assert_eq!(
            zip_table(object, "fields9", "data9", ZipMode::Strict),
            Err(DecodeError::MissingKey("fields9".to_string()))
        );
    }

    #[test]
    fn test_scalar_into_text() {
        assert_eq!(Scalar::Number(54765.0).into_text(), "54765");
        assert_eq!(Scalar::Number(19.49).into_text(), "19.49");
        assert_eq!(Scalar::Text("---".to_string()).into_text(), "---");
    }

    #[test]
    fn test_zip_table_rejects_null_values() {
        let object = json!({ "fields": ["a"], "data": [[null]] });
        let result = zip_table(object.as_object().unwrap(), "fields", "data", ZipMode::Strict);
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }
}
