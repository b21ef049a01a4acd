//! 判斷交易所回應的結果。
//!
//! 交易所不會用明確的狀態碼告訴我們被封鎖或查無資料，只能從幾個跡象判斷：
//! 連線在回應前被關閉、宣告的 Content-Type、JSON 內的 `stat` 欄位。

use serde_json::{Map, Value};

use crate::{
    crawler::error::{DecodeError, FetchError},
    util::http::{HttpResponse, TransportError},
};

/// JSON 回應的根物件
pub(crate) type JsonObject = Map<String, Value>;

const STAT_KEY: &str = "stat";
const STAT_OK: &str = "OK";
const MEDIA_TYPE_JSON: &str = "application/json";
const MEDIA_TYPE_HTML: &str = "text/html";
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// 一次請求的分類結果
#[derive(Debug, Clone, PartialEq)]
pub enum Classified<T> {
    Success(T),
    NoData(String),
    QuotaExceeded(String),
    ConnectionError(String),
}

impl<T> Classified<T> {
    pub fn into_result(self) -> Result<T, FetchError> {
        match self {
            Classified::Success(v) => Ok(v),
            Classified::NoData(msg) => Err(FetchError::NoData(msg)),
            Classified::QuotaExceeded(msg) => Err(FetchError::QuotaExceeded(msg)),
            Classified::ConnectionError(msg) => Err(FetchError::Connection(msg)),
        }
    }
}

/// 交易所被查詢太頻繁時的表現
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signaling {
    /// 回傳一個 HTML 頁面，Content-Type 不是 JSON(證交所)
    ContentType,
    /// 沒有可靠的 Content-Type，只能從內容無法解析成 JSON 判斷(櫃買中心)
    ParseFailure,
}

/// 是否一定要有 `stat` 欄位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatPolicy {
    Required,
    Optional,
}

/// 只處理傳輸層的結果
pub fn classify_transport(
    result: Result<HttpResponse, TransportError>,
) -> Classified<HttpResponse> {
    match transport_outcome(result) {
        Ok(res) => Classified::Success(res),
        Err(classified) => classified,
    }
}

fn transport_outcome<U>(
    result: Result<HttpResponse, TransportError>,
) -> Result<HttpResponse, Classified<U>> {
    match result {
        Err(TransportError::UnexpectedEof(msg)) => Err(Classified::QuotaExceeded(format!(
            "empty reply from server: {}",
            msg
        ))),
        Err(TransportError::Request(msg)) => {
            Err(Classified::ConnectionError(format!("failed to query: {}", msg)))
        }
        Ok(res) if res.status == STATUS_TOO_MANY_REQUESTS => Err(Classified::QuotaExceeded(
            format!("received status {}", res.status),
        )),
        Ok(res) => Ok(res),
    }
}

/// 分類預期回傳 JSON 的請求
///
/// 回應收到且是 JSON，但結構不對(例如 `stat` 不是字串)時回傳 [`DecodeError`]。
pub fn classify_json(
    result: Result<HttpResponse, TransportError>,
    signaling: Signaling,
    stat: StatPolicy,
) -> Result<Classified<JsonObject>, DecodeError> {
    let res = match transport_outcome(result) {
        Ok(res) => res,
        Err(classified) => return Ok(classified),
    };

    if signaling == Signaling::ContentType {
        let media_type = res.media_type().unwrap_or_default();
        if media_type != MEDIA_TYPE_JSON {
            return Ok(Classified::QuotaExceeded(format!(
                "received unexpected content type '{}'",
                media_type
            )));
        }
    }

    let object = match serde_json::from_slice::<Value>(&res.body) {
        Ok(Value::Object(object)) => object,
        Ok(other) if signaling == Signaling::ContentType => {
            return Err(DecodeError::Malformed(format!(
                "expected a JSON object but got {}",
                json_kind(&other)
            )));
        }
        Err(why) if signaling == Signaling::ContentType => {
            return Err(DecodeError::Malformed(format!("failed to parse JSON: {}", why)));
        }
        Ok(other) => {
            return Ok(Classified::QuotaExceeded(format!(
                "expected a JSON object but got {}",
                json_kind(&other)
            )));
        }
        Err(why) => {
            return Ok(Classified::QuotaExceeded(format!(
                "failed to parse JSON: {}",
                why
            )));
        }
    };

    match object.get(STAT_KEY) {
        None if stat == StatPolicy::Required => Err(DecodeError::MissingKey(STAT_KEY.to_string())),
        None => Ok(Classified::Success(object)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case(STAT_OK) => Ok(Classified::Success(object)),
        Some(Value::String(s)) => Ok(Classified::NoData(format!(
            "expected stat '{}' but got '{}'",
            STAT_OK, s
        ))),
        Some(other) => Err(DecodeError::WrongKind {
            field: STAT_KEY.to_string(),
            row: 0,
            expected: "string",
            value: other.to_string(),
        }),
    }
}

/// 分類預期回傳純文字(CSV)的請求
pub fn classify_text(
    result: Result<HttpResponse, TransportError>,
) -> Classified<String> {
    let res = match transport_outcome(result) {
        Ok(res) => res,
        Err(classified) => return classified,
    };

    match res.media_type() {
        Some(media_type) if media_type == MEDIA_TYPE_HTML => Classified::QuotaExceeded(format!(
            "received unexpected content type '{}'",
            media_type
        )),
        _ => Classified::Success(res.text()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use crate::util::http::mock::{html_response, json_response, response};

    use super::*;

    #[test]
    fn test_unexpected_eof_is_quota_exceeded() {
        let result = Err(TransportError::UnexpectedEof("EOF".to_string()));
        assert!(matches!(
            classify_transport(result.clone()),
            Classified::QuotaExceeded(_)
        ));

        for signaling in [Signaling::ContentType, Signaling::ParseFailure] {
            let classified = classify_json(result.clone(), signaling, StatPolicy::Required);
            assert!(matches!(classified, Ok(Classified::QuotaExceeded(_))));
        }

        assert!(matches!(classify_text(result), Classified::QuotaExceeded(_)));
    }

    #[test]
    fn test_other_transport_error_is_connection_error() {
        let result = Err(TransportError::Request("dns error".to_string()));
        let classified = classify_json(result, Signaling::ContentType, StatPolicy::Required);
        assert!(matches!(classified, Ok(Classified::ConnectionError(_))));
    }

    #[test]
    fn test_too_many_requests_status() {
        let mut res = json_response(r#"{"stat":"OK"}"#);
        res.status = 429;
        let classified = classify_json(Ok(res), Signaling::ParseFailure, StatPolicy::Optional);
        assert!(matches!(classified, Ok(Classified::QuotaExceeded(_))));
    }

    #[test]
    fn test_html_content_type_is_quota_exceeded() {
        let res = html_response("<html><body>Too many requests</body></html>");
        let classified = classify_json(Ok(res), Signaling::ContentType, StatPolicy::Required);
        assert!(matches!(classified, Ok(Classified::QuotaExceeded(_))));

        let res = html_response("<html></html>");
        assert!(matches!(classify_text(Ok(res)), Classified::QuotaExceeded(_)));
    }

    #[test]
    fn test_missing_content_type_with_content_type_signaling() {
        let res = response(None, r#"{"stat":"OK"}"#);
        let classified = classify_json(Ok(res), Signaling::ContentType, StatPolicy::Required);
        assert!(matches!(classified, Ok(Classified::QuotaExceeded(_))));
    }

    #[test]
    fn test_unparsable_body() {
        // 櫃買中心：不是 JSON 就是被封鎖
        let res = response(None, "<html>busy</html>");
        let classified = classify_json(Ok(res), Signaling::ParseFailure, StatPolicy::Optional);
        assert!(matches!(classified, Ok(Classified::QuotaExceeded(_))));

        // 證交所：宣告為 JSON 卻無法解析
        let res = json_response("{not json");
        let classified = classify_json(Ok(res), Signaling::ContentType, StatPolicy::Required);
        assert!(matches!(classified, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_stat_not_ok_is_no_data() {
        let res = json_response(r#"{"stat":"很抱歉，沒有符合條件的資料!"}"#);
        let classified = classify_json(Ok(res), Signaling::ContentType, StatPolicy::Required);
        assert!(matches!(classified, Ok(Classified::NoData(_))));
    }

    #[test]
    fn test_stat_ok_is_success() {
        let res = json_response(r#"{"stat":"OK","data":[]}"#);
        let classified = classify_json(Ok(res), Signaling::ContentType, StatPolicy::Required);
        match classified {
            Ok(Classified::Success(object)) => assert!(object.contains_key("data")),
            other => panic!("unexpected {:?}", other),
        }

        let res = response(None, r#"{"stat":"ok","tables":[]}"#);
        let classified = classify_json(Ok(res), Signaling::ParseFailure, StatPolicy::Optional);
        assert!(matches!(classified, Ok(Classified::Success(_))));
    }

    #[test]
    fn test_stat_policy() {
        let res = json_response(r#"{"aaData":[]}"#);
        let classified =
            classify_json(Ok(res.clone()), Signaling::ContentType, StatPolicy::Required);
        assert_eq!(classified, Err(DecodeError::MissingKey("stat".to_string())));

        let classified = classify_json(Ok(res), Signaling::ContentType, StatPolicy::Optional);
        assert!(matches!(classified, Ok(Classified::Success(_))));

        let res = json_response(r#"{"stat":1}"#);
        let classified = classify_json(Ok(res), Signaling::ContentType, StatPolicy::Required);
        assert!(matches!(classified, Err(DecodeError::WrongKind { .. })));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(Classified::Success(1).into_result(), Ok(1));
        assert!(Classified::<i32>::NoData("x".to_string())
            .into_result()
            .unwrap_err()
            .is_no_data());
        assert!(Classified::<i32>::ConnectionError("x".to_string())
            .into_result()
            .unwrap_err()
            .is_connection());
    }
}
