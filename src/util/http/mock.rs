use std::{collections::VecDeque, fs, path::PathBuf, sync::Mutex};

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};

use super::{HttpRequest, HttpResponse, Transport, TransportError};

/// 依序回放預先準備好的回應，並記錄收到的請求
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn with(response: Result<HttpResponse, TransportError>) -> Self {
        let mock = MockTransport::default();
        mock.push(response);
        mock
    }

    pub(crate) fn push(&self, response: Result<HttpResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("no canned response".to_string())))
    }
}

pub(crate) fn response(content_type: Option<&'static str>, body: impl Into<Vec<u8>>) -> HttpResponse {
    let mut headers = HeaderMap::new();
    if let Some(ct) = content_type {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(ct));
    }

    HttpResponse {
        status: 200,
        headers,
        body: body.into(),
    }
}

pub(crate) fn json_response(body: impl Into<Vec<u8>>) -> HttpResponse {
    response(Some("application/json; charset=utf-8"), body)
}

pub(crate) fn html_response(body: impl Into<Vec<u8>>) -> HttpResponse {
    response(Some("text/html; charset=utf-8"), body)
}

/// 讀取 `testdata/` 底下的檔案
pub(crate) fn testdata(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "testdata", name].iter().collect();
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e))
}

/// 取出請求網址的查詢參數
pub(crate) fn query_param(request: &HttpRequest, key: &str) -> Option<String> {
    reqwest::Url::parse(&request.url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub(crate) fn path(request: &HttpRequest) -> String {
    reqwest::Url::parse(&request.url)
        .map(|u| u.path().to_string())
        .unwrap_or_default()
}
