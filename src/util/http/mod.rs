use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, Method,
};
use thiserror::Error;

use crate::logging::Logger;

#[cfg(test)]
pub(crate) mod mock;
pub mod throttle;
pub mod user_agent;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// 送往交易所的請求
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        HttpRequest {
            method: Method::GET,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Builds a POST request whose body is `application/x-www-form-urlencoded`.
    pub fn post_form(url: impl Into<String>, params: &[(&str, &str)]) -> Self {
        let body = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        HttpRequest {
            method: Method::POST,
            url: url.into(),
            headers,
            body: Some(body),
        }
    }
}

/// 交易所的回應，body 已完整讀取
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns the declared media type without parameters, lower-cased,
    /// e.g. `application/json` for `application/json; charset=utf-8`.
    pub fn media_type(&self) -> Option<String> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// 傳輸層的錯誤
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// 連線在讀到任何資料前就被關閉，交易所大量封鎖時會這樣回應
    #[error("empty reply from server: {0}")]
    UnexpectedEof(String),
    #[error("request failed: {0}")]
    Request(String),
}

/// 發送請求並取回狀態碼、標頭與內容
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// 以 reqwest 實作的 [`Transport`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Result<Self> {
        // 已經安裝過 provider 時會回傳 Err，可以忽略
        let _ = rustls::crypto::ring::default_provider().install_default();

        let client = Client::builder()
            // ===== 壓縮 =====
            .brotli(true)
            .gzip(true)
            .zstd(true)
            // ===== 超時設置 =====
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            // ===== TCP 優化 =====
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            // ===== 連接池 =====
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            // ===== Cookie 和重定向 =====
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            // ===== Headers =====
            .referer(true)
            .user_agent(user_agent::gen_random_ua())
            .build()
            .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))?;

        Ok(ReqwestTransport { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let visit_log = format!("{}:{}", request.method, request.url);
        let mut rb = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            rb = rb.body(body);
        }

        let start = Instant::now();
        let response = match rb.send().await {
            Ok(response) => response,
            Err(why) => {
                LOGGER.error(format!(
                    "{} failed because {:?}. {} ms",
                    visit_log,
                    why,
                    start.elapsed().as_millis()
                ));
                return Err(into_transport_error(&why));
            }
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|why| {
            LOGGER.error(format!("{} failed to read body because {:?}", visit_log, why));
            // 已收到回應標頭，內容中斷不是被封鎖
            TransportError::Request(format!("{:?}", why))
        })?;

        LOGGER.info(format!(
            "{} {} {} bytes {} ms",
            visit_log,
            status,
            body.len(),
            start.elapsed().as_millis()
        ));

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

/// 送出請求時的錯誤，找出錯誤鏈中是否有「尚未收到回應連線就結束」的跡象
fn into_transport_error(why: &reqwest::Error) -> TransportError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(why);

    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            if io_err.kind() == std::io::ErrorKind::UnexpectedEof {
                return TransportError::UnexpectedEof(why.to_string());
            }
        }

        let msg = err.to_string();
        if msg.contains("connection closed before message completed")
            || msg.contains("IncompleteMessage")
            || msg.contains("unexpected end of file")
        {
            return TransportError::UnexpectedEof(why.to_string());
        }

        source = err.source();
    }

    TransportError::Request(format!("{:?}", why))
}
