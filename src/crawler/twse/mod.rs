use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use concat_string::concat_string;

use crate::{
    crawler::{
        cache_buster,
        classify::{self, Classified, JsonObject, Signaling, StatPolicy},
        require_rows, FetchError, QuoteSource, ZipMode,
    },
    declare::{Quote, StockExchange},
    util::http::{throttle::RateLimiter, HttpRequest, Transport},
};

/// 台股收盤報價-上市
pub mod quote;

pub const HOST: &str = "www.twse.com.tw";

/// 證交所報價查詢
///
/// 證交所被查詢太頻繁時會回傳 HTML 頁面，所以用 Content-Type 判斷是否被封鎖；
/// 每個 JSON 回應都帶有 `stat`，不是 `OK` 就是查無資料。
pub struct Client {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    host: String,
    zip_mode: ZipMode,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>) -> Self {
        Client {
            transport,
            limiter,
            host: HOST.to_string(),
            zip_mode: ZipMode::Strict,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// 欄位數與資料筆數不一致時是否仍然解析，預設為 [`ZipMode::Strict`]
    pub fn with_zip_mode(mut self, mode: ZipMode) -> Self {
        self.zip_mode = mode;
        self
    }

    fn report_url(&self, report: &str, query: &str) -> String {
        let ts = cache_buster();
        concat_string!(
            "https://",
            self.host,
            "/exchangeReport/",
            report,
            "?response=json&",
            query,
            "&_=",
            ts
        )
    }

    async fn get_json(&self, url: String) -> Result<Classified<JsonObject>, FetchError> {
        self.limiter.acquire().await;
        let result = self.transport.send(HttpRequest::get(url)).await;
        Ok(classify::classify_json(
            result,
            Signaling::ContentType,
            StatPolicy::Required,
        )?)
    }
}

#[async_trait]
impl QuoteSource for Client {
    fn exchange(&self) -> StockExchange {
        StockExchange::TWSE
    }

    async fn fetch_day_quotes(&self, date: NaiveDate) -> Result<HashMap<String, Quote>, FetchError> {
        let url = self.report_url(
            "MI_INDEX",
            &format!("date={}&type=ALL", date.format("%Y%m%d")),
        );

        match self.get_json(url).await? {
            Classified::NoData(_) => Ok(HashMap::new()),
            classified => Ok(quote::decode_day_quotes(&classified.into_result()?, date, self.zip_mode)?),
        }
    }

    async fn fetch_daily_quotes(
        &self,
        code: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<Quote>, FetchError> {
        let url = self.report_url(
            "STOCK_DAY",
            &format!(
                "date={:04}{:02}01&stockNo={}",
                year,
                month,
                urlencoding::encode(code)
            ),
        );

        let object = self.get_json(url).await?.into_result()?;
        require_rows(quote::decode_daily_quotes(&object, code, self.zip_mode)?, "STOCK_DAY")
    }

    async fn fetch_monthly_quotes(&self, code: &str, year: i32) -> Result<Vec<Quote>, FetchError> {
        let url = self.report_url(
            "FMSRFK",
            &format!("date={:04}0101&stockNo={}", year, urlencoding::encode(code)),
        );

        let object = self.get_json(url).await?.into_result()?;
        require_rows(quote::decode_monthly_quotes(&object, code, year, self.zip_mode)?, "FMSRFK")
    }

    async fn fetch_yearly_quotes(&self, code: &str) -> Result<Vec<Quote>, FetchError> {
        let url = self.report_url("FMNPTK", &format!("stockNo={}", urlencoding::encode(code)));

        let object = self.get_json(url).await?.into_result()?;
        require_rows(quote::decode_yearly_quotes(&object, code, self.zip_mode)?, "FMNPTK")
    }
}
