use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use concat_string::concat_string;

use crate::{
    crawler::{
        classify::{self, Classified, JsonObject, Signaling, StatPolicy},
        require_rows, DecodeError, FetchError, QuoteSource,
    },
    declare::{Quote, StockExchange},
    util::{
        datetime,
        http::{throttle::RateLimiter, HttpRequest, HttpResponse, Transport, TransportError},
    },
};

/// 台股收盤報價-上櫃
pub mod quote;

pub const HOST: &str = "www.tpex.org.tw";

/// 櫃買中心報價查詢
///
/// 櫃買中心被封鎖時的回應沒有可靠的 Content-Type，只能從內容無法解析成 JSON 判斷；
/// 月、年統計只提供 CSV 下載。
pub struct Client {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    host: String,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>) -> Self {
        Client {
            transport,
            limiter,
            host: HOST.to_string(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    fn url(&self, path: &str) -> String {
        concat_string!("https://", self.host, path)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.limiter.acquire().await;
        self.transport.send(request).await
    }

    async fn get_json(&self, url: String) -> Result<Classified<JsonObject>, FetchError> {
        let result = self.send(HttpRequest::get(url)).await;
        Ok(classify::classify_json(
            result,
            Signaling::ParseFailure,
            StatPolicy::Optional,
        )?)
    }

    async fn post_csv(&self, url: String, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let result = self.send(HttpRequest::post_form(url, params)).await;
        classify::classify_text(result).into_result()
    }
}

#[async_trait]
impl QuoteSource for Client {
    fn exchange(&self) -> StockExchange {
        StockExchange::TPEx
    }

    async fn fetch_day_quotes(&self, date: NaiveDate) -> Result<HashMap<String, Quote>, FetchError> {
        let url = format!(
            "{}?l=zh-tw&d={}",
            self.url("/web/stock/aftertrading/daily_close_quotes/stk_quote_result.php"),
            datetime::to_roc_date_string(date)
        );

        match self.get_json(url).await? {
            Classified::NoData(_) => Ok(HashMap::new()),
            classified => {
                let rows = quote::rows(&classified.into_result()?)?;
                Ok(quote::decode_day_quotes(&rows, date)?)
            }
        }
    }

    async fn fetch_daily_quotes(
        &self,
        code: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<Quote>, FetchError> {
        let roc_year = datetime::gregorian_year_to_roc_year(year).ok_or_else(|| {
            DecodeError::InvalidDate {
                field: "year".to_string(),
                value: year.to_string(),
            }
        })?;
        let url = format!(
            "{}?l=zh-tw&d={}/{:02}/01&stkno={}",
            self.url("/web/stock/aftertrading/daily_trading_info/st43_result.php"),
            roc_year,
            month,
            urlencoding::encode(code)
        );

        let rows = quote::rows(&self.get_json(url).await?.into_result()?)?;
        require_rows(quote::decode_daily_quotes(&rows, code)?, "st43")
    }

    async fn fetch_monthly_quotes(&self, code: &str, year: i32) -> Result<Vec<Quote>, FetchError> {
        let url = self.url("/web/stock/statistics/monthly/download_st44.php?l=en-us");
        let year = year.to_string();
        let text = self
            .post_csv(url, &[("yy", year.as_str()), ("stk_no", code)])
            .await?;

        require_rows(quote::decode_monthly_quotes(&text, code)?, "st44")
    }

    async fn fetch_yearly_quotes(&self, code: &str) -> Result<Vec<Quote>, FetchError> {
        let url = self.url("/web/stock/statistics/monthly/download_st42.php?l=en-us");
        let text = self.post_csv(url, &[("stk_no", code)]).await?;

        require_rows(quote::decode_yearly_quotes(&text, code)?, "st42")
    }
}
