//! 台灣證券交易所與證券櫃檯買賣中心的歷史報價爬蟲。
//!
//! 兩個交易所各有一個實作 [`crawler::QuoteSource`] 的客戶端，共用同一個
//! [`util::http::throttle::RateLimiter`] 控制查詢頻率。

pub mod config;
pub mod crawler;
pub mod declare;
pub mod logging;
pub mod util;
