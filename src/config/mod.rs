use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use config::{Config as config_config, File as config_file};
use serde::{Deserialize, Serialize};

const CONFIG_PATH: &str = "app.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct App {
    #[serde(default)]
    pub crawler: Crawler,
}

const CRAWLER_MIN_INTERVAL_MS: &str = "CRAWLER_MIN_INTERVAL_MS";
const CRAWLER_TWSE_HOST: &str = "CRAWLER_TWSE_HOST";
const CRAWLER_TPEX_HOST: &str = "CRAWLER_TPEX_HOST";
const CRAWLER_CONNECT_TIMEOUT_SECS: &str = "CRAWLER_CONNECT_TIMEOUT_SECS";
const CRAWLER_TIMEOUT_SECS: &str = "CRAWLER_TIMEOUT_SECS";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Crawler {
    /// 兩次請求之間至少間隔的毫秒數
    pub min_interval_ms: u64,
    pub twse_host: String,
    pub tpex_host: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl Default for Crawler {
    fn default() -> Self {
        Crawler {
            min_interval_ms: 3000,
            twse_host: "www.twse.com.tw".to_string(),
            tpex_host: "www.tpex.org.tw".to_string(),
            connect_timeout_secs: 8,
            timeout_secs: 15,
        }
    }
}

impl Crawler {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl App {
    /// 讀取 app.json，沒有設定檔時使用預設值，最後再以 env 覆蓋
    pub fn get() -> Result<Self> {
        Self::from_path(config_path())
    }

    fn from_path(config_path: PathBuf) -> Result<Self> {
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path.clone()))
                .build()
                .and_then(|c| c.try_deserialize())
                .with_context(|| format!("Failed to load config from {:?}", config_path))?;
            return Ok(config.override_with_env());
        }

        Ok(App::default().override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Some(ms) = env_parse::<u64>(CRAWLER_MIN_INTERVAL_MS) {
            self.crawler.min_interval_ms = ms;
        }

        if let Ok(host) = env::var(CRAWLER_TWSE_HOST) {
            self.crawler.twse_host = host;
        }

        if let Ok(host) = env::var(CRAWLER_TPEX_HOST) {
            self.crawler.tpex_host = host;
        }

        if let Some(secs) = env_parse::<u64>(CRAWLER_CONNECT_TIMEOUT_SECS) {
            self.crawler.connect_timeout_secs = secs;
        }

        if let Some(secs) = env_parse::<u64>(CRAWLER_TIMEOUT_SECS) {
            self.crawler.timeout_secs = secs;
        }

        self
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| T::from_str(v.trim()).ok())
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}
