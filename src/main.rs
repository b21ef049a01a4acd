use std::{collections::BTreeMap, sync::Arc};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use stock_quote_crawler::{
    config,
    crawler::{tpex, twse, QuoteSource, ZipMode},
    declare::StockExchange,
    logging,
    util::http::{throttle::RateLimiter, ReqwestTransport, Transport},
};

#[cfg(all(target_os = "linux", target_env = "musl"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "stock_quote_crawler")]
#[command(about = "Fetch historical quotes from the Taiwan Stock Exchange and the Taipei Exchange")]
#[command(version)]
struct Cli {
    /// twse 或 tpex
    exchange: StockExchange,

    /// 證交所欄位數與資料筆數不一致時仍然解析
    #[arg(long)]
    lenient: bool,

    #[command(subcommand)]
    query: Query,
}

#[derive(Subcommand, Debug)]
enum Query {
    /// 指定日期全市場的收盤行情
    Day {
        /// 例如 2021-03-24
        date: NaiveDate,
    },
    /// 個股指定月份每個交易日的行情
    Daily {
        code: String,
        year: i32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
    /// 個股指定年度每個月的統計
    Monthly { code: String, year: i32 },
    /// 個股每一年的統計
    Yearly { code: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let settings = config::App::get()?;
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(
        settings.crawler.connect_timeout(),
        settings.crawler.timeout(),
    )?);
    let limiter = Arc::new(RateLimiter::new(settings.crawler.min_interval()));

    let sources: Vec<Box<dyn QuoteSource>> = vec![
        Box::new(
            twse::Client::new(Arc::clone(&transport), Arc::clone(&limiter))
                .with_host(settings.crawler.twse_host.as_str())
                .with_zip_mode(if cli.lenient { ZipMode::Lenient } else { ZipMode::Strict }),
        ),
        Box::new(
            tpex::Client::new(transport, limiter).with_host(settings.crawler.tpex_host.as_str()),
        ),
    ];

    let source = sources
        .iter()
        .find(|s| s.exchange() == cli.exchange)
        .with_context(|| format!("No client for {}", cli.exchange))?;

    logging::info_file_async(format!("{} {:?} start", cli.exchange, cli.query));

    match run(source.as_ref(), &cli.query).await {
        Ok(json) => {
            logging::info_file_async(format!("{} {:?} done", cli.exchange, cli.query));
            println!("{}", json);
            Ok(())
        }
        Err(why) => {
            let msg = format!("{} {:?} failed because {:?}", cli.exchange, cli.query, why);
            logging::error_file_async(msg.clone());
            logging::error_console(msg);
            Err(why)
        }
    }
}

async fn run(source: &dyn QuoteSource, query: &Query) -> Result<String> {
    let json = match query {
        Query::Day { date } => {
            let quotes: BTreeMap<_, _> = source.fetch_day_quotes(*date).await?.into_iter().collect();
            serde_json::to_string_pretty(&quotes)?
        }
        Query::Daily { code, year, month } => {
            serde_json::to_string_pretty(&source.fetch_daily_quotes(code, *year, *month).await?)?
        }
        Query::Monthly { code, year } => {
            serde_json::to_string_pretty(&source.fetch_monthly_quotes(code, *year).await?)?
        }
        Query::Yearly { code } => {
            serde_json::to_string_pretty(&source.fetch_yearly_quotes(code).await?)?
        }
    };

    Ok(json)
}
