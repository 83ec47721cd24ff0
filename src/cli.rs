use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Timeframe {
    #[value(name = "1m")]
    OneMinute,
    #[value(name = "5m")]
    FiveMinutes,
    #[value(name = "15m")]
    FifteenMinutes,
    #[value(name = "30m")]
    ThirtyMinutes,
    #[value(name = "1h")]
    OneHour,
    #[value(name = "4h")]
    FourHours,
    #[value(name = "1d")]
    OneDay,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::ThirtyMinutes => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::OneDay => "1d",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ohlcv-dl")]
#[command(author, version, about = "Request an OHLCV download job and follow it to completion", long_about = None)]
pub struct Args {
    /// Market symbol (e.g. BTC/USDT)
    #[arg(short, long, default_value = "")]
    pub symbol: String,

    /// Candle timeframe
    #[arg(short, long, value_enum, default_value = "1h")]
    pub timeframe: Timeframe,

    /// Start date (YYYY-MM-DD or YYYY-MM-DDTHH:MM)
    #[arg(long, default_value = "")]
    pub start: String,

    /// End date (YYYY-MM-DD or YYYY-MM-DDTHH:MM)
    #[arg(long, default_value = "")]
    pub end: String,

    /// Download server base URL
    #[arg(long, env = "OHLCV_SERVER", default_value = "http://127.0.0.1:5000")]
    pub server: String,

    /// HTTP proxy (e.g., http://127.0.0.1:7890)
    #[arg(long, env = "OHLCV_PROXY")]
    pub proxy: Option<String>,

    /// Delay between status polls, in milliseconds
    #[arg(long, env = "OHLCV_POLL_INTERVAL_MS", default_value = "1000")]
    pub poll_interval_ms: u64,

    /// Save the finished CSV into this directory
    #[arg(short, long)]
    pub output: Option<String>,
}
