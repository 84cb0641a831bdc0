use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::core::{DEFAULT_STOCK_RETURN, GOLD_RETURN, ReturnTable, StockId};
use crate::market::DEFAULT_GOLD_FALLBACK_PRICE;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(default_value_t = 8080, env = "NIVESH_PORT", help = "Port to listen on")]
    pub port: u16,
    #[arg(
        long,
        default_value = "0.0.0.0",
        env = "NIVESH_HOST",
        help = "Address to bind"
    )]
    pub host: String,
    #[arg(
        long,
        default_value_t = DEFAULT_GOLD_FALLBACK_PRICE,
        env = "NIVESH_GOLD_FALLBACK_PRICE",
        help = "Gold price per gram used when no live price is available"
    )]
    pub gold_fallback_price: f64,
    #[arg(
        long,
        default_value_t = 300,
        env = "NIVESH_PRICE_CACHE_TTL_SECS",
        help = "How long live prices are reused, in seconds (0 disables caching)"
    )]
    pub price_cache_ttl_secs: u64,
    #[arg(
        long,
        default_value_t = DEFAULT_STOCK_RETURN,
        help = "Expected annual return in percent for stocks without an override"
    )]
    pub default_stock_return: f64,
    #[arg(long, default_value_t = GOLD_RETURN, help = "Expected annual gold return in percent")]
    pub gold_return: f64,
    #[arg(
        long = "stock-return",
        value_name = "ID=RATE",
        help = "Per-stock expected annual return in percent; repeatable"
    )]
    pub stock_returns: Vec<String>,
    #[arg(
        long,
        value_enum,
        default_value_t = LogFormat::Text,
        env = "NIVESH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub addr: SocketAddr,
    pub gold_fallback_price: f64,
    pub price_cache_ttl: Duration,
    pub returns: ReturnTable,
    pub log_format: LogFormat,
}

pub fn build_settings(args: ServeArgs) -> Result<Settings, String> {
    let host: IpAddr = args
        .host
        .parse()
        .map_err(|_| format!("--host must be an IP address, got '{}'", args.host))?;

    if !args.gold_fallback_price.is_finite() || args.gold_fallback_price <= 0.0 {
        return Err("--gold-fallback-price must be > 0".to_string());
    }

    check_rate("--default-stock-return", args.default_stock_return)?;
    check_rate("--gold-return", args.gold_return)?;

    let mut returns = ReturnTable::new(args.default_stock_return, args.gold_return);
    for raw in &args.stock_returns {
        let (stock_id, rate) = parse_stock_return(raw)?;
        returns = returns.with_stock_rate(stock_id, rate);
    }

    Ok(Settings {
        addr: SocketAddr::new(host, args.port),
        gold_fallback_price: args.gold_fallback_price,
        price_cache_ttl: Duration::from_secs(args.price_cache_ttl_secs),
        returns,
        log_format: args.log_format,
    })
}

fn check_rate(flag: &str, rate: f64) -> Result<(), String> {
    if !rate.is_finite() || !(-100.0..=100.0).contains(&rate) {
        return Err(format!("{flag} must be between -100 and 100"));
    }
    Ok(())
}

fn parse_stock_return(raw: &str) -> Result<(StockId, f64), String> {
    let Some((stock_id, rate)) = raw.split_once('=') else {
        return Err(format!("--stock-return expects ID=RATE, got '{raw}'"));
    };
    let stock_id = stock_id.trim();
    if stock_id.is_empty() {
        return Err(format!("--stock-return is missing a stock id in '{raw}'"));
    }
    let rate: f64 = rate
        .trim()
        .parse()
        .map_err(|_| format!("--stock-return rate for '{stock_id}' is not a number"))?;
    check_rate("--stock-return", rate)?;
    Ok((stock_id.to_string(), rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_args() -> ServeArgs {
        ServeArgs {
            port: 8080,
            host: "127.0.0.1".to_string(),
            gold_fallback_price: DEFAULT_GOLD_FALLBACK_PRICE,
            price_cache_ttl_secs: 300,
            default_stock_return: DEFAULT_STOCK_RETURN,
            gold_return: GOLD_RETURN,
            stock_returns: Vec::new(),
            log_format: LogFormat::Text,
        }
    }

    #[test]
    fn build_settings_applies_defaults() {
        let settings = build_settings(sample_args()).expect("valid settings");
        assert_eq!(settings.addr, "127.0.0.1:8080".parse().expect("socket address"));
        assert_eq!(settings.price_cache_ttl, Duration::from_secs(300));
        assert_eq!(settings.returns.stock_rate("anything"), DEFAULT_STOCK_RETURN);
        assert_eq!(settings.returns.gold_rate(), GOLD_RETURN);
    }

    #[test]
    fn build_settings_collects_stock_overrides() {
        let mut args = sample_args();
        args.stock_returns = vec!["tcs=15".to_string(), " infy = 9.5 ".to_string()];

        let settings = build_settings(args).expect("valid overrides");
        assert_eq!(settings.returns.stock_rate("tcs"), 15.0);
        assert_eq!(settings.returns.stock_rate("infy"), 9.5);
        assert_eq!(settings.returns.stock_rate("itc"), DEFAULT_STOCK_RETURN);
    }

    #[test]
    fn build_settings_rejects_malformed_stock_return() {
        let mut args = sample_args();
        args.stock_returns = vec!["tcs:15".to_string()];
        let err = build_settings(args).expect_err("must reject missing '='");
        assert!(err.contains("--stock-return"));

        let mut args = sample_args();
        args.stock_returns = vec!["tcs=fast".to_string()];
        let err = build_settings(args).expect_err("must reject non-numeric rate");
        assert!(err.contains("not a number"));
    }

    #[test]
    fn build_settings_rejects_invalid_host() {
        let mut args = sample_args();
        args.host = "localhost:80".to_string();
        let err = build_settings(args).expect_err("must reject host");
        assert!(err.contains("--host"));
    }

    #[test]
    fn build_settings_rejects_non_positive_gold_fallback() {
        let mut args = sample_args();
        args.gold_fallback_price = 0.0;
        let err = build_settings(args).expect_err("must reject zero price");
        assert!(err.contains("--gold-fallback-price"));
    }

    #[test]
    fn build_settings_rejects_out_of_range_rates() {
        let mut args = sample_args();
        args.gold_return = 250.0;
        let err = build_settings(args).expect_err("must reject gold rate");
        assert!(err.contains("--gold-return"));
    }
}
