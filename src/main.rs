//!
//! tubelink server binary
//! ----------------------
//! Loads configuration from the environment (CLI flags override the port and
//! bind address) and serves the HTTP API. Missing provider settings abort
//! startup before the listener binds.

use std::env;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tubelink::config::Config;

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    arg_value(args, flag).and_then(|v| v.parse::<u16>().ok())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

const USAGE: &str = "tubelink\n\nUSAGE:\n  tubelink [--http-port N] [--bind ADDR]\n\nOPTIONS:\n  --http-port N     HTTP port (env: TUBELINK_HTTP_PORT, default 3000)\n  --bind ADDR       Listen address (env: TUBELINK_BIND, default 0.0.0.0)\n\nENVIRONMENT:\n  SUPABASE_URL               Provider base URL (required; NEXT_PUBLIC_SUPABASE_URL also accepted)\n  SUPABASE_ANON_KEY          Provider public key (required; NEXT_PUBLIC_SUPABASE_ANON_KEY also accepted)\n  TUBELINK_COOKIE_SECURE     Mark session cookies Secure (default true)\n  TUBELINK_DEBUG_COOKIES     Enable GET /api/debug/cookies (default false)\n  TUBELINK_HTTP_TIMEOUT_SECS Provider request timeout (default 10)\n  RUST_LOG                   Log filter (default info)\n";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let _ = fmt().with_env_filter(filter).try_init();

    let args: Vec<String> = env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::from_env().context("loading configuration")?;
    if let Some(port) = parse_port_arg(&args, "--http-port") {
        config.http_port = port;
    }
    if let Some(bind) = arg_value(&args, "--bind") {
        config.bind = bind.to_string();
    }

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "tubelink", "tubelink starting: RUST_LOG='{}', http_port={}", rust_log, config.http_port);

    tubelink::server::run_with_config(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cli_flags() {
        let a = args(&["tubelink", "--http-port", "8080", "--bind", "127.0.0.1"]);
        assert_eq!(parse_port_arg(&a, "--http-port"), Some(8080));
        assert_eq!(arg_value(&a, "--bind"), Some("127.0.0.1"));
        assert!(!has_flag(&a, "--help"));
        assert_eq!(parse_port_arg(&args(&["tubelink", "--http-port"]), "--http-port"), None);
        assert_eq!(parse_port_arg(&args(&["tubelink", "--http-port", "web"]), "--http-port"), None);
    }

    #[test]
    fn first_flag_occurrence_wins() {
        let a = args(&["tubelink", "--bind", "10.0.0.1", "--bind", "10.0.0.2"]);
        assert_eq!(arg_value(&a, "--bind"), Some("10.0.0.1"));
        assert_eq!(arg_value(&args(&["tubelink", "--bind"]), "--bind"), None);
        assert_eq!(arg_value(&args(&[]), "--bind"), None);
    }
}
