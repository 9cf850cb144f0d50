use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use rehttp::http::{Client, JitteredBackoff};
use rehttp::requests::RequestBuilder;
use reqwest::Method;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// rehttp - HTTP requests with retries
///
/// Sends one HTTP request, retrying timeouts (408), rate limiting (429),
/// server errors (5xx) and network failures with a growing, jittered delay.
/// The response body is written to stdout and the status line to stderr.
///
/// Examples:
///   rehttp https://example.com/health
///   rehttp -X POST --json '{"name":"x"}' https://example.com/items
#[derive(Parser, Debug)]
#[command(author, about, version = env!("REHTTP_VERSION"))]
struct Cli {
    /// URL to request
    #[arg(value_name = "URL")]
    url: String,

    /// HTTP method
    #[arg(short = 'X', long = "method", default_value = "GET")]
    method: Method,

    /// Request header in the form "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Raw request body
    #[arg(short = 'd', long = "data", conflicts_with = "json")]
    data: Option<String>,

    /// JSON request body; sets Content-Type and Accept headers
    #[arg(long = "json", value_name = "JSON")]
    json: Option<String>,

    /// Total attempts per request, including the first one
    #[arg(
        long = "attempts",
        env = "REHTTP_ATTEMPTS",
        default_value_t = rehttp::http::DEFAULT_ATTEMPTS
    )]
    attempts: u32,

    /// Timeout of each attempt in seconds
    #[arg(long = "timeout", env = "REHTTP_TIMEOUT", value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Upper bound in seconds for the growing part of the wait between attempts
    #[arg(long = "max-delay", env = "REHTTP_MAX_DELAY", value_name = "SECS")]
    max_delay: Option<u64>,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected \"Name: value\", got {:?}", s)),
    }
}

fn build_client(cli: &Cli) -> Result<Client> {
    let mut backoff = JitteredBackoff::new();
    if let Some(max_delay) = cli.max_delay {
        backoff = backoff.with_max_delay(Duration::from_secs(max_delay));
    }

    let client = Client::builder()
        .max_attempts(cli.attempts)
        .timeout(Duration::from_secs(cli.timeout))
        .backoff(backoff)
        .build()?;
    Ok(client)
}

fn build_request(cli: &Cli) -> Result<RequestBuilder> {
    let mut builder = RequestBuilder::new(cli.url.as_str())
        .method(cli.method.clone())
        .headers(cli.headers.iter().cloned());

    if let Some(data) = &cli.data {
        builder = builder.body(data.as_str());
    }
    if let Some(json) = &cli.json {
        let value: serde_json::Value =
            serde_json::from_str(json).context("--json is not valid JSON")?;
        builder = builder.json(&value);
    }

    Ok(builder)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    debug!("{:?}", cli);

    let client = build_client(&cli)?;

    let cancel = CancellationToken::new();
    let request = build_request(&cli)?.build(cancel.clone())?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let response = client.execute(&request).await?;

    eprintln!("{}", response.status_line());
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(response.body())
        .context("Failed to write response body")?;
    stdout.flush()?;

    Ok(())
}
