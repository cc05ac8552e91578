use chrono::Local;
use clap::{ArgAction, Parser};
use conkeyscan_core::{
    bundled_keywords, load_keywords, ClientConfig, ConfluenceClient, ContentFetcher, LogFile,
    MatchMode, QueryTemplate, ScanControl, ScanError, Scanner, SnapshotStore, TextExtractor,
    DEFAULT_CONTEXT_LENGTH, DEFAULT_CQL_TEMPLATE, DEFAULT_REQUESTS_PER_SECOND,
    DEFAULT_RESULTS_DIR,
};
use std::io::BufRead;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Scan Confluence for keywords using CQL search queries.
#[derive(Parser)]
#[command(name = "conkeyscan", version)]
struct Cli {
    /// URL of the Confluence instance
    #[arg(short, long, env = "CONFLUENCE_URL")]
    url: String,

    /// The username of the account to be used
    #[arg(long, visible_alias = "usr", env = "CONFLUENCE_USERNAME")]
    username: String,

    /// The according password OR an API key
    #[arg(
        long,
        visible_alias = "pwd",
        env = "CONFLUENCE_PASSWORD",
        hide_env_values = true
    )]
    password: String,

    /// Dictionary file with one keyword per line, falls back to the bundled list
    #[arg(short, long)]
    dict_path: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long, default_value_t = true, action = ArgAction::Set)]
    disable_ssl_checks: bool,

    /// Max requests per second
    #[arg(short, long, default_value_t = DEFAULT_REQUESTS_PER_SECOND)]
    rate_limit: u32,

    /// HTTP or SOCKS proxy, e.g. socks5://127.0.0.1:1337 or http://127.0.0.1:8080
    #[arg(short, long, env = "CONFLUENCE_PROXY")]
    proxy: Option<String>,

    /// Custom user agent string (default randomly selected)
    #[arg(short = 'a', long)]
    user_agent: Option<String>,

    /// Custom CQL query, must contain KEYWORD_PLACEHOLDER at least once
    #[arg(short, long, default_value = DEFAULT_CQL_TEMPLATE)]
    cql: String,

    /// One of TRACE, DEBUG, INFO, SUCCESS, WARNING, ERROR, CRITICAL
    #[arg(short, long, default_value = "INFO")]
    log_level: String,

    /// Characters of context captured on each side of a match
    #[arg(long, default_value_t = DEFAULT_CONTEXT_LENGTH)]
    context_length: usize,

    /// Match keywords literally instead of as regular expressions
    #[arg(long, default_value_t = false)]
    literal: bool,

    /// Read pages from existing snapshots instead of fetching them again
    #[arg(long, default_value_t = false)]
    skip_cached: bool,

    /// Directory for page snapshots
    #[arg(long, default_value = DEFAULT_RESULTS_DIR)]
    results_dir: PathBuf,

    /// Directory for the run log file
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,
}

fn tracing_level(log_level: &str) -> anyhow::Result<&'static str> {
    let level = match log_level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "INFO" | "SUCCESS" => "info",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        other => anyhow::bail!("unknown log level {other}"),
    };
    Ok(level)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let started_at = Local::now();

    let level = tracing_level(&cli.log_level)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(fmt::layer())
        .init();

    let template = QueryTemplate::parse(cli.cql.as_str()).map_err(|err| {
        error!("{err}");
        anyhow::anyhow!(err.to_string())
    })?;

    info!(
        "applying rate limit of {} requests per second",
        cli.rate_limit
    );
    let config = ClientConfig::new(&cli.url, &cli.username, &cli.password)
        .with_verify_tls(!cli.disable_ssl_checks)
        .with_rate_limit(cli.rate_limit)
        .with_proxy(cli.proxy.clone())
        .with_user_agent(cli.user_agent.clone());
    debug!(user_agent = %config.user_agent, "using user agent");
    if let Some(proxy) = &config.proxy {
        info!("using proxy {proxy}");
    }

    let client = ConfluenceClient::new(&config)
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;

    let keywords = match &cli.dict_path {
        Some(path) => load_keywords(path).map_err(|err| {
            error!("{err}");
            anyhow::anyhow!(err.to_string())
        })?,
        None => bundled_keywords(),
    };

    let log_file = LogFile::for_run(&cli.log_dir, started_at);
    info!("searching as user {}", cli.username);
    info!("searching for {} keywords", keywords.len());
    info!("logging to {} and stdout", log_file.path().display());
    info!("storing results to {}", cli.results_dir.display());

    let mode = if cli.literal {
        MatchMode::Literal
    } else {
        MatchMode::Pattern
    };
    let fetcher =
        ContentFetcher::new(SnapshotStore::new(&cli.results_dir)).reuse_snapshots(cli.skip_cached);
    let control = ScanControl::new();
    let scanner = Scanner::new(
        client,
        log_file,
        template,
        fetcher,
        TextExtractor::new(cli.context_length, mode),
    )
    .with_control(control.clone());

    let answers = forward_lines(std::io::BufReader::new(std::io::stdin()));
    let prompt = spawn_interrupt_prompt(control.clone(), answers);
    let cancelled = control.token();
    let outcome = tokio::select! {
        outcome = scanner.run(&keywords) => outcome,
        _ = cancelled.cancelled() => Err(ScanError::Cancelled),
    };
    prompt.abort();

    match outcome {
        Ok(report) => {
            if let Some(reason) = &report.stopped_by {
                warn!("scan stopped early after a failed search: {reason}");
            }
            info!(
                keywords = report.keywords_searched,
                hits = report.hits_seen,
                pages = report.pages_fetched,
                snapshots = report.snapshots_written,
                matches = report.matches,
                failures = report.failures,
                log_file = %scanner.sink().path().display(),
                "conkeyscan done"
            );
            Ok(())
        }
        Err(err) => Err(anyhow::anyhow!(err.to_string())),
    }
}

/// Reads lines on a plain OS thread. A read that never returns stays on
/// that thread and does not hold up runtime shutdown.
fn forward_lines<R>(reader: R) -> mpsc::UnboundedReceiver<String>
where
    R: BufRead + Send + 'static,
{
    let (sender, receiver) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else {
                return;
            };
            if sender.send(line).is_err() {
                return;
            }
        }
    });
    receiver
}

/// Lines typed before the question was asked are discarded. A closed
/// input counts as `n`.
async fn confirm_exit(answers: &mut mpsc::UnboundedReceiver<String>) -> bool {
    while answers.try_recv().is_ok() {}
    warn!("Do you really want to exit? y/n");
    match answers.recv().await {
        Some(answer) => answer.trim().eq_ignore_ascii_case("y"),
        None => false,
    }
}

/// Ctrl-C pauses the scan and asks for confirmation. Anything but `y`
/// resumes and re-arms the handler.
fn spawn_interrupt_prompt(
    control: ScanControl,
    mut answers: mpsc::UnboundedReceiver<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            control.pause();

            if confirm_exit(&mut answers).await {
                control.cancel();
                return;
            }
            warn!("resuming scan");
            control.resume();
        }
    })
}
