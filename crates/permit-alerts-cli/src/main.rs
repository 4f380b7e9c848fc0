//! Permit Alerts CLI
//!
//! Terminal alert board for construction permit deadlines. Fetches the
//! project list, derives deadline alerts and prints them highest severity
//! first. `watch` keeps refreshing on a timer and accepts commands on stdin.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use colored::Colorize;
use permit_alerts::{
    AlertBoard, AlertCategory, AlertMonitor, AlertRecord, AlertSummary, Evaluator,
    MonitorConfig, MonitorHandle, RefreshOutcome, RefreshSignal, Severity, SourceConfig,
};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Deadline alerts for construction permit projects
#[derive(Parser)]
#[command(name = "permit-alerts")]
#[command(about = "Deadline alerts for construction permit projects")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(long, env = "PERMIT_ALERTS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Read projects from a JSON export instead of the API
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// REST API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Offset day counts are computed in, e.g. +09:00
    #[arg(long, global = true)]
    utc_offset: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch once and print the current alerts
    Check {
        /// Hide an alert by id (repeatable)
        #[arg(long = "dismiss", value_name = "ALERT_ID")]
        dismiss: Vec<String>,

        /// Exit with status 2 when any high-severity alert is shown
        #[arg(long)]
        fail_on_high: bool,
    },
    /// Keep refreshing and print the board whenever it changes
    ///
    /// Commands on stdin: `refresh`, `dismiss <id>`, `dismiss-all`, `clear`.
    /// Lines starting with `{` are treated as realtime frames.
    Watch {
        /// Refresh interval in seconds (overrides configuration)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// List the active rules and their thresholds
    Rules,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Check {
            dismiss,
            fail_on_high,
        } => run_check(&config, dismiss, fail_on_high, cli.format).await,
        Commands::Watch { interval } => {
            if let Some(secs) = interval {
                config.refresh_interval_secs = secs;
                config.validate().context("Invalid refresh interval")?;
            }
            run_watch(&config, cli.format).await
        }
        Commands::Rules => {
            print_rules(&Evaluator::new(config.thresholds.clone()), cli.format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("permit_alerts=debug,permit_alerts_cli=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("permit_alerts=info,permit_alerts_cli=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<MonitorConfig> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MonitorConfig::from_env().context("Invalid environment configuration")?,
    };

    if let Some(path) = &cli.input {
        config.source = SourceConfig::File { path: path.clone() };
    } else if let Some(base_url) = &cli.api_url {
        config.source = SourceConfig::Rest {
            base_url: base_url.clone(),
        };
    }
    if let Some(offset) = &cli.utc_offset {
        config.utc_offset = Some(offset.clone());
    }

    config.validate().context("Invalid configuration")?;
    debug!(source = ?config.source, "Configuration loaded");
    Ok(config)
}

async fn run_check(
    config: &MonitorConfig,
    dismiss: Vec<String>,
    fail_on_high: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    let board = AlertBoard::from_config(config).context("Failed to set up alert board")?;

    if let RefreshOutcome::Failed(message) = board.refresh().await {
        bail!("Failed to fetch projects: {message}");
    }
    for id in dismiss {
        if !board.dismiss(id.as_str()).await {
            warn!(alert_id = %id, "Alert id given more than once");
        }
    }

    let summary = board.summary().await;
    print_summary(&summary, board.last_refreshed().await, format)?;

    if fail_on_high && summary.high > 0 {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_watch(config: &MonitorConfig, format: OutputFormat) -> Result<ExitCode> {
    let board = Arc::new(AlertBoard::from_config(config).context("Failed to set up alert board")?);
    let handle = AlertMonitor::new(board.clone(), config.refresh_interval()).spawn();
    info!(
        interval_secs = config.refresh_interval_secs,
        "Watching alerts, press Ctrl-C to stop"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    watch_until(&board, &handle, stdin, format, tokio::signal::ctrl_c()).await?;

    handle.shutdown().await;
    Ok(ExitCode::SUCCESS)
}

/// Print the board whenever it changes and apply commands from `input`
/// until `shutdown` resolves.
async fn watch_until<R, F>(
    board: &AlertBoard,
    handle: &MonitorHandle,
    input: R,
    format: OutputFormat,
    shutdown: F,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: Future,
{
    let mut lines = input.lines();
    let mut stdin_open = true;
    let mut poll = tokio::time::interval(Duration::from_secs(1));
    let mut shown_refresh: Option<DateTime<FixedOffset>> = None;
    let mut shown_error: Option<String> = None;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if apply_command(board, handle, line.trim()).await {
                        print_summary(&board.summary().await, board.last_refreshed().await, format)?;
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin, ignoring further commands");
                    stdin_open = false;
                }
            },
            _ = poll.tick() => {
                let error = board.last_error().await;
                if error != shown_error {
                    if let Some(message) = &error {
                        eprintln!(
                            "{}",
                            format!("Refresh failed, showing previous alerts: {message}").yellow()
                        );
                    }
                    shown_error = error;
                }

                let refreshed = board.last_refreshed().await;
                if refreshed != shown_refresh {
                    shown_refresh = refreshed;
                    print_summary(&board.summary().await, refreshed, format)?;
                }
            }
        }
    }

    Ok(())
}

/// Apply one stdin command. Returns `true` if the board changed.
async fn apply_command(board: &AlertBoard, handle: &MonitorHandle, line: &str) -> bool {
    if line.is_empty() {
        return false;
    }
    if line.starts_with('{') {
        if let Some(signal) = handle.handle_realtime(line) {
            debug!(signal = ?signal, "Realtime frame triggered refresh");
        }
        return false;
    }

    match line.split_once(' ') {
        Some(("dismiss", id)) => board.dismiss(id.trim()).await,
        _ => match line {
            "refresh" => {
                handle.signal(RefreshSignal::Manual);
                false
            }
            "dismiss-all" => board.dismiss_all().await > 0,
            "clear" => {
                board.clear_dismissed().await;
                true
            }
            other => {
                eprintln!("{}", format!("Unknown command: {other}").yellow());
                false
            }
        },
    }
}

#[derive(Serialize)]
struct Report<'a> {
    refreshed_at: Option<DateTime<FixedOffset>>,
    #[serde(flatten)]
    summary: &'a AlertSummary,
}

fn print_summary(
    summary: &AlertSummary,
    refreshed_at: Option<DateTime<FixedOffset>>,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Json {
        let report = Report {
            refreshed_at,
            summary,
        };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    let stamp = refreshed_at.map_or_else(
        || "never".to_string(),
        |at| at.format("%Y-%m-%d %H:%M").to_string(),
    );
    println!(
        "{} {} (high {}, medium {}, low {}) at {stamp}",
        "Alerts:".bold(),
        summary.total,
        summary.high.to_string().red(),
        summary.medium.to_string().yellow(),
        summary.low.to_string().blue(),
    );

    if summary.is_empty() {
        println!("{}", "No alerts".green());
        return Ok(());
    }
    for alert in &summary.alerts {
        println!("{}", render_alert(alert));
    }
    Ok(())
}

fn render_alert(alert: &AlertRecord) -> String {
    let badge = format!("[{:<6}]", alert.severity.as_str().to_uppercase());
    let badge = match alert.severity {
        Severity::High => badge.red().bold(),
        Severity::Medium => badge.yellow(),
        Severity::Low => badge.blue(),
    };
    let offset = alert
        .day_offset
        .map(|days| format!(" ({days:+}d)"))
        .unwrap_or_default();

    format!(
        "{badge} {} {}{offset}\n         {} {}  {}",
        category_tag(alert.category).dimmed(),
        alert.title.bold(),
        alert.project.code,
        alert.message,
        alert.id.to_string().dimmed(),
    )
}

fn category_tag(category: AlertCategory) -> String {
    format!("{:<11}", category.as_str())
}

#[derive(Serialize)]
struct RuleInfo {
    name: &'static str,
    category: AlertCategory,
    description: String,
}

fn print_rules(evaluator: &Evaluator, format: OutputFormat) -> Result<()> {
    let rules: Vec<RuleInfo> = evaluator
        .rules()
        .map(|rule| RuleInfo {
            name: rule.name(),
            category: rule.category(),
            description: rule.describe(evaluator.thresholds()),
        })
        .collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    println!("{}", "Active rules:".bold());
    for rule in &rules {
        println!(
            "  {:<26} {} {}",
            rule.name.cyan(),
            category_tag(rule.category).dimmed(),
            rule.description
        );
    }
    Ok(())
}
