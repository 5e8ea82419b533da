//! Workshop - coordinator, cohort and groups of three
//!
//! CLI entry point: runs the workshop with console narration.

use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use workshop::cli::{Cli, Command};
use workshop::config::Config;
use workshop::driver::WorkshopRuntime;
use workshop::events::{NarrationFormat, Narrator, create_event_bus, spawn_narrator};
use workshop::WorkshopSnapshot;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    // stdout carries the narration
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install tracing subscriber: {}", e))?;

    debug!(?level, "Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let command = cli.command.unwrap_or_else(Command::default_run);
    debug!(?command, "main: dispatching command");
    match command {
        Command::Run {
            duration,
            format,
            no_color,
        } => {
            let format = format.unwrap_or(config.narration.format);
            let color = config.narration.color && !no_color;
            cmd_run(&config, duration.map(Duration::from_secs), format, color).await
        }
        Command::Config => cmd_config(&config),
    }
}

/// Run the workshop until interrupted or `duration` elapses
async fn cmd_run(config: &Config, duration: Option<Duration>, format: NarrationFormat, color: bool) -> Result<()> {
    debug!(?duration, %format, color, "cmd_run: called");
    info!(
        cohort_size = config.cohort_size,
        group_workers = config.group_workers,
        "Starting workshop"
    );

    let bus = create_event_bus();
    let narrator = spawn_narrator(&bus, Narrator::new(format, color));
    let runtime = WorkshopRuntime::from_config(config, bus.clone());

    match duration {
        Some(limit) => {
            tokio::select! {
                _ = tokio::time::sleep(limit) => info!("Run duration elapsed"),
                res = tokio::signal::ctrl_c() => {
                    res.context("Failed to listen for Ctrl-C")?;
                    info!("Interrupted");
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
            info!("Interrupted");
        }
    }

    let snapshot = runtime.shutdown().await.context("Workshop actors failed")?;

    // The narrator ends once the last emitter is gone
    drop(bus);
    narrator.await.context("Narrator task failed")?;

    print_summary(&snapshot, format)
}

fn print_summary(snapshot: &WorkshopSnapshot, format: NarrationFormat) -> Result<()> {
    match format {
        NarrationFormat::Json => {
            let json = serde_json::to_string(snapshot).context("Failed to serialize summary")?;
            println!("{}", json);
        }
        NarrationFormat::Text => {
            let stats = &snapshot.stats;
            println!();
            println!("Workshop summary");
            println!("  {:<22}{}", "Coordinator wakes:", stats.coordinator_wakes);
            println!("  {:<22}{}", "Spurious wakes:", stats.spurious_wakes);
            println!("  {:<22}{}", "Cohort rounds:", stats.cohort_rounds);
            println!("  {:<22}{}", "Cohort completions:", stats.cohort_completions);
            println!("  {:<22}{}", "Groups served:", stats.groups_served);
            println!("  {:<22}{}", "Group departures:", stats.group_departures);
            println!("  {:<22}{}", "Peak cohort arrivals:", stats.peak_cohort_arrivals);
            println!("  {:<22}{}", "Peak group arrivals:", stats.peak_group_arrivals);
        }
    }
    Ok(())
}

/// Print the effective configuration
fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}
