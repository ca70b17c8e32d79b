use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use sweepr::archive::collect_files;
use sweepr::cleaner::{DeletionScheduler, Tier};
use sweepr::config::{GlobalConfig, load_config};
use sweepr::deleter::LocalFsDeleter;

/// Outcome of one sweep, printed as text or JSON.
#[derive(Debug, Serialize)]
struct SweepSummary {
    dir: PathBuf,
    submitted: usize,
    deleted: usize,
    deleted_large: u64,
    deleted_small: u64,
    dry_run: bool,
}

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sweepr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("sweepr.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &GlobalConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Sweep {
            dir,
            pattern,
            dry_run,
            json,
        } => handle_sweep_command(dir.as_deref(), pattern.as_deref(), *dry_run, *json, config),
        Commands::Config => handle_config_command(config),
    }
}

fn handle_sweep_command(
    dir: Option<&Path>,
    pattern: Option<&str>,
    dry_run: bool,
    json: bool,
    config: &GlobalConfig,
) -> Result<()> {
    let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| config.archive.dir.clone());
    let pattern = pattern.unwrap_or(&config.archive.pattern);
    info!("Sweeping {} (pattern: {})", dir.display(), pattern);

    let files = collect_files(&dir, pattern).with_context(|| format!("Failed to list {}", dir.display()))?;
    let submitted = files.len();

    let summary = if dry_run {
        let threshold = config.cleaner.throttle_threshold;
        if !json {
            for file in &files {
                let tier = Tier::classify(file.len, threshold);
                let label = match tier {
                    Tier::Large => format!("{:>5}", tier).magenta(),
                    Tier::Small => format!("{:>5}", tier).cyan(),
                };
                println!("{} {:>14} {}", label, file.len, file.path.display());
            }
        }
        SweepSummary {
            dir,
            submitted,
            deleted: 0,
            deleted_large: 0,
            deleted_small: 0,
            dry_run,
        }
    } else {
        let scheduler = DeletionScheduler::new(config.cleaner.clone(), Arc::new(LocalFsDeleter::new()))
            .context("Failed to start deletion scheduler")?;
        let deleted = scheduler.submit_batch(files);
        let summary = SweepSummary {
            dir,
            submitted,
            deleted,
            deleted_large: scheduler.deleted_large_files(),
            deleted_small: scheduler.deleted_small_files(),
            dry_run,
        };
        scheduler.shutdown();
        summary
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.dry_run {
        println!("{} {} files would be submitted", "Dry run:".yellow(), summary.submitted);
    } else {
        let status = if summary.deleted == summary.submitted {
            "Swept:".green()
        } else {
            "Swept (partial):".yellow()
        };
        println!(
            "{} deleted {} of {} files under {} ({} large, {} small)",
            status,
            summary.deleted,
            summary.submitted,
            summary.dir.display(),
            summary.deleted_large,
            summary.deleted_small
        );
    }
    Ok(())
}

fn handle_config_command(config: &GlobalConfig) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to render configuration")?;
    print!("{}", yaml);
    Ok(())
}

fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
