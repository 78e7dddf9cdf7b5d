use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use ecosync::config::{LoggingConfig, WorkflowConfig};
use ecosync::pipeline::{self, PipelineReport};

use super::args::CliArgs;
use super::errors::AppError;

const DEFAULT_CONFIG_FILE: &str = "ecosync.toml";

fn load_config(args: &CliArgs) -> Result<WorkflowConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => WorkflowConfig::read_file(path)?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                WorkflowConfig::read_file(&default_path)?
            } else {
                WorkflowConfig::default()
            }
        }
    };

    if let Some(action) = args.action {
        config.action = action;
    }
    if let Some(short_name) = &args.short_name {
        config.search.short_name = short_name.clone();
    }
    if let Some(tile) = &args.tile {
        config.search.tile = tile.clone();
    }
    if let Some(date) = args.start_date {
        config.search.start_date = date;
    }
    if let Some(date) = args.end_date {
        config.search.end_date = date;
    }
    if let Some(day_night) = args.day_night {
        config.search.day_night = day_night;
    }
    if let Some(file_types) = &args.file_types {
        config.search.file_types = file_types.clone();
    }
    if let Some(dir) = &args.download_dir {
        config.download.root = dir.clone();
    }
    if let Some(manifest) = &args.manifest {
        config.upload.manifest = manifest.clone();
    }
    if let Some(collection) = &args.collection {
        config.upload.collection_base = collection.clone();
    }
    if let Some(email) = &args.user_email {
        config.upload.user_email = email.clone();
    }

    // validate the merged result, not the raw file
    config.validate()?;
    Ok(config)
}

fn parse_level(level: &str) -> Result<tracing::Level, AppError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(AppError::InvalidLogLevel {
            level: level.to_string(),
        }),
    }
}

fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<(), AppError> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        parse_level(&config.level)?
    };
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .init();
    Ok(())
}

fn print_summary(config: &WorkflowConfig, report: &PipelineReport) {
    if config.action.includes_download() {
        println!();
        println!("Download summary:");
        println!("  new downloads:      {}", report.download.downloaded);
        println!("  skipped (existing): {}", report.download.skipped);
        println!("  errors:             {}", report.download.errors);
        println!("  unparsed granules:  {}", report.download.unparsed);
        println!("  files tracked:      {}", report.tracked_files);
        if report.search_failed {
            println!("  search failed; upload ran from files already on disk");
        }
    }
    if config.action.includes_upload() {
        println!();
        println!("Upload summary:");
        println!("  folders uploaded:   {}", report.uploads_completed);
        println!("  folder errors:      {}", report.upload_errors);
        println!(
            "  manifest rows:      {} matched, {} unmatched",
            report.rows_matched, report.rows_unmatched
        );
    }
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    init_logging(&config.logging, args.log)?;

    println!("{:=<60}", "");
    println!("ECOSTRESS data download and upload");
    println!("{:=<60}", "");

    info!(
        "starting {} run for tile {} ({} to {})",
        config.action, config.search.tile, config.search.start_date, config.search.end_date
    );

    let report = pipeline::run_workflow(&config)?;
    print_summary(&config, &report);
    info!("run completed");

    println!();
    println!("{:=<60}", "");
    println!("Workflow completed");
    println!("{:=<60}", "");

    Ok(())
}
