use clap::Parser;
use r2d2::Pool;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use duck_norec::config::{AppConfig, CliArgs};
use duck_norec::db::DuckDBConnectionManager;
use duck_norec::runner;
use duck_norec::util::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Initialize logging
    init_tracing(&config.logging)?;

    info!(
        "Initializing connection pool for {}",
        config.database.connection_string
    );
    let db_manager = DuckDBConnectionManager::new(config.database.connection_string.clone());
    let pool = Pool::builder()
        .max_size(config.database.pool_size)
        .build(db_manager)?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing current check");
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    let fuzz = config.fuzz.clone();
    let report = match tokio::task::spawn_blocking(move || runner::run(&fuzz, &pool, &stop)).await? {
        Ok(report) => report,
        Err(e) => {
            error!("Fuzz run aborted: {}", e);
            return Err(e.into());
        }
    };

    info!(
        "Run finished (seed {}): {} databases, {} checks, {} passed, {} expected errors, {} findings, {} failures",
        report.seed,
        report.databases,
        report.checks,
        report.passes,
        report.expected_errors,
        report.findings.len(),
        report.failures.len()
    );

    if let Some(path) = &config.report.path {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("Report written to {}", path.display());
    }

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
