use crate::oracle::OracleKind;
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// `:memory:` or a database file path.
    pub connection_string: String,
    pub pool_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FuzzConfig {
    /// Run seed; drawn at random when absent.
    pub seed: Option<u64>,
    pub num_databases: u64,
    pub queries_per_database: u64,
    /// Wall-clock budget for the whole run.
    pub timeout_secs: Option<u64>,
    pub oracles: Vec<OracleKind>,
    /// Chance of running an UPDATE mutation before each check.
    pub mutation_probability: f64,
    /// Top up empty tables before checking, regardless of oracle needs.
    pub require_rows: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub error_log_file: Option<PathBuf>,
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub fuzz: FuzzConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Differential (NoREC) logic-bug fuzzer for DuckDB", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database to test (`:memory:` or a file path)
    #[arg(long)]
    pub db: Option<String>,

    /// Seed for the run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of databases to generate
    #[arg(long)]
    pub num_databases: Option<u64>,

    /// Oracle checks per database
    #[arg(short = 'q', long)]
    pub num_queries: Option<u64>,

    /// Stop after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Oracles to run (repeatable)
    #[arg(long, value_enum)]
    pub oracle: Vec<OracleKind>,

    /// Append warnings and errors to this file
    #[arg(long, value_name = "FILE")]
    pub error_log: Option<PathBuf>,

    /// Write a JSON run report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Emit console logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut config_builder = Config::builder()
            .set_default("database.connection_string", ":memory:")?
            .set_default("database.pool_size", 1_i64)?
            .set_default("fuzz.num_databases", 1_i64)?
            .set_default("fuzz.queries_per_database", 100_i64)?
            .set_default("fuzz.oracles", vec!["norec"])?
            .set_default("fuzz.mutation_probability", 0.1)?
            .set_default("fuzz.require_rows", false)?
            .set_default("logging.json", false)?;

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = ["duck-norec.toml", "config/duck-norec.toml"];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix("DUCK_NOREC")
                .prefix_separator("__")
                .separator("__"),
        );

        // Build the config
        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        // Override with command line args if provided
        if let Some(db) = &args.db {
            config.database.connection_string = db.clone();
        }
        if args.seed.is_some() {
            config.fuzz.seed = args.seed;
        }
        if let Some(n) = args.num_databases {
            config.fuzz.num_databases = n;
        }
        if let Some(n) = args.num_queries {
            config.fuzz.queries_per_database = n;
        }
        if args.timeout_secs.is_some() {
            config.fuzz.timeout_secs = args.timeout_secs;
        }
        if !args.oracle.is_empty() {
            config.fuzz.oracles = args.oracle.clone();
        }
        if args.error_log.is_some() {
            config.logging.error_log_file = args.error_log.clone();
        }
        if args.report.is_some() {
            config.report.path = args.report.clone();
        }
        if args.json_logs {
            config.logging.json = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the fuzzer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.pool_size == 0 {
            return Err(ConfigError::Message(
                "database.pool_size must be at least 1".to_string(),
            ));
        }
        let p = self.fuzz.mutation_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::Message(format!(
                "fuzz.mutation_probability must be within [0, 1], got {}",
                p
            )));
        }
        Ok(())
    }
}

// Default implementation
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                connection_string: ":memory:".to_string(),
                pool_size: 1,
            },
            fuzz: FuzzConfig {
                seed: None,
                num_databases: 1,
                queries_per_database: 100,
                timeout_secs: None,
                oracles: vec![OracleKind::NoRec],
                mutation_probability: 0.1,
                require_rows: false,
            },
            logging: LoggingConfig::default(),
            report: ReportConfig::default(),
        }
    }
}
