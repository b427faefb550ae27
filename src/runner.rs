//! Drives generation and oracle checks over a pool of connections.

use crate::config::FuzzConfig;
use crate::db::{DuckDBConnectionManager, DuckExecutor};
use crate::error::Result;
use crate::generator::{add_rows_to_all_tables, mutator, populate};
use crate::oracle::{TestOracle, build_oracle};
use crate::random::Randomly;
use crate::state::{Finding, GlobalState, RunStats};
use crate::util::event_log::TracingEventLog;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// A non-benign error that ended one database iteration.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub database: u64,
    pub seed: u64,
    pub error: String,
    pub last_query: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub databases: u64,
    pub checks: u64,
    pub passes: u64,
    pub expected_errors: u64,
    pub findings: Vec<Finding>,
    pub failures: Vec<Failure>,
}

impl RunReport {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            started_at: Utc::now(),
            finished_at: None,
            databases: 0,
            checks: 0,
            passes: 0,
            expected_errors: 0,
            findings: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn absorb(&mut self, stats: &RunStats) {
        self.databases += 1;
        self.checks += stats.checks;
        self.passes += stats.passes;
        self.expected_errors += stats.expected_errors;
        self.findings.extend(stats.findings.iter().cloned());
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.failures.is_empty()
    }
}

struct Budget<'a> {
    stop: &'a AtomicBool,
    deadline: Option<Instant>,
}

impl Budget<'_> {
    fn exhausted(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Runs `num_databases` iterations or until `stop` is set or the timeout
/// passes. Only connectivity failures abort the run.
pub fn run(
    config: &FuzzConfig,
    pool: &Pool<DuckDBConnectionManager>,
    stop: &AtomicBool,
) -> Result<RunReport> {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!("Starting fuzz run with seed {}", seed);

    let mut seeds = Randomly::new(seed);
    let mut report = RunReport::new(seed);
    let budget = Budget {
        stop,
        deadline: config
            .timeout_secs
            .map(|s| Instant::now() + Duration::from_secs(s)),
    };
    let needs_rows = config.require_rows
        || config
            .oracles
            .iter()
            .any(|o| o.requires_all_tables_to_contain_rows());

    for database in 0..config.num_databases {
        if budget.exhausted() {
            warn!("Stopping before database {}: budget exhausted", database);
            break;
        }

        let db_seed = seeds.next_seed();
        let conn = pool.get()?;
        let mut state = GlobalState::new(
            Box::new(DuckExecutor::new(conn)),
            Box::new(TracingEventLog),
            db_seed,
        );
        let mut oracle = build_oracle(&config.oracles);

        let outcome = run_database(config, &mut state, oracle.as_mut(), needs_rows, &budget);
        report.absorb(state.stats());

        match outcome {
            Ok(()) => info!("Database {} done (seed {})", database, db_seed),
            Err(e) if e.is_connectivity() => {
                error!("Lost connection in database {}: {}", database, e);
                return Err(e);
            }
            Err(e) => {
                error!("Database {} failed (seed {}): {}", database, db_seed, e);
                report.failures.push(Failure {
                    database,
                    seed: db_seed,
                    error: e.to_string(),
                    last_query: oracle.last_query().map(str::to_string),
                });
            }
        }
    }

    report.finished_at = Some(Utc::now());
    Ok(report)
}

fn run_database(
    config: &FuzzConfig,
    state: &mut GlobalState,
    oracle: &mut dyn TestOracle,
    needs_rows: bool,
    budget: &Budget<'_>,
) -> Result<()> {
    state.refresh_schema_with_retry()?;
    populate(state)?;
    if needs_rows {
        add_rows_to_all_tables(state)?;
    }

    for _ in 0..config.queries_per_database {
        if budget.exhausted() {
            break;
        }
        if state.randomly().chance(config.mutation_probability) {
            mutator::mutate(state)?;
        }
        oracle.check(state)?;
    }
    Ok(())
}
