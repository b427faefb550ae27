//! Side channel for queries, progress and errors.
//!
//! Every generator and oracle reports through an [`EventLog`]; none of its
//! methods can fail.

use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

pub trait EventLog {
    fn log_query(&self, sql: &str);

    fn log_info(&self, message: &str);

    fn log_error(&self, message: &str, sql: Option<&str>);

    fn log_exception(&self, err: &dyn std::error::Error, sql: Option<&str>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn log_query(&self, sql: &str) {
        debug!(target: "duck_norec::query", "{}", sql);
    }

    fn log_info(&self, message: &str) {
        info!(target: "duck_norec::state", "{}", message);
    }

    fn log_error(&self, message: &str, sql: Option<&str>) {
        match sql {
            Some(sql) => error!(target: "duck_norec::state", sql, "{}", message),
            None => error!(target: "duck_norec::state", "{}", message),
        }
    }

    fn log_exception(&self, err: &dyn std::error::Error, sql: Option<&str>) {
        match sql {
            Some(sql) => error!(target: "duck_norec::state", sql, error = %err, "statement failed"),
            None => error!(target: "duck_norec::state", error = %err, "operation failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Query(String),
    Info(String),
    Error { message: String, sql: Option<String> },
}

/// Keeps every event in memory; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingEventLog {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl RecordingEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn infos(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                LogEvent::Info(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(String, Option<String>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                LogEvent::Error { message, sql } => Some((message, sql)),
                _ => None,
            })
            .collect()
    }

    pub fn queries(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                LogEvent::Query(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: LogEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl EventLog for RecordingEventLog {
    fn log_query(&self, sql: &str) {
        self.push(LogEvent::Query(sql.to_string()));
    }

    fn log_info(&self, message: &str) {
        self.push(LogEvent::Info(message.to_string()));
    }

    fn log_error(&self, message: &str, sql: Option<&str>) {
        self.push(LogEvent::Error {
            message: message.to_string(),
            sql: sql.map(str::to_string),
        });
    }

    fn log_exception(&self, err: &dyn std::error::Error, sql: Option<&str>) {
        self.log_error(&err.to_string(), sql);
    }
}
