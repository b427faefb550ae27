pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod oracle;
pub mod random;
pub mod runner;
pub mod schema;
pub mod state;
pub mod util;
