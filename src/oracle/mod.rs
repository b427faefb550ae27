//! Test oracles and the registry that builds them from configuration.

pub mod errors;
pub mod norec;

use crate::error::Result;
use crate::state::GlobalState;
use serde::{Deserialize, Serialize};

pub use norec::{CheckOutcome, NoRecOracle};

pub trait TestOracle {
    /// Runs one check. Findings and benign errors are reported through the
    /// state's event log; only genuine failures come back as `Err`.
    fn check(&mut self, state: &mut GlobalState) -> Result<()>;

    fn last_query(&self) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    #[value(name = "norec")]
    NoRec,
}

impl OracleKind {
    pub fn create(&self) -> Box<dyn TestOracle> {
        match self {
            OracleKind::NoRec => Box::new(NoRecOracle::new()),
        }
    }

    pub fn requires_all_tables_to_contain_rows(&self) -> bool {
        match self {
            OracleKind::NoRec => false,
        }
    }
}

/// Runs several oracles back to back; the first genuine failure wins.
pub struct CompositeOracle {
    oracles: Vec<Box<dyn TestOracle>>,
    last: Option<usize>,
}

impl CompositeOracle {
    pub fn new(oracles: Vec<Box<dyn TestOracle>>) -> Self {
        Self { oracles, last: None }
    }
}

impl TestOracle for CompositeOracle {
    fn check(&mut self, state: &mut GlobalState) -> Result<()> {
        for (idx, oracle) in self.oracles.iter_mut().enumerate() {
            self.last = Some(idx);
            oracle.check(state)?;
        }
        Ok(())
    }

    fn last_query(&self) -> Option<&str> {
        self.last
            .and_then(|idx| self.oracles.get(idx))
            .and_then(|o| o.last_query())
    }
}

/// One oracle for a single kind, a composite for several.
pub fn build_oracle(kinds: &[OracleKind]) -> Box<dyn TestOracle> {
    match kinds {
        [single] => single.create(),
        [] => OracleKind::NoRec.create(),
        many => Box::new(CompositeOracle::new(
            many.iter().map(OracleKind::create).collect(),
        )),
    }
}
