//! Emission sinks for merged results

use crate::error::Result;
use crate::types::MergedResult;

/// Receives the merged descriptor of every processed merge point
pub trait EmissionSink {
    fn emit(&mut self, result: MergedResult) -> Result<()>;
}

/// Keeps every emitted result in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    results: Vec<MergedResult>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[MergedResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<MergedResult> {
        self.results
    }
}

impl EmissionSink for CollectingSink {
    fn emit(&mut self, result: MergedResult) -> Result<()> {
        self.results.push(result);
        Ok(())
    }
}
