//! Build configuration for index construction
//!
//! Parameters for k-mer and minimizer lengths and build parallelism.
//! Validation runs before any file is touched, so a bad `k`/`m` pair never
//! costs a genome parse.

use crate::constants::{DEFAULT_K, DEFAULT_M, MAX_K, MIN_K};
use crate::error::{Error, Result};

/// Configuration parameters for building a repeat index
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// K-mer length (1..=32; two-bit packing into a single u64)
    pub k: usize,

    /// Minimizer length (1..=k)
    pub m: usize,

    /// Number of threads for the build (0 = all available cores)
    pub threads: usize,

    /// Log per-step detail during construction
    pub verbose: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { k: DEFAULT_K, m: DEFAULT_M, threads: 0, verbose: false }
    }
}

impl BuildConfig {
    /// Create a configuration with the given k-mer and minimizer lengths
    pub fn new(k: usize, m: usize) -> Result<Self> {
        let config = Self { k, m, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    /// Validate the parameters
    pub fn validate(&self) -> Result<()> {
        if self.k < MIN_K || self.k > MAX_K {
            return Err(Error::ConfigInvalid(format!(
                "k must be in range [{MIN_K}, {MAX_K}], got k={}",
                self.k
            )));
        }
        if self.m < 1 || self.m > self.k {
            return Err(Error::ConfigInvalid(format!(
                "m must be in range [1, k], got m={}, k={}",
                self.m, self.k
            )));
        }
        Ok(())
    }

    /// Log the configuration via tracing
    pub fn log(&self) {
        tracing::info!("Build configuration:");
        tracing::info!("  k = {}", self.k);
        tracing::info!("  m = {}", self.m);
        if self.threads == 0 {
            tracing::info!("  threads = all available cores");
        } else {
            tracing::info!("  threads = {}", self.threads);
        }
        tracing::debug!("  verbose = {}", self.verbose);
    }
}
