use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct BenchConfig {
    pub clock: ClockConfig,
    pub run: RunConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClockConfig {
    pub kind: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            kind: "monotonic".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunConfig {
    /// Per-operation measurement count.
    pub iterations: u64,
    /// Expiry checks per refresh in the batch benchmark.
    pub batch_size: u64,
    /// Deadline horizon used by the batch benchmark, in seconds.
    pub horizon_secs: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            iterations: 1_000_000,
            batch_size: 256,
            horizon_secs: 0.05,
        }
    }
}

/// Loads `path` if it exists, otherwise falls back to defaults. A present
/// but malformed file is an error rather than a silent fallback.
pub fn load(path: &str) -> anyhow::Result<BenchConfig> {
    if !Path::new(path).exists() {
        return Ok(BenchConfig::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path))?;

    let config: BenchConfig =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path))?;

    Ok(config)
}
