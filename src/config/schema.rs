use crate::error::{MdError, Result};
use crate::target::{LocationDb, SeqRange};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn get_filter(&self) -> String {
        self.filter
            .clone()
            .unwrap_or_else(super::default_log_filter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AllocatorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_width: Option<u64>,
}

impl AllocatorConfig {
    pub fn get_seq_width(&self) -> u64 {
        self.seq_width.unwrap_or_else(super::default_seq_width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqRangeConfig {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardConfig {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub sequences: Vec<SeqRangeConfig>,
}

impl ShardConfig {
    pub fn get_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("mdt{:04x}", self.index))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub allocator: AllocatorConfig,
    #[serde(default)]
    pub shards: Vec<ShardConfig>,
}

impl Config {
    pub fn shard(&self, index: u32) -> Option<&ShardConfig> {
        self.shards.iter().find(|s| s.index == index)
    }
}

pub fn validate_config(config: &Config) -> Result<()> {
    let width = config.allocator.get_seq_width();
    if width == 0 || width > u32::MAX as u64 {
        return Err(MdError::Config(format!(
            "allocator.seq_width ({}) must be between 1 and {}",
            width,
            u32::MAX
        )));
    }

    let mut seen = HashSet::new();
    for shard in &config.shards {
        if !seen.insert(shard.index) {
            return Err(MdError::Config(format!(
                "Shard index {} is configured more than once",
                shard.index
            )));
        }
    }

    let mut fld = LocationDb::new();
    for shard in &config.shards {
        for range in &shard.sequences {
            fld.insert(SeqRange::new(range.start, range.end, shard.index))?;
        }
        if shard.sequences.is_empty() {
            tracing::warn!(
                "Shard #{} has no sequence ranges; nothing will route to it by fid",
                shard.index
            );
        }
    }

    Ok(())
}
