use serde::{Deserialize, Serialize};

use crate::error::{MdError, Result};

/// A contiguous run of fid sequences owned by one shard. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqRange {
    pub start: u64,
    pub end: u64,
    pub index: u32,
}

impl SeqRange {
    pub fn new(start: u64, end: u64, index: u32) -> Self {
        SeqRange { start, end, index }
    }

    pub fn contains(&self, seq: u64) -> bool {
        self.start <= seq && seq < self.end
    }

    pub fn width(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    fn overlaps(&self, other: &SeqRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Sequence location database: which shard owns which sequences.
#[derive(Debug, Clone, Default)]
pub struct LocationDb {
    /// Sorted by `start`, never overlapping.
    ranges: Vec<SeqRange>,
}

impl LocationDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, range: SeqRange) -> Result<()> {
        if range.start >= range.end {
            return Err(MdError::Config(format!(
                "Empty sequence range [{:#x}, {:#x}) for shard #{}",
                range.start, range.end, range.index
            )));
        }

        let pos = self.ranges.partition_point(|r| r.start < range.start);
        let clash = [pos.checked_sub(1), Some(pos)]
            .into_iter()
            .flatten()
            .filter_map(|i| self.ranges.get(i))
            .find(|r| r.overlaps(&range));
        if let Some(existing) = clash {
            return Err(MdError::Config(format!(
                "Sequence range [{:#x}, {:#x}) for shard #{} overlaps [{:#x}, {:#x}) of shard #{}",
                range.start, range.end, range.index, existing.start, existing.end, existing.index
            )));
        }

        self.ranges.insert(pos, range);
        Ok(())
    }

    pub fn lookup(&self, seq: u64) -> Option<u32> {
        let pos = self.ranges.partition_point(|r| r.start <= seq);
        pos.checked_sub(1)
            .and_then(|i| self.ranges.get(i))
            .filter(|r| r.contains(seq))
            .map(|r| r.index)
    }

    pub fn ranges(&self) -> &[SeqRange] {
        &self.ranges
    }

    pub fn ranges_for(&self, index: u32) -> impl Iterator<Item = &SeqRange> + '_ {
        self.ranges.iter().filter(move |r| r.index == index)
    }

    pub fn remove_shard(&mut self, index: u32) {
        self.ranges.retain(|r| r.index != index);
    }
}
