use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::config::Config;
use crate::context::OpContext;
use crate::error::{MdError, Result};
use crate::fid::Fid;
use crate::target::SeqRange;

/// Largest number of objects a client puts in one metadata sequence.
pub const DEFAULT_SEQ_WIDTH: u64 = 0x20000;

/// Hands out fids for objects about to be created.
pub trait FidAllocator: Send + Sync {
    /// Allocate a fresh fid for an object that will live on `shard`.
    fn alloc_fid(&self, shard: u32, ctx: &OpContext) -> Result<Fid>;
}

#[derive(Debug)]
struct SeqCursor {
    /// Sequences not yet opened, in ascending order.
    pending: VecDeque<SeqRange>,
    seq: Option<u64>,
    next_oid: u64,
}

impl SeqCursor {
    fn new(ranges: impl IntoIterator<Item = SeqRange>) -> Self {
        let mut pending: Vec<SeqRange> = ranges.into_iter().collect();
        pending.sort_by_key(|r| r.start);
        SeqCursor {
            pending: pending.into(),
            seq: None,
            next_oid: 1,
        }
    }

    fn advance(&mut self) -> Option<u64> {
        let next = match self.seq {
            Some(seq) if self.pending.front().is_some_and(|r| r.contains(seq + 1)) => seq + 1,
            _ => {
                // current range used up
                if self.seq.is_some() {
                    self.pending.pop_front();
                }
                self.pending.front()?.start
            }
        };
        self.seq = Some(next);
        self.next_oid = 1;
        Some(next)
    }
}

/// Allocates fids from the sequence ranges each shard owns.
///
/// Each sequence yields object numbers `1..=width`, after which the next
/// sequence of the same shard is opened.
#[derive(Debug)]
pub struct SeqAllocator {
    width: u64,
    cursors: Mutex<HashMap<u32, SeqCursor>>,
}

impl SeqAllocator {
    pub fn new(width: u64) -> Self {
        SeqAllocator {
            width: width.max(1),
            cursors: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let allocator = SeqAllocator::new(config.allocator.get_seq_width());
        for shard in &config.shards {
            allocator.add_ranges(
                shard.index,
                shard
                    .sequences
                    .iter()
                    .map(|r| SeqRange::new(r.start, r.end, shard.index)),
            );
        }
        allocator
    }

    pub fn add_ranges(&self, shard: u32, ranges: impl IntoIterator<Item = SeqRange>) {
        let mut cursors = self.cursors.lock();
        let cursor = cursors
            .entry(shard)
            .or_insert_with(|| SeqCursor::new(std::iter::empty()));
        // the range currently being consumed stays at the front
        let current = match cursor.seq {
            Some(_) => cursor.pending.pop_front(),
            None => None,
        };
        cursor.pending.extend(ranges);
        cursor.pending.make_contiguous().sort_by_key(|r| r.start);
        if let Some(range) = current {
            cursor.pending.push_front(range);
        }
    }
}

impl FidAllocator for SeqAllocator {
    fn alloc_fid(&self, shard: u32, _ctx: &OpContext) -> Result<Fid> {
        let mut cursors = self.cursors.lock();
        let cursor = cursors.get_mut(&shard).ok_or_else(|| MdError::Allocation {
            shard,
            reason: "no sequences assigned".to_string(),
        })?;

        let seq = match cursor.seq {
            Some(seq) if cursor.next_oid <= self.width => seq,
            _ => cursor.advance().ok_or_else(|| MdError::Allocation {
                shard,
                reason: "sequence space exhausted".to_string(),
            })?,
        };

        let oid = cursor.next_oid;
        cursor.next_oid += 1;
        let fid = Fid::new(seq, oid as u32, 0);
        tracing::trace!("Allocated {} on shard #{}", fid, shard);
        Ok(fid)
    }
}
