use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::context::OpContext;
use crate::error::{MdError, Result};
use crate::fid::Fid;
use crate::layout::{FxNameHash, NameHash};
use crate::rpc::MdClient;
use crate::target::fld::{LocationDb, SeqRange};

/// One shard and the connection used to reach it.
#[derive(Clone)]
pub struct ShardDescriptor {
    index: u32,
    name: String,
    conn: Option<Arc<dyn MdClient>>,
}

impl ShardDescriptor {
    pub fn new(index: u32, name: impl Into<String>, conn: Option<Arc<dyn MdClient>>) -> Self {
        ShardDescriptor {
            index,
            name: name.into(),
            conn,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn client(&self) -> Result<&Arc<dyn MdClient>> {
        self.conn.as_ref().ok_or(MdError::NotConnected(self.index))
    }
}

impl fmt::Debug for ShardDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardDescriptor")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("connected", &self.conn.is_some())
            .finish()
    }
}

/// An immutable view of the table. Updates publish a new generation.
#[derive(Clone, Default)]
struct Generation {
    number: u64,
    shards: BTreeMap<u32, ShardDescriptor>,
    fld: LocationDb,
}

/// Routing table from fids and names to metadata shards.
///
/// Readers clone the current generation under a short read lock and route
/// against that snapshot, so a concurrent update is seen either entirely or
/// not at all.
pub struct ShardTable {
    current: RwLock<Arc<Generation>>,
    hasher: Arc<dyn NameHash>,
}

impl ShardTable {
    pub fn new() -> Self {
        Self::with_hasher(Arc::new(FxNameHash))
    }

    pub fn with_hasher(hasher: Arc<dyn NameHash>) -> Self {
        ShardTable {
            current: RwLock::new(Arc::new(Generation::default())),
            hasher,
        }
    }

    /// Build a table from configuration. `connect` supplies the connection
    /// for each configured shard, or `None` to leave it offline.
    pub fn from_config<F>(config: &Config, mut connect: F) -> Result<Self>
    where
        F: FnMut(&crate::config::ShardConfig) -> Option<Arc<dyn MdClient>>,
    {
        let table = ShardTable::new();
        table.update(|next| {
            for shard in &config.shards {
                next.shards.insert(
                    shard.index,
                    ShardDescriptor::new(shard.index, shard.get_name(), connect(shard)),
                );
                for range in &shard.sequences {
                    next.fld
                        .insert(SeqRange::new(range.start, range.end, shard.index))?;
                }
            }
            Ok(())
        })?;
        Ok(table)
    }

    fn snapshot(&self) -> Arc<Generation> {
        self.current.read().clone()
    }

    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Generation) -> Result<()>,
    {
        let mut current = self.current.write();
        let mut next = (**current).clone();
        apply(&mut next)?;
        next.number += 1;
        *current = Arc::new(next);
        Ok(())
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().number
    }

    pub fn add_shard(&self, shard: ShardDescriptor) -> Result<()> {
        tracing::info!("Adding shard #{} ({})", shard.index(), shard.name());
        self.update(|next| {
            next.shards.insert(shard.index(), shard);
            Ok(())
        })
    }

    /// Remove a shard along with the sequence ranges it owned.
    pub fn remove_shard(&self, index: u32) -> Result<ShardDescriptor> {
        let mut removed = None;
        self.update(|next| {
            removed = next.shards.remove(&index);
            if removed.is_none() {
                return Err(MdError::NoTarget(format!("shard #{}", index)));
            }
            next.fld.remove_shard(index);
            Ok(())
        })?;
        tracing::info!("Removed shard #{}", index);
        removed.ok_or_else(|| MdError::NoTarget(format!("shard #{}", index)))
    }

    pub fn add_range(&self, range: SeqRange) -> Result<()> {
        self.update(|next| next.fld.insert(range))
    }

    pub fn shards(&self) -> Vec<ShardDescriptor> {
        self.snapshot().shards.values().cloned().collect()
    }

    pub fn ranges(&self) -> Vec<SeqRange> {
        self.snapshot().fld.ranges().to_vec()
    }

    pub fn shard_count(&self) -> usize {
        self.snapshot().shards.len()
    }

    pub fn check_connect(&self) -> Result<()> {
        let snapshot = self.snapshot();
        if snapshot.shards.is_empty() {
            return Err(MdError::NotConnected(0));
        }
        Ok(())
    }

    pub fn target_by_index(&self, index: u32) -> Result<ShardDescriptor> {
        self.snapshot()
            .shards
            .get(&index)
            .cloned()
            .ok_or_else(|| MdError::NoTarget(format!("shard #{}", index)))
    }

    /// Find the shard owning `fid`.
    pub fn target_for(&self, fid: &Fid) -> Result<ShardDescriptor> {
        let snapshot = self.snapshot();
        let index = if fid.is_igif() {
            Some(0)
        } else {
            snapshot.fld.lookup(fid.seq)
        };

        index
            .and_then(|i| snapshot.shards.get(&i).cloned())
            .ok_or_else(|| MdError::NoTarget(fid.to_string()))
    }

    /// Route `ctx` to a shard.
    ///
    /// When the primary object is a striped directory and a name is given,
    /// the name picks the stripe and `ctx.fid1` becomes that stripe's fid.
    /// Otherwise routing goes by `ctx.fid1`.
    pub fn locate(&self, ctx: &mut OpContext) -> Result<ShardDescriptor> {
        if let (Some(layout), Some(name)) = (ctx.mea1.as_ref(), ctx.name.as_deref()) {
            let stripe = layout.locate_stripe(name, self.hasher.as_ref())?;
            let (fid, mds) = (stripe.fid, stripe.mds);
            tracing::debug!("Locate on striped dir: '{}' -> stripe {} mds #{}", name, fid, mds);
            ctx.fid1 = fid;
            ctx.mds = Some(mds);
            return self.target_by_index(mds);
        }

        let target = self.target_for(&ctx.fid1)?;
        ctx.mds = Some(target.index());
        Ok(target)
    }

    /// Like [`locate`](Self::locate), except that a striped directory with
    /// an unrecognized hash type goes to its first stripe, with or without a
    /// name.
    pub fn locate_or_first_stripe(&self, ctx: &mut OpContext) -> Result<ShardDescriptor> {
        let first = match ctx.mea1.as_deref() {
            Some(layout) if !layout.hash().is_known() => {
                let stripe = layout.first_stripe()?;
                Some((stripe.fid, stripe.mds, layout.hash()))
            }
            _ => None,
        };

        let Some((fid, mds, hash)) = first else {
            return self.locate(ctx);
        };
        tracing::debug!("Unknown hash {}, starting at stripe 0 ({})", hash, fid);
        ctx.fid1 = fid;
        ctx.mds = Some(mds);
        self.target_by_index(mds)
    }
}

impl Default for ShardTable {
    fn default() -> Self {
        Self::new()
    }
}
