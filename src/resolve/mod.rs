//! Intent-lock resolution across metadata shards.
//!
//! [`IntentResolver::intent_lock`] is the entry point. It routes the
//! request, follows cross-references to the owning shard and guarantees that
//! every lock grant picked up on the way is either handed to the caller or
//! released.

mod lookup;
mod open;
mod remote;
mod revalidate;

use std::sync::Arc;

use crate::alloc::FidAllocator;
use crate::context::OpContext;
use crate::error::{MdError, Result};
use crate::intent::{Intent, IntentOp, Resolution};
use crate::lock::{release_slot, LockService};
use crate::rpc::{IntentReply, Reply};
use crate::target::{ShardDescriptor, ShardTable};

pub struct IntentResolver {
    table: Arc<ShardTable>,
    locks: Arc<dyn LockService>,
    fids: Arc<dyn FidAllocator>,
}

impl IntentResolver {
    pub fn new(
        table: Arc<ShardTable>,
        locks: Arc<dyn LockService>,
        fids: Arc<dyn FidAllocator>,
    ) -> Self {
        IntentResolver { table, locks, fids }
    }

    pub fn table(&self) -> &Arc<ShardTable> {
        &self.table
    }

    /// Resolve `it` against the cluster.
    ///
    /// On success the grants left in `it.lock` and `it.remote_lock` belong to
    /// the caller. On failure both are released and cleared.
    ///
    /// # Panics
    ///
    /// Panics on an intent kind that does not take the intent-lock path.
    pub fn intent_lock(&self, ctx: &mut OpContext, it: &mut Intent) -> Result<Resolution> {
        let result = self.dispatch(ctx, it);
        if let Err(e) = &result {
            tracing::debug!(
                "Intent {} on {} failed ({}), dropping {} lock(s)",
                it.op,
                ctx.fid1,
                e,
                it.held_locks()
            );
            release_slot(self.locks.as_ref(), &mut it.lock);
            release_slot(self.locks.as_ref(), &mut it.remote_lock);
        }
        result
    }

    fn dispatch(&self, ctx: &mut OpContext, it: &mut Intent) -> Result<Resolution> {
        if !ctx.fid1.is_sane() {
            return Err(MdError::Stale(ctx.fid1));
        }
        self.table.check_connect()?;

        tracing::debug!(
            "INTENT LOCK '{}' for {} '{}' on {}",
            it.op,
            ctx.fid2,
            ctx.name_or_placeholder(),
            ctx.fid1
        );

        let reply = match it.op {
            IntentOp::Lookup | IntentOp::Getattr | IntentOp::Layout => self.lookup(ctx, it)?,
            IntentOp::Open | IntentOp::OpenCreate => self.open(ctx, it)?,
            IntentOp::Readdir => panic!("intent {} does not take the intent-lock path", it.op),
        };
        Ok(Resolution::new(it, reply))
    }

    fn call(&self, target: &ShardDescriptor, ctx: &OpContext, it: &Intent) -> Result<IntentReply> {
        target.client()?.intent_lock(ctx, it)
    }

    /// Make `reply` the current result of `it`, releasing the grant it
    /// replaces.
    fn adopt(&self, it: &mut Intent, reply: IntentReply) -> Option<Reply> {
        it.disposition = reply.disposition;
        if reply.lock.is_some() {
            release_slot(self.locks.as_ref(), &mut it.lock);
            it.lock = reply.lock;
        }
        reply.reply
    }
}
