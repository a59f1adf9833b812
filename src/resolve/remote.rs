use crate::context::{OpBias, OpContext};
use crate::error::{MdError, Result};
use crate::fid::Fid;
use crate::intent::{Intent, IntentOp};
use crate::lock::{release_slot, HeldLock};
use crate::rpc::Reply;

use super::IntentResolver;

impl IntentResolver {
    /// Re-issue `it` against the shard that owns the object named in
    /// `pending`.
    ///
    /// The first-hop lock stays with the intent and the second hop's grant
    /// lands in `it.remote_lock`. If the second hop fails, the first-hop lock
    /// is released here.
    pub(super) fn intent_remote(
        &self,
        it: &mut Intent,
        parent_hint: Option<Fid>,
        pending: &Reply,
    ) -> Result<Reply> {
        let body = pending.body()?;

        if it.op == IntentOp::Lookup {
            it.op = IntentOp::Getattr;
        }

        let detached = it.lock.take().map(|grant| HeldLock::new(grant, self.locks.as_ref()));

        let foreign = body.fid1;
        if !foreign.is_sane() {
            return Err(MdError::Protocol(format!(
                "cross-reference to invalid fid {}",
                foreign
            )));
        }
        let target = self.table.target_for(&foreign)?;

        let mut ctx = OpContext::new(foreign);
        ctx.fid2 = parent_hint.unwrap_or(Fid::ZERO);
        ctx.bias = OpBias::CROSS_REF;
        ctx.mds = Some(target.index());

        tracing::debug!(
            "REMOTE_INTENT with fid={} -> mds #{}",
            foreign,
            target.index()
        );

        let second = self.call(&target, &ctx, it)?;

        it.disposition |= second.disposition;
        if second.lock.is_some() {
            release_slot(self.locks.as_ref(), &mut it.remote_lock);
            it.remote_lock = second.lock;
        }
        if let Some(held) = detached {
            it.lock = Some(held.keep());
        }

        second.reply.ok_or_else(|| {
            MdError::Protocol(format!("no reply from mds #{} for {}", target.index(), foreign))
        })
    }
}
