use crate::context::OpContext;
use crate::error::{MdError, Result};
use crate::intent::{Disposition, Intent, IntentOp, OpenFlags};
use crate::rpc::Reply;

use super::IntentResolver;

impl IntentResolver {
    /// Resolve an open, optionally creating the object.
    pub(super) fn open(&self, ctx: &mut OpContext, it: &mut Intent) -> Result<Option<Reply>> {
        let parent_hint = ctx.fid1;
        let by_fid = it.flags.contains(OpenFlags::BY_FID);

        let target = if by_fid {
            if !ctx.fid2.is_sane() {
                return Err(MdError::Stale(ctx.fid2));
            }
            // the shard recovers the parent stripe from the child's link
            // entries, so hand it the child instead of the master directory
            if ctx.mea1.is_some() {
                ctx.fid1 = ctx.fid2;
            }
            let target = self.table.target_for(&ctx.fid2)?;
            ctx.mds = Some(target.index());
            target
        } else {
            if !ctx.fid2.is_zero() {
                return Err(MdError::InvalidRequest(format!(
                    "open by name with child fid {} already set",
                    ctx.fid2
                )));
            }
            if ctx.name.is_none() {
                return Err(MdError::InvalidRequest(
                    "open by name without a name".to_string(),
                ));
            }
            self.table.locate(ctx)?
        };

        if it.op == IntentOp::OpenCreate && !by_fid {
            ctx.fid2 = self.fids.alloc_fid(target.index(), ctx)?;
        }

        tracing::debug!(
            "OPEN_INTENT with fid1={}, fid2={}, name='{}' -> mds #{}",
            ctx.fid1,
            ctx.fid2,
            ctx.name_or_placeholder(),
            target.index()
        );

        let first = self.call(&target, ctx, it)?;
        let reply = self.adopt(it, first);

        // nothing found, the body would only carry a zero fid
        if it.is_negative()
            && !it
                .disposition
                .intersects(Disposition::OPEN_CREATE | Disposition::OPEN_OPEN)
        {
            return Ok(reply);
        }

        let current = reply.ok_or_else(|| {
            MdError::Protocol(format!("open on mds #{} returned no reply", target.index()))
        })?;

        if current.body()?.is_cross_ref() {
            let redirected = self.intent_remote(it, Some(parent_hint), &current)?;
            redirected.body()?;
            return Ok(Some(redirected));
        }

        Ok(Some(current))
    }
}
