use crate::context::{OpBias, OpContext};
use crate::error::{MdError, Result};
use crate::fid::Fid;
use crate::intent::{Disposition, Intent};
use crate::lock::release_slot;
use crate::rpc::Reply;

use super::IntentResolver;

impl IntentResolver {
    /// Resolve a lookup, getattr or layout intent.
    ///
    /// Returns `None` when the shard answered from cache.
    pub(super) fn lookup(&self, ctx: &mut OpContext, it: &mut Intent) -> Result<Option<Reply>> {
        let layout = ctx.mea1.clone();

        let target = self.table.locate_or_first_stripe(ctx)?;

        if !ctx.fid2.is_sane() {
            ctx.fid2 = Fid::ZERO;
        }

        tracing::debug!(
            "LOOKUP_INTENT with fid1={}, fid2={}, name='{}' -> mds #{} striped={}",
            ctx.fid1,
            ctx.fid2,
            ctx.name_or_placeholder(),
            target.index(),
            layout.is_some()
        );

        ctx.bias.remove(OpBias::CROSS_REF);

        let first = self.call(&target, ctx, it)?;
        let mut reply = self.adopt(it, first);

        if reply.is_none() {
            // served from cache, so nothing refreshed the stripes
            if let Some(slaves) = ctx.mea2.clone() {
                self.revalidate_slaves(&slaves)?;
            }
            return Ok(None);
        }

        if let Some(layout) = layout.as_deref() {
            if it.is_negative() && layout.need_try_all_stripes() {
                let queried = layout.position_of(&ctx.fid1);
                // first stripe that could not answer; a negative result
                // proves nothing while it stands
                let mut unanswered: Option<MdError> = None;
                for (index, stripe) in layout.stripes().iter().enumerate() {
                    if !it.is_negative() {
                        break;
                    }
                    if Some(index) == queried {
                        continue;
                    }

                    tracing::debug!("Try other stripes {}", stripe.fid);
                    let target = match self.table.target_for(&stripe.fid) {
                        Ok(target) => target,
                        Err(e) => {
                            tracing::warn!("Skipping stripe {} ({}): {}", index, stripe.fid, e);
                            unanswered.get_or_insert(e);
                            continue;
                        }
                    };

                    let previous = (ctx.fid1, ctx.mds, it.disposition);
                    ctx.fid1 = stripe.fid;
                    ctx.mds = Some(target.index());
                    it.disposition.remove(Disposition::ENQ_COMPLETE);

                    match self.call(&target, ctx, it) {
                        Ok(next) => {
                            release_slot(self.locks.as_ref(), &mut it.lock);
                            reply = self.adopt(it, next);
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Lookup on stripe {} ({}) failed: {}",
                                index,
                                stripe.fid,
                                e
                            );
                            (ctx.fid1, ctx.mds, it.disposition) = previous;
                            unanswered.get_or_insert(e);
                        }
                    }
                }

                if it.is_negative() {
                    if let Some(e) = unanswered {
                        return Err(e);
                    }
                }
            }
        }

        let Some(current) = reply else {
            return Err(MdError::Protocol(
                "stripe lookup produced no reply".to_string(),
            ));
        };

        if current.body()?.is_cross_ref() {
            let redirected = self.intent_remote(it, None, &current)?;
            redirected.body()?;
            return Ok(Some(redirected));
        }

        Ok(Some(current))
    }
}
