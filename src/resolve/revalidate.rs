use crate::context::OpContext;
use crate::error::Result;
use crate::intent::{Intent, IntentOp};
use crate::layout::StripeLayout;
use crate::lock::HeldLock;

use super::IntentResolver;

impl IntentResolver {
    /// Refresh the cached root object of every stripe in `layout`.
    ///
    /// Stops at the first failure. Stripes refreshed before it keep their
    /// new attributes. No lock taken here outlives the call.
    pub fn revalidate_slaves(&self, layout: &StripeLayout) -> Result<()> {
        for stripe in layout.stripes() {
            // same fid on both sides: refresh only, no new lock wanted
            let mut ctx = OpContext::new(stripe.fid).with_child(stripe.fid);
            let target = self.table.locate(&mut ctx)?;

            tracing::debug!("Revalidate slave {} -> mds #{}", stripe.fid, target.index());

            let it = Intent::new(IntentOp::Getattr);
            let answer = self.call(&target, &ctx, &it)?;
            let held = answer
                .lock
                .map(|grant| HeldLock::new(grant, self.locks.as_ref()));

            match answer.reply {
                None => tracing::debug!("slave {} is still valid.", stripe.fid),
                Some(reply) => {
                    let body = reply.body()?;
                    match stripe.root.upgrade() {
                        Some(root) => root.refresh_from(body),
                        None => tracing::debug!("slave {} is no longer cached", stripe.fid),
                    }
                }
            }

            if let Some(grant) = held.as_ref().and_then(HeldLock::grant) {
                self.locks.set_lock_data(grant.handle, &stripe.fid);
            }
        }
        Ok(())
    }
}
