use bitflags::bitflags;
use std::sync::Arc;

use crate::fid::Fid;
use crate::layout::StripeLayout;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpBias: u32 {
        /// Request is the second hop of a cross-reference.
        const CROSS_REF = 1 << 0;
    }
}

/// Per-call operation data. Resolvers may rewrite the fids while routing.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    /// Primary object, usually the parent directory.
    pub fid1: Fid,
    /// Secondary object: the child, or zero when unknown.
    pub fid2: Fid,
    pub name: Option<String>,
    /// Stripe layout of `fid1`, when it is a striped directory.
    pub mea1: Option<Arc<StripeLayout>>,
    /// Stripe layout of `fid2`.
    pub mea2: Option<Arc<StripeLayout>>,
    pub bias: OpBias,
    /// Shard the request was last routed to.
    pub mds: Option<u32>,
}

impl OpContext {
    pub fn new(fid1: Fid) -> Self {
        OpContext {
            fid1,
            ..OpContext::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_child(mut self, fid2: Fid) -> Self {
        self.fid2 = fid2;
        self
    }

    pub fn with_parent_layout(mut self, layout: Arc<StripeLayout>) -> Self {
        self.mea1 = Some(layout);
        self
    }

    pub fn with_child_layout(mut self, layout: Arc<StripeLayout>) -> Self {
        self.mea2 = Some(layout);
        self
    }

    pub fn name_or_placeholder(&self) -> &str {
        self.name.as_deref().unwrap_or("<NULL>")
    }
}
