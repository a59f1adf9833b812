//! Remote-call primitive consumed by the resolvers.
//!
//! The transport and its wire encoding live behind [`MdClient`]; this module
//! only fixes the shape of what comes back.

use bitflags::bitflags;

use crate::context::OpContext;
use crate::error::{MdError, Result};
use crate::fid::Fid;
use crate::intent::{Disposition, Intent};
use crate::lock::LockGrant;

bitflags! {
    /// Which fields of an [`MdtBody`] the server filled in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Valid: u64 {
        const ID        = 1 << 0;
        const TYPE      = 1 << 1;
        const SIZE      = 1 << 2;
        const BLOCKS    = 1 << 3;
        const NLINK     = 1 << 4;
        const ATIME     = 1 << 5;
        const MTIME     = 1 << 6;
        const CTIME     = 1 << 7;
        /// The object named by `fid1` is owned by another shard.
        const CROSS_REF = 1 << 32;
    }
}

/// Metadata body of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MdtBody {
    pub fid1: Fid,
    pub fid2: Fid,
    pub valid: Valid,
    pub mode: u32,
    pub size: u64,
    pub blocks: u64,
    pub nlink: u32,
    pub atime: i64,
    pub ctime: i64,
    pub mtime: i64,
}

impl MdtBody {
    pub fn is_cross_ref(&self) -> bool {
        self.valid.contains(Valid::CROSS_REF)
    }
}

/// A reply that actually crossed the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub body: Option<MdtBody>,
}

impl Reply {
    pub fn new(body: MdtBody) -> Self {
        Reply { body: Some(body) }
    }

    pub fn without_body() -> Self {
        Reply { body: None }
    }

    pub fn body(&self) -> Result<&MdtBody> {
        self.body
            .as_ref()
            .ok_or_else(|| MdError::Protocol("reply carries no metadata body".to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntentReply {
    /// `None` when the client satisfied the intent from cache.
    pub reply: Option<Reply>,
    pub lock: Option<LockGrant>,
    pub disposition: Disposition,
}

/// Connection to one metadata shard.
pub trait MdClient: Send + Sync {
    /// Enqueue an intent lock. Any lock granted is handed back in the reply
    /// and from then on belongs to the caller.
    fn intent_lock(&self, ctx: &OpContext, intent: &Intent) -> Result<IntentReply>;

    fn getattr(&self, fid: &Fid) -> Result<MdtBody>;

    fn getattr_name(&self, parent: &Fid, name: &str) -> Result<MdtBody>;
}
