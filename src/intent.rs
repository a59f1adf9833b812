use bitflags::bitflags;
use std::fmt;

use crate::fid::Fid;
use crate::lock::LockGrant;
use crate::rpc::Reply;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentOp {
    Lookup,
    Getattr,
    Layout,
    Open,
    OpenCreate,
    /// Readdir never takes the intent-lock path.
    Readdir,
}

impl fmt::Display for IntentOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentOp::Lookup => write!(f, "lookup"),
            IntentOp::Getattr => write!(f, "getattr"),
            IntentOp::Layout => write!(f, "layout"),
            IntentOp::Open => write!(f, "open"),
            IntentOp::OpenCreate => write!(f, "open|creat"),
            IntentOp::Readdir => write!(f, "readdir"),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpenFlags: u32 {
        /// Open the object named by the secondary fid, not by name.
        const BY_FID = 1 << 0;
        const EXCL   = 1 << 1;
    }
}

bitflags! {
    /// What the server reports having done for an intent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Disposition: u32 {
        const LOOKUP_EXECD = 1 << 0;
        const LOOKUP_POS   = 1 << 1;
        const LOOKUP_NEG   = 1 << 2;
        const OPEN_CREATE  = 1 << 3;
        const OPEN_OPEN    = 1 << 4;
        const ENQ_COMPLETE = 1 << 5;
    }
}

/// A namespace operation plus the locks it acquired.
///
/// Grants left in `lock` and `remote_lock` after a successful resolve belong
/// to the caller.
#[derive(Debug, Clone)]
pub struct Intent {
    pub op: IntentOp,
    pub flags: OpenFlags,
    pub disposition: Disposition,
    pub lock: Option<LockGrant>,
    pub remote_lock: Option<LockGrant>,
}

impl Intent {
    pub fn new(op: IntentOp) -> Self {
        Intent {
            op,
            flags: OpenFlags::empty(),
            disposition: Disposition::empty(),
            lock: None,
            remote_lock: None,
        }
    }

    pub fn with_flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_negative(&self) -> bool {
        self.disposition.contains(Disposition::LOOKUP_NEG)
    }

    /// Number of grants currently held by this intent.
    pub fn held_locks(&self) -> usize {
        self.lock.is_some() as usize + self.remote_lock.is_some() as usize
    }
}

/// What a resolved intent amounts to, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Served from client cache; no round trip happened.
    Cached,
    Negative,
    Found(Fid),
    Created(Fid),
    Opened(Fid),
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub outcome: Outcome,
    pub disposition: Disposition,
    pub reply: Option<Reply>,
}

impl Resolution {
    pub(crate) fn new(intent: &Intent, reply: Option<Reply>) -> Self {
        let disposition = intent.disposition;
        let fid = reply
            .as_ref()
            .and_then(|r| r.body.as_ref())
            .map(|b| b.fid1)
            .unwrap_or(Fid::ZERO);

        let outcome = if reply.is_none() {
            Outcome::Cached
        } else if disposition.contains(Disposition::OPEN_CREATE) {
            Outcome::Created(fid)
        } else if disposition.contains(Disposition::OPEN_OPEN) {
            Outcome::Opened(fid)
        } else if disposition.contains(Disposition::LOOKUP_NEG) {
            Outcome::Negative
        } else {
            Outcome::Found(fid)
        };

        Resolution {
            outcome,
            disposition,
            reply,
        }
    }

    pub fn enqueue_complete(&self) -> bool {
        self.disposition.contains(Disposition::ENQ_COMPLETE)
    }
}
