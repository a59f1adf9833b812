use std::fmt;

use crate::fid::Fid;

/// Distributed lock modes, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Ex,
    Pw,
    Pr,
    Cw,
    Cr,
    Nl,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Ex => write!(f, "EX"),
            LockMode::Pw => write!(f, "PW"),
            LockMode::Pr => write!(f, "PR"),
            LockMode::Cw => write!(f, "CW"),
            LockMode::Cr => write!(f, "CR"),
            LockMode::Nl => write!(f, "NL"),
        }
    }
}

/// Opaque server-granted lock cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockHandle(pub u64);

impl fmt::Display for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockGrant {
    pub handle: LockHandle,
    pub mode: LockMode,
}

impl LockGrant {
    pub fn new(handle: LockHandle, mode: LockMode) -> Self {
        LockGrant { handle, mode }
    }
}

/// Lock reference primitive.
///
/// `release` must be called at most once per acquisition of a
/// `(handle, mode)` pair.
pub trait LockService: Send + Sync {
    fn release(&self, handle: LockHandle, mode: LockMode);

    /// Associate a granted lock with the cached object it protects.
    fn set_lock_data(&self, handle: LockHandle, fid: &Fid);
}

/// A lock grant owned by the current scope.
///
/// Dropping a `HeldLock` releases the grant. `keep` hands it back to the
/// caller instead, so every exit path either releases or transfers.
pub struct HeldLock<'a> {
    grant: Option<LockGrant>,
    locks: &'a dyn LockService,
}

impl<'a> HeldLock<'a> {
    pub fn new(grant: LockGrant, locks: &'a dyn LockService) -> Self {
        HeldLock {
            grant: Some(grant),
            locks,
        }
    }

    pub fn grant(&self) -> Option<LockGrant> {
        self.grant
    }

    /// Transfer ownership of the grant out of this guard.
    pub fn keep(mut self) -> LockGrant {
        // `grant` is only ever taken here and in drop
        match self.grant.take() {
            Some(grant) => grant,
            None => unreachable!("HeldLock kept twice"),
        }
    }
}

impl Drop for HeldLock<'_> {
    fn drop(&mut self) {
        if let Some(grant) = self.grant.take() {
            tracing::debug!("Releasing lock {} mode {}", grant.handle, grant.mode);
            self.locks.release(grant.handle, grant.mode);
        }
    }
}

impl fmt::Debug for HeldLock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeldLock")
            .field("grant", &self.grant)
            .finish()
    }
}

/// Release whatever grant sits in `slot` and clear it.
pub(crate) fn release_slot(locks: &dyn LockService, slot: &mut Option<LockGrant>) {
    if let Some(grant) = slot.take() {
        drop(HeldLock::new(grant, locks));
    }
}
