use fxhash::hash64;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::cache::{CachedObject, ObjectCache};
use crate::error::{MdError, Result};
use crate::fid::Fid;

pub const LMV_HASH_TYPE_ALL_CHARS: u32 = 1;
pub const LMV_HASH_TYPE_FNV_1A_64: u32 = 2;
pub const LMV_HASH_TYPE_MASK: u32 = 0x0000_ffff;
pub const LMV_HASH_FLAG_MIGRATION: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKind {
    AllChars,
    Fnv1a64,
    Unknown(u32),
}

/// Sharding-function tag of a striped directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashTag {
    pub kind: HashKind,
    pub migrating: bool,
    raw: u32,
}

impl HashTag {
    pub fn from_raw(raw: u32) -> Self {
        let kind = match raw & LMV_HASH_TYPE_MASK {
            LMV_HASH_TYPE_ALL_CHARS => HashKind::AllChars,
            LMV_HASH_TYPE_FNV_1A_64 => HashKind::Fnv1a64,
            other => HashKind::Unknown(other),
        };
        HashTag {
            kind,
            migrating: raw & LMV_HASH_FLAG_MIGRATION != 0,
            raw,
        }
    }

    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// The hash function itself is recognized. Migration does not matter here.
    pub fn is_known(&self) -> bool {
        !matches!(self.kind, HashKind::Unknown(_))
    }
}

impl fmt::Display for HashTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            HashKind::AllChars => write!(f, "all_char")?,
            HashKind::Fnv1a64 => write!(f, "fnv_1a_64")?,
            HashKind::Unknown(t) => write!(f, "unknown({:#x})", t)?,
        }
        if self.migrating {
            write!(f, ",migrating")?;
        }
        Ok(())
    }
}

/// Maps an entry name to a stripe index for a recognized hash kind.
pub trait NameHash: Send + Sync {
    fn stripe_index(&self, kind: HashKind, name: &str, stripe_count: usize) -> usize;
}

/// Default name hash built on FxHash.
#[derive(Debug, Default, Clone, Copy)]
pub struct FxNameHash;

impl NameHash for FxNameHash {
    fn stripe_index(&self, _kind: HashKind, name: &str, stripe_count: usize) -> usize {
        (hash64(name.as_bytes()) % stripe_count as u64) as usize
    }
}

#[derive(Debug, Clone)]
pub struct StripeEntry {
    pub fid: Fid,
    pub mds: u32,
    /// Locally cached root object of this stripe.
    pub root: Weak<CachedObject>,
}

/// How one directory's entries are spread over shards.
#[derive(Debug, Clone)]
pub struct StripeLayout {
    hash: HashTag,
    stripes: Vec<StripeEntry>,
}

impl StripeLayout {
    pub fn new(hash: HashTag, stripes: Vec<StripeEntry>) -> Self {
        StripeLayout { hash, stripes }
    }

    /// Build a layout from server-supplied `(stripe fid, shard index)` pairs,
    /// attaching each stripe to its cached root object.
    pub fn from_parts(raw_hash: u32, parts: &[(Fid, u32)], cache: &ObjectCache) -> Arc<Self> {
        let stripes = parts
            .iter()
            .map(|&(fid, mds)| StripeEntry {
                fid,
                mds,
                root: Arc::downgrade(&cache.get_or_insert(fid, libc::S_IFDIR as u32)),
            })
            .collect();
        Arc::new(StripeLayout::new(HashTag::from_raw(raw_hash), stripes))
    }

    pub fn hash(&self) -> HashTag {
        self.hash
    }

    pub fn stripes(&self) -> &[StripeEntry] {
        &self.stripes
    }

    pub fn stripe(&self, index: usize) -> Option<&StripeEntry> {
        self.stripes.get(index)
    }

    pub fn first_stripe(&self) -> Result<&StripeEntry> {
        self.stripes.first().ok_or_else(|| {
            MdError::Protocol("striped directory has no stripes".to_string())
        })
    }

    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// Entries may sit on any stripe, so a negative lookup on one stripe
    /// proves nothing.
    pub fn need_try_all_stripes(&self) -> bool {
        !self.hash.is_known() || self.hash.migrating
    }

    pub fn position_of(&self, fid: &Fid) -> Option<usize> {
        self.stripes.iter().position(|s| s.fid == *fid)
    }

    /// Pick the stripe that should hold `name`.
    pub fn locate_stripe(&self, name: &str, hasher: &dyn NameHash) -> Result<&StripeEntry> {
        if !self.hash.is_known() {
            return Err(MdError::UnknownHash(self.hash.raw()));
        }
        if self.stripes.is_empty() {
            return Err(MdError::Protocol(
                "striped directory has no stripes".to_string(),
            ));
        }
        let index = hasher.stripe_index(self.hash.kind, name, self.stripes.len());
        self.stripes.get(index).ok_or_else(|| {
            MdError::Protocol(format!(
                "hash picked stripe {} of {}",
                index,
                self.stripes.len()
            ))
        })
    }
}
