//! File handles for re-exporting the namespace over a network filesystem.
//!
//! A handle is a run of 32-bit words. Each entry takes [`FH_ENTRY_WORDS`]
//! words: sequence low, sequence high, object id, version and the file-type
//! bits of the mode. Type 1 carries the object alone, type 2 appends its
//! parent.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::{CachedObject, ObjectAttrs, ObjectCache};
use crate::error::{MdError, Result};
use crate::fid::Fid;
use crate::rpc::Valid;
use crate::target::ShardTable;

pub const FH_ENTRY_WORDS: usize = 5;
pub const FH_TYPE_CHILD: u8 = 1;
pub const FH_TYPE_CHILD_PARENT: u8 = 2;

/// One object reference inside a file handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandleEntry {
    pub fid: Fid,
    /// Only the `S_IFMT` bits are kept.
    pub mode: u32,
}

impl HandleEntry {
    pub fn new(fid: Fid, mode: u32) -> Self {
        HandleEntry {
            fid,
            mode: mode & libc::S_IFMT as u32,
        }
    }

    fn write_words(&self, out: &mut Vec<u32>) {
        out.extend_from_slice(&[
            self.fid.seq as u32,
            (self.fid.seq >> 32) as u32,
            self.fid.oid,
            self.fid.ver,
            self.mode,
        ]);
    }

    fn read_words(words: &[u32]) -> Self {
        HandleEntry {
            fid: Fid::new(
                words[0] as u64 | (words[1] as u64) << 32,
                words[2],
                words[3],
            ),
            mode: words[4],
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode == libc::S_IFDIR as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportHandle {
    pub fh_type: u8,
    pub child: HandleEntry,
    pub parent: Option<HandleEntry>,
}

impl ExportHandle {
    pub fn words(&self) -> Vec<u32> {
        let mut words = Vec::with_capacity(FH_ENTRY_WORDS * self.fh_type as usize);
        self.child.write_words(&mut words);
        if let Some(parent) = &self.parent {
            parent.write_words(&mut words);
        }
        words
    }
}

/// `TYPE:WORD,WORD,...` with hexadecimal words.
impl fmt::Display for ExportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.fh_type)?;
        for (i, word) in self.words().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{:08x}", word)?;
        }
        Ok(())
    }
}

impl FromStr for ExportHandle {
    type Err = MdError;

    fn from_str(s: &str) -> Result<Self> {
        let (fh_type, words) = s
            .split_once(':')
            .ok_or_else(|| MdError::InvalidHandle(format!("missing type prefix in '{}'", s)))?;
        let fh_type: u8 = fh_type
            .trim()
            .parse()
            .map_err(|_| MdError::InvalidHandle(format!("bad handle type '{}'", fh_type)))?;
        let words = words
            .split(',')
            .filter(|w| !w.trim().is_empty())
            .map(|w| {
                let w = w.trim();
                let digits = w.strip_prefix("0x").unwrap_or(w);
                u32::from_str_radix(digits, 16)
                    .map_err(|_| MdError::InvalidHandle(format!("bad handle word '{}'", w)))
            })
            .collect::<Result<Vec<u32>>>()?;
        decode_fh(fh_type, &words)
    }
}

/// Encode `child` (and `parent`, when there is room) into at most
/// `max_words` words.
pub fn encode_fh(
    child: HandleEntry,
    parent: Option<HandleEntry>,
    max_words: usize,
) -> Result<ExportHandle> {
    if max_words < FH_ENTRY_WORDS {
        return Err(MdError::InvalidHandle(format!(
            "handle needs {} words, only {} available",
            FH_ENTRY_WORDS, max_words
        )));
    }

    let parent = parent.filter(|_| max_words >= 2 * FH_ENTRY_WORDS);
    let fh_type = if parent.is_some() {
        FH_TYPE_CHILD_PARENT
    } else {
        FH_TYPE_CHILD
    };

    tracing::debug!(
        "encoding fid {} parent {:?} type {}",
        child.fid,
        parent.map(|p| p.fid),
        fh_type
    );
    Ok(ExportHandle {
        fh_type,
        child,
        parent,
    })
}

pub fn decode_fh(fh_type: u8, words: &[u32]) -> Result<ExportHandle> {
    if fh_type != FH_TYPE_CHILD && fh_type != FH_TYPE_CHILD_PARENT {
        return Err(MdError::Stale(Fid::ZERO));
    }
    if words.len() < FH_ENTRY_WORDS * fh_type as usize {
        return Err(MdError::Stale(Fid::ZERO));
    }

    let child = HandleEntry::read_words(&words[..FH_ENTRY_WORDS]);
    let parent = (fh_type == FH_TYPE_CHILD_PARENT)
        .then(|| HandleEntry::read_words(&words[FH_ENTRY_WORDS..2 * FH_ENTRY_WORDS]));
    Ok(ExportHandle {
        fh_type,
        child,
        parent,
    })
}

/// Turns decoded handles back into cached objects.
pub struct Exporter {
    table: Arc<ShardTable>,
    cache: Arc<ObjectCache>,
}

impl Exporter {
    pub fn new(table: Arc<ShardTable>, cache: Arc<ObjectCache>) -> Self {
        Exporter { table, cache }
    }

    pub fn get_object(&self, fid: &Fid) -> Result<Arc<CachedObject>> {
        if !fid.is_sane() {
            return Err(MdError::Stale(*fid));
        }
        if let Some(object) = self.cache.get(fid) {
            return Ok(object);
        }

        let target = self.table.target_for(fid)?;
        let body = target.client()?.getattr(fid)?;
        tracing::debug!("Fetched {} from mds #{}", fid, target.index());
        Ok(self
            .cache
            .insert(CachedObject::new(*fid, body.mode, ObjectAttrs::from(&body))))
    }

    pub fn get_dentry(&self, handle: &ExportHandle) -> Result<Arc<CachedObject>> {
        self.get_object(&handle.child.fid)
    }

    /// Parent of the directory `dir`, found through its `..` entry.
    pub fn get_parent(&self, dir: &Fid) -> Result<Arc<CachedObject>> {
        let target = self.table.target_for(dir)?;
        let body = target.client()?.getattr_name(dir, "..")?;
        if !body.valid.contains(Valid::ID) {
            return Err(MdError::Protocol(format!(
                "'..' of {} came back without an fid",
                dir
            )));
        }
        tracing::debug!("parent for {} is {}", dir, body.fid1);
        self.get_object(&body.fid1)
    }
}
