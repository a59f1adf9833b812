//! Simulated metadata cluster for resolver tests.
//!
//! Every shard is a [`MockShard`] holding directory entries and object
//! attributes in memory. All shards share one [`CountingLocks`] service and
//! one call journal, so a test can check both which shards were asked and
//! whether every grant was accounted for.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use stripemd::alloc::SeqAllocator;
use stripemd::cache::ObjectCache;
use stripemd::context::{OpBias, OpContext};
use stripemd::error::{MdError, Result};
use stripemd::fid::{Fid, FID_SEQ_NORMAL};
use stripemd::intent::{Disposition, Intent, IntentOp};
use stripemd::layout::StripeLayout;
use stripemd::lock::{LockGrant, LockHandle, LockMode, LockService};
use stripemd::resolve::IntentResolver;
use stripemd::rpc::{IntentReply, MdClient, MdtBody, Reply, Valid};
use stripemd::target::{SeqRange, ShardDescriptor, ShardTable};

/// Sequences owned by each shard.
pub const SHARD_SEQ_WIDTH: u64 = 0x1000;
/// Offset inside a shard's range where the allocator starts handing out fids.
pub const ALLOC_SEQ_OFFSET: u64 = 0x800;

/// Lock service that tracks every outstanding grant and panics on a release
/// of something it never granted.
#[derive(Default)]
pub struct CountingLocks {
    next: AtomicU64,
    granted: AtomicUsize,
    released: AtomicUsize,
    outstanding: Mutex<HashMap<LockHandle, LockMode>>,
    lock_data: Mutex<Vec<(LockHandle, Fid)>>,
}

impl CountingLocks {
    pub fn grant(&self, mode: LockMode) -> LockGrant {
        let handle = LockHandle(self.next.fetch_add(1, Ordering::SeqCst) + 1);
        self.granted.fetch_add(1, Ordering::SeqCst);
        self.outstanding.lock().insert(handle, mode);
        LockGrant::new(handle, mode)
    }

    pub fn granted(&self) -> usize {
        self.granted.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.lock().len()
    }

    pub fn is_held(&self, grant: &LockGrant) -> bool {
        self.outstanding.lock().get(&grant.handle) == Some(&grant.mode)
    }

    pub fn lock_data(&self) -> Vec<(LockHandle, Fid)> {
        self.lock_data.lock().clone()
    }

    /// Hand back whatever the caller was left holding.
    pub fn release_intent(&self, it: &mut Intent) {
        for grant in [it.lock.take(), it.remote_lock.take()].into_iter().flatten() {
            self.release(grant.handle, grant.mode);
        }
    }
}

impl LockService for CountingLocks {
    fn release(&self, handle: LockHandle, mode: LockMode) {
        match self.outstanding.lock().remove(&handle) {
            Some(held) => assert_eq!(held, mode, "lock {} released in the wrong mode", handle),
            None => panic!("lock {} released twice or never granted", handle),
        }
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    fn set_lock_data(&self, handle: LockHandle, fid: &Fid) {
        self.lock_data.lock().push((handle, *fid));
    }
}

/// One intent call as seen by a shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub shard: u32,
    pub op: IntentOp,
    pub fid1: Fid,
    pub fid2: Fid,
    pub name: Option<String>,
    pub bias: OpBias,
}

pub type Journal = Arc<Mutex<Vec<Call>>>;

pub struct MockShard {
    index: u32,
    locks: Arc<CountingLocks>,
    journal: Journal,
    entries: Mutex<HashMap<(Fid, String), MdtBody>>,
    objects: Mutex<HashMap<Fid, MdtBody>>,
    fresh: Mutex<HashSet<Fid>>,
    failure: Mutex<Option<i32>>,
}

fn lock_mode_for(op: IntentOp) -> LockMode {
    match op {
        IntentOp::Lookup => LockMode::Cr,
        IntentOp::Getattr | IntentOp::Layout | IntentOp::Readdir => LockMode::Pr,
        IntentOp::Open | IntentOp::OpenCreate => LockMode::Cw,
    }
}

pub fn attrs_body(fid: Fid, mode: u32, size: u64) -> MdtBody {
    MdtBody {
        fid1: fid,
        valid: Valid::ID | Valid::TYPE | Valid::SIZE | Valid::BLOCKS | Valid::NLINK,
        mode,
        size,
        blocks: size.div_ceil(512),
        nlink: 1,
        atime: 1_700_000_000,
        ctime: 1_700_000_100,
        mtime: 1_700_000_200,
        ..MdtBody::default()
    }
}

impl MockShard {
    pub fn new(index: u32, locks: Arc<CountingLocks>, journal: Journal) -> Self {
        MockShard {
            index,
            locks,
            journal,
            entries: Mutex::new(HashMap::new()),
            objects: Mutex::new(HashMap::new()),
            fresh: Mutex::new(HashSet::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn add_entry(&self, parent: Fid, name: &str, child: Fid) {
        self.entries.lock().insert(
            (parent, name.to_string()),
            attrs_body(child, libc::S_IFREG as u32, 0),
        );
    }

    /// Entry whose object lives on another shard.
    pub fn add_remote_entry(&self, parent: Fid, name: &str, child: Fid) {
        let mut body = attrs_body(child, libc::S_IFREG as u32, 0);
        body.valid |= Valid::CROSS_REF;
        self.entries.lock().insert((parent, name.to_string()), body);
    }

    pub fn add_object(&self, body: MdtBody) {
        self.objects.lock().insert(body.fid1, body);
    }

    /// Intents on `fid` will be answered from the client cache.
    pub fn mark_fresh(&self, fid: Fid) {
        self.fresh.lock().insert(fid);
    }

    pub fn fail_with(&self, errno: i32) {
        *self.failure.lock() = Some(errno);
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    fn record(&self, ctx: &OpContext, it: &Intent) {
        self.journal.lock().push(Call {
            shard: self.index,
            op: it.op,
            fid1: ctx.fid1,
            fid2: ctx.fid2,
            name: ctx.name.clone(),
            bias: ctx.bias,
        });
    }

    fn granted(&self, it: &Intent, body: Option<MdtBody>, disposition: Disposition) -> IntentReply {
        IntentReply {
            reply: body.map(Reply::new),
            lock: Some(self.locks.grant(lock_mode_for(it.op))),
            disposition: disposition | Disposition::ENQ_COMPLETE,
        }
    }

    fn by_name(&self, ctx: &OpContext, it: &Intent, name: &str) -> Result<IntentReply> {
        let key = (ctx.fid1, name.to_string());
        let existing = self.entries.lock().get(&key).copied();
        let opening = matches!(it.op, IntentOp::Open | IntentOp::OpenCreate);

        match existing {
            Some(body) => {
                let mut disposition = Disposition::LOOKUP_EXECD | Disposition::LOOKUP_POS;
                if opening {
                    disposition |= Disposition::OPEN_OPEN;
                }
                Ok(self.granted(it, Some(body), disposition))
            }
            None if it.op == IntentOp::OpenCreate => {
                let body = attrs_body(ctx.fid2, libc::S_IFREG as u32, 0);
                self.entries.lock().insert(key, body);
                self.objects.lock().insert(ctx.fid2, body);
                Ok(self.granted(
                    it,
                    Some(body),
                    Disposition::LOOKUP_EXECD
                        | Disposition::LOOKUP_NEG
                        | Disposition::OPEN_CREATE
                        | Disposition::OPEN_OPEN,
                ))
            }
            None => Ok(self.granted(
                it,
                Some(MdtBody::default()),
                Disposition::LOOKUP_EXECD | Disposition::LOOKUP_NEG,
            )),
        }
    }

    fn by_fid(&self, ctx: &OpContext, it: &Intent) -> Result<IntentReply> {
        let opening = matches!(it.op, IntentOp::Open | IntentOp::OpenCreate);
        // a cross-reference hop names the object in fid1 and the parent in fid2
        let fid = if opening && !ctx.bias.contains(OpBias::CROSS_REF) && !ctx.fid2.is_zero() {
            ctx.fid2
        } else {
            ctx.fid1
        };

        if self.fresh.lock().contains(&fid) {
            return Ok(self.granted(it, None, Disposition::LOOKUP_EXECD | Disposition::LOOKUP_POS));
        }

        let body = self.objects.lock().get(&fid).copied();
        match body {
            Some(body) => {
                let mut disposition = Disposition::LOOKUP_EXECD | Disposition::LOOKUP_POS;
                if opening {
                    disposition |= Disposition::OPEN_OPEN;
                }
                Ok(self.granted(it, Some(body), disposition))
            }
            None => Err(MdError::Remote {
                shard: self.index,
                errno: -libc::ENOENT,
            }),
        }
    }
}

impl MdClient for MockShard {
    fn intent_lock(&self, ctx: &OpContext, it: &Intent) -> Result<IntentReply> {
        self.record(ctx, it);
        if let Some(errno) = *self.failure.lock() {
            return Err(MdError::Remote {
                shard: self.index,
                errno,
            });
        }
        match ctx.name.as_deref() {
            Some(name) if !it.flags.contains(stripemd::intent::OpenFlags::BY_FID) => {
                self.by_name(ctx, it, name)
            }
            _ => self.by_fid(ctx, it),
        }
    }

    fn getattr(&self, fid: &Fid) -> Result<MdtBody> {
        self.objects.lock().get(fid).copied().ok_or(MdError::Remote {
            shard: self.index,
            errno: -libc::ENOENT,
        })
    }

    fn getattr_name(&self, parent: &Fid, name: &str) -> Result<MdtBody> {
        self.entries
            .lock()
            .get(&(*parent, name.to_string()))
            .copied()
            .ok_or(MdError::Remote {
                shard: self.index,
                errno: -libc::ENOENT,
            })
    }
}

pub struct Cluster {
    pub locks: Arc<CountingLocks>,
    pub journal: Journal,
    pub shards: Vec<Arc<MockShard>>,
    pub table: Arc<ShardTable>,
    pub cache: Arc<ObjectCache>,
    pub resolver: IntentResolver,
}

impl Cluster {
    pub fn new(count: u32) -> Self {
        let locks = Arc::new(CountingLocks::default());
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let table = Arc::new(ShardTable::new());
        let allocator = SeqAllocator::new(0x100);

        let mut shards = Vec::new();
        for index in 0..count {
            let shard = Arc::new(MockShard::new(index, locks.clone(), journal.clone()));
            let client: Arc<dyn MdClient> = shard.clone();
            table
                .add_shard(ShardDescriptor::new(
                    index,
                    format!("mdt{:04x}", index),
                    Some(client),
                ))
                .unwrap();
            let start = Self::seq(index);
            table
                .add_range(SeqRange::new(start, start + SHARD_SEQ_WIDTH, index))
                .unwrap();
            allocator.add_ranges(
                index,
                [SeqRange::new(
                    start + ALLOC_SEQ_OFFSET,
                    start + SHARD_SEQ_WIDTH,
                    index,
                )],
            );
            shards.push(shard);
        }

        let resolver = IntentResolver::new(table.clone(), locks.clone(), Arc::new(allocator));
        Cluster {
            locks,
            journal,
            shards,
            table,
            cache: Arc::new(ObjectCache::new()),
            resolver,
        }
    }

    pub fn seq(shard: u32) -> u64 {
        FID_SEQ_NORMAL + shard as u64 * SHARD_SEQ_WIDTH
    }

    /// A fid owned by `shard`.
    pub fn fid(shard: u32, oid: u32) -> Fid {
        Fid::new(Self::seq(shard), oid, 0)
    }

    pub fn shard(&self, index: u32) -> &MockShard {
        &self.shards[index as usize]
    }

    /// A striped directory with stripe `i` on shard `i % shard count`.
    pub fn striped_dir(&self, raw_hash: u32, stripes: u32) -> (Fid, Arc<StripeLayout>) {
        let master = Self::fid(0, 0x10);
        let parts: Vec<(Fid, u32)> = (0..stripes)
            .map(|i| {
                let shard = i % self.shards.len() as u32;
                (Self::fid(shard, 0x100 + i), shard)
            })
            .collect();
        (master, StripeLayout::from_parts(raw_hash, &parts, &self.cache))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.journal.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.journal.lock().clear();
    }

    pub fn resolve(&self, ctx: &mut OpContext, it: &mut Intent) -> Result<stripemd::intent::Resolution> {
        self.resolver.intent_lock(ctx, it)
    }
}
