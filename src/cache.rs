use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::fid::Fid;
use crate::rpc::MdtBody;

/// Attributes the client keeps for a cached object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectAttrs {
    pub size: u64,
    pub blocks: u64,
    pub nlink: u32,
    pub atime: i64,
    pub ctime: i64,
    pub mtime: i64,
}

impl From<&MdtBody> for ObjectAttrs {
    fn from(body: &MdtBody) -> Self {
        ObjectAttrs {
            size: body.size,
            blocks: body.blocks,
            nlink: body.nlink,
            atime: body.atime,
            ctime: body.ctime,
            mtime: body.mtime,
        }
    }
}

#[derive(Debug)]
pub struct CachedObject {
    fid: Fid,
    mode: u32,
    attrs: RwLock<ObjectAttrs>,
}

impl CachedObject {
    pub fn new(fid: Fid, mode: u32, attrs: ObjectAttrs) -> Self {
        CachedObject {
            fid,
            mode,
            attrs: RwLock::new(attrs),
        }
    }

    pub fn fid(&self) -> Fid {
        self.fid
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn attrs(&self) -> ObjectAttrs {
        *self.attrs.read()
    }

    /// Overwrite size, blocks, link count and times from a reply body.
    pub fn refresh_from(&self, body: &MdtBody) {
        *self.attrs.write() = ObjectAttrs::from(body);
    }
}

/// Objects the client currently holds, keyed by fid.
///
/// Stripe layouts only keep weak references into this cache, so evicting an
/// object here is enough to drop it.
#[derive(Debug, Default)]
pub struct ObjectCache {
    objects: DashMap<Fid, Arc<CachedObject>>,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fid: &Fid) -> Option<Arc<CachedObject>> {
        self.objects.get(fid).map(|entry| Arc::clone(entry.value()))
    }

    pub fn get_or_insert(&self, fid: Fid, mode: u32) -> Arc<CachedObject> {
        Arc::clone(
            self.objects
                .entry(fid)
                .or_insert_with(|| Arc::new(CachedObject::new(fid, mode, ObjectAttrs::default())))
                .value(),
        )
    }

    pub fn insert(&self, object: CachedObject) -> Arc<CachedObject> {
        let object = Arc::new(object);
        self.objects.insert(object.fid(), Arc::clone(&object));
        object
    }

    pub fn evict(&self, fid: &Fid) -> Option<Arc<CachedObject>> {
        self.objects.remove(fid).map(|(_, object)| object)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
