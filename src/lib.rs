pub mod alloc;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod fid;
pub mod intent;
pub mod layout;
pub mod lock;
pub mod resolve;
pub mod rpc;
pub mod target;

pub use alloc::{FidAllocator, SeqAllocator};
pub use cache::{CachedObject, ObjectAttrs, ObjectCache};
pub use config::{load_config, save_config, Config};
pub use context::{OpBias, OpContext};
pub use error::{MdError, Result};
pub use export::{decode_fh, encode_fh, ExportHandle, Exporter};
pub use fid::Fid;
pub use intent::{Disposition, Intent, IntentOp, OpenFlags, Outcome, Resolution};
pub use layout::{HashTag, NameHash, StripeLayout};
pub use lock::{HeldLock, LockGrant, LockHandle, LockMode, LockService};
pub use resolve::IntentResolver;
pub use rpc::{IntentReply, MdClient, MdtBody, Reply, Valid};
pub use target::{ShardDescriptor, ShardTable};
