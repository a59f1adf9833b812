use crate::fid::Fid;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MdError>;

#[derive(Error, Debug)]
pub enum MdError {
    #[error("No shard owns {0}")]
    NoTarget(String),

    #[error("Unrecognized directory hash type {0:#x}")]
    UnknownHash(u32),

    #[error("Shard #{0} is not connected")]
    NotConnected(u32),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Stale file handle: {0}")]
    Stale(Fid),

    #[error("Identifier allocation failed on shard #{shard}: {reason}")]
    Allocation { shard: u32, reason: String },

    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    #[error("Shard #{shard} returned errno {errno}")]
    Remote { shard: u32, errno: i32 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid identifier: {0}")]
    InvalidFid(String),

    #[error("Invalid file handle: {0}")]
    InvalidHandle(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),
}

#[cfg(target_os = "linux")]
const EBADHASH: i32 = libc::EBADFD;
#[cfg(not(target_os = "linux"))]
const EBADHASH: i32 = libc::EBADF;

impl MdError {
    /// Negative errno equivalent, as handed back to a VFS caller.
    pub fn errno(&self) -> i32 {
        let errno = match self {
            MdError::NoTarget(_) | MdError::NotConnected(_) => libc::ENODEV,
            MdError::UnknownHash(_) => EBADHASH,
            MdError::Protocol(_) => libc::EPROTO,
            MdError::Stale(_) => libc::ESTALE,
            MdError::Allocation { .. } => libc::ENOSPC,
            MdError::OutOfMemory(_) => libc::ENOMEM,
            MdError::Remote { errno, .. } => errno.abs(),
            MdError::InvalidRequest(_)
            | MdError::InvalidFid(_)
            | MdError::InvalidHandle(_)
            | MdError::Config(_)
            | MdError::Json(_) => libc::EINVAL,
            MdError::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
        };
        -errno
    }

    /// True for failures to find an owning shard.
    pub fn is_routing(&self) -> bool {
        matches!(
            self,
            MdError::NoTarget(_) | MdError::UnknownHash(_) | MdError::NotConnected(_)
        )
    }
}

impl From<std::io::Error> for MdError {
    fn from(err: std::io::Error) -> Self {
        MdError::Io(err)
    }
}

impl From<serde_json::Error> for MdError {
    fn from(err: serde_json::Error) -> Self {
        MdError::Json(err.to_string())
    }
}
