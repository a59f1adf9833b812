use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MdError;

/// Last reserved sequence for special objects.
pub const FID_SEQ_RSVD: u64 = 11;
/// First sequence of the IGIF range (inode/generation embedded in the fid).
pub const FID_SEQ_IGIF: u64 = 12;
pub const FID_SEQ_IGIF_MAX: u64 = 0x0ffff_ffff;
/// First sequence handed out to regular namespace objects.
pub const FID_SEQ_NORMAL: u64 = 0x2_0000_0400;

/// Globally unique object identifier.
///
/// Ordering is by sequence, then object number, then version, matching the
/// field order below.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Fid {
    pub seq: u64,
    pub oid: u32,
    pub ver: u32,
}

impl Fid {
    pub const ZERO: Fid = Fid {
        seq: 0,
        oid: 0,
        ver: 0,
    };

    pub const fn new(seq: u64, oid: u32, ver: u32) -> Self {
        Fid { seq, oid, ver }
    }

    pub fn is_zero(&self) -> bool {
        *self == Fid::ZERO
    }

    pub fn is_igif(&self) -> bool {
        (FID_SEQ_IGIF..=FID_SEQ_IGIF_MAX).contains(&self.seq)
    }

    pub fn is_normal(&self) -> bool {
        self.seq >= FID_SEQ_NORMAL
    }

    fn is_reserved(&self) -> bool {
        self.seq > 0 && self.seq <= FID_SEQ_RSVD
    }

    /// A sane fid names a real object; the zero fid never does.
    pub fn is_sane(&self) -> bool {
        (self.is_normal() && self.ver == 0) || self.is_igif() || self.is_reserved()
    }
}

impl fmt::Display for Fid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}:{:#x}:{:#x}]", self.seq, self.oid, self.ver)
    }
}

fn parse_hex_field<T>(
    field: &str,
    whole: &str,
    parse: fn(&str, u32) -> Result<T, std::num::ParseIntError>,
) -> Result<T, MdError> {
    let digits = field
        .trim()
        .strip_prefix("0x")
        .or_else(|| field.trim().strip_prefix("0X"))
        .unwrap_or_else(|| field.trim());
    parse(digits, 16).map_err(|e| MdError::InvalidFid(format!("'{}': {}", whole, e)))
}

impl FromStr for Fid {
    type Err = MdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s.trim();
        let inner = inner
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(inner);

        let fields: Vec<&str> = inner.split(':').collect();
        if fields.len() != 3 {
            return Err(MdError::InvalidFid(format!(
                "'{}': expected [SEQ:OID:VER]",
                s
            )));
        }

        Ok(Fid {
            seq: parse_hex_field(fields[0], s, u64::from_str_radix)?,
            oid: parse_hex_field(fields[1], s, u32::from_str_radix)?,
            ver: parse_hex_field(fields[2], s, u32::from_str_radix)?,
        })
    }
}
