use stripemd::fid::Fid;
use stripemd::layout::{LMV_HASH_TYPE_ALL_CHARS, LMV_HASH_TYPE_FNV_1A_64};

/// Parse a stripe given as `FID@SHARD`.
pub fn parse_stripe(value: &str) -> Result<(Fid, u32), String> {
    let (fid, index) = value
        .rsplit_once('@')
        .ok_or_else(|| format!("expected FID@SHARD, got '{}'", value))?;
    let fid: Fid = fid.parse().map_err(|e| format!("{}", e))?;
    if !fid.is_sane() {
        return Err(format!("stripe fid {} is not valid", fid));
    }
    let index = parse_number(index).ok_or_else(|| format!("bad shard index '{}'", index))?;
    let index = u32::try_from(index).map_err(|_| format!("shard index {} out of range", index))?;
    Ok((fid, index))
}

/// Accepts a hash name or a raw tag in decimal or `0x` hex.
pub fn parse_hash_type(value: &str) -> Result<u32, String> {
    match value {
        "all_char" | "all_chars" => Ok(LMV_HASH_TYPE_ALL_CHARS),
        "fnv_1a_64" => Ok(LMV_HASH_TYPE_FNV_1A_64),
        other => parse_number(other)
            .and_then(|raw| u32::try_from(raw).ok())
            .ok_or_else(|| format!("unknown hash type '{}'", other)),
    }
}

fn parse_number(value: &str) -> Option<u64> {
    let value = value.trim();
    match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}
