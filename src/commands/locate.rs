use stripemd::config::Config;
use stripemd::error::Result;
use stripemd::fid::Fid;

pub fn print_location(config: &Config, fid: Fid, json: bool) -> Result<()> {
    let table = super::offline_table(config)?;
    let target = table.target_for(&fid)?;

    if json {
        let location = serde_json::json!({
            "fid": fid.to_string(),
            "shard": target.index(),
            "shard_name": target.name(),
            "igif": fid.is_igif(),
        });
        println!("{}", serde_json::to_string(&location)?);
    } else {
        println!("{} -> shard #{} ({})", fid, target.index(), target.name());
    }
    Ok(())
}
