use stripemd::cache::ObjectCache;
use stripemd::config::Config;
use stripemd::context::OpContext;
use stripemd::error::Result;
use stripemd::fid::Fid;
use stripemd::layout::StripeLayout;

#[derive(Debug)]
struct RouteReport {
    fid: Fid,
    shard: u32,
    shard_name: String,
    stripe: Option<usize>,
    hash: Option<String>,
    try_all_stripes: bool,
}

pub fn print_route(
    config: &Config,
    parent: Fid,
    name: &str,
    stripes: &[(Fid, u32)],
    hash_type: u32,
    json: bool,
) -> Result<()> {
    let table = super::offline_table(config)?;
    let cache = ObjectCache::new();

    let mut ctx = OpContext::new(parent).with_name(name);
    let layout = (!stripes.is_empty()).then(|| StripeLayout::from_parts(hash_type, stripes, &cache));
    if let Some(layout) = &layout {
        ctx = ctx.with_parent_layout(layout.clone());
    }

    let target = table.locate_or_first_stripe(&mut ctx)?;
    let report = RouteReport {
        fid: ctx.fid1,
        shard: target.index(),
        shard_name: target.name().to_string(),
        stripe: layout.as_ref().and_then(|l| l.position_of(&ctx.fid1)),
        hash: layout.as_ref().map(|l| l.hash().to_string()),
        try_all_stripes: layout.as_ref().is_some_and(|l| l.need_try_all_stripes()),
    };

    if json {
        let route = serde_json::json!({
            "parent": parent.to_string(),
            "name": name,
            "fid": report.fid.to_string(),
            "shard": report.shard,
            "shard_name": report.shard_name,
            "stripe": report.stripe,
            "hash": report.hash,
            "try_all_stripes": report.try_all_stripes,
        });
        println!("{}", serde_json::to_string(&route)?);
        return Ok(());
    }

    match report.stripe {
        Some(stripe) => println!(
            "'{}' in {} -> stripe {} {} on shard #{} ({})",
            name, parent, stripe, report.fid, report.shard, report.shard_name
        ),
        None => println!(
            "'{}' in {} -> shard #{} ({})",
            name, parent, report.shard, report.shard_name
        ),
    }
    if let Some(hash) = &report.hash {
        println!("  hash: {}", hash);
    }
    if report.try_all_stripes {
        println!("  negative lookups fall back to searching every stripe");
    }
    Ok(())
}
