use std::path::Path;

use stripemd::config::Config;
use stripemd::error::Result;

use crate::cli::ConfigAction;

pub fn handle_config_command(
    action: Option<ConfigAction>,
    config_path: &Path,
    config: &Config,
) -> Result<()> {
    match action {
        Some(ConfigAction::Path) => {
            println!("Config location: {}", config_path.display());
        }
        None | Some(ConfigAction::Show) => {
            println!("Config file: {}", config_path.display());
            println!();
            println!("Current configuration:");
            println!("  Logging:");
            println!("    filter: {}", config.logging.get_filter());
            println!("  Allocator:");
            println!("    seq_width: {:#x}", config.allocator.get_seq_width());
            println!("  Shards:");
            if config.shards.is_empty() {
                println!("    (none)");
            }
            for shard in &config.shards {
                println!("    #{} {}", shard.index, shard.get_name());
                if let Some(address) = &shard.address {
                    println!("      address: {}", address);
                }
                for range in &shard.sequences {
                    println!("      sequences: [{:#x}, {:#x})", range.start, range.end);
                }
            }
        }
    }
    Ok(())
}
