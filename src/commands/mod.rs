pub mod config;
pub mod doctor;
pub mod fh;
pub mod locate;
pub mod route;

pub use config::handle_config_command;
pub use doctor::run_doctor;
pub use fh::handle_fh_command;
pub use locate::print_location;
pub use route::print_route;

use stripemd::config::Config;
use stripemd::error::Result;
use stripemd::target::ShardTable;

/// Routing table for offline inspection: every configured shard is present
/// but none is connected.
fn offline_table(config: &Config) -> Result<ShardTable> {
    ShardTable::from_config(config, |_| None)
}
