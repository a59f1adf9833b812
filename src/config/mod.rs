pub mod paths;
pub mod persistence;
pub mod schema;

pub use paths::*;
pub use persistence::*;
pub use schema::*;

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_seq_width() -> u64 {
    crate::alloc::DEFAULT_SEQ_WIDTH
}
