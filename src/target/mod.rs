pub mod fld;
pub mod table;

pub use fld::{LocationDb, SeqRange};
pub use table::{ShardDescriptor, ShardTable};
