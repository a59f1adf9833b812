pub mod args;
pub mod validation;

pub use args::{Args, Commands, ConfigAction, FhAction, ObjectKind};
