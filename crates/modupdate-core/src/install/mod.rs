pub mod backup;
pub mod transfer;

pub use backup::{make_backup, should_overwrite_backup};
pub use transfer::{download, promote, restore, TempArea};
