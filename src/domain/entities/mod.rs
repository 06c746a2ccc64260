pub mod change_set;
pub mod file_listing;

pub use change_set::ChangeSet;
pub use file_listing::{EntryType, FileListingEntry};
