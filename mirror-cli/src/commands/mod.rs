//! CLI command implementations

pub mod list;
pub mod sync;

pub use list::ListArgs;
pub use sync::SyncArgs;
