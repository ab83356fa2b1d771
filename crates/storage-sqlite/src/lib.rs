//! SQLite row store and Markdown document renderer for the docsync engine.

pub mod errors;
pub mod markdown;
pub mod store;

pub use errors::StorageError;
pub use markdown::MarkdownRenderer;
pub use store::SqliteRowStore;
