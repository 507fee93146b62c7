pub mod file;

pub use file::FileStore;

use async_trait::async_trait;
use honeypot_core::{LogEntry, Result};

/// Durable sink for captured visits. Append-only: nothing is ever updated
/// or removed through this interface.
#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn append(&self, entry: &LogEntry) -> Result<()>;

    /// Short human description for logs, e.g. the file path.
    fn describe(&self) -> String;
}
