pub mod config;
pub mod entry;
pub mod error;
pub mod resolver;

pub use config::HoneypotConfig;
pub use entry::LogEntry;
pub use error::{HoneypotError, Result};
pub use resolver::{IpResolver, RequestFacts, ResolvedIp};
