use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";
pub const DIRECT: &str = "Direct";

/// One captured visit. Immutable once built; persisted as a single JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub ip: String,
    pub timestamp: String,
    pub user_agent: String,
    pub referer: String,
    pub url: String,
}

impl LogEntry {
    /// Build an entry stamped with the current UTC instant. Absent fields take
    /// their defaults (`Unknown` / `Direct`).
    pub fn capture(
        ip: String,
        user_agent: Option<String>,
        referer: Option<String>,
        url: Option<String>,
    ) -> Self {
        Self {
            ip: non_empty_or(Some(ip), UNKNOWN),
            timestamp: now_iso8601(),
            user_agent: non_empty_or(user_agent, UNKNOWN),
            referer: non_empty_or(referer, DIRECT),
            url: non_empty_or(url, UNKNOWN),
        }
    }

    /// Serialized record followed by `\n`.
    pub fn to_json_line(&self) -> crate::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Human-readable console line, user agent cut to `max_chars` characters.
    pub fn summary(&self, max_chars: usize) -> String {
        let ua: String = self.user_agent.chars().take(max_chars).collect();
        format!("[{}] IP: {} | UA: {}", self.timestamp, self.ip, ua)
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.123Z`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}
