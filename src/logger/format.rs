//! Access log line formats
//!
//! - `combined`: Apache/Nginx combined format
//! - `common`: Common Log Format
//! - `json`: one JSON object per line

use chrono::{DateTime, Local};
use serde::Serialize;

/// One handled request, as written to the access log
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    #[serde(serialize_with = "serialize_time")]
    pub time: DateTime<Local>,
    pub method: String,
    /// Path plus query, as received
    pub uri: String,
    /// Resource the request resolved to, if any
    pub resource: Option<String>,
    pub status: u16,
    pub body_bytes: usize,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// New entry stamped with the current local time
    pub fn new(remote_addr: impl Into<String>, method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            time: Local::now(),
            method: method.into(),
            uri: uri.into(),
            resource: None,
            status: 200,
            body_bytes: 0,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Render in the named format; unknown names fall back to `combined`
    pub fn format(&self, format: &str) -> String {
        match format {
            "common" => self.format_common(),
            "json" => self.format_json(),
            _ => self.format_combined(),
        }
    }

    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/1.1\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.uri,
            self.status,
            self.body_bytes,
        )
    }

    fn format_combined(&self) -> String {
        format!(
            "{} \"-\" \"{}\" {:.3}",
            self.format_common(),
            self.user_agent.as_deref().unwrap_or("-"),
            Self::seconds(self.request_time_us),
        )
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!(r#"{{"log_error":"{e}"}}"#))
    }

    #[allow(clippy::cast_precision_loss)]
    fn seconds(micros: u64) -> f64 {
        micros as f64 / 1_000_000.0
    }
}

fn serialize_time<S: serde::Serializer>(time: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.to_rfc3339())
}
