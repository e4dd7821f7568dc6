//! Structured stderr logging with redaction
//!
//! Field values are redacted by key name before they are formatted:
//! - recovery phrases, seeds, private and chain-code material: fully hidden
//! - addresses: bech32 prefix plus a few data characters
//! - transaction ids and key hashes: head and tail only

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

pub fn disable_debug() {
    DEBUG_ENABLED.store(false, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// One log line: level, module, message and redacted `key=value` fields
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, redacted according to its key
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let redacted = redact_for_key(key, &value.to_string());
        self.fields.push((key, redacted));
        self
    }

    /// Add a field that is always fully redacted
    pub fn redacted_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, redact_value(&value.to_string())));
        self
    }

    pub fn address_field(mut self, key: &'static str, address: &str) -> Self {
        self.fields.push((key, redact_address(address)));
        self
    }

    /// Format without the timestamp
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        if !self.fields.is_empty() {
            let fields = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ");
            line.push_str(" | ");
            line.push_str(&fields);
        }
        line
    }

    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

const SECRET_KEYS: &[&str] = &[
    "phrase", "mnemonic", "seed", "entropy", "passphrase", "password",
    "private", "secret", "signing_key", "xprv", "chain_code",
];

const ADDRESS_KEYS: &[&str] = &["address", "destination", "merchant", "recipient"];

const HASH_KEYS: &[&str] = &["tx_id", "txid", "hash", "utxo", "fund"];

fn redact_for_key(key: &str, value: &str) -> String {
    let key = key.to_lowercase();
    if SECRET_KEYS.iter().any(|k| key.contains(k)) {
        redact_value(value)
    } else if ADDRESS_KEYS.iter().any(|k| key.contains(k)) {
        redact_address(value)
    } else if HASH_KEYS.iter().any(|k| key.contains(k)) {
        redact_hash(value)
    } else {
        value.to_string()
    }
}

fn redact_value(value: &str) -> String {
    match value.len() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        n => format!("[REDACTED:{}chars]", n),
    }
}

/// Keep the bech32 prefix and six data characters, plus the last four
fn redact_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }
    if !trimmed.is_ascii() || trimmed.len() <= 16 {
        return redact_value(trimmed);
    }
    let prefix_len = trimmed.rfind('1').map_or(6, |sep| sep + 7).min(trimmed.len() - 8);
    format!("{}...{}", &trimmed[..prefix_len], &trimmed[trimmed.len() - 4..])
}

fn redact_hash(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }
    if !trimmed.is_ascii() || trimmed.len() <= 20 {
        return trimmed.to_string();
    }
    format!("{}...{}", &trimmed[..10], &trimmed[trimmed.len() - 6..])
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)*) => {
        $crate::utils::logging::LogEntry::new($crate::utils::logging::LogLevel::$level, $module, $msg)
            $(.field(stringify!($key), &$value))*
            .log()
    };
}

#[macro_export]
macro_rules! log_debug {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_at!(Debug, $module, $msg $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_at!(Info, $module, $msg $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_at!(Warn, $module, $msg $(, $key = $value)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log_at!(Error, $module, $msg $(, $key = $value)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "addr1qx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgse35a3x";

    #[test]
    fn test_secret_fields_fully_redacted() {
        let entry = LogEntry::new(LogLevel::Info, "wallet", "derived")
            .field("phrase", "abandon abandon abandon")
            .field("private_key", "deadbeefdeadbeef")
            .field("account", 0);
        assert_eq!(entry.fields[0].1, "[REDACTED:23chars]");
        assert!(entry.fields[1].1.starts_with("[REDACTED"));
        assert_eq!(entry.fields[2].1, "0");
        assert!(!entry.render().contains("abandon"));
    }

    #[test]
    fn test_address_keeps_prefix_and_tail() {
        let redacted = redact_address(ADDR);
        assert!(redacted.starts_with("addr1qx2fxv"));
        assert!(redacted.ends_with("5a3x"));
        assert!(redacted.contains("..."));
        assert!(redacted.len() < ADDR.len());
    }

    #[test]
    fn test_hash_fields() {
        let tx = "a".repeat(64);
        let entry = LogEntry::new(LogLevel::Debug, "authorization", "built").field("tx_id", &tx);
        assert_eq!(entry.fields[0].1, format!("{}...{}", "a".repeat(10), "a".repeat(6)));
        assert_eq!(redact_hash("short"), "short");
    }

    #[test]
    fn test_short_and_empty_values() {
        assert_eq!(redact_value(""), "[EMPTY]");
        assert_eq!(redact_value("abc"), "[REDACTED]");
        assert_eq!(redact_address("addr1short"), "[REDACTED:10chars]");
    }

    #[test]
    fn test_render_layout() {
        let entry = LogEntry::new(LogLevel::Warn, "balances", "price unavailable").field("unit", "lovelace");
        assert_eq!(entry.render(), "WARN [balances] price unavailable | unit=lovelace");
    }
}
