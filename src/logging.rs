use std::cmp::Ordering;

pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(level: LogLevel) -> u8 {
            match level {
                LogLevel::Debug => 0,
                LogLevel::Info => 1,
                LogLevel::Warn => 2,
            }
        }

        rank(*self).cmp(&rank(*other))
    }
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            _ => None,
        }
    }
}

/// Emits one JSON object per line: `ts`, `level`, `event`, then any extra fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Logger {
    min_level: LogLevel,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LEVEL)
    }
}

impl Logger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    pub fn debug(&self, event: &str, fields: serde_json::Value) {
        self.event(LogLevel::Debug, event, fields);
    }

    pub fn info(&self, event: &str, fields: serde_json::Value) {
        self.event(LogLevel::Info, event, fields);
    }

    pub fn warn(&self, event: &str, fields: serde_json::Value) {
        self.event(LogLevel::Warn, event, fields);
    }

    pub fn event(&self, level: LogLevel, event: &str, fields: serde_json::Value) {
        if let Some(line) = self.render(level, event, fields, now_unix_millis()) {
            emit(level, &line);
        }
    }

    fn render(
        &self,
        level: LogLevel,
        event: &str,
        fields: serde_json::Value,
        ts: u64,
    ) -> Option<String> {
        if level < self.min_level {
            return None;
        }

        let mut payload = serde_json::Map::new();
        payload.insert(
            "ts".to_string(),
            serde_json::Value::Number(serde_json::Number::from(ts)),
        );
        payload.insert(
            "level".to_string(),
            serde_json::Value::String(level.as_str().to_string()),
        );
        payload.insert(
            "event".to_string(),
            serde_json::Value::String(event.to_string()),
        );

        if let serde_json::Value::Object(extra) = fields {
            for (key, value) in extra {
                payload.insert(key, value);
            }
        }

        Some(serde_json::Value::Object(payload).to_string())
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(level: LogLevel, line: &str) {
    let line = wasm_bindgen::JsValue::from_str(line);
    match level {
        LogLevel::Debug => web_sys::console::debug_1(&line),
        LogLevel::Info => web_sys::console::log_1(&line),
        LogLevel::Warn => web_sys::console::warn_1(&line),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(level: LogLevel, line: &str) {
    match level {
        LogLevel::Warn => eprintln!("{line}"),
        LogLevel::Debug | LogLevel::Info => println!("{line}"),
    }
}

#[cfg(target_arch = "wasm32")]
pub fn now_unix_millis() -> u64 {
    js_sys::Date::now().max(0.0) as u64
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_unix_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_below_min_level_are_dropped() {
        let logger = Logger::new(LogLevel::Info);

        assert!(logger
            .render(LogLevel::Debug, "noise", json!({}), 1)
            .is_none());
        assert!(logger
            .render(LogLevel::Warn, "counter_unavailable", json!({}), 1)
            .is_some());
    }

    #[test]
    fn rendered_line_merges_extra_fields() {
        let logger = Logger::new(LogLevel::Debug);
        let line = logger
            .render(
                LogLevel::Info,
                "counter_loaded",
                json!({ "value": 42, "source": "hit" }),
                1_700_000_000_000,
            )
            .expect("info passes debug threshold");

        let parsed: serde_json::Value = serde_json::from_str(&line).expect("valid JSON line");
        assert_eq!(parsed["ts"], 1_700_000_000_000u64);
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "counter_loaded");
        assert_eq!(parsed["value"], 42);
        assert_eq!(parsed["source"], "hit");
    }

    #[test]
    fn level_parsing_accepts_known_names_only() {
        assert_eq!(LogLevel::parse(" DEBUG "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("trace"), None);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
    }
}
