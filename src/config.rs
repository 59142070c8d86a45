use std::str::FromStr;

use url::Url;

use crate::counter::CounterEndpoint;
use crate::logging::{LogLevel, DEFAULT_LOG_LEVEL};
use crate::notify::NotificationTimings;
use crate::reveal::RevealOptions;

pub const ATTRIBUTE_PREFIX: &str = "data-enhancer-";

const DEFAULT_SECTION_OFFSET: f64 = 150.0;
const DEFAULT_SCROLL_TOP_THRESHOLD: f64 = 300.0;
const DEFAULT_ANCHOR_GAP: f64 = 20.0;
const DEFAULT_REVEAL_THRESHOLD: f64 = 0.1;
const DEFAULT_REVEAL_MARGIN: f64 = 50.0;
const DEFAULT_REVEAL_DURATION_MS: u32 = 600;
const DEFAULT_REVEAL_OFFSET: f64 = 20.0;
const DEFAULT_MENU_BREAKPOINT: f64 = 768.0;
const DEFAULT_TOAST_ENTER_MS: u32 = 300;
const DEFAULT_TOAST_HOLD_MS: u32 = 2_000;
const DEFAULT_TOAST_EXIT_MS: u32 = 300;
const DEFAULT_COUNTER_BASE: &str = "https://api.countapi.xyz";
const DEFAULT_COUNTER_NAMESPACE: &str = "portfolio";
const DEFAULT_COUNTER_KEY: &str = "visits";

const SECTION_OFFSET_BOUNDS: (f64, f64) = (0.0, 1_000.0);
const SCROLL_TOP_THRESHOLD_BOUNDS: (f64, f64) = (0.0, 10_000.0);
const ANCHOR_GAP_BOUNDS: (f64, f64) = (0.0, 500.0);
const REVEAL_THRESHOLD_BOUNDS: (f64, f64) = (0.0, 1.0);
const REVEAL_MARGIN_BOUNDS: (f64, f64) = (0.0, 1_000.0);
const REVEAL_DURATION_MS_BOUNDS: (u32, u32) = (0, 10_000);
const REVEAL_OFFSET_BOUNDS: (f64, f64) = (0.0, 500.0);
const MENU_BREAKPOINT_BOUNDS: (f64, f64) = (0.0, 4_000.0);
const TOAST_TRANSITION_MS_BOUNDS: (u32, u32) = (0, 5_000);
const TOAST_HOLD_MS_BOUNDS: (u32, u32) = (100, 60_000);

/// Selector for elements that fade in once they scroll into view.
pub const REVEAL_SELECTOR: &str =
    ".reveal, .publication-item, .education-item, .experience-item, .skill-category";

#[derive(Clone, Debug, PartialEq)]
pub struct EnhancerConfig {
    pub section_offset: f64,
    pub scroll_top_threshold: f64,
    pub anchor_gap: f64,
    pub reveal: RevealOptions,
    pub reveal_duration_ms: u32,
    pub reveal_offset: f64,
    pub menu_breakpoint: f64,
    pub toast: NotificationTimings,
    /// `None` only when no usable counter base URL is available.
    pub counter: Option<CounterEndpoint>,
    pub email: Option<String>,
    pub custom_cursor: bool,
    pub log_level: LogLevel,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl EnhancerConfig {
    /// Builds the config from `data-enhancer-*` attribute values.
    ///
    /// `lookup` receives the attribute name without the prefix, e.g.
    /// `"section-offset"`. Missing, malformed or out-of-range values fall back
    /// to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let section_offset = parse_with_bounds(
            lookup("section-offset"),
            DEFAULT_SECTION_OFFSET,
            SECTION_OFFSET_BOUNDS,
        );
        let scroll_top_threshold = parse_with_bounds(
            lookup("scroll-top-threshold"),
            DEFAULT_SCROLL_TOP_THRESHOLD,
            SCROLL_TOP_THRESHOLD_BOUNDS,
        );
        let anchor_gap =
            parse_with_bounds(lookup("anchor-gap"), DEFAULT_ANCHOR_GAP, ANCHOR_GAP_BOUNDS);
        let reveal = RevealOptions {
            threshold: parse_with_bounds(
                lookup("reveal-threshold"),
                DEFAULT_REVEAL_THRESHOLD,
                REVEAL_THRESHOLD_BOUNDS,
            ),
            bottom_margin: parse_with_bounds(
                lookup("reveal-margin"),
                DEFAULT_REVEAL_MARGIN,
                REVEAL_MARGIN_BOUNDS,
            ),
        };
        let reveal_duration_ms = parse_with_bounds(
            lookup("reveal-duration-ms"),
            DEFAULT_REVEAL_DURATION_MS,
            REVEAL_DURATION_MS_BOUNDS,
        );
        let reveal_offset = parse_with_bounds(
            lookup("reveal-offset"),
            DEFAULT_REVEAL_OFFSET,
            REVEAL_OFFSET_BOUNDS,
        );
        let menu_breakpoint = parse_with_bounds(
            lookup("menu-breakpoint"),
            DEFAULT_MENU_BREAKPOINT,
            MENU_BREAKPOINT_BOUNDS,
        );
        let toast = NotificationTimings {
            enter_ms: parse_with_bounds(
                lookup("toast-enter-ms"),
                DEFAULT_TOAST_ENTER_MS,
                TOAST_TRANSITION_MS_BOUNDS,
            ),
            hold_ms: parse_with_bounds(
                lookup("toast-hold-ms"),
                DEFAULT_TOAST_HOLD_MS,
                TOAST_HOLD_MS_BOUNDS,
            ),
            exit_ms: parse_with_bounds(
                lookup("toast-exit-ms"),
                DEFAULT_TOAST_EXIT_MS,
                TOAST_TRANSITION_MS_BOUNDS,
            ),
        };
        let counter = parse_http_url(lookup("counter-base"))
            .or_else(|| parse_http_url(Some(DEFAULT_COUNTER_BASE.to_string())))
            .map(|base| CounterEndpoint {
                base,
                namespace: parse_non_empty_string(lookup("counter-namespace"))
                    .unwrap_or_else(|| DEFAULT_COUNTER_NAMESPACE.to_string()),
                key: parse_non_empty_string(lookup("counter-key"))
                    .unwrap_or_else(|| DEFAULT_COUNTER_KEY.to_string()),
            });
        let email = parse_non_empty_string(lookup("email")).filter(|value| value.contains('@'));
        let custom_cursor = parse_switch(lookup("cursor")).unwrap_or(true);
        let log_level = parse_non_empty_string(lookup("log-level"))
            .and_then(|value| LogLevel::parse(&value))
            .unwrap_or(DEFAULT_LOG_LEVEL);

        Self {
            section_offset,
            scroll_top_threshold,
            anchor_gap,
            reveal,
            reveal_duration_ms,
            reveal_offset,
            menu_breakpoint,
            toast,
            counter,
            email,
            custom_cursor,
            log_level,
        }
    }
}

pub fn parse_with_bounds<T>(raw: Option<String>, default: T, bounds: (T, T)) -> T
where
    T: FromStr + PartialOrd + Copy,
{
    raw.and_then(|value| value.trim().parse::<T>().ok())
        .filter(|value| bounds.0 <= *value && *value <= bounds.1)
        .unwrap_or(default)
}

pub fn parse_non_empty_string(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn parse_http_url(raw: Option<String>) -> Option<Url> {
    let value = parse_non_empty_string(raw)?;
    let parsed = Url::parse(&value).ok()?;

    if (parsed.scheme() == "http" || parsed.scheme() == "https") && !parsed.cannot_be_a_base() {
        Some(parsed)
    } else {
        None
    }
}

fn parse_switch(raw: Option<String>) -> Option<bool> {
    match parse_non_empty_string(raw)?.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> EnhancerConfig {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        EnhancerConfig::from_lookup(|name| values.get(name).cloned())
    }

    #[test]
    fn defaults_match_page_script_constants() {
        let config = EnhancerConfig::default();

        assert_eq!(config.section_offset, 150.0);
        assert_eq!(config.scroll_top_threshold, 300.0);
        assert_eq!(config.reveal.threshold, 0.1);
        assert_eq!(config.reveal.bottom_margin, 50.0);
        assert_eq!(config.menu_breakpoint, 768.0);
        assert_eq!(config.toast.hold_ms, 2_000);
        assert_eq!(
            config.counter.map(|counter| counter.hit_url().to_string()).as_deref(),
            Some("https://api.countapi.xyz/hit/portfolio/visits")
        );
        assert_eq!(config.email, None);
        assert!(config.custom_cursor);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn valid_overrides_are_applied() {
        let config = config_from(&[
            ("section-offset", "90"),
            ("menu-breakpoint", "575"),
            ("reveal-threshold", "0.25"),
            ("toast-hold-ms", "2500"),
            ("counter-base", "https://counter.example.com/v1"),
            ("counter-namespace", "vaskar"),
            ("email", "me@example.com"),
            ("cursor", "off"),
            ("log-level", "debug"),
        ]);

        assert_eq!(config.section_offset, 90.0);
        assert_eq!(config.menu_breakpoint, 575.0);
        assert_eq!(config.reveal.threshold, 0.25);
        assert_eq!(config.toast.hold_ms, 2_500);
        assert_eq!(
            config.counter.as_ref().map(|counter| counter.get_url().to_string()).as_deref(),
            Some("https://counter.example.com/v1/get/vaskar/visits")
        );
        assert_eq!(config.email.as_deref(), Some("me@example.com"));
        assert!(!config.custom_cursor);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn out_of_range_or_malformed_values_fall_back() {
        let config = config_from(&[
            ("section-offset", "-10"),
            ("reveal-threshold", "1.5"),
            ("toast-hold-ms", "fast"),
            ("counter-base", "ftp://counter.example.com"),
            ("email", "not-an-address"),
            ("cursor", "maybe"),
        ]);

        assert_eq!(config.section_offset, 150.0);
        assert_eq!(config.reveal.threshold, 0.1);
        assert_eq!(config.toast.hold_ms, 2_000);
        assert_eq!(
            config.counter.map(|counter| counter.base.to_string()).as_deref(),
            Some("https://api.countapi.xyz/")
        );
        assert_eq!(config.email, None);
        assert!(config.custom_cursor);
    }

    #[test]
    fn default_counter_base_is_always_usable() {
        for base in [None, Some("not a url"), Some("mailto:me@example.com")] {
            let pairs: Vec<(&str, &str)> =
                base.map(|base| ("counter-base", base)).into_iter().collect();
            let counter = config_from(&pairs)
                .counter
                .expect("default base parses as an http URL");
            assert_eq!(counter.base.scheme(), "https");
            assert_eq!(counter.base.host_str(), Some("api.countapi.xyz"));
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(parse_with_bounds(Some("0".to_string()), 5u32, (0, 10)), 0);
        assert_eq!(parse_with_bounds(Some(" 10 ".to_string()), 5u32, (0, 10)), 10);
        assert_eq!(parse_with_bounds(Some("11".to_string()), 5u32, (0, 10)), 5);
        assert_eq!(parse_with_bounds(None, 5u32, (0, 10)), 5);
    }
}
