use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::logging::Logger;

pub const PLACEHOLDER: &str = "--";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterEndpoint {
    pub base: Url,
    pub namespace: String,
    pub key: String,
}

impl CounterEndpoint {
    /// `{base}/hit/{namespace}/{key}`: increments, then returns the new value.
    pub fn hit_url(&self) -> Url {
        self.url_for("hit")
    }

    /// `{base}/get/{namespace}/{key}`: read-only.
    pub fn get_url(&self) -> Url {
        self.url_for("get")
    }

    fn url_for(&self, action: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([action, self.namespace.as_str(), self.key.as_str()]);
        }
        url
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct CounterResponse {
    pub value: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterError {
    Network,
    Status(u16),
    Decode,
}

impl CounterError {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Status(status) if status >= 500 => "upstream_5xx",
            Self::Status(_) => "upstream_non_success",
            Self::Decode => "decode",
        }
    }
}

/// Performs a single GET against the counting service.
#[allow(async_fn_in_trait)]
pub trait CounterSource {
    async fn fetch(&self, url: &Url) -> Result<CounterResponse, CounterError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitorCount {
    Known(u64),
    Unavailable,
}

impl VisitorCount {
    pub fn display_text(self) -> String {
        match self {
            Self::Known(value) => format!("Visitors: {value}"),
            Self::Unavailable => format!("Visitors: {PLACEHOLDER}"),
        }
    }
}

/// Records one visit. The increment is attempted exactly once; on failure a
/// single read-only request is made before giving up.
pub async fn fetch_visitor_count<S>(
    source: &S,
    endpoint: &CounterEndpoint,
    logger: &Logger,
) -> VisitorCount
where
    S: CounterSource,
{
    match source.fetch(&endpoint.hit_url()).await {
        Ok(response) => {
            logger.info(
                "counter_loaded",
                json!({ "source": "hit", "value": response.value }),
            );
            return VisitorCount::Known(response.value);
        }
        Err(error) => {
            logger.warn(
                "counter_primary_failed",
                json!({ "error_class": error.as_str() }),
            );
        }
    }

    match source.fetch(&endpoint.get_url()).await {
        Ok(response) => {
            logger.info(
                "counter_loaded",
                json!({ "source": "get", "value": response.value }),
            );
            VisitorCount::Known(response.value)
        }
        Err(error) => {
            logger.warn(
                "counter_unavailable",
                json!({ "error_class": error.as_str() }),
            );
            VisitorCount::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct ScriptedSource {
        responses: HashMap<String, Result<CounterResponse, CounterError>>,
        requested: RefCell<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(responses: &[(&str, Result<CounterResponse, CounterError>)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(url, result)| (url.to_string(), *result))
                    .collect(),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl CounterSource for ScriptedSource {
        async fn fetch(&self, url: &Url) -> Result<CounterResponse, CounterError> {
            self.requested.borrow_mut().push(url.to_string());
            self.responses
                .get(url.as_str())
                .copied()
                .unwrap_or(Err(CounterError::Network))
        }
    }

    const HIT: &str = "https://api.countapi.xyz/hit/portfolio/visits";
    const GET: &str = "https://api.countapi.xyz/get/portfolio/visits";

    fn endpoint() -> CounterEndpoint {
        CounterEndpoint {
            base: Url::parse("https://api.countapi.xyz").expect("valid URL"),
            namespace: "portfolio".to_string(),
            key: "visits".to_string(),
        }
    }

    fn quiet_logger() -> Logger {
        Logger::new(LogLevel::Warn)
    }

    #[test]
    fn endpoint_urls_follow_hit_and_get_shape() {
        let endpoint = CounterEndpoint {
            base: Url::parse("https://counter.example.com/v1/").expect("valid URL"),
            namespace: "my site".to_string(),
            key: "home".to_string(),
        };

        assert_eq!(
            endpoint.hit_url().as_str(),
            "https://counter.example.com/v1/hit/my%20site/home"
        );
        assert_eq!(
            endpoint.get_url().as_str(),
            "https://counter.example.com/v1/get/my%20site/home"
        );
    }

    #[test]
    fn response_decodes_value_field() {
        let response: CounterResponse =
            serde_json::from_str(r#"{"value": 42}"#).expect("valid counter payload");
        assert_eq!(response.value, 42);
        assert!(serde_json::from_str::<CounterResponse>(r#"{"count": 42}"#).is_err());
    }

    #[tokio::test]
    async fn primary_success_shows_incremented_value() {
        let source = ScriptedSource::new(&[(HIT, Ok(CounterResponse { value: 42 }))]);

        let count = fetch_visitor_count(&source, &endpoint(), &quiet_logger()).await;

        assert_eq!(count.display_text(), "Visitors: 42");
        assert_eq!(source.requested.borrow().as_slice(), [HIT]);
    }

    #[tokio::test]
    async fn primary_failure_falls_back_to_read_only_request() {
        let source = ScriptedSource::new(&[
            (HIT, Err(CounterError::Status(503))),
            (GET, Ok(CounterResponse { value: 7 })),
        ]);

        let count = fetch_visitor_count(&source, &endpoint(), &quiet_logger()).await;

        assert_eq!(count.display_text(), "Visitors: 7");
        assert_eq!(source.requested.borrow().as_slice(), [HIT, GET]);
    }

    #[tokio::test]
    async fn both_failures_show_placeholder_without_retrying_hit() {
        let source = ScriptedSource::new(&[
            (HIT, Err(CounterError::Network)),
            (GET, Err(CounterError::Decode)),
        ]);

        let count = fetch_visitor_count(&source, &endpoint(), &quiet_logger()).await;

        assert_eq!(count, VisitorCount::Unavailable);
        assert_eq!(count.display_text(), "Visitors: --");
        let requested = source.requested.borrow();
        assert_eq!(requested.iter().filter(|url| url.as_str() == HIT).count(), 1);
        assert_eq!(requested.len(), 2);
    }

    #[test]
    fn error_classes_are_stable() {
        assert_eq!(CounterError::Network.as_str(), "network");
        assert_eq!(CounterError::Status(502).as_str(), "upstream_5xx");
        assert_eq!(CounterError::Status(404).as_str(), "upstream_non_success");
        assert_eq!(CounterError::Decode.as_str(), "decode");
    }
}
