use std::time::Duration;

use clap::Args;
use url::Url;

pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Connection and scheduling settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// API base URL prefix (empty = same origin as the gateway)
    #[arg(long, env = "KILO_API_URL", default_value = "")]
    pub api_url: String,

    /// Origin that an empty --api-url resolves against
    #[arg(long, env = "KILO_ORIGIN", default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    /// Seconds between pending-notification polls
    #[arg(long, env = "KILO_POLL_INTERVAL_SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "KILO_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

/// Resolved configuration, validated once at startup.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Absolute base every endpoint path is appended to, without trailing slash
    pub base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl TryFrom<&ClientArgs> for ClientConfig {
    type Error = String;

    fn try_from(args: &ClientArgs) -> Result<Self, Self::Error> {
        if args.poll_interval_secs == 0 {
            return Err("poll interval must be at least 1 second".to_string());
        }
        if args.timeout_secs == 0 {
            return Err("HTTP timeout must be at least 1 second".to_string());
        }
        let base_url = resolve_base_url(&args.api_url, &args.origin)?;
        Ok(Self::new(base_url)
            .with_poll_interval(Duration::from_secs(args.poll_interval_secs))
            .with_request_timeout(Duration::from_secs(args.timeout_secs)))
    }
}

/// Resolves the configured API prefix against the origin.
///
/// An empty prefix means "same origin". A relative prefix such as `/kilo` is
/// joined onto the origin; an absolute URL is used as-is.
pub fn resolve_base_url(api_url: &str, origin: &str) -> Result<String, String> {
    let api_url = api_url.trim();
    if api_url.starts_with("http://") || api_url.starts_with("https://") {
        let parsed = Url::parse(api_url).map_err(|e| format!("Invalid API URL '{api_url}': {e}"))?;
        return Ok(parsed.as_str().trim_end_matches('/').to_string());
    }

    let origin = Url::parse(origin).map_err(|e| format!("Invalid origin '{origin}': {e}"))?;
    let joined = if api_url.is_empty() {
        origin
    } else {
        origin
            .join(api_url)
            .map_err(|e| format!("Cannot join '{api_url}' onto origin: {e}"))?
    };
    Ok(joined.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_url_means_same_origin() {
        assert_eq!(
            resolve_base_url("", "http://localhost:8000").unwrap(),
            "http://localhost:8000"
        );
    }

    #[test]
    fn relative_prefix_joins_origin() {
        assert_eq!(
            resolve_base_url("/kilo/", "http://gateway:8000/").unwrap(),
            "http://gateway:8000/kilo"
        );
    }

    #[test]
    fn absolute_api_url_wins() {
        assert_eq!(
            resolve_base_url("https://kilo.example.com/", "http://localhost:8000").unwrap(),
            "https://kilo.example.com"
        );
    }

    #[test]
    fn invalid_origin_is_rejected() {
        assert!(resolve_base_url("", "not a url").is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let args = ClientArgs {
            api_url: String::new(),
            origin: DEFAULT_ORIGIN.to_string(),
            poll_interval_secs: 0,
            timeout_secs: 5,
        };
        assert!(ClientConfig::try_from(&args).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let args = ClientArgs {
            api_url: String::new(),
            origin: DEFAULT_ORIGIN.to_string(),
            poll_interval_secs: 30,
            timeout_secs: 0,
        };
        let err = ClientConfig::try_from(&args).unwrap_err();
        assert!(err.contains("timeout"), "{err}");

        let args = ClientArgs { timeout_secs: 3, ..args };
        let config = ClientConfig::try_from(&args).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }
}
