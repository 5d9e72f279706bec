use std::time::Duration;

use dreamcanvas_core::pagination::DEFAULT_PAGE_SIZE;

/// Default base URL of the image service.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
/// Default interval between training status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// Default ceiling on variations per request.
pub const DEFAULT_MAX_VARIATIONS: u32 = 8;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    pub api_url: String,
    /// Gallery page size.
    pub page_size: u32,
    /// Interval between training status polls.
    pub poll_interval: Duration,
    /// Upper bound on `num_variations`.
    pub max_variations: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_variations: DEFAULT_MAX_VARIATIONS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                     |
    /// |----------------------------------|-----------------------------|
    /// | `DREAMCANVAS_API_URL`            | `http://localhost:5000/api` |
    /// | `DREAMCANVAS_PAGE_SIZE`          | `12`                        |
    /// | `DREAMCANVAS_POLL_INTERVAL_SECS` | `5`                         |
    /// | `DREAMCANVAS_MAX_VARIATIONS`     | `8`                         |
    ///
    /// Unparseable or zero numeric values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("DREAMCANVAS_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        let page_size = positive_or(&lookup, "DREAMCANVAS_PAGE_SIZE", u64::from(DEFAULT_PAGE_SIZE));
        let poll_secs = positive_or(
            &lookup,
            "DREAMCANVAS_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        );
        let max_variations = positive_or(
            &lookup,
            "DREAMCANVAS_MAX_VARIATIONS",
            u64::from(DEFAULT_MAX_VARIATIONS),
        );

        Self {
            api_url,
            page_size: u32::try_from(page_size).unwrap_or(DEFAULT_PAGE_SIZE),
            poll_interval: Duration::from_secs(poll_secs),
            max_variations: u32::try_from(max_variations).unwrap_or(DEFAULT_MAX_VARIATIONS),
        }
    }
}

fn positive_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => value,
        _ => {
            tracing::warn!(key, value = %raw, default, "Invalid configuration value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(ClientConfig::from_lookup(|_| None), ClientConfig::default());
    }

    #[test]
    fn values_read_from_lookup() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("DREAMCANVAS_API_URL", "http://gpu-box:8000/api"),
            ("DREAMCANVAS_PAGE_SIZE", "24"),
            ("DREAMCANVAS_POLL_INTERVAL_SECS", "2"),
            ("DREAMCANVAS_MAX_VARIATIONS", "6"),
        ]));
        assert_eq!(config.api_url, "http://gpu-box:8000/api");
        assert_eq!(config.page_size, 24);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.max_variations, 6);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("DREAMCANVAS_PAGE_SIZE", "zero"),
            ("DREAMCANVAS_POLL_INTERVAL_SECS", "0"),
            ("DREAMCANVAS_API_URL", "  "),
        ]));
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.poll_interval, Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
