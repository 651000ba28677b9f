use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8081";
pub const DEFAULT_POLL_MS: u64 = 2_000;
pub const DEFAULT_WINDOW_TICK_MS: u64 = 1_000;
pub const DEFAULT_WINDOW_MS: u64 = 60 * 60 * 1_000;
pub const DEFAULT_STEP_MS: u64 = 5_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

const URL_ENV: &str = "FAULTLINE_URL";
const POLL_MS_ENV: &str = "FAULTLINE_POLL_MS";
const WINDOW_TICK_MS_ENV: &str = "FAULTLINE_WINDOW_TICK_MS";
const WINDOW_MS_ENV: &str = "FAULTLINE_WINDOW_MS";
const STEP_MS_ENV: &str = "FAULTLINE_STEP_MS";
const TIMEOUT_MS_ENV: &str = "FAULTLINE_TIMEOUT_MS";

/// Settings for a viewing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    /// Backend base URL; `/api/graph` is appended.
    pub base_url: String,
    /// Live fetch cadence.
    pub poll_ms: u64,
    /// Live window/cursor refresh cadence.
    pub window_tick_ms: u64,
    /// Width of the scrubbable window.
    pub window_ms: u64,
    /// Magnitude of one back/forward step.
    pub step_ms: u64,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_ms: DEFAULT_POLL_MS,
            window_tick_ms: DEFAULT_WINDOW_TICK_MS,
            window_ms: DEFAULT_WINDOW_MS,
            step_ms: DEFAULT_STEP_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ViewConfig {
    /// Reads `FAULTLINE_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();
        let config = Self {
            base_url: lookup(URL_ENV).unwrap_or(defaults.base_url),
            poll_ms: millis(&lookup, POLL_MS_ENV, defaults.poll_ms)?,
            window_tick_ms: millis(&lookup, WINDOW_TICK_MS_ENV, defaults.window_tick_ms)?,
            window_ms: millis(&lookup, WINDOW_MS_ENV, defaults.window_ms)?,
            step_ms: millis(&lookup, STEP_MS_ENV, defaults.step_ms)?,
            timeout_ms: millis(&lookup, TIMEOUT_MS_ENV, defaults.timeout_ms)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err(format!("{URL_ENV} must not be empty"));
        }
        for (name, value) in [
            ("poll interval", self.poll_ms),
            ("window tick", self.window_tick_ms),
            ("window size", self.window_ms),
            ("step size", self.step_ms),
            ("request timeout", self.timeout_ms),
        ] {
            if value == 0 {
                return Err(format!("{name} must be greater than zero"));
            }
            if i64::try_from(value).is_err() {
                return Err(format!("{name} of {value}ms is out of range"));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn window_tick(&self) -> Duration {
        Duration::from_millis(self.window_tick_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Window size as a signed millisecond offset. Only valid after `validate`.
    pub fn window_span(&self) -> i64 {
        i64::try_from(self.window_ms).unwrap_or(i64::MAX)
    }

    pub fn step_span(&self) -> i64 {
        i64::try_from(self.step_ms).unwrap_or(i64::MAX)
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64, String> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid {key}={raw:?}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_variables_use_defaults() {
        let config = ViewConfig::from_lookup(lookup(&[])).expect("defaults are valid");
        assert_eq!(config, ViewConfig::default());
        assert_eq!(config.window_span(), 3_600_000);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn variables_override_defaults() {
        let config = ViewConfig::from_lookup(lookup(&[
            ("FAULTLINE_URL", "http://graph.internal:9000"),
            ("FAULTLINE_POLL_MS", "500"),
            ("FAULTLINE_WINDOW_MS", " 600000 "),
        ]))
        .expect("valid overrides");
        assert_eq!(config.base_url, "http://graph.internal:9000");
        assert_eq!(config.poll_ms, 500);
        assert_eq!(config.window_ms, 600_000);
        assert_eq!(config.step_ms, DEFAULT_STEP_MS);
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = ViewConfig::from_lookup(lookup(&[("FAULTLINE_STEP_MS", "five")]))
            .expect_err("non-numeric step");
        assert!(err.contains("FAULTLINE_STEP_MS"), "{err}");

        let err = ViewConfig::from_lookup(lookup(&[("FAULTLINE_POLL_MS", "0")]))
            .expect_err("zero poll interval");
        assert!(err.contains("poll interval"), "{err}");
    }
}
