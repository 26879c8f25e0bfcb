use crate::error::{CsrfError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a check proceeds after the first failing stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPolicy {
    /// Stop at the first failure
    FailFast,
    /// Run every stage and record all failures; the first one is reported
    #[default]
    Accumulate,
}

impl CheckPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckPolicy::FailFast => "fail_fast",
            CheckPolicy::Accumulate => "accumulate",
        }
    }
}

impl std::str::FromStr for CheckPolicy {
    type Err = CsrfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(CheckPolicy::FailFast),
            "accumulate" => Ok(CheckPolicy::Accumulate),
            other => Err(CsrfError::config(format!("Unknown check policy: {other}"))),
        }
    }
}

/// CSRF guard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Bind tokens to the requester's remote address and user agent.
    ///
    /// Must have the same value when a token is generated and when it is
    /// checked.
    pub origin_check: bool,

    /// Prefix applied to the key when addressing the session entry
    pub session_prefix: String,

    /// Stage sequencing policy
    pub policy: CheckPolicy,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            origin_check: false,
            session_prefix: "csrf_".to_string(),
            policy: CheckPolicy::Accumulate,
        }
    }
}

impl CsrfConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables.
    ///
    /// Uses the following environment variables:
    /// - `NOCSRF_ORIGIN_CHECK`: `true`/`false`/`1`/`0` (default: false)
    /// - `NOCSRF_SESSION_PREFIX`: session key prefix (default: `csrf_`)
    /// - `NOCSRF_CHECK_POLICY`: `fail_fast` or `accumulate` (default: accumulate)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("NOCSRF_ORIGIN_CHECK") {
            config.origin_check = parse_bool(&value)
                .ok_or_else(|| CsrfError::config("Invalid NOCSRF_ORIGIN_CHECK"))?;
        }

        if let Ok(prefix) = std::env::var("NOCSRF_SESSION_PREFIX") {
            config.session_prefix = prefix;
        }

        if let Ok(policy) = std::env::var("NOCSRF_CHECK_POLICY") {
            config.policy = policy.parse()?;
        }

        debug!(
            origin_check = config.origin_check,
            policy = config.policy.as_str(),
            "Loaded CSRF configuration from environment"
        );

        Ok(config)
    }

    /// Enable or disable origin binding
    pub fn with_origin_check(mut self, enabled: bool) -> Self {
        self.origin_check = enabled;
        self
    }

    /// Set session key prefix
    pub fn with_session_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.session_prefix = prefix.into();
        self
    }

    /// Set stage sequencing policy
    pub fn with_policy(mut self, policy: CheckPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Session key under which the token for `key` lives
    pub fn session_key(&self, key: &str) -> String {
        format!("{}{}", self.session_prefix, key)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Per-call options for a token check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// Surface failures as `Err` instead of `Ok(false)`
    pub throw_on_failure: bool,

    /// Maximum token age in seconds
    pub max_age: Option<i64>,

    /// Leave the session entry in place so the token can be checked again
    pub reusable: bool,
}

impl CheckOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return failures as errors
    pub fn with_throw_on_failure(mut self, throw: bool) -> Self {
        self.throw_on_failure = throw;
        self
    }

    /// Reject tokens older than `seconds`
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_reusable(mut self, reusable: bool) -> Self {
        self.reusable = reusable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CsrfConfig::default();
        assert!(!config.origin_check);
        assert_eq!(config.session_prefix, "csrf_");
        assert_eq!(config.policy, CheckPolicy::Accumulate);
        assert_eq!(config.session_key("login"), "csrf_login");
    }

    #[test]
    fn test_config_builder() {
        let config = CsrfConfig::new()
            .with_origin_check(true)
            .with_session_prefix("")
            .with_policy(CheckPolicy::FailFast);

        assert!(config.origin_check);
        assert_eq!(config.session_key("login"), "login");
        assert_eq!(config.policy, CheckPolicy::FailFast);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: CsrfConfig =
            serde_json::from_str(r#"{"origin_check": true, "policy": "fail_fast"}"#).unwrap();

        assert!(config.origin_check);
        assert_eq!(config.session_prefix, "csrf_");
        assert_eq!(config.policy, CheckPolicy::FailFast);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("fail-fast".parse::<CheckPolicy>().unwrap(), CheckPolicy::FailFast);
        assert_eq!(" Accumulate ".parse::<CheckPolicy>().unwrap(), CheckPolicy::Accumulate);
        assert!("sometimes".parse::<CheckPolicy>().is_err());
    }

    // Environment is process-global, so every NOCSRF_* case lives in this one test.
    #[test]
    fn test_config_from_env() {
        const VARS: [&str; 3] = [
            "NOCSRF_ORIGIN_CHECK",
            "NOCSRF_SESSION_PREFIX",
            "NOCSRF_CHECK_POLICY",
        ];
        let clear = || {
            for var in VARS {
                unsafe { std::env::remove_var(var) };
            }
        };

        clear();
        assert_eq!(CsrfConfig::from_env().unwrap(), CsrfConfig::default());

        unsafe {
            std::env::set_var("NOCSRF_ORIGIN_CHECK", "yes");
            std::env::set_var("NOCSRF_SESSION_PREFIX", "_token.");
            std::env::set_var("NOCSRF_CHECK_POLICY", "fail-fast");
        }
        let config = CsrfConfig::from_env().unwrap();
        assert!(config.origin_check);
        assert_eq!(config.session_prefix, "_token.");
        assert_eq!(config.policy, CheckPolicy::FailFast);

        unsafe { std::env::set_var("NOCSRF_ORIGIN_CHECK", "maybe") };
        assert!(matches!(CsrfConfig::from_env(), Err(CsrfError::Config(_))));

        unsafe {
            std::env::set_var("NOCSRF_ORIGIN_CHECK", "0");
            std::env::set_var("NOCSRF_CHECK_POLICY", "sometimes");
        }
        assert!(matches!(CsrfConfig::from_env(), Err(CsrfError::Config(_))));

        clear();
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("OFF"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_check_options() {
        let options = CheckOptions::default();
        assert!(!options.throw_on_failure);
        assert_eq!(options.max_age, None);
        assert!(!options.reusable);

        let options = CheckOptions::new()
            .with_throw_on_failure(true)
            .with_max_age(300)
            .with_reusable(true);
        assert!(options.throw_on_failure);
        assert_eq!(options.max_age, Some(300));
        assert!(options.reusable);
    }
}
