//! Token generation and verification against session state.

use crate::clock::{Clock, SystemClock};
use crate::config::{CheckOptions, CheckPolicy, CsrfConfig};
use crate::error::{CheckFailure, Result};
use crate::fingerprint::RequestOrigin;
use crate::form::RequestContext;
use crate::nonce::{NONCE_LENGTH, NonceGenerator};
use crate::session::SessionEntryStore;
use crate::token::TokenCodec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Stages of a check, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckStage {
    /// Session entry present
    Session,
    /// Form field present
    Form,
    /// Session entry cleared (non-reusable checks only)
    Consume,
    /// Token origin matches the requester
    Origin,
    /// Submitted token equals the stored one
    Match,
    /// Token younger than the maximum age
    Expiry,
}

impl CheckStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStage::Session => "session",
            CheckStage::Form => "form",
            CheckStage::Consume => "consume",
            CheckStage::Origin => "origin",
            CheckStage::Match => "match",
            CheckStage::Expiry => "expiry",
        }
    }
}

impl fmt::Display for CheckStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a check.
///
/// Holds every failure in the order it was detected. Under
/// [`CheckPolicy::FailFast`] there is at most one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    failures: Vec<(CheckStage, CheckFailure)>,
    consumed: bool,
}

impl CheckReport {
    fn fail(&mut self, stage: CheckStage, failure: CheckFailure) {
        self.failures.push((stage, failure));
    }

    /// True if no stage failed
    pub fn is_pass(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failure reported to callers
    pub fn first_failure(&self) -> Option<CheckFailure> {
        self.failures.first().map(|(_, failure)| *failure)
    }

    /// All failures with the stage that detected them
    pub fn failures(&self) -> &[(CheckStage, CheckFailure)] {
        &self.failures
    }

    /// Whether this check cleared the session entry
    pub fn consumed(&self) -> bool {
        self.consumed
    }

    pub fn into_result(self) -> std::result::Result<(), CheckFailure> {
        match self.first_failure() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

/// Session-bound CSRF guard.
///
/// Issues tokens into a session entry and later checks a submitted token
/// against it. Non-reusable checks clear the entry once both the session and
/// the form carry a token, whatever the outcome of the remaining stages.
///
/// # Examples
///
/// ```
/// use armature_nocsrf::prelude::*;
///
/// let guard = NoCsrf::new(CsrfConfig::default());
/// let session = MemorySessionStore::new();
/// let origin = RequestOrigin::new("203.0.113.7", "Mozilla/5.0");
///
/// let token = guard.generate(&session, "login", &origin).unwrap();
///
/// let request = RequestContext::new(origin).with_field("login", token);
/// assert!(guard.check(&session, "login", &request, &CheckOptions::default()).unwrap());
///
/// // One-time use
/// assert!(!guard.check(&session, "login", &request, &CheckOptions::default()).unwrap());
/// ```
#[derive(Clone)]
pub struct NoCsrf {
    config: Arc<CsrfConfig>,
    clock: Arc<dyn Clock>,
    nonces: NonceGenerator,
}

impl NoCsrf {
    /// Create a guard using the system clock
    pub fn new(config: CsrfConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a guard with a custom time source
    pub fn with_clock(config: CsrfConfig, clock: Arc<dyn Clock>) -> Self {
        debug!(
            origin_check = config.origin_check,
            policy = config.policy.as_str(),
            "Creating CSRF guard"
        );
        Self {
            config: Arc::new(config),
            clock,
            nonces: NonceGenerator::new(),
        }
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// Bind subsequently generated and checked tokens to the requester's
    /// origin
    pub fn enable_origin_check(&mut self) {
        Arc::make_mut(&mut self.config).origin_check = true;
    }

    pub fn origin_check_enabled(&self) -> bool {
        self.config.origin_check
    }

    fn codec(&self) -> TokenCodec {
        TokenCodec::new(self.config.origin_check)
    }

    /// Generate a token for `key` and store it in the session, replacing any
    /// previous one.
    pub fn generate<S>(&self, session: &S, key: &str, origin: &RequestOrigin) -> Result<String>
    where
        S: SessionEntryStore + ?Sized,
    {
        let fingerprint = if self.config.origin_check {
            origin.fingerprint()
        } else {
            String::new()
        };
        let nonce = self.nonces.next(NONCE_LENGTH);
        let token = self.codec().encode(self.clock.now(), &fingerprint, &nonce)?;

        session.set(&self.config.session_key(key), Some(token.clone()))?;
        debug!(key = %key, origin_check = self.config.origin_check, "Generated CSRF token");

        Ok(token)
    }

    /// Run every check stage and report what failed.
    ///
    /// Only session store errors are returned as `Err`; token rejections are
    /// recorded in the report.
    pub fn verify<S>(
        &self,
        session: &S,
        key: &str,
        request: &RequestContext,
        options: &CheckOptions,
    ) -> Result<CheckReport>
    where
        S: SessionEntryStore + ?Sized,
    {
        let fail_fast = self.config.policy == CheckPolicy::FailFast;
        let session_key = self.config.session_key(key);
        let mut report = CheckReport::default();

        let stored = session.get(&session_key)?;
        if stored.is_none() {
            report.fail(CheckStage::Session, CheckFailure::MissingSessionToken);
            if fail_fast {
                return Ok(report);
            }
        }

        let submitted = request.form.get(key);
        if submitted.is_none() {
            report.fail(CheckStage::Form, CheckFailure::MissingFormToken);
        }

        // The remaining stages need both tokens.
        let (Some(stored), Some(submitted)) = (stored, submitted) else {
            return Ok(report);
        };

        if !options.reusable {
            session.set(&session_key, None)?;
            report.consumed = true;
            trace!(key = %key, stage = %CheckStage::Consume, "Consumed CSRF token");
        }

        let decoded = self.codec().decode(&stored);

        if self.config.origin_check
            && !constant_time_compare(&decoded.origin_fingerprint, &request.origin.fingerprint())
        {
            report.fail(CheckStage::Origin, CheckFailure::OriginMismatch);
            if fail_fast {
                return Ok(report);
            }
        }

        if !constant_time_compare(submitted, &stored) {
            report.fail(CheckStage::Match, CheckFailure::TokenMismatch);
            if fail_fast {
                return Ok(report);
            }
        }

        if let Some(max_age) = options.max_age {
            let now = self.clock.now();
            let fresh = decoded
                .issue_time
                .is_some_and(|issued| issued.saturating_add(max_age) >= now);
            if !fresh {
                report.fail(CheckStage::Expiry, CheckFailure::TokenExpired);
            }
        }

        Ok(report)
    }

    /// Check a submitted token.
    ///
    /// Returns `Ok(true)` if the token is valid. On rejection returns
    /// `Ok(false)`, or `Err(CsrfError::Rejected(_))` carrying the first
    /// failure when `options.throw_on_failure` is set. Session store errors
    /// are always returned as `Err`.
    pub fn check<S>(
        &self,
        session: &S,
        key: &str,
        request: &RequestContext,
        options: &CheckOptions,
    ) -> Result<bool>
    where
        S: SessionEntryStore + ?Sized,
    {
        let report = self.verify(session, key, request, options)?;

        let Some(failure) = report.first_failure() else {
            trace!(key = %key, "CSRF token accepted");
            return Ok(true);
        };

        let stage = report.failures()[0].0;
        warn!(
            key = %key,
            stage = %stage,
            reason = failure.kind(),
            failures = report.failures().len(),
            "CSRF token rejected"
        );

        if options.throw_on_failure {
            Err(failure.into())
        } else {
            Ok(false)
        }
    }
}

impl fmt::Debug for NoCsrf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoCsrf")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for NoCsrf {
    fn default() -> Self {
        Self::new(CsrfConfig::default())
    }
}

/// Constant-time string comparison
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
