//! # Armature NoCSRF
//!
//! Session-bound, one-time anti-forgery tokens for Armature applications.
//!
//! ## Features
//!
//! - ✅ **Synchronizer tokens** - Token stored in the user's session, echoed in the form
//! - ✅ **One-time use** - A check consumes the session entry unless marked reusable
//! - ✅ **Origin binding** - Optional remote address / user agent fingerprint
//! - ✅ **Expiry** - Optional maximum token age per check
//! - ✅ **Typed failures** - Return `false` or a [`CheckFailure`] per call
//! - ✅ **Pluggable sessions** - Bring your own [`SessionEntryStore`]
//!
//! ## Quick Start
//!
//! ```rust
//! use armature_nocsrf::prelude::*;
//!
//! let guard = NoCsrf::new(CsrfConfig::default());
//! let session = MemorySessionStore::new();
//! let origin = RequestOrigin::new("198.51.100.4", "Mozilla/5.0");
//!
//! // Render `token` into a hidden `login` field
//! let token = guard.generate(&session, "login", &origin).unwrap();
//!
//! // On submit
//! let request = RequestContext::new(origin).with_field("login", token);
//! assert!(guard.check(&session, "login", &request, &CheckOptions::default()).unwrap());
//! ```
//!
//! ## Failure Reasons
//!
//! ```rust
//! use armature_nocsrf::prelude::*;
//!
//! let guard = NoCsrf::default();
//! let session = MemorySessionStore::new();
//! let origin = RequestOrigin::new("198.51.100.4", "Mozilla/5.0");
//! guard.generate(&session, "login", &origin).unwrap();
//!
//! let forged = RequestContext::new(origin).with_field("login", "whateverkey");
//! let options = CheckOptions::new().with_throw_on_failure(true);
//!
//! let err = guard.check(&session, "login", &forged, &options).unwrap_err();
//! assert_eq!(err.failure(), Some(CheckFailure::TokenMismatch));
//! assert_eq!(err.to_string(), "Invalid CSRF token.");
//! ```
//!
//! ## Origin Binding
//!
//! ```rust
//! use armature_nocsrf::prelude::*;
//!
//! let mut guard = NoCsrf::default();
//! guard.enable_origin_check();
//!
//! let session = MemorySessionStore::new();
//! let alice = RequestOrigin::new("198.51.100.4", "Firefox");
//! let token = guard.generate(&session, "transfer", &alice).unwrap();
//!
//! let mallory = RequestOrigin::new("203.0.113.66", "curl");
//! let request = RequestContext::new(mallory).with_field("transfer", token);
//! assert!(!guard.check(&session, "transfer", &request, &CheckOptions::default()).unwrap());
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod form;
pub mod nonce;
pub mod session;
pub mod token;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CheckOptions, CheckPolicy, CsrfConfig};
pub use error::{CheckFailure, CsrfError, Result, SessionError, SessionResult};
pub use fingerprint::{FINGERPRINT_WIDTH, RequestOrigin};
pub use form::{FormData, RequestContext};
pub use nonce::{ALPHABET, NONCE_LENGTH, NonceGenerator};
pub use session::{MemorySessionStore, SessionEntryStore};
pub use token::{DecodedToken, TokenCodec};
pub use validator::{CheckReport, CheckStage, NoCsrf};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{CheckOptions, CheckPolicy, CsrfConfig};
    pub use crate::error::{CheckFailure, CsrfError, Result, SessionError, SessionResult};
    pub use crate::fingerprint::RequestOrigin;
    pub use crate::form::{FormData, RequestContext};
    pub use crate::session::{MemorySessionStore, SessionEntryStore};
    pub use crate::validator::{CheckReport, CheckStage, NoCsrf};
}
