//! Warden CSRF
//!
//! Anti-forgery token lifecycle using the double-submit-cookie pattern:
//! sealed tokens bound to a session and identity, issued pre-auth or
//! authenticated, validated on every guarded state-changing call.
//! Trusted non-browser clients are exempt by user-agent signature.

pub mod cookies;
pub mod guard;
pub mod sealer;

pub use cookies::parse_cookie_header;
pub use guard::{
    session_binding, CsrfConfig, CsrfGuard, CsrfSession, IssuedToken, SESSION_ID_PREFIX,
};
pub use sealer::{TokenClaims, TokenSealer};
