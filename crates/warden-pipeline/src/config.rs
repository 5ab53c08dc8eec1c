//! Declarative endpoint configuration.

use warden_access::ResourceAccessConfig;
use warden_ratelimit::RateLimitConfig;

/// Authentication tier an endpoint requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthLevel {
    /// No identity checks; CSRF and rate limiting still apply.
    None,
    /// An identity assertion must be present.
    #[default]
    Authenticated,
    /// Authenticated with a verified email or phone.
    Verified,
    /// Verified with onboarding complete.
    Onboarded,
}

/// Everything the composer needs to guard one endpoint.
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    /// Required authentication tier.
    pub auth: AuthLevel,
    /// Quota enforcement, when configured.
    pub rate_limit: Option<RateLimitConfig>,
    /// Whether state-changing browser calls need an anti-forgery token.
    pub csrf: bool,
    /// Resource permission evaluation, when the endpoint names one.
    pub resource: Option<ResourceAccessConfig>,
}

impl EndpointConfig {
    /// Configuration requiring only the given tier.
    pub fn new(auth: AuthLevel) -> Self {
        Self {
            auth,
            ..Self::default()
        }
    }

    /// Enable rate limiting.
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    /// Enable CSRF protection.
    pub fn with_csrf(mut self) -> Self {
        self.csrf = true;
        self
    }

    /// Attach resource permission evaluation.
    pub fn with_resource(mut self, config: ResourceAccessConfig) -> Self {
        self.resource = Some(config);
        self
    }
}
