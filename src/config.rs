use std::time::Duration;

/// How long category and page listings are served from cache.
pub const DEFAULT_NAVIGATION_TTL: Duration = Duration::from_secs(300);
/// How long a session may sit idle before its cart expires.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_SESSION_CAPACITY: u64 = 10_000;

/// Runtime tunables for the storefront services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub navigation_ttl: Duration,
    pub session_idle_timeout: Duration,
    /// Upper bound on concurrently tracked sessions.
    pub session_capacity: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            navigation_ttl: DEFAULT_NAVIGATION_TTL,
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            session_capacity: DEFAULT_SESSION_CAPACITY,
        }
    }
}

impl Settings {
    /// Overrides defaults with whichever values were supplied.
    pub fn with_overrides(
        navigation_ttl_secs: Option<u64>,
        session_idle_secs: Option<u64>,
        session_capacity: Option<u64>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            navigation_ttl: navigation_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.navigation_ttl),
            session_idle_timeout: session_idle_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle_timeout),
            session_capacity: session_capacity.unwrap_or(defaults.session_capacity),
        }
    }
}
