//! Session configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// How long an error stays on the banner unless replaced or dismissed.
pub const DEFAULT_ERROR_TTL: Duration = Duration::from_millis(3000);

/// Owner of every todo the session reads or writes. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(u64);

impl UserId {
    pub fn new(id: u64) -> Result<Self, ConfigError> {
        if id == 0 {
            return Err(ConfigError::MissingUserId);
        }
        Ok(Self(id))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: String,
    pub user_id: UserId,
    pub error_ttl: Duration,
}

impl SessionConfig {
    /// Fails when `user_id` is zero; hosts show the missing-user warning
    /// instead of starting a session.
    pub fn new(base_url: &str, user_id: u64) -> Result<Self, ConfigError> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        Ok(Self {
            base_url: base_url.to_string(),
            user_id: UserId::new(user_id)?,
            error_ttl: DEFAULT_ERROR_TTL,
        })
    }

    pub fn with_error_ttl(mut self, ttl: Duration) -> Self {
        self.error_ttl = ttl;
        self
    }
}
