//! The transient error banner.
//!
//! Holds at most one `ErrorKind` together with the instant it expires.
//! Raising a new error replaces the previous one and restarts the window.
//! Time is passed in explicitly so the session can drive it from
//! `tokio::time` and tests can pin it.

use std::time::Duration;

use tokio::time::Instant;

use crate::types::ErrorKind;

#[derive(Debug, Clone)]
pub struct ErrorBanner {
    ttl: Duration,
    active: Option<(ErrorKind, Instant)>,
}

impl ErrorBanner {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, active: None }
    }

    pub fn current(&self) -> Option<ErrorKind> {
        self.active.map(|(kind, _)| kind)
    }

    /// What is showing at `now`, ignoring an error whose deadline passed.
    pub fn current_at(&self, now: Instant) -> Option<ErrorKind> {
        self.active
            .filter(|&(_, deadline)| now < deadline)
            .map(|(kind, _)| kind)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.active.map(|(_, deadline)| deadline)
    }

    pub fn raise(&mut self, kind: ErrorKind, now: Instant) {
        self.active = Some((kind, now + self.ttl));
    }

    pub fn dismiss(&mut self) -> Option<ErrorKind> {
        self.active.take().map(|(kind, _)| kind)
    }

    /// Clears the banner if its deadline has passed, returning what was shown.
    pub fn expire(&mut self, now: Instant) -> Option<ErrorKind> {
        match self.active {
            Some((kind, deadline)) if now >= deadline => {
                self.active = None;
                Some(kind)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_millis(3000);

    #[test]
    fn expires_once_after_ttl() {
        let start = Instant::now();
        let mut banner = ErrorBanner::new(TTL);
        banner.raise(ErrorKind::UnableAddTodo, start);

        assert_eq!(banner.expire(start + Duration::from_millis(2999)), None);
        assert_eq!(banner.current(), Some(ErrorKind::UnableAddTodo));
        assert_eq!(banner.expire(start + TTL), Some(ErrorKind::UnableAddTodo));
        assert_eq!(banner.expire(start + TTL * 2), None);
        assert_eq!(banner.current(), None);
    }

    #[test]
    fn new_error_restarts_window() {
        let start = Instant::now();
        let mut banner = ErrorBanner::new(TTL);
        banner.raise(ErrorKind::UnableAddTodo, start);
        banner.raise(ErrorKind::UnableDeleteTodo, start + Duration::from_secs(2));

        assert_eq!(banner.expire(start + TTL), None);
        assert_eq!(banner.current(), Some(ErrorKind::UnableDeleteTodo));
        assert_eq!(banner.deadline(), Some(start + Duration::from_secs(5)));
    }

    #[test]
    fn current_at_hides_overdue_error() {
        let start = Instant::now();
        let mut banner = ErrorBanner::new(TTL);
        banner.raise(ErrorKind::UnableLoadTodo, start);

        assert_eq!(banner.current_at(start), Some(ErrorKind::UnableLoadTodo));
        assert_eq!(banner.current_at(start + TTL), None);
        // still pending expiry, so the event fires once
        assert_eq!(banner.expire(start + TTL), Some(ErrorKind::UnableLoadTodo));
    }

    #[test]
    fn dismiss_clears_immediately() {
        let mut banner = ErrorBanner::new(TTL);
        banner.raise(ErrorKind::EmptyTodoTitle, Instant::now());
        assert_eq!(banner.dismiss(), Some(ErrorKind::EmptyTodoTitle));
        assert_eq!(banner.deadline(), None);
        assert_eq!(banner.dismiss(), None);
    }
}
