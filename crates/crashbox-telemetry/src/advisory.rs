//! Newer-build advisory
//!
//! The collector may answer any request with a bare integer: the newest
//! monitor build it knows about. When that is ahead of ours we say so once
//! per process.

use std::sync::atomic::{AtomicBool, Ordering};

use crashbox_core::domain::MONITOR_BUILD;
use tracing::{debug, warn};

/// Longest slice of an unparseable body that ends up in a log line.
const MAX_LOGGED_BODY: usize = 64;

#[derive(Debug)]
pub struct VersionAdvisor {
    current: u64,
    advised: AtomicBool,
}

impl VersionAdvisor {
    pub fn new(current: u64) -> Self {
        Self {
            current,
            advised: AtomicBool::new(false),
        }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    /// Whether the advisory has already been emitted.
    pub fn has_advised(&self) -> bool {
        self.advised.load(Ordering::SeqCst)
    }

    /// Inspects one response body.
    ///
    /// Returns the advertised build only on the call that emitted the
    /// advisory. Empty, malformed, equal or older values yield `None`.
    pub fn inspect(&self, body: &str) -> Option<u64> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }

        let latest = match trimmed.parse::<u64>() {
            Ok(v) => v,
            Err(e) => {
                let excerpt: String = trimmed.chars().take(MAX_LOGGED_BODY).collect();
                debug!(body = %excerpt, error = %e, "Ignoring non-numeric collector response");
                return None;
            }
        };

        if latest <= self.current {
            return None;
        }
        if self.advised.swap(true, Ordering::SeqCst) {
            return None;
        }

        warn!(
            current = self.current,
            latest,
            "A newer crash monitor build is available; consider updating"
        );
        Some(latest)
    }
}

impl Default for VersionAdvisor {
    fn default() -> Self {
        Self::new(MONITOR_BUILD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_build_advises_once() {
        let advisor = VersionAdvisor::default();
        assert_eq!(advisor.inspect("99999999"), Some(99_999_999));
        assert!(advisor.has_advised());
        assert_eq!(advisor.inspect("99999999"), None);
        assert_eq!(advisor.inspect("100000000"), None);
    }

    #[test]
    fn test_same_or_older_build_is_silent() {
        let advisor = VersionAdvisor::default();
        assert_eq!(advisor.inspect(&MONITOR_BUILD.to_string()), None);
        assert_eq!(advisor.inspect("1"), None);
        assert!(!advisor.has_advised());
    }

    #[test]
    fn test_malformed_bodies_are_ignored() {
        let advisor = VersionAdvisor::new(10);
        for body in ["", "  ", "ok", "12abc", "-5", "1.5", "<html>error</html>"] {
            assert_eq!(advisor.inspect(body), None, "body {body:?}");
        }
        assert!(!advisor.has_advised());
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        let advisor = VersionAdvisor::new(10);
        assert_eq!(advisor.inspect(" 11\r\n"), Some(11));
    }
}
