//! Domain error kinds for the extraction & monitoring engine.
//!
//! These are small, matchable enums at the boundaries that need to tag a
//! diagnostic entry or return a specific HTTP status; everything upstream of
//! that collapses into `anyhow::Error` via `?`.

use std::fmt;

/// Failure modes from [`crate::url_guard::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlGuardError {
    InvalidUrl,
    SchemeForbidden,
    LocalhostRefused,
    NotAllowlisted,
    DnsFailed,
    NoRecords,
    PrivateDestination,
}

impl UrlGuardError {
    /// Short machine-readable tag, used in diagnostics and the edit API.
    pub fn kind(&self) -> &'static str {
        match self {
            UrlGuardError::InvalidUrl => "invalid_url",
            UrlGuardError::SchemeForbidden => "scheme_forbidden",
            UrlGuardError::LocalhostRefused => "localhost_refused",
            UrlGuardError::NotAllowlisted => "not_allowlisted",
            UrlGuardError::DnsFailed => "dns_failed",
            UrlGuardError::NoRecords => "no_records",
            UrlGuardError::PrivateDestination => "private_destination",
        }
    }
}

impl fmt::Display for UrlGuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

impl std::error::Error for UrlGuardError {}

/// Failure modes from the headless-browser pool.
#[derive(Debug)]
pub enum BrowserPoolError {
    FetchTimeout,
    BrowserCrashed,
    NavigationFailed(String),
    LaunchFailed(String),
}

impl BrowserPoolError {
    pub fn kind(&self) -> &'static str {
        match self {
            BrowserPoolError::FetchTimeout => "fetch_timeout",
            BrowserPoolError::BrowserCrashed => "browser_crashed",
            BrowserPoolError::NavigationFailed(_) => "navigation_failed",
            BrowserPoolError::LaunchFailed(_) => "navigation_failed",
        }
    }

    /// Whether the underlying error message indicates the CDP session died,
    /// i.e. the browser process itself needs to be re-launched.
    pub fn indicates_dead_session(message: &str) -> bool {
        let m = message.to_ascii_lowercase();
        m.contains("session closed")
            || m.contains("target closed")
            || m.contains("connection closed")
            || m.contains("browser has been closed")
            || m.contains("channel closed")
    }
}

impl fmt::Display for BrowserPoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserPoolError::FetchTimeout => write!(f, "navigation timed out"),
            BrowserPoolError::BrowserCrashed => write!(f, "browser process crashed"),
            BrowserPoolError::NavigationFailed(msg) => write!(f, "navigation failed: {msg}"),
            BrowserPoolError::LaunchFailed(msg) => write!(f, "browser launch failed: {msg}"),
        }
    }
}

impl std::error::Error for BrowserPoolError {}

/// Failure modes from the HTML extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    NoPriceExtracted,
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::NoPriceExtracted => write!(f, "No price extracted"),
        }
    }
}

impl std::error::Error for ExtractionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_guard_kinds_are_stable_tags() {
        assert_eq!(UrlGuardError::PrivateDestination.kind(), "private_destination");
        assert_eq!(UrlGuardError::NotAllowlisted.kind(), "not_allowlisted");
    }

    #[test]
    fn dead_session_detection_is_case_insensitive() {
        assert!(BrowserPoolError::indicates_dead_session("Target Closed"));
        assert!(BrowserPoolError::indicates_dead_session("Session closed."));
        assert!(!BrowserPoolError::indicates_dead_session("navigation timeout of 45000 ms exceeded"));
    }
}
