//! Request-scoped value bundles handed to the message formatters.

use std::time::Duration;

use crate::headers::Headers;

/// Substituted for a method or URL the request shape does not expose.
pub const UNKNOWN: &str = "UNKNOWN";

/// What the interceptor knows about a request when it arrives.
///
/// `headers` have already been through the configured sanitizer. `body` is
/// only filled in when request-body logging is enabled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestView {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
}

/// What the interceptor knows about a request once its response finished.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompletionView {
    pub method: String,
    pub url: String,
    pub status_code: u16,
    /// Elapsed milliseconds, always with exactly two decimals.
    pub duration_ms: String,
}

impl CompletionView {
    pub fn new(method: String, url: String, status_code: u16, elapsed: Duration) -> Self {
        Self { method, url, status_code, duration_ms: format_millis(elapsed) }
    }

    /// Responses at or above 300 are reported at error severity.
    pub fn is_error(&self) -> bool {
        self.status_code >= 300
    }
}

/// `Duration` → `"12.34"` (milliseconds, two decimals).
pub fn format_millis(elapsed: Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64() * 1e3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_have_two_decimals() {
        assert_eq!(format_millis(Duration::ZERO), "0.00");
        assert_eq!(format_millis(Duration::from_micros(1_234_567)), "1234.57");
        assert_eq!(format_millis(Duration::from_nanos(4_999)), "0.00");
        assert_eq!(format_millis(Duration::from_millis(7)), "7.00");
    }

    #[test]
    fn error_boundary_is_300() {
        let view = |status| CompletionView::new("GET".into(), "/".into(), status, Duration::ZERO);
        assert!(!view(200).is_error());
        assert!(!view(299).is_error());
        assert!(view(300).is_error());
        assert!(view(404).is_error());
        assert!(view(500).is_error());
    }
}
