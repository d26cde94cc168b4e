//! Header redaction.

use std::collections::HashSet;
use std::sync::Arc;

use crate::headers::{HeaderValue, Headers};

/// Replacement value for every sensitive header.
pub const REDACTED: &str = "*****";

/// Header names redacted when the host supplies no set of its own.
pub const DEFAULT_SENSITIVE_HEADERS: [&str; 4] = [
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
];

/// A header sanitizer: receives the request headers, returns what gets logged.
pub type Sanitizer = Arc<dyn Fn(&Headers) -> Headers + Send + Sync + 'static>;

/// Lower-cased set of sensitive header names.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SensitiveHeaders(HashSet<String>);

impl SensitiveHeaders {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(names.into_iter().map(|n| n.as_ref().to_ascii_lowercase()).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&name.to_ascii_lowercase())
    }

    /// Copies `headers`, replacing the value of every sensitive entry with
    /// [`REDACTED`]. Order and all other entries are untouched.
    pub fn redact(&self, headers: &Headers) -> Headers {
        headers.iter()
            .map(|(name, value)| {
                let value = if self.contains(name) {
                    HeaderValue::from(REDACTED)
                } else {
                    value.clone()
                };
                (name.to_owned(), value)
            })
            .collect()
    }

    /// Turns the set into a [`Sanitizer`].
    pub fn into_sanitizer(self) -> Sanitizer {
        Arc::new(move |headers: &Headers| self.redact(headers))
    }
}

impl Default for SensitiveHeaders {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_HEADERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_case_varied_names_in_place() {
        let headers = Headers::new()
            .with("Accept", "application/json")
            .with("Authorization", "Bearer secret")
            .with("X-Request-Id", "abc")
            .with("COOKIE", vec!["a=1".to_owned(), "b=2".to_owned()]);

        let redacted = SensitiveHeaders::default().redact(&headers);

        let entries: Vec<_> = redacted.iter()
            .map(|(k, v)| (k.to_owned(), v.to_string()))
            .collect();
        assert_eq!(entries, vec![
            ("Accept".to_owned(),        "application/json".to_owned()),
            ("Authorization".to_owned(), REDACTED.to_owned()),
            ("X-Request-Id".to_owned(),  "abc".to_owned()),
            ("COOKIE".to_owned(),        REDACTED.to_owned()),
        ]);
    }

    #[test]
    fn custom_set_replaces_defaults() {
        let set = SensitiveHeaders::new(["X-Tenant"]);
        assert!(set.contains("x-tenant"));
        assert!(!set.contains("authorization"));

        let sanitize = set.into_sanitizer();
        let out = sanitize(&Headers::new().with("authorization", "t").with("x-tenant", "acme"));
        assert_eq!(out.get("authorization"), Some(&HeaderValue::from("t")));
        assert_eq!(out.get("x-tenant"), Some(&HeaderValue::from(REDACTED)));
    }
}
