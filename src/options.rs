//! Interceptor configuration.
//!
//! [`Options`] is what the host writes: every field optional, set through a
//! fluent builder or read from the environment. [`Config`] is what the
//! interceptor runs with: every field present, resolved once at construction
//! and shared read-only by every request afterwards.
//!
//! Resolution is field by field. Supplying a custom sink does not discard the
//! default formatters, supplying formatters does not discard the default
//! sanitizer, and so on.
//!
//! ```rust
//! use reqlog::{Options, RequestLogInterceptor};
//!
//! let interceptor = RequestLogInterceptor::create(
//!     Options::new()
//!         .ignore_paths(["/healthz", "/readyz"])
//!         .sensitive_headers(["authorization", "x-session"])
//!         .completed_request_message(|done| {
//!             format!("{} {} -> {}", done.method, done.url, done.status_code)
//!         }),
//! );
//! # let _ = interceptor;
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::format::{self, CompletedFormatter, IncomingFormatter};
use crate::headers::Headers;
use crate::sanitize::{Sanitizer, SensitiveHeaders};
use crate::sink::{LogSink, TracingSink};
use crate::view::{CompletionView, RequestView};

// ── Environment ───────────────────────────────────────────────────────────────

pub const ENV_IGNORE_PATHS: &str      = "REQLOG_IGNORE_PATHS";
pub const ENV_SENSITIVE_HEADERS: &str = "REQLOG_SENSITIVE_HEADERS";
pub const ENV_LOG_HEADERS: &str       = "REQLOG_LOG_HEADERS";
pub const ENV_LOG_REQUEST_BODY: &str  = "REQLOG_LOG_REQUEST_BODY";

// ── Options ───────────────────────────────────────────────────────────────────

/// Partial interceptor configuration.
#[derive(Default)]
pub struct Options {
    logger: Option<Arc<dyn LogSink>>,
    ignore_paths: Option<Vec<String>>,
    sensitive_headers: Option<SensitiveHeaders>,
    sanitize_headers: Option<Sanitizer>,
    incoming_request_message: Option<IncomingFormatter>,
    completed_request_message: Option<CompletedFormatter>,
    log_headers: Option<bool>,
    log_request_body: Option<bool>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `REQLOG_*` variables from the process environment.
    ///
    /// See [`Options::from_vars`] for the recognised variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(std::env::vars())
    }

    /// Builds options from `(name, value)` pairs.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `REQLOG_IGNORE_PATHS` | comma-separated ignore substrings |
    /// | `REQLOG_SENSITIVE_HEADERS` | comma-separated header names to redact |
    /// | `REQLOG_LOG_HEADERS` | boolean |
    /// | `REQLOG_LOG_REQUEST_BODY` | boolean |
    ///
    /// Unrelated variables are ignored. Variables left unset stay unset, so
    /// the builder methods can still fill them in afterwards.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::new();
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                ENV_IGNORE_PATHS      => options = options.ignore_paths(split_list(value)),
                ENV_SENSITIVE_HEADERS => options = options.sensitive_headers(split_list(value)),
                ENV_LOG_HEADERS       => options = options.log_headers(parse_flag(key, value)?),
                ENV_LOG_REQUEST_BODY  => options = options.log_request_body(parse_flag(key, value)?),
                _                     => {}
            }
        }
        Ok(options)
    }

    /// Sink for every log line. Defaults to [`TracingSink`].
    pub fn logger(mut self, sink: impl LogSink) -> Self {
        self.logger = Some(Arc::new(sink));
        self
    }

    /// Like [`Options::logger`], for a sink the host keeps a handle to.
    pub fn shared_logger(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.logger = Some(sink);
        self
    }

    /// Requests whose URL contains any of these substrings are not logged.
    pub fn ignore_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Header names (any case) whose values the default sanitizer redacts.
    pub fn sensitive_headers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sensitive_headers = Some(SensitiveHeaders::new(names));
        self
    }

    /// Replaces the default sanitizer entirely.
    pub fn sanitize_headers<F>(mut self, f: F) -> Self
    where
        F: Fn(&Headers) -> Headers + Send + Sync + 'static,
    {
        self.sanitize_headers = Some(Arc::new(f));
        self
    }

    pub fn incoming_request_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestView) -> String + Send + Sync + 'static,
    {
        self.incoming_request_message = Some(Arc::new(f));
        self
    }

    pub fn completed_request_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&CompletionView) -> String + Send + Sync + 'static,
    {
        self.completed_request_message = Some(Arc::new(f));
        self
    }

    /// Append sanitized headers to the default incoming message.
    pub fn log_headers(mut self, enabled: bool) -> Self {
        self.log_headers = Some(enabled);
        self
    }

    /// Capture the request body, when the request shape exposes one.
    pub fn log_request_body(mut self, enabled: bool) -> Self {
        self.log_request_body = Some(enabled);
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("logger", &self.logger.is_some())
            .field("ignore_paths", &self.ignore_paths)
            .field("sensitive_headers", &self.sensitive_headers)
            .field("sanitize_headers", &self.sanitize_headers.is_some())
            .field("incoming_request_message", &self.incoming_request_message.is_some())
            .field("completed_request_message", &self.completed_request_message.is_some())
            .field("log_headers", &self.log_headers)
            .field("log_request_body", &self.log_request_body)
            .finish()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_flag(var: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on"  => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidFlag { var: var.to_owned(), value: value.to_owned() }),
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

/// Fully resolved configuration. Immutable once built.
pub(crate) struct Config {
    pub(crate) sink: Arc<dyn LogSink>,
    pub(crate) ignore_paths: Vec<String>,
    pub(crate) sanitize: Sanitizer,
    pub(crate) incoming: IncomingFormatter,
    pub(crate) completed: CompletedFormatter,
    pub(crate) log_request_body: bool,
}

impl Config {
    pub(crate) fn resolve(options: Options) -> Self {
        let log_headers = options.log_headers.unwrap_or(false);

        let sanitize = options.sanitize_headers.unwrap_or_else(|| {
            options.sensitive_headers.unwrap_or_default().into_sanitizer()
        });

        Self {
            sink: options.logger.unwrap_or_else(|| Arc::new(TracingSink::default())),
            ignore_paths: options.ignore_paths.unwrap_or_default(),
            sanitize,
            incoming: options.incoming_request_message
                .unwrap_or_else(|| format::default_incoming(log_headers)),
            completed: options.completed_request_message
                .unwrap_or_else(format::default_completed),
            log_request_body: options.log_request_body.unwrap_or(false),
        }
    }

    /// Plain substring containment against every ignore entry.
    pub(crate) fn is_ignored(&self, url: &str) -> bool {
        self.ignore_paths.iter().any(|p| url.contains(p.as_str()))
    }
}
