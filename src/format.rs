//! Log message formatters.
//!
//! A formatter is any `Fn(&View) -> String`. The built-in ones produce:
//!
//! ```text
//! Incoming Request: GET /users/42
//! Completed Request: GET /users/42 - 200 (3.17 ms)
//! ```
//!
//! A custom formatter that panics is not caught: the panic unwinds into the
//! host exactly as a panicking handler would.

use std::sync::Arc;

use crate::view::{CompletionView, RequestView};

pub type IncomingFormatter = Arc<dyn Fn(&RequestView) -> String + Send + Sync + 'static>;
pub type CompletedFormatter = Arc<dyn Fn(&CompletionView) -> String + Send + Sync + 'static>;

pub fn incoming_request_message(view: &RequestView) -> String {
    format!("Incoming Request: {} {}", view.method, view.url)
}

pub fn completed_request_message(view: &CompletionView) -> String {
    format!(
        "Completed Request: {} {} - {} ({} ms)",
        view.method, view.url, view.status_code, view.duration_ms,
    )
}

/// The default incoming formatter, extended with the sanitized headers
/// and/or the captured body when the corresponding flags are set.
pub(crate) fn default_incoming(log_headers: bool) -> IncomingFormatter {
    Arc::new(move |view: &RequestView| {
        let mut message = incoming_request_message(view);
        if log_headers && !view.headers.is_empty() {
            message.push(' ');
            message.push_str(&view.headers.to_string());
        }
        if let Some(body) = &view.body {
            message.push_str(" body=");
            message.push_str(body);
        }
        message
    })
}

pub(crate) fn default_completed() -> CompletedFormatter {
    Arc::new(completed_request_message)
}
