//! Where log lines go.
//!
//! The interceptor never writes anywhere itself. It hands finished messages
//! to a [`LogSink`], chosen once at construction.

use tracing::{error, info};

/// A destination for log lines at two severities.
pub trait LogSink: Send + Sync + 'static {
    fn log(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default sink: forwards to the `tracing` subscriber the host installed.
///
/// `log` becomes an `INFO` event, `error` an `ERROR` event, both tagged with
/// a `context` field.
#[derive(Clone, Debug)]
pub struct TracingSink {
    context: String,
}

impl TracingSink {
    pub const DEFAULT_CONTEXT: &'static str = "RequestLogInterceptor";

    pub fn new(context: impl Into<String>) -> Self {
        Self { context: context.into() }
    }

    pub fn context(&self) -> &str { &self.context }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CONTEXT)
    }
}

impl LogSink for TracingSink {
    fn log(&self, message: &str) {
        info!(context = %self.context, "{message}");
    }

    fn error(&self, message: &str) {
        error!(context = %self.context, "{message}");
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[traced_test]
    #[test]
    fn forwards_to_tracing() {
        let sink = TracingSink::new("api");
        sink.log("Incoming Request: GET /");
        sink.error("Completed Request: GET / - 500 (1.00 ms)");

        assert!(logs_contain("Incoming Request: GET /"));
        assert!(logs_contain("Completed Request: GET / - 500"));
        assert!(logs_contain("ERROR"));
        assert!(logs_contain("context=api"));
    }
}
