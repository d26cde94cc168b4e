//! The request logging interceptor.
//!
//! # Lifecycle of one request
//!
//! ```text
//! Start ──ignored──▶ Passthrough
//!   │
//!   └──▶ LoggedIncoming ──▶ AwaitingCompletion ──finish──▶ LoggedCompletion
//! ```
//!
//! `AwaitingCompletion` has no timeout. If the host never signals that the
//! response finished (the client hung up, the handler errored out), the
//! listener is dropped without firing and no completion line is written.
//!
//! The incoming line is always written before the completion listener is
//! registered, so for any one request the two lines can never appear out of
//! order.

use std::sync::Arc;
use std::time::Instant;

use tracing::trace;

use crate::options::{Config, Options};
use crate::shape::{self, RequestShape, ResponseShape};
use crate::view::{CompletionView, RequestView};

/// Logs one line when a request arrives and one when its response finishes.
///
/// Cloning is cheap: clones share the same resolved configuration.
#[derive(Clone)]
pub struct RequestLogInterceptor {
    config: Arc<Config>,
}

impl RequestLogInterceptor {
    /// Resolves `options` into a complete configuration.
    ///
    /// Anything left unset falls back to its default on its own; see
    /// [`Options`].
    pub fn create(options: Options) -> Self {
        Self { config: Arc::new(Config::resolve(options)) }
    }

    /// Observes one request and hands it on to `next`.
    ///
    /// `next` receives the request back and is called exactly once, before
    /// this method returns, whatever the logging outcome. Its return value is
    /// passed through untouched.
    ///
    /// The completion line is written later, from whichever thread the host
    /// signals completion on, and only if `response` (or its `raw` response)
    /// exposes a [`CompletionSource`](crate::CompletionSource).
    pub fn handle<Q, R>(
        &self,
        request: Q,
        response: &dyn ResponseShape,
        next: impl FnOnce(Q) -> R,
    ) -> R
    where
        Q: RequestShape,
    {
        let start = Instant::now();

        let method = shape::resolve_method(&request);
        let url = shape::resolve_url(&request);

        if self.config.is_ignored(&url) {
            trace!(%method, %url, "request matches an ignore path, not logging");
            return next(request);
        }

        let view = RequestView {
            headers: (self.config.sanitize)(&shape::resolve_headers(&request)),
            body: if self.config.log_request_body { shape::resolve_body(&request) } else { None },
            method,
            url,
        };
        self.config.sink.log(&(self.config.incoming)(&view));

        match shape::resolve_completion(response) {
            Some(source) => {
                let config = Arc::clone(&self.config);
                let RequestView { method, url, .. } = view;
                source.once_finish(Box::new(move |status| {
                    let done = CompletionView::new(method, url, status, start.elapsed());
                    let message = (config.completed)(&done);
                    if done.is_error() {
                        config.sink.error(&message);
                    } else {
                        config.sink.log(&message);
                    }
                }));
            }
            None => {
                trace!(method = %view.method, url = %view.url, "response cannot signal completion");
            }
        }

        next(request)
    }

    /// Whether a request to `url` would have its body logged.
    ///
    /// Lets hosts skip buffering bodies nobody is going to look at.
    pub fn captures_body_of(&self, url: &str) -> bool {
        self.config.log_request_body && !self.config.is_ignored(url)
    }
}

impl Default for RequestLogInterceptor {
    fn default() -> Self {
        Self::create(Options::default())
    }
}

impl std::fmt::Debug for RequestLogInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLogInterceptor")
            .field("ignore_paths", &self.config.ignore_paths)
            .field("log_request_body", &self.config.log_request_body)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::headers::Headers;
    use crate::sanitize::REDACTED;
    use crate::shape::PlainRequest;
    use crate::shape::PlainResponse;
    use crate::sink::LogSink;

    #[derive(Clone, Debug, Eq, PartialEq)]
    pub(crate) enum Line {
        Log(String),
        Error(String),
    }

    /// Sink that remembers every line it was given.
    #[derive(Clone, Default)]
    pub(crate) struct Recorder(Arc<Mutex<Vec<Line>>>);

    impl Recorder {
        pub(crate) fn lines(&self) -> Vec<Line> {
            self.0.lock().unwrap().clone()
        }
    }

    impl LogSink for Recorder {
        fn log(&self, message: &str) {
            self.0.lock().unwrap().push(Line::Log(message.to_owned()));
        }

        fn error(&self, message: &str) {
            self.0.lock().unwrap().push(Line::Error(message.to_owned()));
        }
    }

    fn interceptor(options: Options) -> (RequestLogInterceptor, Recorder) {
        let recorder = Recorder::default();
        (RequestLogInterceptor::create(options.logger(recorder.clone())), recorder)
    }

    #[test]
    fn get_with_default_config() {
        let (interceptor, recorder) = interceptor(Options::new());
        let res = PlainResponse::new();

        interceptor.handle(PlainRequest::new("GET", "/test"), &res, |_| ());
        assert_eq!(recorder.lines(), vec![Line::Log("Incoming Request: GET /test".into())]);

        res.set_status(200);
        res.finish();

        let lines = recorder.lines();
        assert_eq!(lines.len(), 2);
        match &lines[1] {
            Line::Log(m) => {
                assert!(m.starts_with("Completed Request: GET /test - 200 ("), "{m}");
                assert!(m.ends_with(" ms)"), "{m}");
            }
            other => panic!("expected log severity, got {other:?}"),
        }
    }

    #[test]
    fn not_found_goes_to_error() {
        let (interceptor, recorder) = interceptor(Options::new());
        let res = PlainResponse::new();

        interceptor.handle(PlainRequest::new("POST", "/error"), &res, |_| ());
        res.set_status(404);
        res.finish();

        match &recorder.lines()[1] {
            Line::Error(m) => assert!(m.contains("Completed Request: POST /error - 404"), "{m}"),
            other => panic!("expected error severity, got {other:?}"),
        }
    }

    #[test]
    fn severity_boundary() {
        for (status, is_error) in [(199, false), (299, false), (300, true), (301, true), (503, true)] {
            let (interceptor, recorder) = interceptor(Options::new());
            let res = PlainResponse::new();
            interceptor.handle(PlainRequest::new("GET", "/"), &res, |_| ());
            res.set_status(status);
            res.finish();
            assert_eq!(matches!(recorder.lines()[1], Line::Error(_)), is_error, "status {status}");
        }
    }

    #[test]
    fn status_is_read_when_finished() {
        let (interceptor, recorder) = interceptor(Options::new());
        let res = PlainResponse::new();
        res.set_status(500);

        interceptor.handle(PlainRequest::new("GET", "/late"), &res, |_| ());
        res.set_status(204);
        res.finish();

        assert!(matches!(&recorder.lines()[1], Line::Log(m) if m.contains(" - 204 (")));
    }

    #[test]
    fn missing_method_and_url() {
        let (interceptor, recorder) = interceptor(Options::new());
        interceptor.handle(PlainRequest::default(), &PlainResponse::new(), |_| ());
        assert_eq!(recorder.lines(), vec![Line::Log("Incoming Request: UNKNOWN UNKNOWN".into())]);
    }

    #[test]
    fn ignored_paths_emit_nothing_but_continue() {
        let (interceptor, recorder) = interceptor(Options::new().ignore_paths(["/health"]));
        let res = PlainResponse::new();
        let mut calls = 0;

        let out = interceptor.handle(PlainRequest::new("GET", "/healthz"), &res, |req| {
            calls += 1;
            req.url
        });
        res.finish();

        assert_eq!(calls, 1);
        assert_eq!(out.as_deref(), Some("/healthz"));
        assert!(recorder.lines().is_empty());
    }

    #[test]
    fn continuation_called_once_on_logged_path() {
        let (interceptor, _recorder) = interceptor(Options::new());
        let mut calls = 0;
        interceptor.handle(PlainRequest::new("GET", "/"), &PlainResponse::detached(), |_| calls += 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn custom_formatters() {
        let (interceptor, recorder) = interceptor(
            Options::new()
                .incoming_request_message(|r| format!("--> {} {}", r.method, r.url))
                .completed_request_message(|c| {
                    format!("<-- {} {} {} {}", c.method, c.url, c.status_code, c.duration_ms.len() > 3)
                }),
        );
        let res = PlainResponse::new();

        interceptor.handle(PlainRequest::new("PUT", "/items/3"), &res, |_| ());
        res.set_status(201);
        res.finish();

        assert_eq!(recorder.lines(), vec![
            Line::Log("--> PUT /items/3".into()),
            Line::Log("<-- PUT /items/3 201 true".into()),
        ]);
    }

    #[test]
    fn formatter_sees_sanitized_headers_in_order() {
        let seen = Arc::new(Mutex::new(None));
        let s = Arc::clone(&seen);
        let (interceptor, _recorder) = interceptor(Options::new().incoming_request_message(move |r| {
            *s.lock().unwrap() = Some(r.headers.clone());
            String::new()
        }));

        let headers = Headers::new()
            .with("Accept", "*/*")
            .with("Authorization", "Bearer t")
            .with("X-Api-Key", "k")
            .with("User-Agent", "curl");
        interceptor.handle(PlainRequest::new("GET", "/").with_headers(headers), &PlainResponse::new(), |_| ());

        let seen = seen.lock().unwrap().clone().unwrap();
        let rendered: Vec<_> = seen.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(rendered, vec![
            "Accept=*/*".to_owned(),
            format!("Authorization={REDACTED}"),
            format!("X-Api-Key={REDACTED}"),
            "User-Agent=curl".to_owned(),
        ]);
    }

    #[test]
    fn log_headers_and_body() {
        let (interceptor, recorder) = interceptor(Options::new().log_headers(true).log_request_body(true));
        let req = PlainRequest::new("POST", "/login")
            .with_headers(Headers::new().with("cookie", "sid=1"))
            .with_body("user=alice");

        interceptor.handle(req, &PlainResponse::new(), |_| ());

        assert_eq!(recorder.lines(), vec![Line::Log(format!(
            "Incoming Request: POST /login [cookie: {REDACTED}] body=user=alice"
        ))]);
    }

    #[test]
    fn body_not_captured_by_default() {
        let (interceptor, recorder) = interceptor(Options::new());
        interceptor.handle(PlainRequest::new("POST", "/x").with_body("secret"), &PlainResponse::new(), |_| ());
        assert_eq!(recorder.lines(), vec![Line::Log("Incoming Request: POST /x".into())]);
    }

    #[test]
    fn adapter_wrapped_request_and_response() {
        let (interceptor, recorder) = interceptor(Options::new());
        let res = PlainResponse::wrapping(PlainResponse::new());

        interceptor.handle(PlainRequest::wrapping(PlainRequest::new("GET", "/wrapped")), &res, |_| ());
        res.set_status(302);
        res.finish();

        let lines = recorder.lines();
        assert_eq!(lines[0], Line::Log("Incoming Request: GET /wrapped".into()));
        assert!(matches!(&lines[1], Line::Error(m) if m.contains("GET /wrapped - 302")));
    }

    #[test]
    fn no_completion_capability_degrades_silently() {
        let (interceptor, recorder) = interceptor(Options::new());
        let res = PlainResponse::detached();

        interceptor.handle(PlainRequest::new("GET", "/quiet"), &res, |_| ());
        res.finish();

        assert_eq!(recorder.lines(), vec![Line::Log("Incoming Request: GET /quiet".into())]);
    }

    #[test]
    fn never_finished_stays_at_one_line() {
        let (interceptor, recorder) = interceptor(Options::new());
        let res = PlainResponse::new();
        interceptor.handle(PlainRequest::new("GET", "/hang"), &res, |_| ());
        drop(res);
        assert_eq!(recorder.lines().len(), 1);
    }

    #[test]
    fn duration_is_two_decimals() {
        let durations = Arc::new(Mutex::new(Vec::new()));
        let d = Arc::clone(&durations);
        let (interceptor, _recorder) = interceptor(Options::new().completed_request_message(move |c| {
            d.lock().unwrap().push(c.duration_ms.clone());
            String::new()
        }));
        let res = PlainResponse::new();
        interceptor.handle(PlainRequest::new("GET", "/"), &res, |_| ());
        std::thread::sleep(std::time::Duration::from_millis(2));
        res.finish();

        let duration = durations.lock().unwrap()[0].clone();
        let (whole, frac) = duration.split_once('.').unwrap();
        assert_eq!(frac.len(), 2);
        assert!(whole.parse::<u64>().unwrap() >= 2);
    }
}
