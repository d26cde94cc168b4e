//! # reqlog
//!
//! Request/response logging for HTTP services. One line when a request
//! arrives, one line when its response finishes. Nothing more.
//!
//! ## What it is not
//!
//! reqlog is not a tracing or metrics system. It does not aggregate, sample,
//! export, or persist anything. Every line goes to a [`LogSink`], and by
//! default that sink is whatever `tracing` subscriber the application
//! installed.
//!
//! ## What it does
//!
//! - Times each request from arrival to response completion
//! - Routes completion lines by status: `>= 300` to error severity
//! - Skips requests whose URL contains a configured ignore substring
//! - Redacts sensitive headers before any formatter sees them
//! - Works with `http::Request` directly, with adapter-wrapped requests that
//!   keep the real one under `raw`, or with plain owned shapes
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::convert::Infallible;
//!
//! use hyper::service::service_fn;
//! use reqlog::middleware::{LogService, RequestBody};
//! use reqlog::{Options, RequestLogInterceptor};
//!
//! # async fn serve(io: impl hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static) {
//! let interceptor = RequestLogInterceptor::create(
//!     Options::new()
//!         .ignore_paths(["/healthz", "/readyz"])
//!         .log_headers(true),
//! );
//!
//! let svc = LogService::new(interceptor, service_fn(|_req: hyper::Request<RequestBody<hyper::body::Incoming>>| async {
//!     Ok::<_, Infallible>(hyper::Response::new(String::from("ok")))
//! }));
//!
//! hyper::server::conn::http1::Builder::new()
//!     .serve_connection(io, svc)
//!     .await
//!     .ok();
//! # }
//! ```
//!
//! ```text
//! INFO reqlog::sink: Incoming Request: GET /users/42 [host: localhost:3000, authorization: *****] context=RequestLogInterceptor
//! INFO reqlog::sink: Completed Request: GET /users/42 - 200 (0.41 ms) context=RequestLogInterceptor
//! ```

mod error;
mod format;
mod headers;
mod interceptor;
mod options;
mod sanitize;
mod shape;
mod sink;
mod view;

pub mod middleware;

pub use error::Error;
pub use format::{CompletedFormatter, IncomingFormatter, completed_request_message, incoming_request_message};
pub use headers::{HeaderValue, Headers};
pub use interceptor::RequestLogInterceptor;
pub use options::{
    ENV_IGNORE_PATHS, ENV_LOG_HEADERS, ENV_LOG_REQUEST_BODY, ENV_SENSITIVE_HEADERS, Options,
};
pub use sanitize::{DEFAULT_SENSITIVE_HEADERS, REDACTED, Sanitizer, SensitiveHeaders};
pub use shape::{
    CapturedBody, CompletionSource, FinishListener, FinishSlot, OriginalUri, PlainRequest,
    PlainResponse, RequestShape, ResponseShape,
};
pub use sink::{LogSink, TracingSink};
pub use view::{CompletionView, RequestView, UNKNOWN};
