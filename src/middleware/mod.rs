//! Middleware layer.
//!
//! Glue between [`RequestLogInterceptor`](crate::RequestLogInterceptor) and
//! hyper. Wrap any hyper service in [`LogService`] and every request it
//! serves gets an incoming line and, once the response body has been fully
//! produced, a completion line.
//!
//! The inner service receives a [`RequestBody`]: the original body, or an
//! in-memory replay of it when request-body logging captured it first.
//!
//! ```rust,no_run
//! use std::convert::Infallible;
//!
//! use hyper::service::service_fn;
//! use reqlog::middleware::{LogService, RequestBody};
//! use reqlog::{Options, RequestLogInterceptor};
//!
//! # fn demo() {
//! let interceptor = RequestLogInterceptor::create(Options::new().ignore_paths(["/healthz"]));
//! let svc = LogService::new(interceptor, service_fn(|_req: hyper::Request<RequestBody<hyper::body::Incoming>>| async {
//!     Ok::<_, Infallible>(hyper::Response::new(String::from("ok")))
//! }));
//! # let _ = svc;
//! # }
//! ```

mod service;

pub use service::{FinishBody, LogService, MAX_CAPTURED_BODY, RequestBody};
