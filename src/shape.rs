//! Request and response shapes.
//!
//! Hosts do not agree on what a request looks like. Some hand the
//! interceptor their own request object directly, others wrap it in an
//! adapter that keeps the underlying request under a `raw` handle, and the
//! URL may live in `url` or in `original_url` depending on routing.
//!
//! Rather than branching on which host is in use, the interceptor asks each
//! shape for *capabilities* and takes the first one present, in a fixed
//! order: direct field first, then the same field on [`RequestShape::raw`].
//! Every capability is optional. A shape that exposes nothing still yields a
//! usable [`RequestView`](crate::RequestView) full of sentinels.
//!
//! ```text
//! method   direct.method → raw.method → "UNKNOWN"
//! url      direct.url → direct.original_url → raw.url → raw.original_url → "UNKNOWN"
//! headers  direct.headers → raw.headers → empty
//! finish   direct.completion → raw.completion → (no completion line)
//! ```

use std::sync::Mutex;

use bytes::Bytes;

use crate::headers::Headers;
use crate::view::UNKNOWN;

/// One-shot callback fired when a response finishes.
///
/// Receives the status code as it stands at that moment, which may differ
/// from whatever it was when the listener was registered.
pub type FinishListener = Box<dyn FnOnce(u16) + Send + 'static>;

// ── Traits ────────────────────────────────────────────────────────────────────

/// Capabilities the interceptor probes on an incoming request.
pub trait RequestShape {
    fn method(&self) -> Option<&str> { None }
    fn url(&self) -> Option<&str> { None }
    fn original_url(&self) -> Option<&str> { None }
    fn headers(&self) -> Option<Headers> { None }
    fn body(&self) -> Option<&[u8]> { None }
    /// The request this one wraps, for adapter-style hosts.
    fn raw(&self) -> Option<&dyn RequestShape> { None }
}

/// A response that can announce, once, that it has finished.
pub trait CompletionSource {
    /// Registers `listener`. It must be called at most once, and is simply
    /// dropped if the response never finishes.
    fn once_finish(&self, listener: FinishListener);
}

/// Capabilities the interceptor probes on the outgoing response.
pub trait ResponseShape {
    fn completion(&self) -> Option<&dyn CompletionSource> { None }
    /// The response this one wraps, for adapter-style hosts.
    fn raw(&self) -> Option<&dyn ResponseShape> { None }
}

// ── Normalization ─────────────────────────────────────────────────────────────

pub fn resolve_method(req: &dyn RequestShape) -> String {
    req.method()
        .or_else(|| req.raw().and_then(|raw| raw.method()))
        .unwrap_or(UNKNOWN)
        .to_owned()
}

pub fn resolve_url(req: &dyn RequestShape) -> String {
    req.url()
        .or_else(|| req.original_url())
        .or_else(|| req.raw().and_then(|raw| raw.url().or_else(|| raw.original_url())))
        .unwrap_or(UNKNOWN)
        .to_owned()
}

pub fn resolve_headers(req: &dyn RequestShape) -> Headers {
    req.headers()
        .or_else(|| req.raw().and_then(|raw| raw.headers()))
        .unwrap_or_default()
}

/// Lossy UTF-8 rendering of the request body, if any shape exposes one.
pub fn resolve_body(req: &dyn RequestShape) -> Option<String> {
    req.body()
        .or_else(|| req.raw().and_then(|raw| raw.body()))
        .map(|b| String::from_utf8_lossy(b).into_owned())
}

pub fn resolve_completion(res: &dyn ResponseShape) -> Option<&dyn CompletionSource> {
    res.completion().or_else(|| res.raw().and_then(|raw| raw.completion()))
}

// ── http::Request ─────────────────────────────────────────────────────────────

/// The URI a request arrived with, before any routing rewrote it.
///
/// Hosts that strip a mount prefix should insert this as a request extension;
/// the interceptor reports it when the request carries no usable URI.
#[derive(Clone, Debug)]
pub struct OriginalUri(pub http::Uri);

/// A request body already read into memory, attached as a request extension.
///
/// [`LogService`](crate::middleware::LogService) inserts it when body
/// logging is enabled; hosts that buffer bodies themselves can do the same.
#[derive(Clone, Debug)]
pub struct CapturedBody(pub Bytes);

impl<B> RequestShape for http::Request<B> {
    fn method(&self) -> Option<&str> {
        Some(http::Request::method(self).as_str())
    }

    fn url(&self) -> Option<&str> {
        self.uri().path_and_query().map(|pq| pq.as_str())
    }

    fn original_url(&self) -> Option<&str> {
        self.extensions()
            .get::<OriginalUri>()
            .and_then(|o| o.0.path_and_query())
            .map(|pq| pq.as_str())
    }

    fn headers(&self) -> Option<Headers> {
        Some(Headers::from(http::Request::headers(self)))
    }

    fn body(&self) -> Option<&[u8]> {
        self.extensions().get::<CapturedBody>().map(|b| b.0.as_ref())
    }
}

// ── Plain shapes ──────────────────────────────────────────────────────────────

/// An owned request shape for hosts that do not use `http` types.
///
/// Every field is optional, matching what the interceptor is prepared to
/// handle.
#[derive(Clone, Debug, Default)]
pub struct PlainRequest {
    pub method: Option<String>,
    pub url: Option<String>,
    pub original_url: Option<String>,
    pub headers: Option<Headers>,
    pub body: Option<Vec<u8>>,
    pub raw: Option<Box<PlainRequest>>,
}

impl PlainRequest {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: Some(method.to_owned()),
            url: Some(url.to_owned()),
            ..Self::default()
        }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Wraps `inner` the way an adapter would: nothing on the outside,
    /// everything under `raw`.
    pub fn wrapping(inner: PlainRequest) -> Self {
        Self { raw: Some(Box::new(inner)), ..Self::default() }
    }
}

impl RequestShape for PlainRequest {
    fn method(&self) -> Option<&str> { self.method.as_deref() }
    fn url(&self) -> Option<&str> { self.url.as_deref() }
    fn original_url(&self) -> Option<&str> { self.original_url.as_deref() }
    fn headers(&self) -> Option<Headers> { self.headers.clone() }
    fn body(&self) -> Option<&[u8]> { self.body.as_deref() }

    fn raw(&self) -> Option<&dyn RequestShape> {
        self.raw.as_deref().map(|r| r as &dyn RequestShape)
    }
}

/// An owned response shape with a settable status and a one-shot finish
/// signal.
///
/// Built with [`PlainResponse::new`] it exposes the completion capability
/// directly; [`PlainResponse::wrapping`] puts it under `raw` instead, and
/// [`PlainResponse::detached`] exposes none at all.
#[derive(Debug)]
pub struct PlainResponse {
    status: Mutex<u16>,
    listener: FinishSlot,
    exposes_completion: bool,
    raw: Option<Box<PlainResponse>>,
}

impl PlainResponse {
    pub fn new() -> Self {
        Self::build(true, None)
    }

    pub fn wrapping(inner: PlainResponse) -> Self {
        Self::build(false, Some(Box::new(inner)))
    }

    pub fn detached() -> Self {
        Self::build(false, None)
    }

    fn build(exposes_completion: bool, raw: Option<Box<PlainResponse>>) -> Self {
        Self {
            status: Mutex::new(200),
            listener: FinishSlot::default(),
            exposes_completion,
            raw,
        }
    }

    pub fn set_status(&self, status: u16) {
        if let Ok(mut s) = self.status.lock() {
            *s = status;
        }
        if let Some(raw) = &self.raw {
            raw.set_status(status);
        }
    }

    pub fn status(&self) -> u16 {
        self.status.lock().map(|s| *s).unwrap_or_default()
    }

    /// Signals completion with the current status. Only the first call
    /// reaches the listener.
    pub fn finish(&self) {
        if let Some(raw) = &self.raw {
            raw.finish();
        }
        if let Some(listener) = self.listener.take() {
            listener(self.status());
        }
    }
}

impl Default for PlainResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseShape for PlainResponse {
    fn completion(&self) -> Option<&dyn CompletionSource> {
        self.exposes_completion.then_some(&self.listener as &dyn CompletionSource)
    }

    fn raw(&self) -> Option<&dyn ResponseShape> {
        self.raw.as_deref().map(|r| r as &dyn ResponseShape)
    }
}

// ── FinishSlot ────────────────────────────────────────────────────────────────

/// Holds at most one registered [`FinishListener`] until someone takes it.
///
/// A later registration replaces an earlier one that was never taken.
#[derive(Default)]
pub struct FinishSlot(Mutex<Option<FinishListener>>);

impl FinishSlot {
    pub fn take(&self) -> Option<FinishListener> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl CompletionSource for FinishSlot {
    fn once_finish(&self, listener: FinishListener) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(listener);
        }
    }
}

impl ResponseShape for FinishSlot {
    fn completion(&self) -> Option<&dyn CompletionSource> {
        Some(self)
    }
}

impl std::fmt::Debug for FinishSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let armed = self.0.lock().map(|s| s.is_some()).unwrap_or(false);
        f.debug_tuple("FinishSlot").field(&armed).finish()
    }
}
