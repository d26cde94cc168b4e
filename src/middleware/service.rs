//! hyper [`Service`] wrapper and the completion-signalling response body.
//!
//! # When is a response "finished"?
//!
//! hyper writes the status line and headers as soon as the inner service
//! returns, then streams the body. The completion line is written when the
//! body has been fully produced: the frame that reaches end-of-stream, or
//! the final `None`, fires the listener. A body that was already at
//! end-of-stream when hyper dropped it (empty bodies are often never polled)
//! fires on drop.
//!
//! Responses that carry no body on the wire (answers to `HEAD`, and `1xx`,
//! `204` and `304` statuses) are complete once the head is written. hyper
//! drops their body unpolled, so they fire on drop whatever the body holds.
//!
//! Any other body dropped part-way through (client disconnected) never
//! fires, and neither does a request whose inner service returned an error.
//!
//! # Request bodies
//!
//! With request-body logging enabled, bodies announcing at most
//! [`MAX_CAPTURED_BODY`] bytes are read into memory before the interceptor
//! runs, exposed to it through a [`CapturedBody`] extension, and replayed to
//! the inner service. Bodies of unknown or larger size stream through
//! uncaptured.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::{BodyExt, Either, Full};
use hyper::body::{Body, Frame, SizeHint};
use hyper::service::Service;
use tracing::trace;

use crate::interceptor::RequestLogInterceptor;
use crate::shape::{self, CapturedBody, FinishListener, FinishSlot};

/// A heap-allocated, type-erased future.
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Largest request body, in bytes, that is buffered for logging.
pub const MAX_CAPTURED_BODY: u64 = 1024 * 1024;

/// The request body the inner service receives: the original stream, or
/// the buffered copy when it was captured for logging.
pub type RequestBody<B> = Either<B, Full<Bytes>>;

// ── LogService ────────────────────────────────────────────────────────────────

/// Runs every request through a [`RequestLogInterceptor`] before handing it
/// to the inner service.
#[derive(Clone, Debug)]
pub struct LogService<S> {
    interceptor: RequestLogInterceptor,
    inner: S,
}

impl<S> LogService<S> {
    pub fn new(interceptor: RequestLogInterceptor, inner: S) -> Self {
        Self { interceptor, inner }
    }

    pub fn get_ref(&self) -> &S { &self.inner }

    pub fn into_inner(self) -> S { self.inner }
}

impl<S> LogService<S> {
    fn dispatch<B, RB>(&self, req: Request<RequestBody<B>>) -> BoxFuture<Result<Response<FinishBody<RB>>, S::Error>>
    where
        S: Service<Request<RequestBody<B>>, Response = Response<RB>>,
        S::Future: Send + 'static,
        S::Error: 'static,
        B: 'static,
        RB: Body + Unpin + Send + 'static,
    {
        let head = req.method() == Method::HEAD;

        // The slot stands in for the response, which does not exist yet. It
        // catches the listener so it can be moved into the body once it does.
        let slot = FinishSlot::default();
        let fut = self.interceptor.handle(req, &slot, |req| self.inner.call(req));
        let listener = slot.take();

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status();
            let bodiless = head
                || status.is_informational()
                || status == http::StatusCode::NO_CONTENT
                || status == http::StatusCode::NOT_MODIFIED;
            let pending = listener.map(|l| (l, status.as_u16()));
            Ok(res.map(|body| FinishBody::new(body, pending, bodiless)))
        })
    }
}

impl<S, B, RB> Service<Request<B>> for LogService<S>
where
    S: Service<Request<RequestBody<B>>, Response = Response<RB>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: 'static,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: std::fmt::Display,
    RB: Body + Unpin + Send + 'static,
{
    type Response = Response<FinishBody<RB>>;
    type Error = S::Error;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let capture = self.interceptor.captures_body_of(&shape::resolve_url(&req))
            && is_capturable(req.body());

        if !capture {
            return self.dispatch(req.map(Either::Left));
        }

        let this = self.clone();
        Box::pin(async move {
            let req = buffer(req).await;
            this.dispatch(req).await
        })
    }
}

/// Only bodies with a known, non-zero size within the cap are buffered.
fn is_capturable<B: Body>(body: &B) -> bool {
    body.size_hint().upper().is_some_and(|n| n > 0 && n <= MAX_CAPTURED_BODY)
}

/// Reads the whole body, records it as a [`CapturedBody`] extension and
/// rebuilds the request around the buffered bytes.
///
/// A body that fails mid-read (the client went away) is replaced by an empty
/// one; the inner service still runs and decides what to answer.
async fn buffer<B>(req: Request<B>) -> Request<RequestBody<B>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let (mut parts, body) = req.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            trace!(uri = %parts.uri, "request body read failed: {e}");
            Bytes::new()
        }
    };
    parts.extensions.insert(CapturedBody(bytes.clone()));
    Request::from_parts(parts, Either::Right(Full::new(bytes)))
}

// ── FinishBody ────────────────────────────────────────────────────────────────

/// Response body wrapper that fires a [`FinishListener`] once the wrapped
/// body has been fully produced.
pub struct FinishBody<B: Body> {
    inner: B,
    pending: Option<(FinishListener, u16)>,
    bodiless: bool,
}

impl<B: Body> FinishBody<B> {
    fn new(inner: B, pending: Option<(FinishListener, u16)>, bodiless: bool) -> Self {
        Self { inner, pending, bodiless }
    }

    fn fire(&mut self) {
        if let Some((listener, status)) = self.pending.take() {
            listener(status);
        }
    }
}

impl<B: Body + Unpin> Body for FinishBody<B> {
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) => this.fire(),
            Poll::Ready(Some(Ok(_))) if this.inner.is_end_stream() => this.fire(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B: Body> Drop for FinishBody<B> {
    fn drop(&mut self) {
        if self.bodiless || self.inner.is_end_stream() {
            self.fire();
        }
    }
}

impl<B: Body> std::fmt::Debug for FinishBody<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinishBody")
            .field("pending", &self.pending.as_ref().map(|(_, status)| *status))
            .field("bodiless", &self.bodiless)
            .finish_non_exhaustive()
    }
}
