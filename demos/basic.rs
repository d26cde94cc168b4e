//! Minimal reqlog example: a hyper server whose every request is logged.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -H 'authorization: Bearer secret' http://localhost:3000/users/42
//!   curl http://localhost:3000/missing
//!   curl http://localhost:3000/healthz        # not logged
//!   curl -d 'user=alice' http://localhost:3000/login
//!
//! Environment overrides (`REQLOG_IGNORE_PATHS`, `REQLOG_LOG_HEADERS`, ...)
//! are read at startup.

use std::convert::Infallible;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use reqlog::middleware::{LogService, RequestBody};
use reqlog::{Options, RequestLogInterceptor};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Builder calls override whatever the REQLOG_* variables set.
    let options = Options::from_env()
        .expect("invalid REQLOG_* environment")
        .ignore_paths(["/healthz", "/readyz"])
        .log_headers(true)
        .log_request_body(true);
    let interceptor = RequestLogInterceptor::create(options);

    let listener = TcpListener::bind("0.0.0.0:3000").await.expect("bind failed");
    info!(addr = "0.0.0.0:3000", "listening");

    let mut tasks = tokio::task::JoinSet::new();
    loop {
        let (stream, peer) = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            res = listener.accept() => match res {
                Ok(v) => v,
                Err(e) => {
                    error!("accept error: {e}");
                    continue;
                }
            },
        };

        // One LogService per connection; clones of the interceptor share
        // their resolved configuration.
        let svc = LogService::new(interceptor.clone(), service_fn(route));
        tasks.spawn(async move {
            if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), svc)
                .await
            {
                error!(%peer, "connection error: {e}");
            }
        });
    }

    // Responses still streaming get their completion lines before exit.
    info!(in_flight = tasks.len(), "draining connections");
    while tasks.join_next().await.is_some() {}
}

async fn route(req: Request<RequestBody<Incoming>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path();
    let (status, body) = match path {
        "/healthz" | "/readyz" => (StatusCode::OK, "ok".to_owned()),
        "/login" => (StatusCode::NO_CONTENT, String::new()),
        _ if path.starts_with("/users/") => {
            let id = &path["/users/".len()..];
            (StatusCode::OK, format!(r#"{{"id":"{id}","name":"alice"}}"#))
        }
        _ => (StatusCode::NOT_FOUND, String::new()),
    };

    let mut res = Response::new(Full::new(Bytes::from(body)));
    *res.status_mut() = status;
    Ok(res)
}
