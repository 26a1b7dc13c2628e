//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! HTTP plumbing shared by the server front end, the registry and the
//! registry clients.

use crate::RpcError;
use http_body_util::{Empty, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{debug, error};

/// Response type produced by every handler.
pub(crate) type HttpResponse = Response<Full<Bytes>>;

/// Client used for registry traffic.
pub(crate) type HttpClient = Client<HttpConnector, Empty<Bytes>>;

/// Creates a plain-HTTP client.
pub(crate) fn http_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build_http()
}

/// Builds a response with a plain-text body.
pub(crate) fn text_response(status: StatusCode, body: impl Into<Bytes>) -> HttpResponse {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Accepts HTTP/1 connections on `listener` until accepting fails.
///
/// Each connection runs on its own task with upgrades enabled, so a handler
/// may take over the connection after answering a `CONNECT`.
pub(crate) async fn serve<H, Fut>(listener: TcpListener, handler: H) -> Result<(), RpcError>
where
    H: Fn(Request<Incoming>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    loop {
        let (stream, peer) = listener.accept().await.map_err(|e| {
            error!("rpc http: accept error: {e}");
            RpcError::Io(e)
        })?;

        let io = TokioIo::new(stream);
        let handler = handler.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let handler = handler.clone();
                async move { Ok::<_, Infallible>(handler(req).await) }
            });

            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service)
                .with_upgrades()
                .await
            {
                debug!("rpc http: connection from {peer} ended: {err}");
            }
        });
    }
}
