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

//! HTTP front end of the server.

use crate::RpcError;
use crate::http::{self, HttpResponse, text_response};
use crate::server::debug;
use crate::server::{CONNECTED, DEFAULT_DEBUG_PATH, DEFAULT_RPC_PATH, Server};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::ext::ReasonPhrase;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

impl Server {
    /// Serves the HTTP front end on `listener`.
    ///
    /// - `CONNECT` on [`DEFAULT_RPC_PATH`] is answered with [`CONNECTED`],
    ///   after which the connection carries the raw protocol.
    /// - Any other method on [`DEFAULT_RPC_PATH`] gets `405 must CONNECT`.
    /// - `GET` on [`DEFAULT_DEBUG_PATH`] renders the debug page.
    ///
    /// # Errors
    ///
    /// Returns an error when accepting fails.
    pub async fn serve_http(self: Arc<Self>, listener: TcpListener) -> Result<(), RpcError> {
        info!("rpc server debug path: {DEFAULT_DEBUG_PATH}");
        http::serve(listener, move |req| {
            let server = Arc::clone(&self);
            async move { server.handle_http(req) }
        })
        .await
    }

    fn handle_http(self: Arc<Self>, mut req: Request<Incoming>) -> HttpResponse {
        match (req.method(), req.uri().path()) {
            (&Method::CONNECT, DEFAULT_RPC_PATH) => {
                let upgrade = hyper::upgrade::on(&mut req);
                tokio::spawn(async move {
                    match upgrade.await {
                        Ok(upgraded) => self.serve_conn(TokioIo::new(upgraded)).await,
                        Err(err) => error!("rpc hijacking: {err}"),
                    }
                });
                connected_response()
            }
            (_, DEFAULT_RPC_PATH) => text_response(StatusCode::METHOD_NOT_ALLOWED, "405 must CONNECT\n"),
            (&Method::GET, DEFAULT_DEBUG_PATH) => {
                let mut response = Response::new(Full::new(debug::render(&self.services()).into()));
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/html; charset=utf-8"),
                );
                response
            }
            _ => text_response(StatusCode::NOT_FOUND, "404 page not found\n"),
        }
    }
}

/// `200` with the reason phrase taken from [`CONNECTED`].
fn connected_response() -> HttpResponse {
    let mut response = Response::new(Full::default());
    let reason = CONNECTED.split_once(' ').map_or(CONNECTED, |(_, reason)| reason);
    response
        .extensions_mut()
        .insert(ReasonPhrase::from_static(reason.as_bytes()));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_reason_phrase() {
        let response = connected_response();
        assert_eq!(response.status(), StatusCode::OK);
        let reason = response.extensions().get::<ReasonPhrase>().unwrap();
        assert_eq!(reason.as_bytes(), b"Connected to minirpc");
    }
}
