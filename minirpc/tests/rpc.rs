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

//! Integration tests for calls over real TCP connections.
//!
//! These tests verify that:
//! - Raw and HTTP-tunneled connections dispatch calls the same way
//! - Concurrent calls on one client are routed to their callers
//! - Server handle timeouts and client call timeouts are reported
//! - Dispatch errors leave the connection usable
//! - The HTTP front end serves the debug page and rejects non-CONNECT requests

use minirpc::{CodecType, Options, RpcError, Server, dial, dial_http, service, xdial};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Args {
    num1: i64,
    num2: i64,
}

struct Foo;

#[service]
impl Foo {
    pub async fn sum(&self, args: Args, reply: &mut i64) -> Result<(), String> {
        *reply = args.num1 + args.num2;
        Ok(())
    }

    /// Sleeps for `num1` milliseconds, then sums.
    pub async fn sleep(&self, args: Args, reply: &mut i64) -> Result<(), String> {
        tokio::time::sleep(Duration::from_millis(args.num1 as u64)).await;
        *reply = args.num1 + args.num2;
        Ok(())
    }

    pub async fn fail(&self, message: String, _reply: &mut ()) -> Result<(), String> {
        Err(message)
    }
}

fn new_server() -> Arc<Server> {
    let server = Arc::new(Server::new());
    server.register(Foo).unwrap();
    server
}

async fn start_raw(server: Arc<Server>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(server.accept(listener));
    addr
}

async fn start_http(server: Arc<Server>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(server.serve_http(listener));
    addr
}

/// Sends a bare HTTP/1.0 request and returns the whole response.
async fn http_request(addr: &str, method: &str, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(format!("{method} {path} HTTP/1.0\r\nHost: {addr}\r\n\r\n").as_bytes())
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_sum_over_raw_tcp() {
    let client = dial(&start_raw(new_server()).await, None).await.unwrap();
    let reply: i64 = client
        .call("Foo.Sum", &Args { num1: 3, num2: 4 })
        .await
        .unwrap();
    assert_eq!(reply, 7);
}

#[tokio::test]
async fn test_sum_over_http_tunnel() {
    let client = dial_http(&start_http(new_server()).await, None).await.unwrap();
    let reply: i64 = client
        .call("Foo.Sum", &Args { num1: 3, num2: 4 })
        .await
        .unwrap();
    assert_eq!(reply, 7);
}

#[tokio::test]
async fn test_xdial_both_protocols() {
    let server = new_server();
    let raw = format!("tcp@{}", start_raw(Arc::clone(&server)).await);
    let http = format!("http@{}", start_http(server).await);

    for rpc_addr in [raw, http] {
        let client = xdial(&rpc_addr, None).await.unwrap();
        let reply: i64 = client
            .call("Foo.Sum", &Args { num1: 1, num2: 2 })
            .await
            .unwrap();
        assert_eq!(reply, 3);
    }
}

#[tokio::test]
async fn test_json_codec() {
    let addr = start_raw(new_server()).await;
    let options = Options::default().with_codec_type(CodecType::Json);
    let client = dial(&addr, Some(options)).await.unwrap();
    let reply: i64 = client
        .call("Foo.Sum", &Args { num1: 10, num2: -4 })
        .await
        .unwrap();
    assert_eq!(reply, 6);
}

#[tokio::test]
async fn test_concurrent_calls_reach_their_callers() {
    let client = Arc::new(dial(&start_raw(new_server()).await, None).await.unwrap());

    // Later calls sleep less, so replies come back in reverse order.
    let mut tasks = Vec::new();
    for i in 0..10i64 {
        let client = Arc::clone(&client);
        tasks.push(tokio::spawn(async move {
            let args = Args {
                num1: (10 - i) * 10,
                num2: i,
            };
            let reply: i64 = client.call("Foo.Sleep", &args).await.unwrap();
            (args, reply)
        }));
    }
    for task in tasks {
        let (args, reply) = task.await.unwrap();
        assert_eq!(reply, args.num1 + args.num2);
    }
    assert_eq!(client.pending_calls(), 0);
}

#[tokio::test]
async fn test_sequence_numbers_increase() {
    let client = dial(&start_raw(new_server()).await, None).await.unwrap();
    let first = client.go::<_, i64>("Foo.Sum", &Args { num1: 1, num2: 1 });
    let second = client.go::<_, i64>("Foo.Sum", &Args { num1: 2, num2: 2 });
    assert!(second.seq() > first.seq());
    assert_eq!(first.done().await.unwrap(), 2);
    assert_eq!(second.done().await.unwrap(), 4);
}

#[tokio::test]
async fn test_server_handle_timeout() {
    let addr = start_raw(new_server()).await;
    let options = Options::default().with_handle_timeout(Duration::from_millis(100));
    let client = dial(&addr, Some(options)).await.unwrap();

    let err = client
        .call::<_, i64>("Foo.Sleep", &Args { num1: 1000, num2: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Remote(ref msg) if msg.contains("request timeout")));

    // The connection survives the timeout.
    let reply: i64 = client
        .call("Foo.Sum", &Args { num1: 3, num2: 4 })
        .await
        .unwrap();
    assert_eq!(reply, 7);
}

#[tokio::test]
async fn test_client_call_timeout_clears_pending() {
    let client = dial(&start_raw(new_server()).await, None).await.unwrap();

    let err = client
        .call_timeout::<_, i64>(
            "Foo.Sleep",
            &Args { num1: 500, num2: 0 },
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(client.pending_calls(), 0);

    // The late reply is discarded without disturbing later calls.
    tokio::time::sleep(Duration::from_millis(600)).await;
    let reply: i64 = client
        .call("Foo.Sum", &Args { num1: 3, num2: 4 })
        .await
        .unwrap();
    assert_eq!(reply, 7);
}

#[tokio::test]
async fn test_dispatch_errors_keep_connection() {
    let client = dial(&start_raw(new_server()).await, None).await.unwrap();

    let err = client
        .call::<_, i64>("Bar.Sum", &Args { num1: 1, num2: 1 })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "rpc server: can't find service Bar");

    let err = client
        .call::<_, i64>("Foo.Mul", &Args { num1: 1, num2: 1 })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "rpc server: can't find method Mul");

    let err = client.call::<_, ()>("Foo.Fail", "boom").await.unwrap_err();
    assert!(err.is_remote());
    assert_eq!(err.to_string(), "boom");

    assert!(client.is_available());
    let reply: i64 = client
        .call("Foo.Sum", &Args { num1: 3, num2: 4 })
        .await
        .unwrap();
    assert_eq!(reply, 7);
}

#[tokio::test]
async fn test_calls_after_close() {
    let client = dial(&start_raw(new_server()).await, None).await.unwrap();
    client.close().await.unwrap();
    assert!(!client.is_available());

    let err = client
        .call::<_, i64>("Foo.Sum", &Args { num1: 1, num2: 1 })
        .await
        .unwrap_err();
    assert!(err.is_shutdown());
    assert!(client.close().await.unwrap_err().is_shutdown());
}

#[tokio::test]
async fn test_bad_magic_number_is_dropped() {
    let addr = start_raw(new_server()).await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    let options = serde_json::to_vec(&Options {
        magic_number: 0x1234,
        ..Options::default()
    })
    .unwrap();
    stream
        .write_all(&(options.len() as u32).to_be_bytes())
        .await
        .unwrap();
    stream.write_all(&options).await.unwrap();

    let mut buf = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(read, 0);
}

#[tokio::test]
async fn test_debug_page() {
    let addr = start_http(new_server()).await;
    let client = dial_http(&addr, None).await.unwrap();
    let _: i64 = client
        .call("Foo.Sum", &Args { num1: 1, num2: 1 })
        .await
        .unwrap();

    let response = http_request(&addr, "GET", minirpc::DEFAULT_DEBUG_PATH).await;
    assert!(response.starts_with("HTTP/1.0 200") || response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("Service Foo"));
    assert!(response.contains("Sum("));
    assert!(response.contains("<td align=center>1</td>"));
}

#[tokio::test]
async fn test_rpc_path_requires_connect() {
    let addr = start_http(new_server()).await;
    let response = http_request(&addr, "GET", minirpc::DEFAULT_RPC_PATH).await;
    assert!(response.contains(" 405 "));
    assert!(response.contains("405 must CONNECT"));

    let response = http_request(&addr, "GET", "/elsewhere").await;
    assert!(response.contains(" 404 "));
}
