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

//! # HTTP Tunnel Example - RPC over HTTP CONNECT
//!
//! This example serves the server's HTTP front end, dials it through an HTTP
//! `CONNECT` tunnel and keeps running so the debug page can be inspected.
//!
//! ## Running This Example
//!
//! ```bash
//! RUST_LOG=info cargo run --example http_tunnel
//! ```
//!
//! Then open the printed debug URL in a browser. Stop with Ctrl-C.

use minirpc::{CodecType, DEFAULT_DEBUG_PATH, Options, Server, dial_http, service};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
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

    pub fn echo(&self, args: String, reply: &mut String) -> Result<(), String> {
        *reply = args;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let server = Arc::new(Server::new());
    server.register(Foo)?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    tokio::spawn(Arc::clone(&server).serve_http(listener));
    println!("debug page: http://{addr}{DEFAULT_DEBUG_PATH}");

    let options = Options::default().with_codec_type(CodecType::Json);
    let client = dial_http(&addr, Some(options)).await?;
    for i in 0..5i64 {
        let sum: i64 = client.call("Foo.Sum", &Args { num1: i, num2: i * i }).await?;
        println!("{i} + {} = {sum}", i * i);
    }
    let echo: String = client.call("Foo.Echo", "hello over http").await?;
    println!("echo: {echo}");

    tokio::signal::ctrl_c().await?;
    client.close().await?;
    Ok(())
}
