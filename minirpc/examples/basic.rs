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

//! # Basic Example - Raw TCP Server and Client
//!
//! This example starts a server on a raw TCP listener, registers a service
//! with the `#[minirpc::service]` attribute and issues several concurrent
//! calls over a single client connection.
//!
//! ## Running This Example
//!
//! ```bash
//! RUST_LOG=info cargo run --example basic
//! ```

use minirpc::{Server, dial, service};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
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
    println!("server listening on {addr}");
    tokio::spawn(Arc::clone(&server).accept(listener));

    let client = Arc::new(dial(&addr, None).await?);
    let mut calls = Vec::new();
    for i in 0..5i64 {
        let client = Arc::clone(&client);
        calls.push(tokio::spawn(async move {
            let args = Args { num1: i, num2: i * i };
            let reply = client
                .call_timeout::<_, i64>("Foo.Sum", &args, Duration::from_secs(1))
                .await;
            (args, reply)
        }));
    }
    for call in calls {
        match call.await? {
            (args, Ok(reply)) => println!("{} + {} = {reply}", args.num1, args.num2),
            (args, Err(err)) => println!("call Foo.Sum({args:?}) error: {err}"),
        }
    }

    client.close().await?;
    Ok(())
}
