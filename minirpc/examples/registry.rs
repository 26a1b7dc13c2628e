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

//! # Registry Example - Discovery, Load Balancing and Broadcast
//!
//! This example starts a registry and two servers that announce themselves
//! with heartbeats, then uses an `XClient` backed by `RegistryDiscovery` to:
//!
//! - Spread calls over both servers with round-robin selection
//! - Broadcast a call to every server
//! - Broadcast with a deadline that the slow method cannot meet
//!
//! ## Running This Example
//!
//! ```bash
//! RUST_LOG=info cargo run --example registry
//! ```

use minirpc::registry::{self, DEFAULT_REGISTRY_PATH};
use minirpc::xclient::DEFAULT_UPDATE_INTERVAL;
use minirpc::{Registry, RegistryDiscovery, RpcError, SelectMode, Server, XClient, service};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

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

    pub async fn sleep(&self, args: Args, reply: &mut i64) -> Result<(), String> {
        tokio::time::sleep(Duration::from_secs(args.num1.unsigned_abs())).await;
        *reply = args.num1 + args.num2;
        Ok(())
    }
}

async fn start_server(registry_url: &str) -> Result<String, Box<dyn std::error::Error>> {
    let server = Arc::new(Server::new());
    server.register(Foo)?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let rpc_addr = format!("tcp@{}", listener.local_addr()?);
    tokio::spawn(server.accept(listener));
    registry::heartbeat(registry_url, &rpc_addr, Duration::ZERO);
    Ok(rpc_addr)
}

async fn broadcast(
    xc: &XClient<RegistryDiscovery>,
    service_method: &str,
    args: Args,
    deadline: Option<Duration>,
) -> Result<i64, RpcError> {
    let mut reply = 0i64;
    let call = xc.broadcast(service_method, &args, Some(&mut reply));
    match deadline {
        Some(deadline) => tokio::time::timeout(deadline, call)
            .await
            .unwrap_or_else(|_| Err(RpcError::CallTimeout(service_method.to_string())))?,
        None => call.await?,
    }
    Ok(reply)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = Arc::new(Registry::default());
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let registry_url = format!("http://{}{DEFAULT_REGISTRY_PATH}", listener.local_addr()?);
    tokio::spawn(Arc::clone(&registry).serve(listener));

    for _ in 0..2 {
        let rpc_addr = start_server(&registry_url).await?;
        println!("server {rpc_addr} registered");
    }
    while registry.alive_servers().len() < 2 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let discovery = RegistryDiscovery::new(registry_url, DEFAULT_UPDATE_INTERVAL)?;
    let xc = XClient::new(discovery, SelectMode::RoundRobin, None);

    println!("--- call");
    for i in 0..5i64 {
        let args = Args { num1: i, num2: i * i };
        match xc.call::<_, i64>("Foo.Sum", &args).await {
            Ok(reply) => println!("call Foo.Sum success: {} + {} = {reply}", args.num1, args.num2),
            Err(err) => println!("call Foo.Sum error: {err}"),
        }
    }

    println!("--- broadcast");
    for i in 0..5i64 {
        let args = Args { num1: i, num2: i * i };
        match broadcast(&xc, "Foo.Sum", args, None).await {
            Ok(reply) => println!("broadcast Foo.Sum success: {reply}"),
            Err(err) => println!("broadcast Foo.Sum error: {err}"),
        }
        match broadcast(&xc, "Foo.Sleep", args, Some(Duration::from_secs(2))).await {
            Ok(reply) => println!("broadcast Foo.Sleep success: {reply}"),
            Err(err) => println!("broadcast Foo.Sleep error: {err}"),
        }
    }

    xc.close().await?;
    Ok(())
}
