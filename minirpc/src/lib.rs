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

#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # minirpc - A Small RPC Runtime
//!
//! minirpc calls methods on remote services by `"Service.Method"` name over
//! a single multiplexed connection:
//!
//! - **Pluggable codecs**: compact binary (postcard) or JSON bodies, chosen
//!   per connection in a JSON handshake
//! - **Concurrent calls**: requests carry a sequence number, so replies may
//!   arrive in any order
//! - **Timeouts**: a connect timeout on dial, a per-call timeout or
//!   cancellation token on the client, a handle timeout on the server
//! - **HTTP tunnel**: the same protocol behind `CONNECT`, next to a debug page
//! - **Load balancing**: random or round-robin selection over a static list
//!   or a heartbeat-driven registry, plus broadcast to every server
//!
//! ## Architecture
//!
//! - **[`codec`]**: header/body framing and the body formats
//! - **[`handshake`]**: the [`Options`] record opening every connection
//! - **[`service`]**: type-erased method tables built from plain Rust types
//! - **[`server`]**: dispatch loop and HTTP front end
//! - **[`client`]**: multiplexed client and dialing
//! - **[`xclient`]**: discovery and the load-balancing [`XClient`]
//! - **[`registry`]**: server directory and heartbeats
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use minirpc::{Server, dial};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[derive(Default)]
//! struct Num;
//!
//! #[minirpc::service]
//! impl Num {
//!     pub async fn add(&self, args: (i64, i64), reply: &mut i64) -> Result<(), String> {
//!         *reply = args.0 + args.1;
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = Arc::new(Server::new());
//! server.register(Num)?;
//! let listener = TcpListener::bind("127.0.0.1:9999").await?;
//! tokio::spawn(Arc::clone(&server).accept(listener));
//!
//! let client = dial("127.0.0.1:9999", None).await?;
//! let sum: i64 = client.call("Num.Add", &(3i64, 4i64)).await?;
//! assert_eq!(sum, 7);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **`derive`** (default): the [`service`](macro@service) attribute
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`RpcError`]. Errors returned by a
//! service method reach the caller as [`RpcError::Remote`] carrying the
//! method's error text.

pub mod client;
pub mod codec;
pub mod error;
pub mod handshake;
mod http;
pub mod registry;
pub mod server;
pub mod service;
pub mod transport;
pub mod xclient;

// Re-export procedural macros when the derive feature is enabled
#[cfg(feature = "derive")]
pub use minirpc_macros::service;

pub use client::{Call, Client, dial, dial_http, xdial};
pub use codec::{CodecType, Header};
pub use error::RpcError;
pub use handshake::{MAGIC_NUMBER, Options};
pub use registry::{Registry, heartbeat};
pub use server::{CONNECTED, DEFAULT_DEBUG_PATH, DEFAULT_RPC_PATH, Server};
pub use service::{MethodType, Receiver, Service, ServiceBuilder};
pub use xclient::{Discovery, MultiServerDiscovery, RegistryDiscovery, SelectMode, XClient};
