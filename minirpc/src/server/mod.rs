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

//! The RPC server.
//!
//! A [`Server`] holds a registry of [`Service`](crate::Service)s and serves
//! connections in one of two ways:
//!
//! - **Raw**: [`Server::accept`] takes TCP connections that start with the
//!   handshake directly.
//! - **HTTP**: [`Server::serve_http`] answers `CONNECT` requests on
//!   [`DEFAULT_RPC_PATH`] with [`CONNECTED`] and then speaks the raw
//!   protocol over the tunneled connection. It also serves a page listing
//!   every registered method and its call count on [`DEFAULT_DEBUG_PATH`].
//!
//! # Connection Lifecycle
//!
//! 1. Read and validate the handshake; drop the connection on mismatch
//! 2. Read header/body pairs in a loop, one handler task per request
//! 3. Replies are written under a per-connection lock, one message at a time
//! 4. On EOF or a read error, wait for running handlers, then close

mod debug;
mod http;
mod server;

pub use server::Server;

/// Path on which the HTTP front end accepts `CONNECT` requests.
pub const DEFAULT_RPC_PATH: &str = "/_minirpc_";

/// Path of the debug page.
pub const DEFAULT_DEBUG_PATH: &str = "/debug/minirpc";

/// Status text the HTTP front end answers a successful `CONNECT` with.
pub const CONNECTED: &str = "200 Connected to minirpc";
