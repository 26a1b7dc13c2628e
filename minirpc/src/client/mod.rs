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

//! The RPC client.
//!
//! A [`Client`] owns one connection. Requests carry a sequence number that
//! the server echoes back, so any number of calls can be in flight at once
//! and replies may arrive in any order.
//!
//! # Making Calls
//!
//! - [`Client::go`] starts a call and returns a [`Call`] handle.
//! - [`Client::call`] waits for the reply.
//! - [`Client::call_timeout`] and [`Client::call_with_cancel`] stop waiting
//!   on a deadline or a [`CancellationToken`](tokio_util::sync::CancellationToken).
//!   The request is not withdrawn from the server; only the local pending
//!   entry is removed and a late reply is discarded.
//!
//! # Connecting
//!
//! [`dial`], [`dial_http`] and [`xdial`] open a connection and perform the
//! handshake within the connect timeout of the supplied
//! [`Options`](crate::Options).

mod call;
mod client;
mod dial;
mod pending;

pub use call::Call;
pub use client::Client;
#[cfg(unix)]
pub use dial::dial_unix;
pub use dial::{dial, dial_http, xdial};
