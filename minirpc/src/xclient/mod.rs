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

//! Load-balanced calls over a set of servers.
//!
//! A [`Discovery`] supplies server addresses in `protocol@addr` form and
//! picks one per call according to a [`SelectMode`]:
//!
//! | Discovery | Source of the server list |
//! |-----------|---------------------------|
//! | [`MultiServerDiscovery`] | Fixed at construction, replaced with `update` |
//! | [`RegistryDiscovery`] | Pulled from a [`Registry`](crate::Registry) when stale |
//!
//! [`XClient`] sits on top of a discovery. It caches one [`Client`](crate::Client)
//! per address and can [`broadcast`](XClient::broadcast) a call to every
//! server at once.

mod discovery;
mod registry_discovery;
mod xclient;

pub use discovery::{Discovery, MultiServerDiscovery, SelectMode};
pub use registry_discovery::{DEFAULT_UPDATE_INTERVAL, RegistryDiscovery};
pub use xclient::XClient;
