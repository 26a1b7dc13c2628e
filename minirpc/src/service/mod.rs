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

//! Services and their exported methods.
//!
//! A [`Service`] is a receiver object plus a table of [`MethodType`]s, keyed
//! by the exported method name. Requests address a method as
//! `"Service.Method"`.
//!
//! There are two ways to build one:
//!
//! - **By hand** with [`ServiceBuilder`], registering one closure per method.
//! - **With the attribute** `#[minirpc::service]` on an inherent `impl`
//!   block, which implements [`Receiver`] for the type. Every method of the
//!   form below is exported under its name converted to `UpperCamelCase`:
//!
//! ```rust,ignore
//! pub async fn method_name(&self, args: Arg, reply: &mut Reply) -> Result<(), E>
//! ```
//!
//! `Arg` must be `DeserializeOwned`, `Reply` must be `Serialize + Default`
//! and `E` must be `Display`. The argument may also be taken by shared
//! reference, and the method may be synchronous. Anything else in the block
//! is left alone.

mod method;
mod service;

pub use method::{BoxFuture, MethodType};
pub use service::{Service, ServiceBuilder};

use std::sync::Arc;

/// A type that can describe itself as a [`Service`].
///
/// Usually implemented by `#[minirpc::service]`; the service name is the
/// name of the type.
pub trait Receiver: Send + Sync + 'static {
    /// Builds the service table around the shared receiver.
    fn into_service(self: Arc<Self>) -> Service;
}
