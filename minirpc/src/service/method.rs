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

//! A single exported method.

use crate::codec::CodecType;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Decodes the argument bytes, runs the handler and encodes the reply.
///
/// The error string is what the server reports in the response header.
pub(crate) type Invoker =
    Box<dyn Fn(CodecType, Vec<u8>) -> BoxFuture<Result<Vec<u8>, String>> + Send + Sync>;

/// One exported method of a [`Service`](crate::service::Service).
///
/// Besides the invocation entry point the method keeps the names of its
/// argument and reply types and the number of times it has been called,
/// which the debug page displays.
pub struct MethodType {
    name: String,
    arg_type: &'static str,
    reply_type: &'static str,
    num_calls: AtomicU64,
    invoker: Invoker,
}

impl MethodType {
    pub(crate) fn new(
        name: String,
        arg_type: &'static str,
        reply_type: &'static str,
        invoker: Invoker,
    ) -> Self {
        Self {
            name,
            arg_type,
            reply_type,
            num_calls: AtomicU64::new(0),
            invoker,
        }
    }

    /// Returns the exported method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the Rust type name of the argument.
    pub fn arg_type(&self) -> &'static str {
        self.arg_type
    }

    /// Returns the Rust type name of the reply.
    pub fn reply_type(&self) -> &'static str {
        self.reply_type
    }

    /// Returns how many times the method has been invoked.
    pub fn num_calls(&self) -> u64 {
        self.num_calls.load(Ordering::Relaxed)
    }

    /// Counts the call and starts the invocation.
    ///
    /// The returned future owns everything it needs, so it can be spawned and
    /// outlive the connection that asked for it.
    pub(crate) fn invoke(&self, codec_type: CodecType, arg: Vec<u8>) -> BoxFuture<Result<Vec<u8>, String>> {
        self.num_calls.fetch_add(1, Ordering::Relaxed);
        (self.invoker)(codec_type, arg)
    }
}

impl fmt::Debug for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodType")
            .field("name", &self.name)
            .field("arg_type", &self.arg_type)
            .field("reply_type", &self.reply_type)
            .field("num_calls", &self.num_calls())
            .finish_non_exhaustive()
    }
}
