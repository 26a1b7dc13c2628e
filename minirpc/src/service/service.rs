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

//! Service method tables and the builder that produces them.

use crate::codec::CodecType;
use crate::service::method::{BoxFuture, Invoker, MethodType};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::type_name;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

/// A named receiver and the methods it exports.
///
/// Services are built with [`ServiceBuilder`], either by hand or by the
/// `#[minirpc::service]` attribute, and registered on a
/// [`Server`](crate::Server).
#[derive(Debug)]
pub struct Service {
    name: String,
    methods: HashMap<String, Arc<MethodType>>,
}

impl Service {
    /// Returns the service name, the part of `"Service.Method"` before the dot.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up an exported method.
    pub fn method(&self, name: &str) -> Option<Arc<MethodType>> {
        self.methods.get(name).cloned()
    }

    /// Returns the exported methods sorted by name.
    pub fn methods(&self) -> Vec<Arc<MethodType>> {
        let mut methods: Vec<_> = self.methods.values().cloned().collect();
        methods.sort_by(|a, b| a.name().cmp(b.name()));
        methods
    }

    /// Returns the number of exported methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if the service exports nothing.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Invokes `method` with an encoded argument and returns the encoded reply.
    ///
    /// The call counter of the method is incremented when the invocation
    /// starts. On failure the error carries the handler's message, or the
    /// reason the argument could not be decoded.
    pub fn call(
        &self,
        method: &MethodType,
        codec_type: CodecType,
        arg: Vec<u8>,
    ) -> BoxFuture<Result<Vec<u8>, String>> {
        method.invoke(codec_type, arg)
    }
}

/// Builds a [`Service`] around a shared receiver.
///
/// Each [`method`](Self::method) registers a handler that receives the
/// receiver and the decoded argument, and produces the reply or an error
/// whose `Display` text is sent back to the caller.
///
/// # Examples
///
/// ```rust
/// use minirpc::service::ServiceBuilder;
/// use serde::Deserialize;
/// use std::sync::Arc;
///
/// #[derive(Deserialize)]
/// struct Args {
///     num1: i32,
///     num2: i32,
/// }
///
/// struct Num;
///
/// let service = ServiceBuilder::new("Num", Num)
///     .method("Add", |_num: Arc<Num>, args: Args| async move {
///         Ok::<_, String>(args.num1 + args.num2)
///     })
///     .build();
///
/// assert_eq!(service.name(), "Num");
/// assert!(service.method("Add").is_some());
/// ```
pub struct ServiceBuilder<S> {
    name: String,
    receiver: Arc<S>,
    methods: HashMap<String, Arc<MethodType>>,
}

impl<S> ServiceBuilder<S>
where
    S: Send + Sync + 'static,
{
    /// Starts a service named `name` around `receiver`.
    pub fn new(name: impl Into<String>, receiver: S) -> Self {
        Self::from_arc(name, Arc::new(receiver))
    }

    /// Starts a service around a receiver that is already shared.
    pub fn from_arc(name: impl Into<String>, receiver: Arc<S>) -> Self {
        Self {
            name: name.into(),
            receiver,
            methods: HashMap::new(),
        }
    }

    /// Exports `handler` as method `name`.
    ///
    /// Registering a name twice keeps the last handler.
    pub fn method<A, R, E, F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        E: Display + Send + 'static,
        F: Fn(Arc<S>, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let name = name.into();
        let receiver = Arc::clone(&self.receiver);
        let invoker: Invoker = Box::new(
            move |codec_type: CodecType, arg: Vec<u8>| -> BoxFuture<Result<Vec<u8>, String>> {
                let args: A = match codec_type.decode(&arg) {
                    Ok(args) => args,
                    Err(err) => {
                        let message = format!("rpc server: read argv err: {err}");
                        return Box::pin(async move { Err(message) });
                    }
                };
                let pending = handler(Arc::clone(&receiver), args);
                Box::pin(async move {
                    let reply = pending.await.map_err(|e| e.to_string())?;
                    codec_type
                        .encode(&reply)
                        .map_err(|e| format!("rpc server: write reply err: {e}"))
                })
            },
        );

        let method = MethodType::new(name.clone(), type_name::<A>(), type_name::<R>(), invoker);
        self.methods.insert(name, Arc::new(method));
        self
    }

    /// Finishes the service.
    pub fn build(self) -> Service {
        Service {
            name: self.name,
            methods: self.methods,
        }
    }
}
