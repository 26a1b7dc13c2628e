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

//! Service registry and per-connection dispatch.

use crate::RpcError;
use crate::codec::{self, Codec, CodecReader, CodecType, CodecWriter, DeserializationError, Header};
use crate::handshake::{self, MAGIC_NUMBER};
use crate::service::{MethodType, Receiver, Service};
use crate::transport::{BoxedTransport, Transport};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// An RPC server.
///
/// # Examples
///
/// ```rust,no_run
/// use minirpc::Server;
/// use minirpc::service::ServiceBuilder;
/// use std::sync::Arc;
/// use tokio::net::TcpListener;
///
/// struct Num;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let server = Arc::new(Server::new());
/// server.register_service(
///     ServiceBuilder::new("Num", Num)
///         .method("Add", |_: Arc<Num>, (a, b): (i64, i64)| async move { Ok::<_, String>(a + b) })
///         .build(),
/// )?;
///
/// let listener = TcpListener::bind("127.0.0.1:0").await?;
/// server.accept(listener).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Server {
    services: RwLock<HashMap<String, Arc<Service>>>,
}

/// A request whose method resolved and whose argument has been read.
struct Request {
    header: Header,
    service: Arc<Service>,
    method: Arc<MethodType>,
    arg: Vec<u8>,
}

enum Incoming {
    Request(Request),
    Invalid(Header, RpcError),
}

impl Server {
    /// Creates a server with no services.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a receiver under its own type name.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::ServiceAlreadyDefined`] if the name is taken.
    pub fn register<R: Receiver>(&self, receiver: R) -> Result<(), RpcError> {
        self.register_service(Arc::new(receiver).into_service())
    }

    /// Registers a service.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::ServiceAlreadyDefined`] if the name is taken.
    pub fn register_service(&self, service: Service) -> Result<(), RpcError> {
        let mut services = self.services.write();
        if services.contains_key(service.name()) {
            return Err(RpcError::ServiceAlreadyDefined(service.name().to_string()));
        }
        for method in service.methods() {
            info!("rpc server: register {}.{}", service.name(), method.name());
        }
        services.insert(service.name().to_string(), Arc::new(service));
        Ok(())
    }

    /// Resolves `"Service.Method"` into the service and its method.
    ///
    /// The name is split at its last `.`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::IllFormedServiceMethod`] without a `.`,
    /// [`RpcError::ServiceNotFound`] or [`RpcError::MethodNotFound`].
    pub fn find_service(
        &self,
        service_method: &str,
    ) -> Result<(Arc<Service>, Arc<MethodType>), RpcError> {
        let (service_name, method_name) = service_method
            .rsplit_once('.')
            .ok_or_else(|| RpcError::IllFormedServiceMethod(service_method.to_string()))?;
        let service = self
            .services
            .read()
            .get(service_name)
            .cloned()
            .ok_or_else(|| RpcError::ServiceNotFound(service_name.to_string()))?;
        let method = service
            .method(method_name)
            .ok_or_else(|| RpcError::MethodNotFound(method_name.to_string()))?;
        Ok((service, method))
    }

    /// Returns the registered services sorted by name.
    pub fn services(&self) -> Vec<Arc<Service>> {
        let mut services: Vec<_> = self.services.read().values().cloned().collect();
        services.sort_by(|a, b| a.name().cmp(b.name()));
        services
    }

    /// Serves every connection `listener` accepts, each on its own task.
    ///
    /// Returns when accepting fails.
    pub async fn accept(self: Arc<Self>, listener: TcpListener) {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    error!("rpc server: accept error: {err}");
                    return;
                }
            };
            debug!("rpc server: connection from {peer}");
            let server = Arc::clone(&self);
            tokio::spawn(async move { server.serve_conn(stream).await });
        }
    }

    /// Serves a single connection until the peer hangs up.
    ///
    /// A connection with a bad handshake is closed without a reply.
    pub async fn serve_conn<T: Transport>(&self, conn: T) {
        let mut conn: BoxedTransport = Box::new(conn);
        let options = match handshake::read_options(&mut conn).await {
            Ok(options) => options,
            Err(err) => {
                error!("rpc server: options error: {err}");
                return;
            }
        };
        if options.magic_number != MAGIC_NUMBER {
            error!("{}", RpcError::InvalidMagicNumber(options.magic_number));
            return;
        }
        let Some(codec_type) = codec::lookup(&options.codec_type) else {
            error!("rpc server: {}", RpcError::InvalidCodecType(options.codec_type));
            return;
        };

        let (reader, writer) = Codec::from_boxed(conn, codec_type).into_split();
        self.serve_codec(reader, writer, options.handle_timeout).await;
    }

    async fn serve_codec(&self, mut reader: CodecReader, writer: CodecWriter, timeout: Duration) {
        let codec_type = reader.codec_type();
        let sending = Arc::new(Mutex::new(writer));
        let mut handlers = JoinSet::new();

        loop {
            match self.read_request(&mut reader).await {
                Ok(Incoming::Request(request)) => {
                    handlers.spawn(handle_request(
                        request,
                        Arc::clone(&sending),
                        codec_type,
                        timeout,
                    ));
                }
                Ok(Incoming::Invalid(mut header, err)) => {
                    header.error = err.to_string();
                    write_response(&sending, &header, None).await;
                }
                Err(_) => break,
            }
            while handlers.try_join_next().is_some() {}
        }

        while handlers.join_next().await.is_some() {}
        sending.lock().await.close().await;
    }

    async fn read_request(&self, reader: &mut CodecReader) -> Result<Incoming, DeserializationError> {
        let header = reader.read_header().await.inspect_err(|err| {
            if !err.is_eof() {
                error!("rpc server: read header error: {err}");
            }
        })?;

        match self.find_service(&header.service_method) {
            Ok((service, method)) => {
                let arg = reader.read_body_bytes().await.inspect_err(|err| {
                    error!("rpc server: read body error: {err}");
                })?;
                Ok(Incoming::Request(Request {
                    header,
                    service,
                    method,
                    arg,
                }))
            }
            Err(err) => {
                reader.discard_body().await?;
                Ok(Incoming::Invalid(header, err))
            }
        }
    }
}

async fn handle_request(
    request: Request,
    sending: Arc<Mutex<CodecWriter>>,
    codec_type: CodecType,
    timeout: Duration,
) {
    let Request {
        mut header,
        service,
        method,
        arg,
    } = request;
    let invocation = tokio::spawn(service.call(&method, codec_type, arg));

    let outcome = if timeout.is_zero() {
        invocation.await
    } else {
        match tokio::time::timeout(timeout, invocation).await {
            Ok(outcome) => outcome,
            Err(_) => {
                // The invocation keeps running detached; its result is dropped.
                header.error = RpcError::HandleTimeout(timeout).to_string();
                write_response(&sending, &header, None).await;
                return;
            }
        }
    };

    match outcome {
        Ok(Ok(reply)) => write_response(&sending, &header, Some(&reply)).await,
        Ok(Err(message)) => {
            header.error = message;
            write_response(&sending, &header, None).await;
        }
        Err(err) => {
            header.error = format!("rpc server: method {} failed: {err}", header.service_method);
            write_response(&sending, &header, None).await;
        }
    }
}

/// Writes one response; `None` sends the empty placeholder body.
async fn write_response(sending: &Mutex<CodecWriter>, header: &Header, body: Option<&[u8]>) {
    let mut writer = sending.lock().await;
    let result = match body {
        Some(body) => writer.write_encoded(header, body).await,
        None => writer.write(header, &()).await,
    };
    if let Err(err) = result {
        error!("rpc server: write response error: {err}");
    }
}
