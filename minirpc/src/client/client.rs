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

use crate::RpcError;
use crate::client::call::Call;
use crate::client::pending::{PendingCall, PendingCalls};
use crate::codec::{Codec, CodecReader, CodecType, CodecWriter, Header};
use crate::handshake::{self, Options};
use crate::transport::{BoxedTransport, Transport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// A connection to an RPC server.
///
/// Calls are multiplexed over the connection and correlated by sequence
/// number, so one client can be shared by many tasks. A background task
/// reads responses and hands each one to the call it answers.
///
/// # Examples
///
/// ```rust,no_run
/// use minirpc::client::dial;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = dial("127.0.0.1:9999", None).await?;
/// let sum: i64 = client.call("Num.Add", &(3i64, 4i64)).await?;
/// assert_eq!(sum, 7);
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    codec_type: CodecType,
    options: Options,
    /// Taken out on close.
    sending: Mutex<Option<CodecWriter>>,
    pending: PendingCalls,
    /// Stops the receive loop and any write in progress.
    shutdown: CancellationToken,
}

/// Removes a call from the pending table when its waiter goes away.
struct PendingGuard<'a> {
    pending: &'a PendingCalls,
    seq: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(self.seq);
    }
}

impl Client {
    /// Performs the handshake on `conn` and starts the receive loop.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidCodecType`] if no codec is registered under
    /// the requested identifier, or the error that failed the handshake write.
    pub async fn new<T: Transport>(conn: T, options: Options) -> Result<Self, RpcError> {
        let codec_type = options.codec().inspect_err(|err| {
            error!("rpc client: codec error: {err}");
        })?;

        let mut conn: BoxedTransport = Box::new(conn);
        handshake::write_options(&mut conn, &options)
            .await
            .inspect_err(|err| error!("rpc client: options error: {err}"))?;

        Ok(Self::with_codec(Codec::from_boxed(conn, codec_type), options))
    }

    fn with_codec(codec: Codec, options: Options) -> Self {
        let codec_type = codec.codec_type();
        let (reader, writer) = codec.into_split();
        let inner = Arc::new(ClientInner {
            codec_type,
            options,
            sending: Mutex::new(Some(writer)),
            pending: PendingCalls::new(),
            shutdown: CancellationToken::new(),
        });
        tokio::spawn(receive(Arc::clone(&inner), reader));
        Self { inner }
    }

    /// Returns the options the connection was opened with.
    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Returns `true` while the client is neither closed nor disconnected.
    pub fn is_available(&self) -> bool {
        self.inner.pending.is_available()
    }

    /// Returns the number of calls awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.len()
    }

    /// Starts a call without waiting for it.
    ///
    /// The request is registered immediately and written in the background.
    /// Failures, including a closed client, are reported through
    /// [`Call::done`].
    pub fn go<A, R>(&self, service_method: impl Into<String>, args: &A) -> Call<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let service_method = service_method.into();
        let (mut call, complete) = Call::new(service_method.clone(), self.inner.codec_type);

        let body = match self.inner.codec_type.encode(args) {
            Ok(body) => body,
            Err(err) => {
                complete(Err(err.into()));
                return call;
            }
        };

        let seq = match self
            .inner
            .pending
            .register(PendingCall::new(service_method.clone(), complete))
        {
            Ok(seq) => seq,
            Err(rejected) => {
                rejected.finish(Err(RpcError::Shutdown));
                return call;
            }
        };
        call.set_seq(seq);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let header = Header::new(service_method, seq);
            let result = tokio::select! {
                biased;
                _ = inner.shutdown.cancelled() => Err(RpcError::Shutdown),
                result = send(&inner, &header, &body) => result,
            };
            if let Err(err) = result {
                if let Some(call) = inner.pending.remove(seq) {
                    call.finish(Err(err));
                }
            }
        });
        call
    }

    /// Calls `service_method` and waits for the reply.
    ///
    /// Dropping the returned future withdraws the call from the pending
    /// table; a late reply is then discarded.
    pub async fn call<A, R>(&self, service_method: &str, args: &A) -> Result<R, RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let call = self.go(service_method, args);
        let _guard = PendingGuard {
            pending: &self.inner.pending,
            seq: call.seq(),
        };
        call.done().await
    }

    /// Like [`call`](Self::call), giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::CallTimeout`] when the deadline passes first.
    pub async fn call_timeout<A, R>(
        &self,
        service_method: &str,
        args: &A,
        timeout: Duration,
    ) -> Result<R, RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        tokio::time::timeout(timeout, self.call(service_method, args))
            .await
            .unwrap_or_else(|_| Err(RpcError::CallTimeout(service_method.to_string())))
    }

    /// Like [`call`](Self::call), giving up when `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::CallTimeout`] when the token fires first.
    pub async fn call_with_cancel<A, R>(
        &self,
        token: &CancellationToken,
        service_method: &str,
        args: &A,
    ) -> Result<R, RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        tokio::select! {
            result = self.call(service_method, args) => result,
            _ = token.cancelled() => Err(RpcError::CallTimeout(service_method.to_string())),
        }
    }

    /// Closes the connection.
    ///
    /// Calls still pending fail with [`RpcError::Shutdown`]. Writes blocked
    /// on a peer that stopped reading are abandoned, so this never waits on
    /// the network.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Shutdown`] if the client was already closed.
    pub async fn close(&self) -> Result<(), RpcError> {
        if !self.inner.pending.mark_closing() {
            return Err(RpcError::Shutdown);
        }
        self.inner.shutdown.cancel();
        // Writers release the lock as soon as they see the cancellation. The
        // stream closes once the receive loop drops its half too.
        drop(self.inner.sending.lock().await.take());
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

async fn send(inner: &ClientInner, header: &Header, body: &[u8]) -> Result<(), RpcError> {
    match inner.sending.lock().await.as_mut() {
        Some(writer) => Ok(writer.write_encoded(header, body).await?),
        None => Err(RpcError::Shutdown),
    }
}

async fn receive(inner: Arc<ClientInner>, mut reader: CodecReader) {
    let err = loop {
        let header = tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => break RpcError::Shutdown,
            header = reader.read_header() => match header {
                Ok(header) => header,
                Err(err) => break RpcError::from(err),
            },
        };

        match inner.pending.remove(header.seq) {
            None => {
                if let Err(err) = reader.discard_body().await {
                    break err.into();
                }
            }
            Some(call) if header.is_error() => {
                let discarded = reader.discard_body().await;
                call.finish(Err(RpcError::Remote(header.error)));
                if let Err(err) = discarded {
                    break err.into();
                }
            }
            Some(call) => match reader.read_body_bytes().await {
                Ok(body) => call.finish(Ok(body)),
                Err(err) => {
                    call.finish(Err(RpcError::ReadBody(err.to_string())));
                    break err.into();
                }
            },
        }
    };

    debug!("rpc client: receive loop ended: {err}");
    if err.is_shutdown() {
        inner.pending.terminate(|| RpcError::Shutdown);
    } else {
        let reason = err.to_string();
        inner.pending.terminate(|| RpcError::ConnectionLost {
            reason: reason.clone(),
        });
    }
}
