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

use crate::RpcError;
use crate::codec::CodecType;
use crate::client::pending::Completion;
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

/// An in-flight asynchronous call started with [`Client::go`](crate::Client::go).
///
/// Await [`done`](Self::done) for the outcome. Dropping a `Call` does not
/// withdraw it from the client; the reply is discarded when it arrives.
#[derive(Debug)]
pub struct Call<R> {
    seq: u64,
    service_method: String,
    done: oneshot::Receiver<Result<R, RpcError>>,
}

impl<R> Call<R>
where
    R: DeserializeOwned + Send + 'static,
{
    /// Creates a call and the completion that resolves it.
    ///
    /// The completion decodes the reply body with `codec_type`.
    pub(crate) fn new(service_method: String, codec_type: CodecType) -> (Self, Completion) {
        let (tx, rx) = oneshot::channel();
        let complete: Completion = Box::new(move |outcome: Result<Vec<u8>, RpcError>| {
            let result = outcome.and_then(|body| {
                codec_type
                    .decode::<R>(&body)
                    .map_err(|e| RpcError::ReadBody(e.to_string()))
            });
            let _ = tx.send(result);
        });
        let call = Self {
            seq: 0,
            service_method,
            done: rx,
        };
        (call, complete)
    }

    pub(crate) fn set_seq(&mut self, seq: u64) {
        self.seq = seq;
    }

    /// Returns the sequence number, or 0 if the call was never sent.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the `"Service.Method"` target.
    pub fn service_method(&self) -> &str {
        &self.service_method
    }

    /// Waits for the outcome.
    pub async fn done(self) -> Result<R, RpcError> {
        self.done.await.unwrap_or(Err(RpcError::Shutdown))
    }
}
