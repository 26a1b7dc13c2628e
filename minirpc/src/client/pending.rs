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

//! Tracking of calls awaiting a response.
//!
//! Sequence numbers start at 1 and are never reused within a client; 0 is
//! never handed out. The table also carries the client's lifecycle flags so
//! that registration and shutdown are decided under the same lock.

use crate::RpcError;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Delivers the outcome of a call: the encoded reply body or the error.
pub(crate) type Completion = Box<dyn FnOnce(Result<Vec<u8>, RpcError>) + Send>;

/// A call that has been sent and not yet answered.
pub(crate) struct PendingCall {
    pub(crate) service_method: String,
    pub(crate) complete: Completion,
}

impl PendingCall {
    pub(crate) fn new(service_method: String, complete: Completion) -> Self {
        Self {
            service_method,
            complete,
        }
    }

    /// Completes the call, consuming it.
    pub(crate) fn finish(self, outcome: Result<Vec<u8>, RpcError>) {
        (self.complete)(outcome)
    }
}

struct State {
    seq: u64,
    calls: HashMap<u64, PendingCall>,
    /// The user closed the client.
    closing: bool,
    /// The connection ended.
    shutdown: bool,
}

/// Pending call table of one client.
pub(crate) struct PendingCalls {
    state: Mutex<State>,
}

impl PendingCalls {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                seq: 1,
                calls: HashMap::new(),
                closing: false,
                shutdown: false,
            }),
        }
    }

    /// Assigns the next sequence number to `call` and stores it.
    ///
    /// Hands the call back if the client is closing or shut down.
    pub(crate) fn register(&self, call: PendingCall) -> Result<u64, PendingCall> {
        let mut state = self.state.lock();
        if state.closing || state.shutdown {
            return Err(call);
        }
        let seq = state.seq;
        state.seq += 1;
        state.calls.insert(seq, call);
        Ok(seq)
    }

    /// Removes and returns the call registered under `seq`.
    pub(crate) fn remove(&self, seq: u64) -> Option<PendingCall> {
        self.state.lock().calls.remove(&seq)
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Marks the client as closing.
    ///
    /// Returns `false` if it was already closing.
    pub(crate) fn mark_closing(&self) -> bool {
        let mut state = self.state.lock();
        !std::mem::replace(&mut state.closing, true)
    }

    pub(crate) fn is_available(&self) -> bool {
        let state = self.state.lock();
        !state.closing && !state.shutdown
    }

    /// Marks the connection as ended and fails every pending call.
    pub(crate) fn terminate(&self, error: impl Fn() -> RpcError) {
        let calls: Vec<_> = {
            let mut state = self.state.lock();
            state.shutdown = true;
            state.calls.drain().map(|(_, call)| call).collect()
        };
        for call in calls {
            call.finish(Err(error()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop_call() -> PendingCall {
        PendingCall::new("Foo.Sum".to_string(), Box::new(|_| {}))
    }

    #[test]
    fn test_sequence_starts_at_one() {
        let pending = PendingCalls::new();
        assert_eq!(pending.register(noop_call()).ok(), Some(1));
        assert_eq!(pending.register(noop_call()).ok(), Some(2));
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_remove() {
        let pending = PendingCalls::new();
        let seq = pending.register(noop_call()).ok().unwrap();

        let call = pending.remove(seq).unwrap();
        assert_eq!(call.service_method, "Foo.Sum");
        assert!(pending.remove(seq).is_none());
        assert_eq!(pending.len(), 0);
    }

    #[test]
    fn test_closing_rejects_registration() {
        let pending = PendingCalls::new();
        assert!(pending.is_available());
        assert!(pending.mark_closing());
        assert!(!pending.mark_closing());
        assert!(!pending.is_available());
        assert!(pending.register(noop_call()).is_err());
    }

    #[test]
    fn test_terminate_fails_all() {
        let pending = PendingCalls::new();
        let failed = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let failed = Arc::clone(&failed);
            let call = PendingCall::new(
                "Foo.Sum".to_string(),
                Box::new(move |outcome| {
                    assert!(matches!(outcome, Err(RpcError::Shutdown)));
                    failed.fetch_add(1, Ordering::SeqCst);
                }),
            );
            pending.register(call).ok().unwrap();
        }

        pending.terminate(|| RpcError::Shutdown);
        assert_eq!(failed.load(Ordering::SeqCst), 3);
        assert_eq!(pending.len(), 0);
        assert!(!pending.is_available());
        assert!(pending.register(noop_call()).is_err());
    }
}
