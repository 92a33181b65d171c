// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Stub Handle & broken-transport recovery (spec.md §4.4).
//!
//! The teacher holds its HTTP reader/range-fetcher behind a `Mutex` in
//! `ReadingMaterials` and rebuilds it on rewind (`seekable_http_reader.rs`,
//! around `reading_stuff.reader = None`). The gRPC analogue is a stub that
//! gets evicted and recreated when the transport looks broken rather than
//! merely rewound; `StubHandle` plays that role.

use async_trait::async_trait;

use crate::error::Error;
use crate::proto::{ReadObjectRequest, ReadObjectResponse};

/// A thin wrapper around a generated `tonic` client, exposing only the one
/// streaming call the core needs. The stub factory and transport pool
/// themselves are external collaborators (spec.md §1) — this trait is the
/// entire surface the channel consumes from them.
#[async_trait]
pub trait ReadObjectStub: Send {
    async fn read_object(
        &mut self,
        request: ReadObjectRequest,
    ) -> Result<tonic::Streaming<ReadObjectResponse>, tonic::Status>;
}

/// External provider of fresh stubs and eviction of broken transports,
/// per spec.md §4.4: `newBlockingStub()`, `isStubBroken(statusCode)`,
/// `evictChannelFromPool(transport)`.
#[async_trait]
pub trait StubProvider: Send + Sync {
    type Stub: ReadObjectStub;

    async fn new_stub(&self) -> Result<Self::Stub, Error>;

    fn is_stub_broken(&self, code: tonic::Code) -> bool {
        matches!(
            code,
            tonic::Code::Unavailable | tonic::Code::Internal | tonic::Code::Unknown
        )
    }

    /// Evict the transport backing `stub` from the pool so the next
    /// `new_stub` call gets a fresh connection. The default is a no-op: a
    /// provider with no pool (e.g. a direct channel) has nothing to evict.
    async fn evict(&self, _stub: Self::Stub) {}
}

/// Holds the current stub; the only field the channel's own methods
/// mutably share (spec.md §5). Swapping it only ever happens between RPC
/// attempts inside the retry executor, never during an in-flight call.
pub struct StubHandle<P: StubProvider> {
    provider: P,
    current: Option<P::Stub>,
}

impl<P: StubProvider> StubHandle<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            current: None,
        }
    }

    /// Get the current stub, creating one if this is the first call.
    pub async fn get(&mut self) -> Result<&mut P::Stub, Error> {
        if self.current.is_none() {
            self.current = Some(self.provider.new_stub().await?);
        }
        Ok(self.current.as_mut().expect("just inserted"))
    }

    /// Evict the current transport and clear the cached stub so the next
    /// `get` builds a fresh one, per spec.md §4.4.
    pub async fn evict_current(&mut self) {
        if let Some(stub) = self.current.take() {
            self.provider.evict(stub).await;
        }
    }

    pub fn is_broken(&self, code: tonic::Code) -> bool {
        self.provider.is_stub_broken(code)
    }
}
