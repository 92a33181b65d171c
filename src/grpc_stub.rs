// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Default [`StubProvider`]/[`ReadObjectStub`] wiring against a real
//! `tonic::transport::Channel`, for callers who don't need a custom stub
//! factory or connection pool (spec.md §1 treats the pool itself as an
//! external collaborator; this is the straightforward case where there
//! isn't one).

use async_trait::async_trait;
use tonic::transport::Channel;

use crate::error::Error;
use crate::proto::storage::storage_client::StorageClient;
use crate::proto::{ReadObjectRequest, ReadObjectResponse};
use crate::stub::{ReadObjectStub, StubProvider};

#[async_trait]
impl ReadObjectStub for StorageClient<Channel> {
    async fn read_object(
        &mut self,
        request: ReadObjectRequest,
    ) -> Result<tonic::Streaming<ReadObjectResponse>, tonic::Status> {
        Ok(StorageClient::read_object(self, request).await?.into_inner())
    }
}

/// Hands out stubs backed by clones of one shared [`Channel`]. Cloning a
/// `Channel` is cheap — it's a handle onto the same connection pool, not a
/// new connection — so `evict` is the only operation that actually tears
/// anything down, and it has nothing to do here: a plain `Channel` has no
/// pool membership to evict from.
pub struct ChannelStubProvider {
    channel: Channel,
}

impl ChannelStubProvider {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl StubProvider for ChannelStubProvider {
    type Stub = StorageClient<Channel>;

    async fn new_stub(&self) -> Result<Self::Stub, Error> {
        Ok(StorageClient::new(self.channel.clone()))
    }
}
