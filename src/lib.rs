// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A generation-pinned, seekable, streaming read channel over a cloud
//! object-storage gRPC streaming RPC, modeled on the `ReadObject` call of
//! Google Cloud Storage's `google.storage.v2` API and the read-channel
//! design of the Java GCS Hadoop connector.
//!
//! The core type is [`channel::ReadChannel`]: open it once for a
//! `(bucket, object)` pair (optionally pinned to a specific generation),
//! then drive it with [`channel::ReadChannel::read`] and
//! [`channel::ReadChannel::seek`] like any other seekable reader. Two
//! external collaborators are supplied by the caller as trait
//! implementations — [`metadata::MetadataClient`] for the one-shot object
//! metadata lookup, and [`stub::StubProvider`] for producing and recycling
//! the underlying gRPC stubs — so this crate owns only the read-path state
//! machine, not transport or auth.

pub mod carry_over;
pub mod channel;
pub mod config;
pub mod error;
pub mod footer;
pub mod grpc_stub;
pub mod metadata;
pub mod proto;
pub mod resource;
pub mod response_reader;
pub mod retry;
pub mod strategy;
pub mod stub;

pub use channel::ReadChannel;
pub use config::{Fadvise, ReadOptions};
pub use error::Error;
pub use grpc_stub::ChannelStubProvider;
pub use metadata::MetadataClient;
pub use resource::{ObjectInfo, ResourceId};
pub use stub::{ReadObjectStub, StubProvider};
