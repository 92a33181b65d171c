// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The metadata-only RPC collaborator surface.
//!
//! Per spec.md §1, the *existence* of a metadata lookup returning
//! `{size, generation, contentEncoding}` is required; its implementation
//! (auth, transport, the actual `GetObject` unary call) is explicitly out
//! of scope. This module only specifies the trait `ReadChannel::open`
//! consumes.

use async_trait::async_trait;

use crate::error::Error;
use crate::resource::{ObjectInfo, ResourceId};

/// External collaborator that resolves a [`ResourceId`] to concrete
/// [`ObjectInfo`], restricted to the fields the core needs
/// (`contentEncoding, generation, size` per spec.md §4.1 step 1).
#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn get_object_metadata(&self, resource: &ResourceId) -> Result<ObjectInfo, Error>;
}
