// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Wire types compiled from `proto/storage.proto` by `build.rs`.

pub mod storage {
    tonic::include_proto!("google.storage.v2");
}

pub use storage::{
    ChecksummedData, GetObjectRequest, Object, ObjectChecksums, ReadObjectRequest,
    ReadObjectResponse,
};
