// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Server code is only ever used by the in-process mock harness in
    // tests/channel_tests.rs, but tonic-build compiles both client and
    // server from the same invocation, so there's no separate "test-only"
    // build step to wire up.
    //
    // `.bytes(["."])` maps every proto `bytes` field to `bytes::Bytes`
    // instead of `Vec<u8>`, so `ResponseReader` can hand callers a
    // reference-counted view over the decoded frame instead of an owned
    // copy (spec.md §4.6's zero-copy requirement).
    tonic_build::configure()
        .bytes(["."])
        .compile_protos(&["proto/storage.proto"], &["proto"])?;
    Ok(())
}
