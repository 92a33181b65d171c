// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Zero-Copy Response Reader (spec.md §4.6).
//!
//! `tonic::Streaming<T>` already hands back `prost::bytes::Bytes` payloads
//! that are reference-counted views over the transport's receive buffer —
//! so "claiming a backing stream" (the spec's Java-flavored description of
//! a zero-copy marshaller, where a buffer would otherwise be recycled once
//! the decode step returns) is just holding on to the `Bytes` value, and
//! "releasing" it is dropping it. `popStream`/`popAllStreams` becomes
//! `next_chunk` (pop one) and `cancel` (drop everything, idempotently).
//! This mapping is recorded as an Open Question resolution in DESIGN.md.

use bytes::Bytes;

use crate::proto::ReadObjectResponse;

/// One decoded response chunk, ready to be copied into the caller's
/// destination buffer or parked in the carry-over buffer.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: Bytes,
    pub crc32c: Option<u32>,
}

/// Consumes response messages from an in-flight `ReadObject` stream,
/// optionally validating each chunk's CRC32C (spec.md §4.2 Phase F).
pub struct ResponseReader {
    inner: Option<tonic::Streaming<ReadObjectResponse>>,
    zero_copy: bool,
    checksums_enabled: bool,
}

impl ResponseReader {
    pub fn new(
        stream: tonic::Streaming<ReadObjectResponse>,
        zero_copy: bool,
        checksums_enabled: bool,
    ) -> Self {
        Self {
            inner: Some(stream),
            zero_copy,
            checksums_enabled,
        }
    }

    /// Pull the next response message and extract its payload, or `None`
    /// at the end of the stream. Per spec.md's open question: a server
    /// that returns zero response messages for a non-empty requested range
    /// is treated as end-of-stream here, same as a stream that ends after
    /// some messages.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, tonic::Status> {
        let Some(stream) = self.inner.as_mut() else {
            return Ok(None);
        };

        loop {
            let Some(response) = stream.message().await? else {
                return Ok(None);
            };
            let Some(data) = response.checksummed_data else {
                // A message with no payload carries no bytes to deliver;
                // move on to the next one rather than treating it as EOF.
                continue;
            };
            let content = if self.zero_copy {
                data.content
            } else {
                Bytes::copy_from_slice(&data.content)
            };
            let crc32c = if self.checksums_enabled && data.crc32c != 0 {
                Some(data.crc32c)
            } else {
                None
            };
            return Ok(Some(Chunk { content, crc32c }));
        }
    }

    /// Validate a chunk's CRC32C against its content, per spec.md §4.2
    /// Phase F: "if checksums are enabled and the response carries a
    /// CRC32C, recompute and compare; fail on mismatch." The per-chunk
    /// check is the one spec.md marks as provisional versus a streaming
    /// combine (§9 Open Question) — this crate implements only the
    /// per-chunk form.
    pub fn verify_checksum(chunk: &Chunk, offset: u64) -> Result<(), crate::error::Error> {
        if let Some(expected) = chunk.crc32c {
            let actual = crc32c::crc32c(&chunk.content);
            if actual != expected {
                return Err(crate::error::Error::ChecksumMismatch {
                    offset,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Cancel the underlying stream, dropping any claimed backing buffers.
    /// Idempotent — calling it twice, or on a reader whose stream already
    /// ended, is a no-op. Synchronous from the caller's point of view:
    /// dropping `tonic::Streaming` tears down the gRPC stream immediately.
    pub fn cancel(&mut self) {
        self.inner = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_none()
    }
}
