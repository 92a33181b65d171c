// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error taxonomy for the read channel.
//!
//! Mirrors the shape of the teacher's `pub(crate) enum Error` in
//! `seekable_http_reader.rs`: a small `thiserror` enum mixing
//! externally-reportable variants with a couple that are only ever matched
//! on internally and never returned from a public method.

use thiserror::Error;

/// Errors surfaced by [`crate::channel::ReadChannel`].
#[derive(Error, Debug)]
pub enum Error {
    /// The object (or the requested generation of it) does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// Read reached the end of the object (`OUT_OF_RANGE` from the RPC).
    #[error("end of object")]
    EndOfObject,

    /// A response chunk's CRC32C did not match the checksum the server sent.
    #[error("checksum mismatch at offset {offset}: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch {
        offset: u64,
        expected: u32,
        actual: u32,
    },

    /// `open()` was called on an object whose `contentEncoding` contains "gzip".
    #[error("gzip-encoded objects are not supported")]
    GzipEncodingUnsupported,

    /// The channel has been closed; every operation but `is_open` fails with this.
    #[error("channel is closed")]
    Closed,

    /// Internal only: the transport underlying the current stub looks broken
    /// and must be evicted before retrying. Never returned from a public method.
    #[error("transport broken")]
    TransportBroken,

    /// Internal only: an RPC exceeded its deadline. Retryable; never returned
    /// from a public method once the retry budget still has attempts left.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Everything else, translated from a non-retryable RPC status.
    #[error("I/O error for {resource}: {message}")]
    Generic { resource: String, message: String },
}

impl Error {
    /// Translate a terminal (non-retryable, or retry-budget-exhausted)
    /// [`tonic::Status`] into a public [`Error`], per spec.md §4.5:
    /// `NOT_FOUND` -> [`Error::NotFound`], `OUT_OF_RANGE` -> [`Error::EndOfObject`],
    /// everything else -> [`Error::Generic`].
    pub fn from_status(status: &tonic::Status, resource: &str) -> Self {
        let err = match status.code() {
            tonic::Code::NotFound => Error::NotFound(resource.to_string()),
            tonic::Code::OutOfRange => Error::EndOfObject,
            _ => Error::Generic {
                resource: resource.to_string(),
                message: status.message().to_string(),
            },
        };
        debug_assert!(
            !err.is_internal_only(),
            "from_status must never surface an internal-only error to a caller"
        );
        err
    }

    /// Internal-only categories (§7): these never escape to a caller.
    pub(crate) fn is_internal_only(&self) -> bool {
        matches!(self, Error::TransportBroken | Error::DeadlineExceeded)
    }
}
