// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration surface (spec.md §6) and the `Fadvise` access-pattern hint.
//!
//! `Fadvise` plays the same role as the teacher's `AccessPattern` in
//! `seekable_http_reader.rs`, with one addition the teacher didn't need:
//! `Auto`, which latches to `Random` the first time a seek disqualifies
//! in-place skipping (spec.md §4.3, §9).

use std::time::Duration;

/// Caller-declared access pattern hint.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Fadvise {
    /// Successive reads proceed forward through the object; keep a single
    /// unbounded stream open.
    Sequential,
    /// Accesses jump around the object; issue bounded range reads.
    Random,
    /// Start `Sequential`, latch to `Random` on the first seek that can't be
    /// absorbed as an in-place skip. One-way: never latches back.
    Auto,
}

impl Default for Fadvise {
    fn default() -> Self {
        Self::Auto
    }
}

/// Tunables for a [`crate::channel::ReadChannel`], per spec.md §6.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Initial access-pattern hint.
    pub fadvise: Fadvise,
    /// Used to size `Random`-mode reads and to derive the footer prefetch
    /// size (`min_range_request_size / 2`).
    pub min_range_request_size: u64,
    /// Maximum forward distance absorbed as an in-buffer skip; also a floor
    /// for `Random`-mode range size.
    pub inplace_seek_limit: u64,
    /// Per-RPC deadline.
    pub grpc_read_timeout: Duration,
    /// Enables CRC32C validation of response chunks.
    pub grpc_checksums_enabled: bool,
    /// Enables zero-copy buffer retention in the response reader.
    pub grpc_read_zero_copy_enabled: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            fadvise: Fadvise::default(),
            min_range_request_size: 2 * 1024 * 1024,
            inplace_seek_limit: 8 * 1024,
            grpc_read_timeout: Duration::from_secs(60),
            grpc_checksums_enabled: true,
            grpc_read_zero_copy_enabled: true,
        }
    }
}

impl ReadOptions {
    /// `footerStart = max(0, size - prefetchSize)`, spec.md §4.1 step 3.
    pub fn footer_start(&self, size: u64) -> u64 {
        size.saturating_sub(self.prefetch_size())
    }

    /// The footer prefetch size: half of `min_range_request_size`.
    pub fn prefetch_size(&self) -> u64 {
        self.min_range_request_size / 2
    }
}
