// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Read Channel (spec.md §4.2, §6) — the front door orchestrating the
//! Footer Cache, Carry-Over Buffer, Read Strategy & Seek Planner, Stub
//! Handle, and Zero-Copy Response Reader behind a single seekable,
//! generation-pinned streaming read surface.

use std::time::Duration;

use crate::carry_over::CarryOver;
use crate::config::{Fadvise, ReadOptions};
use crate::error::Error;
use crate::footer::Footer;
use crate::metadata::MetadataClient;
use crate::proto::ReadObjectRequest;
use crate::resource::{ObjectInfo, ResourceId};
use crate::response_reader::ResponseReader;
use crate::retry::{self, RetryPolicy};
use crate::strategy::{self, PlannedRange, Strategy};
use crate::stub::{StubHandle, StubProvider};

/// An in-flight `ReadObject` stream and the range it was opened for.
struct ActiveStream {
    reader: ResponseReader,
    /// `None` encodes an unbounded range ("to end of object"), i.e.
    /// spec.md's `endOffset = -1`.
    end_offset: Option<u64>,
}

/// A generation-pinned, seekable, streaming read channel over one object
/// revision (spec.md §1-§3). Not safe for concurrent use by multiple
/// callers; a single owner drives it start to finish.
pub struct ReadChannel<P: StubProvider> {
    resource: ResourceId,
    info: ObjectInfo,
    options: ReadOptions,
    fadvise: Fadvise,
    strategy: Strategy,
    open: bool,
    position_in_stream: u64,
    bytes_to_skip_before_reading: u64,
    carry_over: Option<CarryOver>,
    active_stream: Option<ActiveStream>,
    footer: Option<Footer>,
    stub: StubHandle<P>,
    retry_policy: RetryPolicy,
}

impl<P: StubProvider> ReadChannel<P> {
    /// Open a channel for `resource`, per spec.md §4.1. Resolves
    /// `resource.generation` (if unset) via `metadata`, rejects
    /// gzip-encoded objects, and prefetches the footer. The whole
    /// sequence is retried end-to-end under the backoff policy.
    pub async fn open<M: MetadataClient>(
        resource: ResourceId,
        options: ReadOptions,
        metadata: &M,
        provider: P,
    ) -> Result<Self, Error> {
        let retry_policy = RetryPolicy::default();
        let mut stub = StubHandle::new(provider);
        let schedule = retry_policy.schedule();
        let mut waits = (&schedule).into_iter();

        let (info, footer) = loop {
            match Self::open_once(&resource, &options, metadata, &mut stub).await {
                Ok(result) => break result,
                Err(err @ Error::Generic { .. }) => match waits.next() {
                    Some(Some(duration)) => {
                        tokio::time::sleep(duration).await;
                    }
                    _ => return Err(err),
                },
                Err(err) => return Err(err),
            }
        };

        let fadvise = options.fadvise;
        Ok(Self {
            resource,
            info,
            fadvise,
            strategy: Strategy::initial(fadvise),
            options,
            open: true,
            position_in_stream: 0,
            bytes_to_skip_before_reading: 0,
            carry_over: None,
            active_stream: None,
            footer,
            stub,
            retry_policy,
        })
    }

    async fn open_once<M: MetadataClient>(
        resource: &ResourceId,
        options: &ReadOptions,
        metadata: &M,
        stub: &mut StubHandle<P>,
    ) -> Result<(ObjectInfo, Option<Footer>), Error> {
        // Step 1: resolve metadata under the per-RPC deadline, retrying
        // transient socket errors (and deadline exhaustion) only.
        let info = retry::retry(
            &RetryPolicy::default(),
            retry::error_retryable_socket_only,
            || async {
                match tokio::time::timeout(
                    options.grpc_read_timeout,
                    metadata.get_object_metadata(resource),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(Error::DeadlineExceeded),
                }
            },
        )
        .await?;

        // Step 2: reject gzip-encoded objects.
        if info.is_gzip_encoded() {
            return Err(Error::GzipEncodingUnsupported);
        }

        // Step 3: prefetch the footer, tolerating an empty response.
        let footer = Self::prefetch_footer(resource, options, &info, stub).await?;

        Ok((info, footer))
    }

    async fn prefetch_footer(
        resource: &ResourceId,
        options: &ReadOptions,
        info: &ObjectInfo,
        stub: &mut StubHandle<P>,
    ) -> Result<Option<Footer>, Error> {
        let footer_start = options.footer_start(info.size);
        if footer_start >= info.size {
            return Ok(None);
        }

        let request = ReadObjectRequest {
            bucket: resource.bucket.clone(),
            object: resource.object.clone(),
            generation: info.generation as i64,
            read_offset: footer_start as i64,
            read_limit: 0,
        };

        let resource_name = resource.display_name();
        let retry_policy = RetryPolicy::default();
        let stream = Self::open_stream_with_stub(
            stub,
            &retry_policy,
            options.grpc_read_timeout,
            &resource_name,
            request,
        )
        .await?;

        // Checksums are skipped for the footer prefetch: it's a one-shot
        // read that's immediately re-served from memory, not replayed
        // through the normal Phase F validation path.
        let mut reader = ResponseReader::new(stream, options.grpc_read_zero_copy_enabled, false);
        let mut bytes = bytes::BytesMut::new();
        while let Some(chunk) = reader
            .next_chunk()
            .await
            .map_err(|status| Error::from_status(&status, &resource_name))?
        {
            bytes.extend_from_slice(&chunk.content);
        }

        if bytes.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Footer::new(footer_start, bytes.freeze())))
        }
    }

    /// Open a new `ReadObject` stream, retrying under the backoff policy,
    /// enforcing `timeout` as a per-attempt deadline, and evicting/
    /// recreating the stub on broken-transport signals (spec.md §4.4,
    /// §4.5, §6 `grpcReadTimeoutMillis`).
    async fn open_stream_with_stub(
        stub: &mut StubHandle<P>,
        retry_policy: &RetryPolicy,
        timeout: Duration,
        resource_name: &str,
        request: ReadObjectRequest,
    ) -> Result<tonic::Streaming<crate::proto::ReadObjectResponse>, Error> {
        let attempt = retry::retry(retry_policy, retry::retry_all, || async {
            let call = async {
                match stub.get().await {
                    Ok(s) => s.read_object(request.clone()).await,
                    Err(_) => Err(tonic::Status::unavailable("stub provider failed")),
                }
            };
            let result = match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(tonic::Status::deadline_exceeded("per-RPC deadline exceeded")),
            };
            if let Err(status) = &result {
                if stub.is_broken(status.code()) {
                    stub.evict_current().await;
                }
            }
            result
        })
        .await;

        attempt.map_err(|status| Error::from_status(&status, resource_name))
    }

    async fn open_stream(
        &mut self,
        request: ReadObjectRequest,
    ) -> Result<tonic::Streaming<crate::proto::ReadObjectResponse>, Error> {
        let resource_name = self.resource.display_name();
        Self::open_stream_with_stub(
            &mut self.stub,
            &self.retry_policy,
            self.options.grpc_read_timeout,
            &resource_name,
            request,
        )
        .await
    }

    /// Read up to `dest.len()` bytes, returning the number written, or
    /// `-1` at EOF. Implements spec.md §4.2 Phases A-G.
    pub async fn read(&mut self, dest: &mut [u8]) -> Result<i64, Error> {
        if !self.open {
            return Err(Error::Closed);
        }
        if dest.is_empty() {
            return Ok(0);
        }
        let want = dest.len() as u64;
        let mut written = 0usize;

        // Phase A — range invalidation.
        if let Some(active) = &self.active_stream {
            if let Some(end_offset) = active.end_offset {
                let logical_position = self.position_in_stream + self.bytes_to_skip_before_reading;
                if logical_position + want > end_offset {
                    self.commit_skip();
                    self.cancel_active_stream();
                    self.carry_over = None;
                }
            }
        }

        // Phase B — drain carry-over.
        if let Some(carry) = self.carry_over.as_mut() {
            if self.bytes_to_skip_before_reading > 0 {
                let skipped = carry.skip(self.bytes_to_skip_before_reading);
                self.position_in_stream += skipped;
                self.bytes_to_skip_before_reading -= skipped;
            }
            if !carry.is_empty() {
                let n = carry.copy_into(&mut dest[written..]);
                self.position_in_stream += n as u64;
                written += n;
            }
            if carry.is_empty() {
                self.carry_over = None;
            }
        }

        if written == dest.len() {
            return Ok(written as i64);
        }

        // Phase C — EOF.
        if self.position_in_stream == self.info.size {
            return if written == 0 {
                Ok(-1)
            } else {
                Ok(written as i64)
            };
        }

        // Phase D — footer short-circuit.
        let effective = self.position_in_stream + self.bytes_to_skip_before_reading;
        if let Some(footer) = self.footer.clone() {
            if effective >= footer.start_offset {
                self.commit_skip();
                let n = footer.copy_from(self.position_in_stream, &mut dest[written..]);
                self.position_in_stream += n as u64;
                written += n;
                return Ok(written as i64);
            }
        }

        // Phase E/F — ensure an active stream and consume from it. A
        // mid-stream broken-transport signal (spec.md §7: `TransportBroken`
        // "drives stub recreation and retry") evicts the stub and reopens a
        // fresh range stream at the current position rather than
        // propagating to the caller, up to the backoff budget.
        let schedule = self.retry_policy.schedule();
        let mut waits = (&schedule).into_iter();
        loop {
            if self.active_stream.is_none() {
                self.ensure_active_stream(dest.len() as u64 - written as u64)
                    .await?;
            }
            // `consume_responses` reports how many bytes it committed to
            // `dest` even when it errors out partway through, so a chunk
            // copied just before a broken-transport signal is never
            // silently dropped and overwritten on retry.
            let (n, result) = self.consume_responses(&mut dest[written..]).await;
            written += n;
            match result {
                Ok(()) => break,
                Err(Error::TransportBroken) => match waits.next() {
                    Some(Some(duration)) => tokio::time::sleep(duration).await,
                    _ => {
                        return Err(Error::Generic {
                            resource: self.resource.display_name(),
                            message: "transport broken; retry budget exhausted".to_string(),
                        })
                    }
                },
                Err(err) => return Err(err),
            }
        }

        // Phase G — footer tail splice.
        if written < dest.len() {
            if let Some(footer) = self.footer.clone() {
                if self.position_in_stream >= footer.start_offset {
                    let n = footer.copy_from(self.position_in_stream, &mut dest[written..]);
                    self.position_in_stream += n as u64;
                    written += n;
                }
            }
        }

        Ok(written as i64)
    }

    async fn ensure_active_stream(&mut self, want: u64) -> Result<(), Error> {
        let planned = strategy::plan(
            &self.options,
            self.strategy,
            self.position_in_stream,
            want,
            self.footer.as_ref(),
        );
        self.commit_skip();

        let (read_limit, end_offset) = match planned {
            PlannedRange::Unbounded => (0i64, None),
            PlannedRange::Bounded(len) => (len as i64, Some(self.position_in_stream + len)),
        };
        let request = ReadObjectRequest {
            bucket: self.resource.bucket.clone(),
            object: self.resource.object.clone(),
            generation: self.info.generation as i64,
            read_offset: self.position_in_stream as i64,
            read_limit,
        };

        let stream = self.open_stream(request).await?;
        let reader = ResponseReader::new(
            stream,
            self.options.grpc_read_zero_copy_enabled,
            self.options.grpc_checksums_enabled,
        );
        self.active_stream = Some(ActiveStream { reader, end_offset });
        Ok(())
    }

    /// Pull chunks into `dest` until it's full, the stream ends, or an
    /// error interrupts the pump. Always returns how many bytes it
    /// actually committed to `dest`, even on `Err` — a chunk copied just
    /// before a later chunk's error must not be lost, since `read`'s
    /// retry loop reopens the stream and resumes past exactly that many
    /// bytes.
    async fn consume_responses(&mut self, dest: &mut [u8]) -> (usize, Result<(), Error>) {
        let mut written = 0usize;
        while written < dest.len() {
            let Some(active) = self.active_stream.as_mut() else {
                break;
            };
            let chunk = match active.reader.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => {
                    // Open question (spec.md §9): zero messages for a
                    // non-empty requested range is treated as end-of-stream.
                    self.cancel_active_stream();
                    break;
                }
                Err(status) => {
                    self.cancel_active_stream();
                    if self.stub.is_broken(status.code()) {
                        self.stub.evict_current().await;
                        return (written, Err(Error::TransportBroken));
                    }
                    let resource_name = self.resource.display_name();
                    return (written, Err(Error::from_status(&status, &resource_name)));
                }
            };

            if self.options.grpc_checksums_enabled {
                if let Err(err) = ResponseReader::verify_checksum(&chunk, self.position_in_stream) {
                    return (written, Err(err));
                }
            }

            let mut content = chunk.content;

            if self.bytes_to_skip_before_reading > 0 {
                if (content.len() as u64) <= self.bytes_to_skip_before_reading {
                    self.position_in_stream += content.len() as u64;
                    self.bytes_to_skip_before_reading -= content.len() as u64;
                    continue;
                }
                let skip = self.bytes_to_skip_before_reading as usize;
                content = content.slice(skip..);
                self.position_in_stream += skip as u64;
                self.bytes_to_skip_before_reading = 0;
            }

            let to_copy = content.len().min(dest.len() - written);
            dest[written..written + to_copy].copy_from_slice(&content[..to_copy]);
            written += to_copy;
            self.position_in_stream += to_copy as u64;

            if content.len() > to_copy {
                self.carry_over = Some(CarryOver::new(content.slice(to_copy..)));
            }
        }
        (written, Ok(()))
    }

    /// Seek to `position`, per spec.md §4.3. Either defers as an in-place
    /// skip absorbed by the next read, or tears down the active stream.
    pub async fn seek(&mut self, position: u64) -> Result<(), Error> {
        if !self.open {
            return Err(Error::Closed);
        }
        if position >= self.info.size {
            return Err(Error::Generic {
                resource: self.resource.display_name(),
                message: format!(
                    "seek target {position} out of range for object size {}",
                    self.info.size
                ),
            });
        }
        if position == self.position_in_stream {
            return Ok(());
        }

        if position > self.position_in_stream {
            let distance = position - self.position_in_stream;
            if distance <= self.options.inplace_seek_limit {
                self.bytes_to_skip_before_reading = distance;
                self.strategy = self.strategy.after_seek(self.fadvise, true);
                return Ok(());
            }
        }

        self.strategy = self.strategy.after_seek(self.fadvise, false);
        self.cancel_active_stream();
        self.carry_over = None;
        self.position_in_stream = position;
        self.bytes_to_skip_before_reading = 0;
        Ok(())
    }

    /// The logical offset exposed to callers: `positionInStream +
    /// bytesToSkipBeforeReading`.
    pub fn position(&self) -> u64 {
        self.position_in_stream + self.bytes_to_skip_before_reading
    }

    pub fn size(&self) -> u64 {
        self.info.size
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Always fails: the channel is read-only.
    pub fn write(&mut self, _src: &[u8]) -> Result<usize, Error> {
        Err(Error::Generic {
            resource: self.resource.display_name(),
            message: "channel is read-only".to_string(),
        })
    }

    /// Always fails: truncation is not supported.
    pub fn truncate(&mut self, _size: u64) -> Result<(), Error> {
        Err(Error::Generic {
            resource: self.resource.display_name(),
            message: "truncate is not supported".to_string(),
        })
    }

    /// Idempotent close: cancels any active stream, releases the
    /// carry-over buffer, and flips `open` to `false`. After this, every
    /// operation but [`Self::is_open`] fails with [`Error::Closed`].
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.cancel_active_stream();
        self.carry_over = None;
        self.open = false;
    }

    fn commit_skip(&mut self) {
        self.position_in_stream += self.bytes_to_skip_before_reading;
        self.bytes_to_skip_before_reading = 0;
    }

    fn cancel_active_stream(&mut self) {
        if let Some(mut active) = self.active_stream.take() {
            active.reader.cancel();
            debug_assert!(active.reader.is_cancelled());
        }
    }
}
