// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Stream one object from a `google.storage.v2`-shaped gRPC endpoint to a
//! local file, exercising [`gcs_read_channel::ReadChannel`] end to end.
//!
//! Mirrors the CLI shape of the teacher's `ripunzip` binary (`clap` +
//! `anyhow` + a plain loop doing the real work), generalized from
//! unzipping a local file to streaming a remote one.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tonic::transport::Endpoint;

use gcs_read_channel::proto::storage::storage_client::StorageClient;
use gcs_read_channel::proto::GetObjectRequest;
use gcs_read_channel::{
    ChannelStubProvider, Error, Fadvise, MetadataClient, ObjectInfo, ReadChannel, ReadOptions,
    ResourceId,
};

/// Download one object from a storage gRPC endpoint, streaming it through
/// a generation-pinned read channel.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// gRPC endpoint, e.g. `http://localhost:9000`
    #[arg(long)]
    endpoint: String,
    /// Bucket name
    #[arg(long)]
    bucket: String,
    /// Object name
    #[arg(long)]
    object: String,
    /// Pin to a specific object generation instead of resolving the latest
    #[arg(long)]
    generation: Option<u64>,
    /// Access pattern hint
    #[arg(long, value_enum, default_value = "auto")]
    fadvise: FadviseArg,
    /// Destination file
    #[arg(value_name = "OUT")]
    out: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FadviseArg {
    Sequential,
    Random,
    Auto,
}

impl From<FadviseArg> for Fadvise {
    fn from(value: FadviseArg) -> Self {
        match value {
            FadviseArg::Sequential => Fadvise::Sequential,
            FadviseArg::Random => Fadvise::Random,
            FadviseArg::Auto => Fadvise::Auto,
        }
    }
}

/// Resolves object metadata via the same `Storage` service's `GetObject`
/// unary call. A minimal stand-in for the auth'd, pooled implementation a
/// real deployment would supply — `MetadataClient`'s implementation is
/// explicitly out of this crate's scope (spec.md §1).
struct GrpcMetadataClient {
    channel: tonic::transport::Channel,
}

#[async_trait::async_trait]
impl MetadataClient for GrpcMetadataClient {
    async fn get_object_metadata(&self, resource: &ResourceId) -> Result<ObjectInfo, Error> {
        let mut client = StorageClient::new(self.channel.clone());
        let request = GetObjectRequest {
            bucket: resource.bucket.clone(),
            object: resource.object.clone(),
            generation: resource.generation.map(|g| g as i64).unwrap_or(0),
            read_mask: "contentEncoding,generation,size".to_string(),
        };
        let response = client
            .get_object(request)
            .await
            .map_err(|status| Error::from_status(&status, &resource.display_name()))?
            .into_inner();
        Ok(ObjectInfo {
            size: response.size as u64,
            generation: response.generation as u64,
            content_encoding: (!response.content_encoding.is_empty())
                .then_some(response.content_encoding),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let channel = Endpoint::from_shared(args.endpoint.clone())
        .with_context(|| format!("invalid endpoint {}", args.endpoint))?
        .connect()
        .await
        .with_context(|| format!("connecting to {}", args.endpoint))?;

    let mut resource = ResourceId::new(args.bucket, args.object);
    if let Some(generation) = args.generation {
        resource = resource.with_generation(generation);
    }

    let options = ReadOptions {
        fadvise: args.fadvise.into(),
        ..Default::default()
    };

    let metadata = GrpcMetadataClient {
        channel: channel.clone(),
    };
    let mut reader = ReadChannel::open(
        resource,
        options,
        &metadata,
        ChannelStubProvider::new(channel),
    )
    .await
    .context("opening read channel")?;

    log::info!("object size: {}", reader.size());
    let mut out = File::create(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let mut buf = vec![0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await.context("read")?;
        if n < 0 {
            break;
        }
        out.write_all(&buf[..n as usize]).context("write")?;
        total += n as u64;
    }
    log::info!("wrote {total} bytes to {}", args.out.display());
    Ok(())
}
