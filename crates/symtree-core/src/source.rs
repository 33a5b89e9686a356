//! Byte sources for the ingest driver

use crate::config::READ_CHUNK_SIZE;
use async_stream::try_stream;
use bytes::{Bytes, BytesMut};
use futures::Stream;
use std::{convert::Infallible, io, path::PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Stream the contents of `reader` in chunks of up to [`READ_CHUNK_SIZE`]
pub fn reader_source<R>(mut reader: R) -> impl Stream<Item = io::Result<Bytes>>
where
    R: AsyncRead + Unpin,
{
    try_stream! {
        loop {
            let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);
            if reader.read_buf(&mut buffer).await? == 0 {
                break;
            }
            yield buffer.freeze();
        }
    }
}

/// Stream the file at `path`; opening it is part of the stream, so a
/// missing file surfaces as the first item
pub fn file_source(path: impl Into<PathBuf>) -> impl Stream<Item = io::Result<Bytes>> {
    let path = path.into();
    try_stream! {
        let file = tokio::fs::File::open(&path).await?;
        for await chunk in reader_source(file) {
            yield chunk?;
        }
    }
}

/// In-memory source yielding each item as one chunk
pub fn chunks<I>(chunks: I) -> impl Stream<Item = Result<Bytes, Infallible>>
where
    I: IntoIterator,
    I::Item: Into<Bytes>,
{
    futures::stream::iter(chunks.into_iter().map(|chunk| Ok(chunk.into())))
}
