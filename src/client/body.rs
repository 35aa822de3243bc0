// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::client::transport::TransportError;
use crate::error::DecodeError;
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt, TryStreamExt};
use std::pin::Pin;

/// A single-pass stream of request body chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync>>;

/// The body of a [`Request`](crate::Request)
///
/// In-memory bodies can be replayed any number of times. A streamed body can only be
/// sent once, so a request carrying one is never retried after its first attempt.
pub struct RequestBody(Inner);

enum Inner {
    Empty,
    Bytes(Bytes),
    Stream {
        stream: Option<ChunkStream>,
        length: Option<u64>,
        sent: bool,
    },
}

/// The payload of a [`RequestBody`] handed to an [`HttpTransport`](crate::HttpTransport)
pub enum Payload {
    /// A contiguous buffer
    Bytes(Bytes),
    /// A single-pass stream
    Stream(ChunkStream),
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl RequestBody {
    /// An empty [`RequestBody`]
    pub fn empty() -> Self {
        Self(Inner::Empty)
    }

    /// Create a [`RequestBody`] from a stream of chunks
    ///
    /// `length` should be provided whenever it is known, as most upload operations
    /// require a `Content-Length`.
    pub fn from_stream<S>(stream: S, length: Option<u64>) -> Self
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static,
    {
        Self(Inner::Stream {
            stream: Some(Box::pin(stream)),
            length,
            sent: false,
        })
    }

    /// Returns true if this body carries no data
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Inner::Empty => true,
            Inner::Bytes(b) => b.is_empty(),
            Inner::Stream { length, .. } => *length == Some(0),
        }
    }

    /// Returns the length of this body if known
    pub fn content_length(&self) -> Option<u64> {
        match &self.0 {
            Inner::Empty => Some(0),
            Inner::Bytes(b) => Some(b.len() as u64),
            Inner::Stream { length, .. } => *length,
        }
    }

    /// If this body consists of a single contiguous [`Bytes`], returns it
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.0 {
            Inner::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns true if this body can be sent again from the beginning
    pub fn is_replayable(&self) -> bool {
        match &self.0 {
            Inner::Empty | Inner::Bytes(_) => true,
            Inner::Stream { sent, .. } => !sent,
        }
    }

    /// Prepare this body to be sent again, returning false if that is not possible
    ///
    /// In-memory bodies always rewind. A stream rewinds only if it has not been
    /// handed to a transport yet.
    pub fn rewind(&mut self) -> bool {
        self.is_replayable()
    }

    /// Take the payload to send
    ///
    /// Returns `None` for an empty body, or for a stream that was already taken.
    pub fn take_payload(&mut self) -> Option<Payload> {
        match &mut self.0 {
            Inner::Empty => None,
            Inner::Bytes(b) => Some(Payload::Bytes(b.clone())),
            Inner::Stream { stream, sent, .. } => {
                *sent = true;
                stream.take().map(Payload::Stream)
            }
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Inner::Empty => f.write_str("Empty"),
            Inner::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Inner::Stream { length, sent, .. } => f
                .debug_struct("Stream")
                .field("length", length)
                .field("sent", sent)
                .finish(),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(value: Bytes) -> Self {
        Self(Inner::Bytes(value))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(value: Vec<u8>) -> Self {
        Self(Inner::Bytes(value.into()))
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        Self(Inner::Bytes(value.into()))
    }
}

impl From<&'static str> for RequestBody {
    fn from(value: &'static str) -> Self {
        Self(Inner::Bytes(Bytes::from_static(value.as_bytes())))
    }
}

/// The body of a [`RawResponse`](crate::RawResponse)
pub enum ResponseBody {
    /// A body read fully into memory
    Buffered(Bytes),
    /// A body still being received
    Stream(BoxStream<'static, Result<Bytes, TransportError>>),
}

impl ResponseBody {
    /// Create a streamed [`ResponseBody`]
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }

    /// Returns the buffered contents, or `None` if this body is a stream
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Buffered(b) => Some(b),
            Self::Stream(_) => None,
        }
    }

    /// Collects this body into a [`Bytes`]
    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        match self {
            Self::Buffered(b) => Ok(b),
            Self::Stream(s) => collect_bytes(s).await,
        }
    }

    /// Returns a stream of this body's data
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes, TransportError>> {
        match self {
            Self::Buffered(b) => futures::stream::once(futures::future::ready(Ok(b))).boxed(),
            Self::Stream(s) => s,
        }
    }

    /// Returns the buffered contents or an error if this body is a stream
    pub(crate) fn buffered(&self) -> Result<&Bytes, DecodeError> {
        self.as_bytes().ok_or(DecodeError::NotBuffered)
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffered(b) => f.debug_tuple("Buffered").field(&b.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::Buffered(Bytes::new())
    }
}

impl From<Bytes> for ResponseBody {
    fn from(value: Bytes) -> Self {
        Self::Buffered(value)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(value: Vec<u8>) -> Self {
        Self::Buffered(value.into())
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::Buffered(value.into())
    }
}

impl From<&'static str> for ResponseBody {
    fn from(value: &'static str) -> Self {
        Self::Buffered(Bytes::from_static(value.as_bytes()))
    }
}

async fn collect_bytes<S>(mut stream: S) -> Result<Bytes, TransportError>
where
    S: Stream<Item = Result<Bytes, TransportError>> + Send + Unpin,
{
    let first = stream.next().await.transpose()?.unwrap_or_default();

    // Avoid copying if single response
    match stream.next().await.transpose()? {
        None => Ok(first),
        Some(second) => {
            let mut buf = BytesMut::with_capacity(first.len() + second.len());
            buf.extend_from_slice(&first);
            buf.extend_from_slice(&second);
            let buf = stream
                .try_fold(buf, |mut buf, chunk| async move {
                    buf.extend_from_slice(&chunk);
                    Ok(buf)
                })
                .await?;
            Ok(buf.freeze())
        }
    }
}

/// Reads a stream of request chunks into memory
#[cfg(test)]
pub(crate) async fn collect_request_stream(stream: ChunkStream) -> Result<Bytes, TransportError> {
    use crate::client::transport::TransportErrorKind;
    let mapped = stream.map_err(|e| TransportError::new(TransportErrorKind::Interrupted, e));
    collect_bytes(mapped).await
}
