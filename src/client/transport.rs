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

//! The terminal stage of a [`Pipeline`](crate::Pipeline)

use crate::client::body::{Payload, ResponseBody};
use crate::client::pipeline::{Next, Policy};
use crate::client::request::Request;
use crate::client::response::RawResponse;
use crate::context::Context;
use crate::error::CancelReason;
use crate::{Error, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::debug;

/// Broad classification of a [`TransportError`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportErrorKind {
    /// An error occurred whilst connecting to the remote
    ///
    /// Will be automatically retried
    Connect,
    /// The request timed out
    ///
    /// Will be automatically retried
    Timeout,
    /// An error occurred whilst making the request
    Request,
    /// The connection was interrupted mid-request
    ///
    /// Will be automatically retried
    Interrupted,
    /// An error occurred whilst decoding the response
    Decode,
    /// The [`Context`] stopped while the response body was being read
    Cancelled,
    /// An unknown error occurred
    Unknown,
}

/// An error raised by an [`HttpTransport`]
#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    source: Box<dyn StdError + Send + Sync>,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP error ({:?}): {}", self.kind, self.source)?;
        let mut source = self.source.source();
        while let Some(e) = source {
            write!(f, ": {e}")?;
            source = e.source();
        }
        Ok(())
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.source)
    }
}

impl TransportError {
    /// Create a new [`TransportError`]
    pub fn new<E>(kind: TransportErrorKind, e: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            kind,
            source: Box::new(e),
        }
    }

    pub(crate) fn reqwest(e: reqwest::Error) -> Self {
        let mut kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_decode() || e.is_body() {
            TransportErrorKind::Decode
        } else if e.is_request() || e.is_builder() {
            TransportErrorKind::Request
        } else {
            TransportErrorKind::Unknown
        };

        // Reqwest error variants aren't great, attempt to refine them
        let mut source = e.source();
        while let Some(e) = source {
            if let Some(e) = e.downcast_ref::<std::io::Error>() {
                match e.kind() {
                    std::io::ErrorKind::TimedOut => kind = TransportErrorKind::Timeout,
                    std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof => kind = TransportErrorKind::Interrupted,
                    _ => {}
                }
                break;
            }
            source = e.source();
        }
        Self {
            kind,
            source: Box::new(e),
        }
    }

    /// Returns the [`TransportErrorKind`]
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Returns why the [`Context`] stopped, if this error is a cancellation
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self.kind {
            TransportErrorKind::Cancelled => self.source.downcast_ref::<CancelReason>().copied(),
            _ => None,
        }
    }

    /// Returns true if a request failing with this error may be sent again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Connect
                | TransportErrorKind::Timeout
                | TransportErrorKind::Interrupted
        )
    }
}

/// Sends a single [`Request`] over the network
///
/// Implementations must take the body with [`RequestBody::take_payload`]
/// so that single-pass streams are not replayed, and should buffer the body of
/// non-success responses or when [`Request::buffer_response`] is set.
///
/// [`RequestBody::take_payload`]: crate::RequestBody::take_payload
#[async_trait]
pub trait HttpTransport: std::fmt::Debug + Send + Sync + 'static {
    /// Perform `request`
    async fn send(&self, request: &mut Request) -> Result<RawResponse, TransportError>;
}

/// An [`HttpTransport`] backed by a shared [`reqwest::Client`] connection pool
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a new [`ReqwestTransport`] from a [`reqwest::Client`]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &mut Request) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url())
            .headers(request.headers().clone());

        match request.body_mut().take_payload() {
            Some(Payload::Bytes(b)) => builder = builder.body(b),
            Some(Payload::Stream(s)) => builder = builder.body(reqwest::Body::wrap_stream(s)),
            None => {}
        }

        let response = builder.send().await.map_err(TransportError::reqwest)?;
        let status = response.status();
        let headers = response.headers().clone();

        let body = match request.buffer_response() || !status.is_success() {
            true => ResponseBody::Buffered(
                response.bytes().await.map_err(TransportError::reqwest)?,
            ),
            false => ResponseBody::from_stream(
                response.bytes_stream().map_err(TransportError::reqwest),
            ),
        };
        Ok(RawResponse::new(status, headers, body))
    }
}

/// The terminal [`Policy`] of a [`Pipeline`](crate::Pipeline)
///
/// Hands the request to an [`HttpTransport`], racing it against the [`Context`].
#[derive(Debug)]
pub struct TransportPolicy {
    transport: Arc<dyn HttpTransport>,
}

impl TransportPolicy {
    /// Create a new [`TransportPolicy`]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Policy for TransportPolicy {
    async fn send(
        &self,
        ctx: &Context,
        request: &mut Request,
        _next: Next<'_>,
    ) -> Result<RawResponse> {
        debug!(method = %request.method(), url = %request.url(), "sending request");
        let mut response = ctx
            .run(self.transport.send(request))
            .await
            .map_err(|reason| Error::Cancelled { reason })??;
        debug!(status = %response.status(), "received response");

        let body = bind_body(ctx, response.take_body());
        *response.body_mut() = body;
        Ok(response)
    }
}

/// Make a streamed body fail once `ctx` stops, instead of waiting on the network
fn bind_body(ctx: &Context, body: ResponseBody) -> ResponseBody {
    let stream = match body {
        ResponseBody::Stream(stream) => stream,
        buffered => return buffered,
    };
    let ctx = ctx.clone();
    let stream = futures::stream::unfold(Some((stream, ctx)), |state| async move {
        let (mut stream, ctx) = match state {
            Some(state) => state,
            None => return None,
        };
        tokio::select! {
            biased;
            reason = ctx.done() => {
                let err = TransportError::new(TransportErrorKind::Cancelled, reason);
                Some((Err(err), None))
            }
            chunk = stream.next() => chunk.map(|chunk| (chunk, Some((stream, ctx)))),
        }
    });
    ResponseBody::from_stream(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock_transport::MockTransport;
    use crate::client::Pipeline;
    use http::{Method, StatusCode};
    use std::time::Duration;
    use url::Url;

    #[test]
    fn test_retryable_kinds() {
        let err = |kind| TransportError::new(kind, std::io::Error::other("test"));
        assert!(err(TransportErrorKind::Connect).is_retryable());
        assert!(err(TransportErrorKind::Timeout).is_retryable());
        assert!(err(TransportErrorKind::Interrupted).is_retryable());
        assert!(!err(TransportErrorKind::Request).is_retryable());
        assert!(!err(TransportErrorKind::Decode).is_retryable());
        assert!(!err(TransportErrorKind::Unknown).is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_races_context() {
        let mock = Arc::new(MockTransport::new());
        mock.push_delay(Duration::from_secs(60));
        let pipeline = Pipeline::new(vec![Arc::new(TransportPolicy::new(Arc::clone(&mock) as _))]);

        let ctx = Context::new().with_timeout(Duration::from_secs(1));
        let mut request = Request::new(Method::GET, Url::parse("http://localhost/").unwrap());
        let err = pipeline.send(&ctx, &mut request).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Cancelled {
                reason: CancelReason::DeadlineExceeded
            }
        ));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_status() {
        let mock = Arc::new(MockTransport::new());
        mock.push_status(StatusCode::NOT_FOUND);
        let pipeline = Pipeline::new(vec![Arc::new(TransportPolicy::new(Arc::clone(&mock) as _))]);

        let mut request = Request::new(Method::GET, Url::parse("http://localhost/").unwrap());
        let response = pipeline.send(&Context::new(), &mut request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.reason(), "Not Found");
    }
}
