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

use crate::client::body::{collect_request_stream, Payload, ResponseBody};
use crate::client::pipeline::Pipeline;
use crate::client::request::Request;
use crate::client::response::RawResponse;
use crate::client::transport::{HttpTransport, TransportError, TransportErrorKind, TransportPolicy};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A pipeline sending straight to `mock`
pub(crate) fn mock_pipeline(mock: &Arc<MockTransport>) -> Pipeline {
    Pipeline::new(vec![Arc::new(TransportPolicy::new(
        Arc::clone(mock) as Arc<dyn HttpTransport>
    ))])
}

/// Response headers carried by most write operations
pub(crate) fn write_headers(extra: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("etag", "\"0x8D83204F5E6CF1B\"".parse().unwrap());
    headers.insert("last-modified", "Mon, 27 Jul 2020 08:55:24 GMT".parse().unwrap());
    for (name, value) in extra {
        headers.insert(*name, value.parse().unwrap());
    }
    headers
}

/// What a [`MockTransport`] observed of a request
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

enum Scripted {
    Response(StatusCode, HeaderMap, Bytes),
    Error(TransportErrorKind),
    Delay(Duration),
    Stalled(StatusCode, HeaderMap),
}

/// An [`HttpTransport`] returning queued responses
///
/// Once the queue is empty every request receives an empty `200 OK`.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<Recorded>>,
    calls: AtomicUsize,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("calls", &self.calls)
            .finish()
    }
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_response(
        &self,
        status: StatusCode,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Response(status, headers, body.into()));
    }

    pub(crate) fn push_status(&self, status: StatusCode) {
        self.push_response(status, HeaderMap::new(), Bytes::new())
    }

    pub(crate) fn push_body(&self, status: StatusCode, body: &'static str) {
        self.push_response(status, HeaderMap::new(), Bytes::from_static(body.as_bytes()))
    }

    pub(crate) fn push_error(&self, kind: TransportErrorKind) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Error(kind));
    }

    /// Wait for `delay` and then respond `200 OK`
    pub(crate) fn push_delay(&self, delay: Duration) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Delay(delay));
    }

    /// Respond with `status` and a streamed body that never yields a chunk
    pub(crate) fn push_stalled(&self, status: StatusCode, headers: HeaderMap) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Stalled(status, headers));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> Recorded {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    /// The non-empty bodies received so far
    pub(crate) fn bodies(&self) -> Vec<Bytes> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.body.clone())
            .collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &mut Request) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = match request.body_mut().take_payload() {
            Some(Payload::Bytes(b)) => Some(b),
            Some(Payload::Stream(s)) => Some(collect_request_stream(s).await?),
            None => None,
        };
        self.requests.lock().unwrap().push(Recorded {
            method: request.method().clone(),
            url: request.url().to_string(),
            headers: request.headers().clone(),
            body,
        });

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Response(status, headers, body)) => {
                Ok(RawResponse::new(status, headers, ResponseBody::Buffered(body)))
            }
            Some(Scripted::Error(kind)) => Err(TransportError::new(
                kind,
                std::io::Error::other("mock transport error"),
            )),
            Some(Scripted::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(RawResponse::new(
                    StatusCode::OK,
                    HeaderMap::new(),
                    ResponseBody::default(),
                ))
            }
            Some(Scripted::Stalled(status, headers)) => Ok(RawResponse::new(
                status,
                headers,
                ResponseBody::from_stream(futures::stream::pending()),
            )),
            None => Ok(RawResponse::new(
                StatusCode::OK,
                HeaderMap::new(),
                ResponseBody::default(),
            )),
        }
    }
}
