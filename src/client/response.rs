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

use crate::client::body::ResponseBody;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::ops::Deref;

/// A response as returned by an [`HttpTransport`](crate::HttpTransport)
#[derive(Debug)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl RawResponse {
    /// Create a new [`RawResponse`]
    pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// The HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The canonical reason phrase of the status code
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// The response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the value of a header if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The response body
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Mutable access to the response body
    pub fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.body
    }

    /// Take the body, leaving an empty buffered body in its place
    pub fn take_body(&mut self) -> ResponseBody {
        std::mem::take(&mut self.body)
    }

    /// Consume this response returning its body
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Split into status, headers and buffered body
    ///
    /// A streamed body is discarded and reported as empty.
    pub(crate) fn into_buffered_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        let body = match self.body {
            ResponseBody::Buffered(b) => b,
            ResponseBody::Stream(_) => Bytes::new(),
        };
        (self.status, self.headers, body)
    }
}

/// A decoded value together with the [`RawResponse`] it was decoded from
#[derive(Debug)]
pub struct Response<T> {
    value: T,
    raw: RawResponse,
}

impl<T> Response<T> {
    /// Create a new [`Response`]
    pub fn new(value: T, raw: RawResponse) -> Self {
        Self { value, raw }
    }

    /// The raw response
    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    /// Consume this response returning the decoded value
    pub fn into_value(self) -> T {
        self.value
    }

    /// Consume this response returning the decoded value and raw response
    pub fn into_parts(self) -> (T, RawResponse) {
        (self.value, self.raw)
    }

    /// Map the decoded value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            value: f(self.value),
            raw: self.raw,
        }
    }
}

impl<T> Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
