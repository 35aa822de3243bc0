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

use crate::client::body::RequestBody;
use crate::error::RequestError;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH};
use http::Method;
use url::Url;

/// An outgoing HTTP request
///
/// Header names are case-insensitive and setting a header replaces any previous
/// value. Query parameters keep their insertion order, and setting an existing
/// parameter replaces its value in place.
#[derive(Debug)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: RequestBody,
    retryable: bool,
    buffer_response: bool,
}

impl Request {
    /// Create a new [`Request`] with an empty body
    ///
    /// Any query string already present on `url` is kept and sent ahead of the
    /// parameters added with [`Request::set_query`].
    pub fn new(method: Method, url: Url) -> Self {
        let retryable = method != Method::POST;
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: RequestBody::empty(),
            retryable,
            buffer_response: true,
        }
    }

    /// The HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The URL without the query parameters added by [`Request::set_query`]
    pub fn base_url(&self) -> &Url {
        &self.url
    }

    /// The full URL of this request including all query parameters
    pub fn url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        url
    }

    /// The headers of this request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the headers of this request
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Set a header, replacing any existing value
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Set a header from strings, validating both name and value
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), RequestError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| RequestError::InvalidHeaderName {
                name: name.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| RequestError::InvalidHeaderValue {
                name: name.to_string(),
            })?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// Returns the value of a header if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The query parameters added with [`Request::set_query`] in insertion order
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the value of a query parameter added with [`Request::set_query`]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a query parameter, replacing any existing value with the same name
    pub fn set_query(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.query.push((name, value)),
        }
    }

    /// The body of this request
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Mutable access to the body of this request
    pub fn body_mut(&mut self) -> &mut RequestBody {
        &mut self.body
    }

    /// Replace the body, updating `Content-Length` to match
    pub fn set_body(&mut self, body: impl Into<RequestBody>) {
        self.body = body.into();
        match self.body.content_length() {
            Some(len) => {
                self.headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
            }
            None => {
                self.headers.remove(CONTENT_LENGTH);
            }
        }
    }

    /// Returns true if the method semantics allow this request to be sent again
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Override whether this request may be retried
    pub fn set_retryable(&mut self, retryable: bool) {
        self.retryable = retryable;
    }

    /// Returns true if the transport should read the whole response body into memory
    pub fn buffer_response(&self) -> bool {
        self.buffer_response
    }

    /// Set whether the transport should read the whole response body into memory
    ///
    /// Non-success responses are always buffered regardless of this setting.
    pub fn set_buffer_response(&mut self, buffer: bool) {
        self.buffer_response = buffer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn request(method: Method) -> Request {
        Request::new(method, Url::parse("https://account.file.core.windows.net/share").unwrap())
    }

    #[test]
    fn test_query_last_write_wins_in_place() {
        let mut req = request(Method::GET);
        req.set_query("restype", "share");
        req.set_query("comp", "metadata");
        req.set_query("restype", "directory");

        assert_eq!(req.query_value("restype"), Some("directory"));
        assert_eq!(
            req.url().as_str(),
            "https://account.file.core.windows.net/share?restype=directory&comp=metadata"
        );
    }

    #[test]
    fn test_url_without_query() {
        let req = request(Method::GET);
        assert_eq!(req.url().as_str(), "https://account.file.core.windows.net/share");
    }

    #[test]
    fn test_headers_case_insensitive() {
        let mut req = request(Method::PUT);
        req.set_header("X-Ms-Meta-Key", "a").unwrap();
        req.set_header("x-ms-meta-key", "b").unwrap();
        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.header("X-MS-META-KEY"), Some("b"));

        assert!(matches!(
            req.set_header("bad header", "x"),
            Err(RequestError::InvalidHeaderName { .. })
        ));
        assert!(matches!(
            req.set_header("x-ms-meta-key", "bad\nvalue"),
            Err(RequestError::InvalidHeaderValue { .. })
        ));
    }

    #[test]
    fn test_retryable_from_method() {
        assert!(request(Method::GET).is_retryable());
        assert!(request(Method::PUT).is_retryable());
        assert!(!request(Method::POST).is_retryable());
    }

    #[test]
    fn test_set_body_content_length() {
        let mut req = request(Method::PUT);
        req.set_body(Bytes::from_static(b"hello"));
        assert_eq!(req.header("content-length"), Some("5"));

        let stream = futures::stream::iter(vec![Ok(Bytes::from_static(b"x"))]);
        req.set_body(RequestBody::from_stream(stream, None));
        assert_eq!(req.header("content-length"), None);
    }
}
