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

use crate::client::Request;
use crate::error::{DecodeError, RequestError};
use crate::protocol::header::get_string;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use http::HeaderMap;

/// Standard HTTP headers stored with a file or blob and returned when it is read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    /// `Content-Type`
    pub content_type: Option<String>,
    /// `Content-Encoding`
    pub content_encoding: Option<String>,
    /// `Content-Language`
    pub content_language: Option<String>,
    /// `Cache-Control`
    pub cache_control: Option<String>,
    /// `Content-Disposition`
    pub content_disposition: Option<String>,
    /// `Content-MD5`, raw digest bytes
    pub content_md5: Option<Vec<u8>>,
}

impl HttpHeaders {
    /// Set the headers that store these properties
    ///
    /// Files use the `x-ms-` prefix and blobs the `x-ms-blob-` prefix.
    pub(crate) fn apply(&self, request: &mut Request, prefix: &str) -> Result<(), RequestError> {
        let fields = [
            ("content-type", &self.content_type),
            ("content-encoding", &self.content_encoding),
            ("content-language", &self.content_language),
            ("cache-control", &self.cache_control),
            ("content-disposition", &self.content_disposition),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                request.set_header(&format!("{prefix}{name}"), value)?;
            }
        }
        if let Some(md5) = &self.content_md5 {
            request.set_header(&format!("{prefix}content-md5"), &BASE64_STANDARD.encode(md5))?;
        }
        Ok(())
    }

    /// Read the properties from the standard response headers
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            content_type: get_string(headers, "content-type")?,
            content_encoding: get_string(headers, "content-encoding")?,
            content_language: get_string(headers, "content-language")?,
            cache_control: get_string(headers, "cache-control")?,
            content_disposition: get_string(headers, "content-disposition")?,
            content_md5: decode_md5(get_string(headers, "content-md5")?.as_deref())?,
        })
    }
}

pub(crate) fn decode_md5(value: Option<&str>) -> Result<Option<Vec<u8>>, DecodeError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| {
            BASE64_STANDARD
                .decode(v)
                .map_err(|e| DecodeError::InvalidValue {
                    field: "Content-MD5",
                    value: v.to_string(),
                    message: e.to_string(),
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use url::Url;

    #[test]
    fn test_apply_with_prefix() {
        let headers = HttpHeaders {
            content_type: Some("text/plain".to_string()),
            cache_control: Some("no-cache".to_string()),
            content_md5: Some(vec![1, 2, 3]),
            ..Default::default()
        };
        let mut r = Request::new(Method::PUT, Url::parse("https://a/b").unwrap());
        headers.apply(&mut r, "x-ms-blob-").unwrap();
        assert_eq!(r.header("x-ms-blob-content-type"), Some("text/plain"));
        assert_eq!(r.header("x-ms-blob-cache-control"), Some("no-cache"));
        assert_eq!(r.header("x-ms-blob-content-md5"), Some("AQID"));
        assert!(r.header("x-ms-blob-content-language").is_none());
    }

    #[test]
    fn test_from_headers() {
        let mut map = HeaderMap::new();
        map.insert("content-type", "application/octet-stream".parse().unwrap());
        map.insert("content-md5", "AQID".parse().unwrap());
        let headers = HttpHeaders::from_headers(&map).unwrap();
        assert_eq!(headers.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(headers.content_md5, Some(vec![1, 2, 3]));
        assert!(headers.content_encoding.is_none());

        map.insert("content-md5", "!!".parse().unwrap());
        assert!(HttpHeaders::from_headers(&map).is_err());
    }
}
