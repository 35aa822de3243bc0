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

//! Logic for extracting typed values from response headers

use crate::client::Request;
use crate::error::{DecodeError, RequestError};
use crate::models::Metadata;
use chrono::{DateTime, Utc};
use http::header::{HeaderMap, ETAG, LAST_MODIFIED};
use std::fmt::Display;
use std::str::FromStr;

pub(crate) const META_PREFIX: &str = "x-ms-meta-";

/// Returns the header as a string if present
pub(crate) fn get_str<'a>(
    headers: &'a HeaderMap,
    name: &str,
) -> Result<Option<&'a str>, DecodeError> {
    match headers.get(name) {
        Some(v) => v
            .to_str()
            .map(Some)
            .map_err(|_| DecodeError::BadHeader {
                header: name.to_string(),
            }),
        None => Ok(None),
    }
}

/// Returns the header as an owned string if present
pub(crate) fn get_string(headers: &HeaderMap, name: &str) -> Result<Option<String>, DecodeError> {
    Ok(get_str(headers, name)?.map(ToString::to_string))
}

/// Returns the header as a string, failing if it is absent
pub(crate) fn get_required(headers: &HeaderMap, name: &'static str) -> Result<String, DecodeError> {
    get_string(headers, name)?.ok_or(DecodeError::MissingHeader { header: name })
}

/// Parses the header if present
pub(crate) fn get_parsed<T>(
    headers: &HeaderMap,
    name: &'static str,
) -> Result<Option<T>, DecodeError>
where
    T: FromStr,
    T::Err: Display,
{
    match get_str(headers, name)? {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| DecodeError::InvalidHeader {
                header: name,
                value: value.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Parses the header, failing if it is absent
pub(crate) fn get_required_parsed<T>(
    headers: &HeaderMap,
    name: &'static str,
) -> Result<T, DecodeError>
where
    T: FromStr,
    T::Err: Display,
{
    get_parsed(headers, name)?.ok_or(DecodeError::MissingHeader { header: name })
}

/// Parses a boolean header, treating absence as false
pub(crate) fn get_bool(headers: &HeaderMap, name: &'static str) -> Result<bool, DecodeError> {
    Ok(get_parsed(headers, name)?.unwrap_or(false))
}

/// Parses an RFC 1123 or RFC 3339 date header if present
pub(crate) fn get_date(
    headers: &HeaderMap,
    name: &'static str,
) -> Result<Option<DateTime<Utc>>, DecodeError> {
    match get_str(headers, name)? {
        Some(value) => DateTime::parse_from_rfc2822(value)
            .or_else(|_| DateTime::parse_from_rfc3339(value))
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|e| DecodeError::InvalidHeader {
                header: name,
                value: value.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Extracts an etag from the provided [`HeaderMap`]
pub(crate) fn get_etag(headers: &HeaderMap) -> Result<String, DecodeError> {
    get_required(headers, ETAG.as_str())
}

/// Extracts the last modified time from the provided [`HeaderMap`]
pub(crate) fn get_last_modified(headers: &HeaderMap) -> Result<DateTime<Utc>, DecodeError> {
    get_date(headers, LAST_MODIFIED.as_str())?.ok_or(DecodeError::MissingHeader {
        header: "last-modified",
    })
}

/// Collects the `x-ms-meta-*` headers into [`Metadata`]
pub(crate) fn get_metadata(headers: &HeaderMap) -> Result<Metadata, DecodeError> {
    let mut metadata = Metadata::new();
    for (name, value) in headers {
        if let Some(key) = name.as_str().strip_prefix(META_PREFIX) {
            let value = value.to_str().map_err(|_| DecodeError::BadHeader {
                header: name.to_string(),
            })?;
            metadata.insert(key.to_string(), value.to_string());
        }
    }
    Ok(metadata)
}

/// Sets an `x-ms-meta-*` header for every entry of `metadata`
pub(crate) fn set_metadata(request: &mut Request, metadata: &Metadata) -> Result<(), RequestError> {
    for (key, value) in metadata {
        request.set_header(&format!("{META_PREFIX}{key}"), value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use url::Url;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(k, v)| (k.parse().unwrap(), v.parse().unwrap()))
            .collect()
    }

    #[test]
    fn test_required_headers() {
        let h = headers(&[
            ("etag", "\"0x8D8\""),
            ("last-modified", "Mon, 27 Jul 2020 08:55:24 GMT"),
            ("x-ms-share-quota", "5120"),
            ("x-ms-server-encrypted", "true"),
        ]);
        assert_eq!(get_etag(&h).unwrap(), "\"0x8D8\"");
        assert_eq!(
            get_last_modified(&h).unwrap().to_rfc3339(),
            "2020-07-27T08:55:24+00:00"
        );
        assert_eq!(get_required_parsed::<i64>(&h, "x-ms-share-quota").unwrap(), 5120);
        assert!(get_bool(&h, "x-ms-server-encrypted").unwrap());
        assert!(!get_bool(&h, "x-ms-request-server-encrypted").unwrap());

        let empty = HeaderMap::new();
        assert!(matches!(
            get_etag(&empty),
            Err(DecodeError::MissingHeader { header: "etag" })
        ));
        assert!(get_parsed::<i64>(&empty, "x-ms-share-quota").unwrap().is_none());
    }

    #[test]
    fn test_invalid_header() {
        let h = headers(&[("x-ms-share-quota", "lots"), ("last-modified", "today")]);
        assert!(matches!(
            get_parsed::<i64>(&h, "x-ms-share-quota"),
            Err(DecodeError::InvalidHeader { header: "x-ms-share-quota", .. })
        ));
        assert!(matches!(
            get_last_modified(&h),
            Err(DecodeError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_metadata_headers() {
        let h = headers(&[
            ("x-ms-meta-owner", "alice"),
            ("x-ms-meta-empty", ""),
            ("x-ms-version", "2019-12-12"),
        ]);
        let metadata = get_metadata(&h).unwrap();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["owner"], "alice");
        assert_eq!(metadata["empty"], "");

        let mut request = Request::new(Method::PUT, Url::parse("https://a/b").unwrap());
        set_metadata(&mut request, &metadata).unwrap();
        assert_eq!(request.header("x-ms-meta-owner"), Some("alice"));
        assert_eq!(request.header("x-ms-meta-empty"), Some(""));
    }
}
