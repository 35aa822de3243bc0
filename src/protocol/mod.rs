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

//! Request construction and response checking shared by the service clients

pub(crate) mod header;

use crate::client::{Pipeline, RawResponse, Request};
use crate::error::{DecodeError, RequestError, StorageError};
use crate::xml::{from_slice, FromXml, ToXml};
use crate::{Context, Result};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::ops::Range;
use url::Url;

/// The REST API version spoken by this crate
pub(crate) const API_VERSION: &str = "2019-12-12";

static MS_VERSION: HeaderName = HeaderName::from_static("x-ms-version");

/// Create a request for `url` carrying the API version and server timeout
pub(crate) fn new_request(method: Method, url: &Url, timeout: Option<u32>) -> Request {
    let mut request = Request::new(method, url.clone());
    request.insert_header(MS_VERSION.clone(), HeaderValue::from_static(API_VERSION));
    if let Some(timeout) = timeout {
        request.set_query("timeout", timeout.to_string());
    }
    request
}

/// Send `request` and fail with [`Error::Service`](crate::Error::Service) unless
/// the response has the `expected` status
pub(crate) async fn send(
    pipeline: &Pipeline,
    ctx: &Context,
    mut request: Request,
    expected: StatusCode,
) -> Result<RawResponse> {
    let response = pipeline.send(ctx, &mut request).await?;
    check_status(response, expected)
}

pub(crate) fn check_status(response: RawResponse, expected: StatusCode) -> Result<RawResponse> {
    match response.status() == expected {
        true => Ok(response),
        false => Err(StorageError::from_response(response).into()),
    }
}

/// Decode the buffered XML body of `response`
pub(crate) fn decode_xml<T: FromXml + Default>(response: &RawResponse) -> Result<T, DecodeError> {
    from_slice(response.body().buffered()?)
}

/// Decode the buffered JSON body of `response`
pub(crate) fn decode_json<T: DeserializeOwned>(response: &RawResponse) -> Result<T, DecodeError> {
    Ok(serde_json::from_slice(response.body().buffered()?)?)
}

/// Set `value` as the XML body of `request`
pub(crate) fn set_xml_body(request: &mut Request, value: &impl ToXml) -> Result<(), RequestError> {
    let body = value.to_xml()?;
    request.insert_header(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
    request.set_body(body);
    Ok(())
}

/// Format a half-open byte range as the inclusive `bytes=start-end` form
pub(crate) fn format_range(range: &Range<u64>) -> Result<String, RequestError> {
    match range.start < range.end {
        true => Ok(format!("bytes={}-{}", range.start, range.end - 1)),
        false => Err(RequestError::EmptyRange {
            start: range.start,
            end: range.end,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResponseBody;
    use http::HeaderMap;

    #[test]
    fn test_new_request() {
        let url = Url::parse("https://account.file.core.windows.net/share?restype=share").unwrap();
        let request = new_request(Method::PUT, &url, Some(30));
        assert_eq!(request.header("x-ms-version"), Some(API_VERSION));
        assert_eq!(request.query_value("timeout"), Some("30"));
        assert_eq!(
            request.url().as_str(),
            "https://account.file.core.windows.net/share?restype=share&timeout=30"
        );

        let request = new_request(Method::GET, &url, None);
        assert!(request.query_value("timeout").is_none());
    }

    #[test]
    fn test_check_status() {
        let ok = RawResponse::new(StatusCode::CREATED, HeaderMap::new(), ResponseBody::default());
        assert!(check_status(ok, StatusCode::CREATED).is_ok());

        let conflict = RawResponse::new(
            StatusCode::CONFLICT,
            HeaderMap::new(),
            "<Error><Code>ShareAlreadyExists</Code><Message>exists</Message></Error>".into(),
        );
        let err = check_status(conflict, StatusCode::CREATED).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.error_code(), Some("ShareAlreadyExists"));
    }

    #[test]
    fn test_format_range() {
        assert_eq!(format_range(&(0..512)).unwrap(), "bytes=0-511");
        assert_eq!(format_range(&(10..11)).unwrap(), "bytes=10-10");
        assert!(matches!(
            format_range(&(5..5)),
            Err(RequestError::EmptyRange { start: 5, end: 5 })
        ));
    }

    #[test]
    fn test_decode_json() {
        let response = RawResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            r#"{"permission":"O:BA"}"#.into(),
        );
        let permission: crate::models::SharePermission = decode_json(&response).unwrap();
        assert_eq!(permission.permission, "O:BA");
    }
}
