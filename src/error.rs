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

//! Error types shared by the pipeline, the decoders and the clients

use crate::client::RawResponse;
use crate::xml::{FromXml, TagPath, XmlNode, XmlReader};
use bytes::Bytes;
use http::header::{HeaderMap, CONTENT_TYPE};
use http::StatusCode;
use serde::Deserialize;

static ERROR_CODE: &str = "x-ms-error-code";
static REQUEST_ID: &str = "x-ms-request-id";

/// Why a [`Context`](crate::Context) stopped an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The context was cancelled explicitly
    Cancelled,
    /// The deadline of the context passed
    DeadlineExceeded,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "context cancelled"),
            Self::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl std::error::Error for CancelReason {}

/// A response body or header did not have the expected shape
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The XML document is not well formed
    #[error("Malformed XML document: {message}")]
    Xml {
        /// Description from the XML reader
        message: String,
    },

    /// The document ended while elements were still open
    #[error("Document ended with {depth} unclosed element(s)")]
    UnexpectedEnd {
        /// Number of elements still open
        depth: usize,
    },

    /// A field contained a value that could not be parsed
    #[error("Invalid value '{value}' for {field}: {message}")]
    InvalidValue {
        /// The field being decoded
        field: &'static str,
        /// The offending text
        value: String,
        /// Description of the parse failure
        message: String,
    },

    /// A string did not match any variant of an enumeration
    #[error("Unknown {type_name} value '{value}'")]
    UnknownVariant {
        /// The enumeration being decoded
        type_name: &'static str,
        /// The offending text
        value: String,
    },

    /// A required header was not present
    #[error("{header} header missing from response")]
    MissingHeader {
        /// Name of the header
        header: &'static str,
    },

    /// A header contained non-ASCII data
    #[error("Received {header} header containing non-ASCII data")]
    BadHeader {
        /// Name of the header
        header: String,
    },

    /// A header value could not be parsed
    #[error("Invalid {header} header '{value}': {message}")]
    InvalidHeader {
        /// Name of the header
        header: &'static str,
        /// The offending value
        value: String,
        /// Description of the parse failure
        message: String,
    },

    /// A JSON body could not be parsed
    #[error("Invalid JSON body: {source}")]
    Json {
        /// The serde failure
        #[from]
        source: serde_json::Error,
    },

    /// The body was expected to be buffered but is a stream
    #[error("Response body was not buffered")]
    NotBuffered,
}

/// A request could not be built from the supplied options
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RequestError {
    /// A header name was invalid
    #[error("Invalid header name '{name}'")]
    InvalidHeaderName {
        /// The offending name
        name: String,
    },

    /// A header value was invalid
    #[error("Invalid value for header '{name}'")]
    InvalidHeaderValue {
        /// The header being set
        name: String,
    },

    /// An upload was given a body of unknown length where the service requires one
    #[error("Request body must have a known length")]
    UnknownContentLength,

    /// The request body was consumed by an earlier attempt and cannot be replayed
    #[error("Request body has already been consumed")]
    BodyConsumed,

    /// A range was empty
    #[error("Range {start}..{end} is empty")]
    EmptyRange {
        /// Start of the range
        start: u64,
        /// End of the range (exclusive)
        end: u64,
    },

    /// A page blob range or size was not a multiple of the page size
    #[error("Range {start}..{end} is not aligned to {alignment} bytes")]
    UnalignedRange {
        /// Start of the range
        start: u64,
        /// End of the range (exclusive)
        end: u64,
        /// The required alignment
        alignment: u64,
    },

    /// An XML request body could not be written
    #[error("Error encoding XML request body: {source}")]
    XmlEncode {
        /// The underlying write failure
        source: std::io::Error,
    },

    /// A range starting at `offset` and spanning `length` bytes ends past `u64::MAX`
    #[error("Range of {length} bytes at offset {offset} overflows")]
    RangeOverflow {
        /// Start of the range
        offset: u64,
        /// Length of the range
        length: u64,
    },
}

/// A non-success response from the storage service
///
/// Carries the status, the service error code and message, and the raw headers and
/// body of the response for inspection.
#[derive(Debug)]
pub struct StorageError {
    status: StatusCode,
    code: Option<String>,
    message: String,
    request_id: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Storage service returned {}", self.status)?;
        if let Some(code) = &self.code {
            write!(f, " ({code})")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(id) = &self.request_id {
            write!(f, " [request id {id}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {}

impl StorageError {
    /// Create a [`StorageError`] from a response with an unexpected status
    ///
    /// The error code and message are taken from an XML `<Error>` body, a JSON
    /// `{"code": ..}` or `{"error": {"code": ..}}` body, or the `x-ms-error-code`
    /// header, in that order of preference.
    pub fn from_response(response: RawResponse) -> Self {
        let (status, headers, body) = response.into_buffered_parts();

        let parsed = match body.is_empty() {
            true => ErrorBody::default(),
            false if is_json(&headers, &body) => ErrorBody::from_json(&body),
            false => ErrorBody::from_xml_bytes(&body),
        };

        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        let code = parsed.code.or_else(|| header_str(ERROR_CODE));
        let message = parsed.message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        });

        Self {
            status,
            code,
            message,
            request_id: header_str(REQUEST_ID),
            headers,
            body,
        }
    }

    /// The HTTP status of the response
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The service error code, e.g. `ShareNotFound`
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The service error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The `x-ms-request-id` of the failed request
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// The headers of the raw response
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body of the raw response
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

fn is_json(headers: &HeaderMap, body: &[u8]) -> bool {
    let declared = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("json"))
        .unwrap_or(false);
    declared || body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{')
}

#[derive(Debug, Default)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonErrorBody {
    code: Option<String>,
    message: Option<String>,
    error: Option<JsonErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct JsonErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

xml_tags! {
    enum ErrorTag {
        Error => "Error",
        Code => "Code",
        Message => "Message",
    }
}

impl ErrorBody {
    fn from_json(body: &[u8]) -> Self {
        match serde_json::from_slice::<JsonErrorBody>(body) {
            Ok(JsonErrorBody {
                error: Some(detail),
                ..
            }) => Self {
                code: detail.code,
                message: detail.message,
            },
            Ok(flat) => Self {
                code: flat.code,
                message: flat.message,
            },
            Err(_) => Self::default(),
        }
    }

    // A malformed error body still yields a service error, just without a code
    fn from_xml_bytes(body: &[u8]) -> Self {
        crate::xml::from_slice(body).unwrap_or_default()
    }
}

impl FromXml for ErrorBody {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut result = Self::default();
        let mut path = TagPath::<ErrorTag>::new();
        loop {
            match reader.read()? {
                XmlNode::StartTag(name) => path.push_name(&name),
                XmlNode::EndTag => {
                    if !path.pop() {
                        break;
                    }
                }
                XmlNode::Text(text) => {
                    if path.is(&[ErrorTag::Error, ErrorTag::Code]) {
                        result.code = Some(text);
                    } else if path.is(&[ErrorTag::Error, ErrorTag::Message]) {
                        result.message = Some(text);
                    }
                }
                XmlNode::Attribute { .. } => {}
                XmlNode::End => {
                    path.finish()?;
                    break;
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResponseBody;

    fn response(status: StatusCode, headers: HeaderMap, body: &'static str) -> RawResponse {
        RawResponse::new(status, headers, ResponseBody::from(Bytes::from_static(body.as_bytes())))
    }

    #[test]
    fn test_xml_error_body() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<Error><Code>ShareAlreadyExists</Code><Message>The specified share already exists.
RequestId:1234</Message></Error>"#;
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID, "1234".parse().unwrap());
        let err = StorageError::from_response(response(StatusCode::CONFLICT, headers, body));

        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), Some("ShareAlreadyExists"));
        assert!(err.message().starts_with("The specified share already exists."));
        assert_eq!(err.request_id(), Some("1234"));
        assert_eq!(err.body().as_ref(), body.as_bytes());
    }

    #[test]
    fn test_json_error_body() {
        let body = r#"{"code":"ShareNotFound","message":"The specified share does not exist."}"#;
        let err =
            StorageError::from_response(response(StatusCode::NOT_FOUND, HeaderMap::new(), body));
        assert_eq!(err.code(), Some("ShareNotFound"));
        assert_eq!(err.message(), "The specified share does not exist.");

        let nested = r#"{"error":{"code":"InvalidInput","message":"bad"}}"#;
        let nested = response(StatusCode::BAD_REQUEST, HeaderMap::new(), nested);
        let err = StorageError::from_response(nested);
        assert_eq!(err.code(), Some("InvalidInput"));
        assert_eq!(err.message(), "bad");
    }

    #[test]
    fn test_error_code_header_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(ERROR_CODE, "BlobNotFound".parse().unwrap());
        let err = StorageError::from_response(response(StatusCode::NOT_FOUND, headers, ""));

        assert_eq!(err.code(), Some("BlobNotFound"));
        assert_eq!(err.message(), "Not Found");
        assert_eq!(
            err.to_string(),
            "Storage service returned 404 Not Found (BlobNotFound): Not Found"
        );
    }

    #[test]
    fn test_malformed_error_body() {
        let err = StorageError::from_response(response(
            StatusCode::INTERNAL_SERVER_ERROR,
            HeaderMap::new(),
            "<Error><Code>Oops",
        ));
        assert_eq!(err.code(), None);
        assert_eq!(err.message(), "Internal Server Error");
    }
}
