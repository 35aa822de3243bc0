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

//! Preconditions attached to requests
//!
//! Each condition group maps to a fixed set of request headers. Groups that apply
//! to a resource type are combined by inclusion, so a [`BlobAccessConditions`]
//! holds a [`ModifiedTimeConditions`], a [`MatchConditions`] and a
//! [`LeaseAccessConditions`].

use crate::client::{Request, RFC1123_FMT};
use crate::error::RequestError;
use chrono::{DateTime, Utc};

/// Require the active lease on the resource to match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseAccessConditions {
    /// Sent as `x-ms-lease-id`
    pub lease_id: Option<String>,
}

impl LeaseAccessConditions {
    pub(crate) fn apply(&self, request: &mut Request) -> Result<(), RequestError> {
        if let Some(lease_id) = &self.lease_id {
            request.set_header("x-ms-lease-id", lease_id)?;
        }
        Ok(())
    }
}

/// Require the resource to have been modified, or not, since a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifiedTimeConditions {
    /// Sent as `If-Modified-Since`
    pub if_modified_since: Option<DateTime<Utc>>,
    /// Sent as `If-Unmodified-Since`
    pub if_unmodified_since: Option<DateTime<Utc>>,
}

impl ModifiedTimeConditions {
    pub(crate) fn apply(&self, request: &mut Request) -> Result<(), RequestError> {
        if let Some(t) = &self.if_modified_since {
            request.set_header("if-modified-since", &t.format(RFC1123_FMT).to_string())?;
        }
        if let Some(t) = &self.if_unmodified_since {
            request.set_header("if-unmodified-since", &t.format(RFC1123_FMT).to_string())?;
        }
        Ok(())
    }
}

/// Require the ETag of the resource to match, or not
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchConditions {
    /// Sent as `If-Match`
    pub if_match: Option<String>,
    /// Sent as `If-None-Match`
    pub if_none_match: Option<String>,
}

impl MatchConditions {
    pub(crate) fn apply(&self, request: &mut Request) -> Result<(), RequestError> {
        if let Some(etag) = &self.if_match {
            request.set_header("if-match", etag)?;
        }
        if let Some(etag) = &self.if_none_match {
            request.set_header("if-none-match", etag)?;
        }
        Ok(())
    }
}

/// Conditions accepted by container operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerAccessConditions {
    /// Modification time conditions
    pub modified: ModifiedTimeConditions,
    /// Lease condition
    pub lease: LeaseAccessConditions,
}

impl ContainerAccessConditions {
    pub(crate) fn apply(&self, request: &mut Request) -> Result<(), RequestError> {
        self.modified.apply(request)?;
        self.lease.apply(request)
    }
}

/// Conditions accepted by blob operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobAccessConditions {
    /// Modification time conditions
    pub modified: ModifiedTimeConditions,
    /// ETag conditions
    pub matching: MatchConditions,
    /// Lease condition
    pub lease: LeaseAccessConditions,
}

impl BlobAccessConditions {
    pub(crate) fn apply(&self, request: &mut Request) -> Result<(), RequestError> {
        self.modified.apply(request)?;
        self.matching.apply(request)?;
        self.lease.apply(request)
    }
}

/// Conditions accepted by page blob writes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBlobAccessConditions {
    /// Conditions shared with every blob operation
    pub blob: BlobAccessConditions,
    /// Sent as `x-ms-if-sequence-number-lt`
    pub if_sequence_number_less_than: Option<i64>,
    /// Sent as `x-ms-if-sequence-number-le`
    pub if_sequence_number_less_than_or_equal: Option<i64>,
    /// Sent as `x-ms-if-sequence-number-eq`
    pub if_sequence_number_equal: Option<i64>,
}

impl PageBlobAccessConditions {
    pub(crate) fn apply(&self, request: &mut Request) -> Result<(), RequestError> {
        self.blob.apply(request)?;
        let sequence = [
            ("x-ms-if-sequence-number-lt", self.if_sequence_number_less_than),
            ("x-ms-if-sequence-number-le", self.if_sequence_number_less_than_or_equal),
            ("x-ms-if-sequence-number-eq", self.if_sequence_number_equal),
        ];
        for (name, value) in sequence {
            if let Some(value) = value {
                request.set_header(name, &value.to_string())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use http::Method;
    use url::Url;

    fn request() -> Request {
        Request::new(Method::PUT, Url::parse("https://account.blob.core.windows.net/c/b").unwrap())
    }

    #[test]
    fn test_empty_conditions() {
        let mut r = request();
        PageBlobAccessConditions::default().apply(&mut r).unwrap();
        assert!(r.headers().is_empty());
    }

    #[test]
    fn test_page_blob_conditions() {
        let conditions = PageBlobAccessConditions {
            blob: BlobAccessConditions {
                modified: ModifiedTimeConditions {
                    if_modified_since: Some(Utc.with_ymd_and_hms(2020, 7, 27, 8, 55, 24).unwrap()),
                    if_unmodified_since: None,
                },
                matching: MatchConditions {
                    if_match: Some("\"0x1\"".to_string()),
                    if_none_match: None,
                },
                lease: LeaseAccessConditions {
                    lease_id: Some("lease".to_string()),
                },
            },
            if_sequence_number_less_than: Some(5),
            if_sequence_number_less_than_or_equal: None,
            if_sequence_number_equal: Some(3),
        };
        let mut r = request();
        conditions.apply(&mut r).unwrap();
        assert_eq!(r.header("if-modified-since"), Some("Mon, 27 Jul 2020 08:55:24 GMT"));
        assert_eq!(r.header("if-match"), Some("\"0x1\""));
        assert_eq!(r.header("x-ms-lease-id"), Some("lease"));
        assert_eq!(r.header("x-ms-if-sequence-number-lt"), Some("5"));
        assert_eq!(r.header("x-ms-if-sequence-number-eq"), Some("3"));
        assert!(r.header("x-ms-if-sequence-number-le").is_none());
        assert!(r.header("if-unmodified-since").is_none());
    }
}
