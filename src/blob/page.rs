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

use crate::blob::PAGE_SIZE;
use crate::client::{Pipeline, RequestBody, Response};
use crate::error::RequestError;
use crate::models::{
    AccessTier, BlobAccessConditions, BlobContentInfo, BlobType, HttpHeaders, Metadata,
    PageBlobAccessConditions, PageRangesInfo,
};
use crate::protocol::header::set_metadata;
use crate::protocol::{self, decode_xml, format_range, new_request};
use crate::{Context, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use http::{Method, StatusCode};
use std::ops::Range;
use url::Url;

/// Options for [`PageBlobClient::create`]
#[derive(Debug, Clone, Default)]
pub struct CreatePageBlobOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Size of the blob in bytes, a multiple of [`PAGE_SIZE`]
    pub size: u64,
    /// Initial sequence number, used by sequence number conditions
    pub sequence_number: Option<i64>,
    /// HTTP headers stored with the blob
    pub http_headers: HttpHeaders,
    /// Metadata of the blob
    pub metadata: Metadata,
    /// Premium page blob tier
    pub access_tier: Option<AccessTier>,
    /// Preconditions of the write
    pub conditions: BlobAccessConditions,
}

/// Options for [`PageBlobClient::upload_pages`]
#[derive(Debug, Clone, Default)]
pub struct UploadPagesOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Offset of the first page written, a multiple of [`PAGE_SIZE`]
    pub offset: u64,
    /// MD5 of the body, verified by the service
    pub transactional_md5: Option<Vec<u8>>,
    /// Preconditions of the write
    pub conditions: PageBlobAccessConditions,
}

/// Options for [`PageBlobClient::clear_pages`]
#[derive(Debug, Clone, Default)]
pub struct ClearPagesOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Pages to clear, both ends a multiple of [`PAGE_SIZE`]
    pub range: Range<u64>,
    /// Preconditions of the write
    pub conditions: PageBlobAccessConditions,
}

/// Options for [`PageBlobClient::get_page_ranges`]
#[derive(Debug, Clone, Default)]
pub struct GetPageRangesOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Only report pages within this range
    pub range: Option<Range<u64>>,
    /// Report the difference from this snapshot instead of all valid pages
    pub prev_snapshot: Option<String>,
    /// Preconditions of the read
    pub conditions: BlobAccessConditions,
}

fn check_aligned(range: &Range<u64>) -> Result<(), RequestError> {
    match range.start % PAGE_SIZE == 0 && range.end % PAGE_SIZE == 0 {
        true => Ok(()),
        false => Err(RequestError::UnalignedRange {
            start: range.start,
            end: range.end,
            alignment: PAGE_SIZE,
        }),
    }
}

/// A client for a page blob
#[derive(Debug, Clone)]
pub struct PageBlobClient {
    pipeline: Pipeline,
    url: Url,
}

impl PageBlobClient {
    /// Create a client for the page blob at `url`, sending requests through `pipeline`
    pub fn new(url: Url, pipeline: Pipeline) -> Self {
        Self { pipeline, url }
    }

    /// The URL of the blob
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Create a zero filled page blob of [`CreatePageBlobOptions::size`] bytes
    pub async fn create(
        &self,
        options: &CreatePageBlobOptions,
    ) -> Result<Response<BlobContentInfo>> {
        check_aligned(&(0..options.size))?;

        let mut request = new_request(Method::PUT, &self.url, options.timeout);
        request.set_header("x-ms-blob-type", BlobType::PageBlob.as_str())?;
        request.set_header("x-ms-blob-content-length", &options.size.to_string())?;
        if let Some(sequence_number) = options.sequence_number {
            request.set_header("x-ms-blob-sequence-number", &sequence_number.to_string())?;
        }
        options.http_headers.apply(&mut request, "x-ms-blob-")?;
        set_metadata(&mut request, &options.metadata)?;
        if let Some(tier) = options.access_tier {
            request.set_header("x-ms-access-tier", tier.as_str())?;
        }
        options.conditions.apply(&mut request)?;
        request.set_body(RequestBody::empty());

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = BlobContentInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Write `body` to the pages starting at [`UploadPagesOptions::offset`]
    ///
    /// The body must have a known length that is a multiple of [`PAGE_SIZE`].
    pub async fn upload_pages(
        &self,
        body: impl Into<RequestBody>,
        options: &UploadPagesOptions,
    ) -> Result<Response<BlobContentInfo>> {
        let body = body.into();
        let length = body
            .content_length()
            .ok_or(RequestError::UnknownContentLength)?;
        let end = options
            .offset
            .checked_add(length)
            .ok_or(RequestError::RangeOverflow {
                offset: options.offset,
                length,
            })?;
        let range = options.offset..end;
        check_aligned(&range)?;

        let mut request = new_request(Method::PUT, &self.url, options.timeout);
        request.set_query("comp", "page");
        request.set_header("x-ms-page-write", "update")?;
        request.set_header("x-ms-range", &format_range(&range)?)?;
        if let Some(md5) = &options.transactional_md5 {
            request.set_header("content-md5", &BASE64_STANDARD.encode(md5))?;
        }
        options.conditions.apply(&mut request)?;
        request.set_body(body);

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = BlobContentInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Release the storage of a range of pages, which then read as zeroes
    pub async fn clear_pages(
        &self,
        options: &ClearPagesOptions,
    ) -> Result<Response<BlobContentInfo>> {
        check_aligned(&options.range)?;

        let mut request = new_request(Method::PUT, &self.url, options.timeout);
        request.set_query("comp", "page");
        request.set_header("x-ms-page-write", "clear")?;
        request.set_header("x-ms-range", &format_range(&options.range)?)?;
        options.conditions.apply(&mut request)?;
        request.set_body(RequestBody::empty());

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = BlobContentInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// List the pages of the blob that contain data
    pub async fn get_page_ranges(
        &self,
        options: &GetPageRangesOptions,
    ) -> Result<Response<PageRangesInfo>> {
        let mut request = new_request(Method::GET, &self.url, options.timeout);
        request.set_query("comp", "pagelist");
        if let Some(snapshot) = &options.prev_snapshot {
            request.set_query("prevsnapshot", snapshot.as_str());
        }
        if let Some(range) = &options.range {
            request.set_header("x-ms-range", &format_range(range)?)?;
        }
        options.conditions.apply(&mut request)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let ranges: PageRangesInfo = decode_xml(&response)?;
        let ranges = ranges.with_headers(response.headers())?;
        Ok(Response::new(ranges, response))
    }
}
