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

use crate::client::{Pipeline, RequestBody, Response};
use crate::error::RequestError;
use crate::models::{
    decode_md5, FileDownload, FileInfo, FileProperties, FileRangeInfo, FileRangeList,
    FileRangeWrite, HttpHeaders, LeaseAccessConditions, Metadata, RequestOptions,
    SetMetadataInfo, SetMetadataOptions, SmbProperties,
};
use crate::protocol::header::{get_string, set_metadata};
use crate::protocol::{self, check_status, decode_xml, format_range, new_request};
use crate::share::FILE_ATTRIBUTES;
use crate::{Context, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use http::{Method, StatusCode};
use std::ops::Range;
use url::Url;

/// Options for [`FileClient::create`]
#[derive(Debug, Clone, Default)]
pub struct CreateFileOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Size of the new file in bytes, its content is initially zeroed
    pub content_length: u64,
    /// HTTP headers stored with the file
    pub http_headers: HttpHeaders,
    /// Metadata of the new file
    pub metadata: Metadata,
    /// SMB properties of the new file
    pub smb_properties: SmbProperties,
    /// Security descriptor in SDDL, takes precedence over
    /// [`SmbProperties::permission_key`]
    pub file_permission: Option<String>,
    /// Lease condition
    pub lease: LeaseAccessConditions,
}

/// Options for [`FileClient::download`]
#[derive(Debug, Clone, Default)]
pub struct DownloadFileOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Byte range to read, the whole file if not set
    pub range: Option<Range<u64>>,
    /// Return the MD5 of the range, only valid for ranges of at most 4 MiB
    pub range_get_content_md5: bool,
    /// Lease condition
    pub lease: LeaseAccessConditions,
}

/// Options for [`FileClient::upload_range`]
#[derive(Debug, Clone, Default)]
pub struct UploadRangeOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Offset in the file at which the body is written
    pub offset: u64,
    /// MD5 of the body, verified by the service
    pub transactional_md5: Option<Vec<u8>>,
    /// Lease condition
    pub lease: LeaseAccessConditions,
}

/// Options for [`FileClient::clear_range`]
#[derive(Debug, Clone, Default)]
pub struct ClearRangeOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Byte range to clear
    pub range: Range<u64>,
    /// Lease condition
    pub lease: LeaseAccessConditions,
}

/// Options for [`FileClient::get_range_list`]
#[derive(Debug, Clone, Default)]
pub struct GetRangeListOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Only list ranges overlapping this range
    pub range: Option<Range<u64>>,
    /// Lease condition
    pub lease: LeaseAccessConditions,
}

/// A client for a file in a file share
#[derive(Debug, Clone)]
pub struct FileClient {
    pipeline: Pipeline,
    url: Url,
}

impl FileClient {
    /// Create a client for the file at `url`, sending requests through `pipeline`
    pub fn new(url: Url, pipeline: Pipeline) -> Self {
        Self { pipeline, url }
    }

    /// The URL of the file
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Create the file with the given size, replacing any existing file
    ///
    /// The content of the new file is zeroed, use [`FileClient::upload_range`] to
    /// write it.
    pub async fn create(&self, options: &CreateFileOptions) -> Result<Response<FileInfo>> {
        let mut request = new_request(Method::PUT, &self.url, options.timeout);
        request.set_header("x-ms-type", "file")?;
        request.set_header("x-ms-content-length", &options.content_length.to_string())?;
        options.http_headers.apply(&mut request, "x-ms-")?;
        set_metadata(&mut request, &options.metadata)?;
        options.smb_properties.apply(
            &mut request,
            options.file_permission.as_deref(),
            FILE_ATTRIBUTES,
        )?;
        options.lease.apply(&mut request)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = FileInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Delete the file
    pub async fn delete(&self, options: &RequestOptions) -> Result<Response<()>> {
        let request = new_request(Method::DELETE, &self.url, options.timeout);
        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::ACCEPTED).await?;
        Ok(Response::new((), response))
    }

    /// Get the properties, SMB properties and metadata of the file
    pub async fn get_properties(
        &self,
        options: &RequestOptions,
    ) -> Result<Response<FileProperties>> {
        let request = new_request(Method::HEAD, &self.url, options.timeout);
        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let properties = FileProperties::from_headers(response.headers())?;
        Ok(Response::new(properties, response))
    }

    /// Replace the metadata of the file
    pub async fn set_metadata(
        &self,
        options: &SetMetadataOptions,
    ) -> Result<Response<SetMetadataInfo>> {
        let mut request = new_request(Method::PUT, &self.url, options.timeout);
        request.set_query("comp", "metadata");
        set_metadata(&mut request, &options.metadata)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let info = SetMetadataInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Read the file, or a range of it
    ///
    /// The body of the returned [`FileDownload`] is streamed as it is consumed.
    pub async fn download(&self, options: &DownloadFileOptions) -> Result<Response<FileDownload>> {
        let mut request = new_request(Method::GET, &self.url, options.timeout);
        request.set_buffer_response(false);
        if let Some(range) = &options.range {
            request.set_header("x-ms-range", &format_range(range)?)?;
            if options.range_get_content_md5 {
                request.set_header("x-ms-range-get-content-md5", "true")?;
            }
        }
        options.lease.apply(&mut request)?;

        let expected = match options.range {
            Some(_) => StatusCode::PARTIAL_CONTENT,
            None => StatusCode::OK,
        };
        let response = self.pipeline.send(&options.context, &mut request).await?;
        let mut response = check_status(response, expected)?;

        let headers = response.headers();
        let mut properties = FileProperties::from_headers(headers)?;
        let content_range = get_string(headers, "content-range")?;
        let transactional_md5 = match options.range.is_some() && options.range_get_content_md5 {
            true => {
                // The whole-file MD5 moves to x-ms-content-md5 when a range MD5 is returned
                properties.http_headers.content_md5 =
                    decode_md5(get_string(headers, "x-ms-content-md5")?.as_deref())?;
                decode_md5(get_string(headers, "content-md5")?.as_deref())?
            }
            false => None,
        };

        let download = FileDownload {
            body: response.take_body(),
            content_range,
            transactional_md5,
            properties,
        };
        Ok(Response::new(download, response))
    }

    /// Write `body` to the file starting at [`UploadRangeOptions::offset`]
    ///
    /// The body must have a known, non-zero length of at most 4 MiB.
    pub async fn upload_range(
        &self,
        body: impl Into<RequestBody>,
        options: &UploadRangeOptions,
    ) -> Result<Response<FileRangeInfo>> {
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

        let mut request = new_request(Method::PUT, &self.url, options.timeout);
        request.set_query("comp", "range");
        request.set_header("x-ms-write", FileRangeWrite::Update.as_str())?;
        request.set_header("x-ms-range", &format_range(&range)?)?;
        if let Some(md5) = &options.transactional_md5 {
            request.set_header("content-md5", &BASE64_STANDARD.encode(md5))?;
        }
        options.lease.apply(&mut request)?;
        request.set_body(body);

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = FileRangeInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Release the storage of a range, which then reads as zeroes
    pub async fn clear_range(
        &self,
        options: &ClearRangeOptions,
    ) -> Result<Response<FileRangeInfo>> {
        let mut request = new_request(Method::PUT, &self.url, options.timeout);
        request.set_query("comp", "range");
        request.set_header("x-ms-write", FileRangeWrite::Clear.as_str())?;
        request.set_header("x-ms-range", &format_range(&options.range)?)?;
        options.lease.apply(&mut request)?;
        request.set_body(RequestBody::empty());

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = FileRangeInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// List the ranges of the file that contain data
    pub async fn get_range_list(
        &self,
        options: &GetRangeListOptions,
    ) -> Result<Response<FileRangeList>> {
        let mut request = new_request(Method::GET, &self.url, options.timeout);
        request.set_query("comp", "rangelist");
        if let Some(range) = &options.range {
            request.set_header("x-ms-range", &format_range(range)?)?;
        }
        options.lease.apply(&mut request)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let list: FileRangeList = decode_xml(&response)?;
        let list = list.with_headers(response.headers())?;
        Ok(Response::new(list, response))
    }
}
