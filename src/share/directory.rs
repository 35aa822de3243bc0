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

use crate::client::{Pipeline, Request, Response};
use crate::models::{
    DirectoryInfo, DirectoryProperties, ListFilesAndDirectoriesSegment, Metadata, RequestOptions,
    SetMetadataInfo, SetMetadataOptions, SmbProperties,
};
use crate::protocol::header::set_metadata;
use crate::protocol::{self, decode_xml, new_request};
use crate::share::{FileClient, DIRECTORY_ATTRIBUTES};
use crate::util::append_path;
use crate::{Context, Result};
use http::{Method, StatusCode};
use url::Url;

/// Options for [`DirectoryClient::create`]
#[derive(Debug, Clone, Default)]
pub struct CreateDirectoryOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Metadata of the new directory
    pub metadata: Metadata,
    /// SMB properties of the new directory
    pub smb_properties: SmbProperties,
    /// Security descriptor in SDDL, takes precedence over
    /// [`SmbProperties::permission_key`]
    pub file_permission: Option<String>,
}

/// Options for [`DirectoryClient::list_files_and_directories_segment`]
#[derive(Debug, Clone, Default)]
pub struct ListFilesAndDirectoriesOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Only return items whose name begins with this prefix
    pub prefix: Option<String>,
    /// The `next_marker` of the previous page
    pub marker: Option<String>,
    /// Maximum number of items to return, at most 5000
    pub max_results: Option<u32>,
}

/// A client for a directory of a file share
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    pipeline: Pipeline,
    url: Url,
}

impl DirectoryClient {
    /// Create a client for the directory at `url`, sending requests through `pipeline`
    pub fn new(url: Url, pipeline: Pipeline) -> Self {
        Self { pipeline, url }
    }

    /// The URL of the directory
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// A client for the directory `name` nested in this one
    pub fn subdirectory_client(&self, name: &str) -> Self {
        Self::new(append_path(&self.url, name), self.pipeline.clone())
    }

    /// A client for the file `name` in this directory
    pub fn file_client(&self, name: &str) -> FileClient {
        FileClient::new(append_path(&self.url, name), self.pipeline.clone())
    }

    fn request(&self, method: Method, timeout: Option<u32>) -> Request {
        let mut request = new_request(method, &self.url, timeout);
        request.set_query("restype", "directory");
        request
    }

    /// Create the directory, failing with `ResourceAlreadyExists` if it exists
    ///
    /// The parent directory must already exist.
    pub async fn create(
        &self,
        options: &CreateDirectoryOptions,
    ) -> Result<Response<DirectoryInfo>> {
        let mut request = self.request(Method::PUT, options.timeout);
        set_metadata(&mut request, &options.metadata)?;
        options.smb_properties.apply(
            &mut request,
            options.file_permission.as_deref(),
            DIRECTORY_ATTRIBUTES,
        )?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = DirectoryInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Delete the directory, which must be empty
    pub async fn delete(&self, options: &RequestOptions) -> Result<Response<()>> {
        let request = self.request(Method::DELETE, options.timeout);
        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::ACCEPTED).await?;
        Ok(Response::new((), response))
    }

    /// Get the properties, SMB properties and metadata of the directory
    pub async fn get_properties(
        &self,
        options: &RequestOptions,
    ) -> Result<Response<DirectoryProperties>> {
        let request = self.request(Method::GET, options.timeout);
        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let properties = DirectoryProperties::from_headers(response.headers())?;
        Ok(Response::new(properties, response))
    }

    /// Replace the metadata of the directory
    pub async fn set_metadata(
        &self,
        options: &SetMetadataOptions,
    ) -> Result<Response<SetMetadataInfo>> {
        let mut request = self.request(Method::PUT, options.timeout);
        request.set_query("comp", "metadata");
        set_metadata(&mut request, &options.metadata)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let info = SetMetadataInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// List one page of the files and directories directly inside this directory
    pub async fn list_files_and_directories_segment(
        &self,
        options: &ListFilesAndDirectoriesOptions,
    ) -> Result<Response<ListFilesAndDirectoriesSegment>> {
        let mut request = self.request(Method::GET, options.timeout);
        request.set_query("comp", "list");
        if let Some(prefix) = &options.prefix {
            request.set_query("prefix", prefix.as_str());
        }
        if let Some(marker) = &options.marker {
            request.set_query("marker", marker.as_str());
        }
        if let Some(max_results) = options.max_results {
            request.set_query("maxresults", max_results.to_string());
        }

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let segment = decode_xml(&response)?;
        Ok(Response::new(segment, response))
    }
}
