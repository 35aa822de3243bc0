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

use crate::client::{Pipeline, Response};
use crate::models::{
    join_values, ListSharesInclude, ListSharesSegment, RequestOptions, StorageServiceProperties,
};
use crate::protocol::{self, decode_xml, new_request, set_xml_body};
use crate::share::ShareClient;
use crate::util::append_path;
use crate::{Context, Result};
use http::{Method, StatusCode};
use url::Url;

/// Options for [`ShareServiceClient::list_shares_segment`]
#[derive(Debug, Clone, Default)]
pub struct ListSharesOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Only return shares whose name begins with this prefix
    pub prefix: Option<String>,
    /// The `next_marker` of the previous page
    pub marker: Option<String>,
    /// Maximum number of shares to return, at most 5000
    pub max_results: Option<u32>,
    /// Additional datasets to include
    pub include: Vec<ListSharesInclude>,
}

/// A client for the file service of a storage account
#[derive(Debug, Clone)]
pub struct ShareServiceClient {
    pipeline: Pipeline,
    url: Url,
}

impl ShareServiceClient {
    /// Create a client for the file service at `url`, sending requests through `pipeline`
    pub fn new(url: Url, pipeline: Pipeline) -> Self {
        Self { pipeline, url }
    }

    /// The URL of the file service
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// A client for the share `name`
    pub fn share_client(&self, name: &str) -> ShareClient {
        ShareClient::new(append_path(&self.url, name), self.pipeline.clone())
    }

    /// List one page of the shares in this account
    ///
    /// Pass the returned `next_marker` as `marker` to fetch the next page. An
    /// empty `next_marker` marks the last page.
    pub async fn list_shares_segment(
        &self,
        options: &ListSharesOptions,
    ) -> Result<Response<ListSharesSegment>> {
        let mut request = new_request(Method::GET, &self.url, options.timeout);
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
        if !options.include.is_empty() {
            request.set_query("include", join_values(&options.include));
        }

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let segment = decode_xml(&response)?;
        Ok(Response::new(segment, response))
    }

    /// Get the metrics and CORS settings of the file service
    pub async fn get_properties(
        &self,
        options: &RequestOptions,
    ) -> Result<Response<StorageServiceProperties>> {
        let mut request = new_request(Method::GET, &self.url, options.timeout);
        request.set_query("restype", "service");
        request.set_query("comp", "properties");

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let properties = decode_xml(&response)?;
        Ok(Response::new(properties, response))
    }

    /// Replace the metrics and CORS settings of the file service
    pub async fn set_properties(
        &self,
        properties: &StorageServiceProperties,
        options: &RequestOptions,
    ) -> Result<Response<()>> {
        let mut request = new_request(Method::PUT, &self.url, options.timeout);
        request.set_query("restype", "service");
        request.set_query("comp", "properties");
        set_xml_body(&mut request, properties)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::ACCEPTED).await?;
        Ok(Response::new((), response))
    }
}
