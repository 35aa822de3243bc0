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

use crate::blob::ContainerClient;
use crate::client::{Pipeline, Response};
use crate::models::{
    join_values, ListContainersInclude, ListContainersSegment, RequestOptions,
    StorageServiceProperties,
};
use crate::protocol::{self, decode_xml, new_request, set_xml_body};
use crate::util::append_path;
use crate::{Context, Result};
use http::{Method, StatusCode};
use url::Url;

/// Options for [`BlobServiceClient::list_containers_segment`]
#[derive(Debug, Clone, Default)]
pub struct ListContainersOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Only return containers whose name begins with this prefix
    pub prefix: Option<String>,
    /// The `next_marker` of the previous page
    pub marker: Option<String>,
    /// Maximum number of containers to return, at most 5000
    pub max_results: Option<u32>,
    /// Additional datasets to include
    pub include: Vec<ListContainersInclude>,
}

/// A client for the blob service of a storage account
#[derive(Debug, Clone)]
pub struct BlobServiceClient {
    pipeline: Pipeline,
    url: Url,
}

impl BlobServiceClient {
    /// Create a client for the blob service at `url`, sending requests through `pipeline`
    pub fn new(url: Url, pipeline: Pipeline) -> Self {
        Self { pipeline, url }
    }

    /// The URL of the blob service
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// A client for the container `name`
    pub fn container_client(&self, name: &str) -> ContainerClient {
        ContainerClient::new(append_path(&self.url, name), self.pipeline.clone())
    }

    /// List one page of the containers in this account
    pub async fn list_containers_segment(
        &self,
        options: &ListContainersOptions,
    ) -> Result<Response<ListContainersSegment>> {
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

    /// Get the metrics and CORS settings of the blob service
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

    /// Replace the metrics and CORS settings of the blob service
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock_transport::{mock_pipeline, MockTransport};
    use crate::models::PublicAccessType;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_list_containers() {
        let mock = Arc::new(MockTransport::new());
        mock.push_body(
            StatusCode::OK,
            r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://myaccount.blob.core.windows.net/">
  <MaxResults>1</MaxResults>
  <Containers>
    <Container>
      <Name>images</Name>
      <Properties>
        <Last-Modified>Mon, 27 Jul 2020 08:55:24 GMT</Last-Modified>
        <Etag>"0x8D83204F5E6CF1B"</Etag>
        <PublicAccess>blob</PublicAccess>
      </Properties>
      <Metadata><owner>web</owner></Metadata>
    </Container>
  </Containers>
  <NextMarker>/myaccount/logs</NextMarker>
</EnumerationResults>"#,
        );
        let url = Url::parse("https://myaccount.blob.core.windows.net/").unwrap();
        let client = BlobServiceClient::new(url, mock_pipeline(&mock));
        let options = ListContainersOptions {
            max_results: Some(1),
            include: vec![ListContainersInclude::Metadata],
            ..Default::default()
        };
        let segment = client.list_containers_segment(&options).await.unwrap();

        assert_eq!(
            mock.last_request().url,
            "https://myaccount.blob.core.windows.net/?comp=list&maxresults=1&include=metadata"
        );
        assert_eq!(segment.items.len(), 1);
        assert_eq!(segment.items[0].name, "images");
        assert_eq!(
            segment.items[0].properties.public_access,
            Some(PublicAccessType::Blob)
        );
        assert_eq!(segment.items[0].metadata["owner"], "web");
        assert_eq!(segment.next_marker, "/myaccount/logs");

        assert_eq!(
            client.container_client("images").url().as_str(),
            "https://myaccount.blob.core.windows.net/images"
        );
    }
}
