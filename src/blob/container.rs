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

use crate::blob::BlobClient;
use crate::client::{Pipeline, Request, Response};
use crate::models::{
    join_values, ContainerAccessConditions, ContainerInfo, ContainerPropertiesInfo,
    LeaseAccessConditions, ListBlobsFlatSegment, ListBlobsInclude, Metadata, PublicAccessType,
};
use crate::protocol::header::set_metadata;
use crate::protocol::{self, decode_xml, new_request};
use crate::util::append_path;
use crate::{Context, Result};
use http::{Method, StatusCode};
use url::Url;

/// Options for [`ContainerClient::create`]
#[derive(Debug, Clone, Default)]
pub struct CreateContainerOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Metadata of the new container
    pub metadata: Metadata,
    /// Anonymous access level, private if not set
    pub public_access: Option<PublicAccessType>,
}

/// Options for [`ContainerClient::delete`]
#[derive(Debug, Clone, Default)]
pub struct DeleteContainerOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Preconditions of the delete
    pub conditions: ContainerAccessConditions,
}

/// Options for [`ContainerClient::get_properties`]
#[derive(Debug, Clone, Default)]
pub struct GetContainerPropertiesOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Lease condition
    pub lease: LeaseAccessConditions,
}

/// Options for [`ContainerClient::set_metadata`]
#[derive(Debug, Clone, Default)]
pub struct SetContainerMetadataOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// The new metadata, replacing all existing entries
    pub metadata: Metadata,
    /// Preconditions of the update
    pub conditions: ContainerAccessConditions,
}

/// Options for [`ContainerClient::list_blobs_flat_segment`]
#[derive(Debug, Clone, Default)]
pub struct ListBlobsOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Only return blobs whose name begins with this prefix
    pub prefix: Option<String>,
    /// The `next_marker` of the previous page
    pub marker: Option<String>,
    /// Maximum number of blobs to return, at most 5000
    pub max_results: Option<u32>,
    /// Additional datasets to include
    pub include: Vec<ListBlobsInclude>,
}

/// A client for a blob container
#[derive(Debug, Clone)]
pub struct ContainerClient {
    pipeline: Pipeline,
    url: Url,
}

impl ContainerClient {
    /// Create a client for the container at `url`, sending requests through `pipeline`
    pub fn new(url: Url, pipeline: Pipeline) -> Self {
        Self { pipeline, url }
    }

    /// The URL of the container
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// A client for the blob `name`, which may contain `/`
    pub fn blob_client(&self, name: &str) -> BlobClient {
        BlobClient::new(append_path(&self.url, name), self.pipeline.clone())
    }

    fn request(&self, method: Method, timeout: Option<u32>) -> Request {
        let mut request = new_request(method, &self.url, timeout);
        request.set_query("restype", "container");
        request
    }

    /// Create the container, failing with `ContainerAlreadyExists` if it exists
    pub async fn create(
        &self,
        options: &CreateContainerOptions,
    ) -> Result<Response<ContainerInfo>> {
        let mut request = self.request(Method::PUT, options.timeout);
        set_metadata(&mut request, &options.metadata)?;
        if let Some(access) = options.public_access {
            request.set_header("x-ms-blob-public-access", access.as_str())?;
        }

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = ContainerInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Mark the container and the blobs in it for deletion
    pub async fn delete(&self, options: &DeleteContainerOptions) -> Result<Response<()>> {
        let mut request = self.request(Method::DELETE, options.timeout);
        options.conditions.apply(&mut request)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::ACCEPTED).await?;
        Ok(Response::new((), response))
    }

    /// Get the properties and metadata of the container
    pub async fn get_properties(
        &self,
        options: &GetContainerPropertiesOptions,
    ) -> Result<Response<ContainerPropertiesInfo>> {
        let mut request = self.request(Method::GET, options.timeout);
        options.lease.apply(&mut request)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let info = ContainerPropertiesInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Replace the metadata of the container
    pub async fn set_metadata(
        &self,
        options: &SetContainerMetadataOptions,
    ) -> Result<Response<ContainerInfo>> {
        let mut request = self.request(Method::PUT, options.timeout);
        request.set_query("comp", "metadata");
        set_metadata(&mut request, &options.metadata)?;
        options.conditions.apply(&mut request)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let info = ContainerInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// List one page of the blobs in the container, ignoring any hierarchy
    pub async fn list_blobs_flat_segment(
        &self,
        options: &ListBlobsOptions,
    ) -> Result<Response<ListBlobsFlatSegment>> {
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
        if !options.include.is_empty() {
            request.set_query("include", join_values(&options.include));
        }

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let segment = decode_xml(&response)?;
        Ok(Response::new(segment, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock_transport::{mock_pipeline, write_headers, MockTransport};
    use crate::models::{BlobType, LeaseState, ModifiedTimeConditions};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn client(mock: &Arc<MockTransport>) -> ContainerClient {
        let url = Url::parse("https://myaccount.blob.core.windows.net/images").unwrap();
        ContainerClient::new(url, mock_pipeline(mock))
    }

    #[tokio::test]
    async fn test_create_container() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(StatusCode::CREATED, write_headers(&[]), "");
        let options = CreateContainerOptions {
            public_access: Some(PublicAccessType::Container),
            metadata: Metadata::from([("env".to_string(), "test".to_string())]),
            timeout: Some(5),
            ..Default::default()
        };
        client(&mock).create(&options).await.unwrap();

        let request = mock.last_request();
        assert_eq!(
            request.url,
            "https://myaccount.blob.core.windows.net/images?timeout=5&restype=container"
        );
        assert_eq!(request.headers["x-ms-blob-public-access"], "container");
        assert_eq!(request.headers["x-ms-meta-env"], "test");
    }

    #[tokio::test]
    async fn test_delete_with_conditions() {
        let mock = Arc::new(MockTransport::new());
        mock.push_status(StatusCode::ACCEPTED);
        let options = DeleteContainerOptions {
            conditions: ContainerAccessConditions {
                modified: ModifiedTimeConditions {
                    if_unmodified_since: Utc.with_ymd_and_hms(2020, 7, 27, 8, 55, 24).single(),
                    ..Default::default()
                },
                lease: LeaseAccessConditions {
                    lease_id: Some("lease-1".to_string()),
                },
            },
            ..Default::default()
        };
        client(&mock).delete(&options).await.unwrap();

        let request = mock.last_request();
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.headers["if-unmodified-since"], "Mon, 27 Jul 2020 08:55:24 GMT");
        assert_eq!(request.headers["x-ms-lease-id"], "lease-1");
    }

    #[tokio::test]
    async fn test_get_properties() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(
            StatusCode::OK,
            write_headers(&[
                ("x-ms-blob-public-access", "blob"),
                ("x-ms-lease-state", "leased"),
                ("x-ms-has-legal-hold", "true"),
            ]),
            "",
        );
        let info = client(&mock)
            .get_properties(&GetContainerPropertiesOptions::default())
            .await
            .unwrap();
        assert_eq!(info.public_access, Some(PublicAccessType::Blob));
        assert_eq!(info.lease.lease_state, Some(LeaseState::Leased));
        assert!(info.has_legal_hold);
        assert!(!info.has_immutability_policy);
    }

    #[tokio::test]
    async fn test_set_metadata() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(StatusCode::OK, write_headers(&[]), "");
        let options = SetContainerMetadataOptions {
            metadata: Metadata::from([("k".to_string(), "v".to_string())]),
            ..Default::default()
        };
        client(&mock).set_metadata(&options).await.unwrap();
        let request = mock.last_request();
        assert!(request.url.ends_with("?restype=container&comp=metadata"));
        assert_eq!(request.headers["x-ms-meta-k"], "v");
    }

    #[tokio::test]
    async fn test_list_blobs() {
        let mock = Arc::new(MockTransport::new());
        mock.push_body(
            StatusCode::OK,
            r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://myaccount.blob.core.windows.net/" ContainerName="images">
  <Prefix>2020/</Prefix>
  <Blobs>
    <Blob>
      <Name>2020/cat.png</Name>
      <Properties>
        <Etag>0x1</Etag>
        <Content-Length>2048</Content-Length>
        <Content-Type>image/png</Content-Type>
        <BlobType>BlockBlob</BlobType>
        <Unknown><Nested>ignored</Nested></Unknown>
      </Properties>
    </Blob>
  </Blobs>
  <NextMarker />
</EnumerationResults>"#,
        );
        let options = ListBlobsOptions {
            prefix: Some("2020/".to_string()),
            include: vec![ListBlobsInclude::Metadata, ListBlobsInclude::Snapshots],
            ..Default::default()
        };
        let segment = client(&mock).list_blobs_flat_segment(&options).await.unwrap();

        assert_eq!(
            mock.last_request().url,
            "https://myaccount.blob.core.windows.net/images?restype=container&comp=list&prefix=2020%2F&include=metadata%2Csnapshots"
        );
        assert_eq!(segment.container_name, "images");
        assert_eq!(segment.items.len(), 1);
        let blob = &segment.items[0];
        assert_eq!(blob.name, "2020/cat.png");
        assert_eq!(blob.properties.content_length, 2048);
        assert_eq!(blob.properties.blob_type, Some(BlobType::BlockBlob));
        assert_eq!(
            blob.properties.http_headers.content_type.as_deref(),
            Some("image/png")
        );
        assert_eq!(segment.next_marker, "");
    }

    #[test]
    fn test_blob_client_url() {
        let mock = Arc::new(MockTransport::new());
        assert_eq!(
            client(&mock).blob_client("2020/cat 1.png").url().as_str(),
            "https://myaccount.blob.core.windows.net/images/2020/cat%201.png"
        );
    }
}
