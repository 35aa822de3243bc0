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

use crate::blob::{BlockBlobClient, PageBlobClient};
use crate::client::{Pipeline, Response};
use crate::models::{
    BlobAccessConditions, BlobDownload, BlobInfo, BlobProperties, DeleteSnapshotsOption,
    Metadata,
};
use crate::protocol::header::{get_string, set_metadata};
use crate::protocol::{self, check_status, format_range, new_request};
use crate::{Context, Result};
use http::{Method, StatusCode};
use std::ops::Range;
use url::Url;

/// Options for [`BlobClient::get_properties`]
#[derive(Debug, Clone, Default)]
pub struct GetBlobPropertiesOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Preconditions of the read
    pub conditions: BlobAccessConditions,
}

/// Options for [`BlobClient::delete`]
#[derive(Debug, Clone, Default)]
pub struct DeleteBlobOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Required if the blob has snapshots
    pub delete_snapshots: Option<DeleteSnapshotsOption>,
    /// Preconditions of the delete
    pub conditions: BlobAccessConditions,
}

/// Options for [`BlobClient::download`]
#[derive(Debug, Clone, Default)]
pub struct DownloadBlobOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Byte range to read, the whole blob if not set
    pub range: Option<Range<u64>>,
    /// Preconditions of the read
    pub conditions: BlobAccessConditions,
}

/// Options for [`BlobClient::set_metadata`]
#[derive(Debug, Clone, Default)]
pub struct SetBlobMetadataOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// The new metadata, replacing all existing entries
    pub metadata: Metadata,
    /// Preconditions of the update
    pub conditions: BlobAccessConditions,
}

/// A client for a blob of any type
#[derive(Debug, Clone)]
pub struct BlobClient {
    pipeline: Pipeline,
    url: Url,
}

impl BlobClient {
    /// Create a client for the blob at `url`, sending requests through `pipeline`
    pub fn new(url: Url, pipeline: Pipeline) -> Self {
        Self { pipeline, url }
    }

    /// The URL of the blob
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// A client for block blob operations on this blob
    pub fn block_blob_client(&self) -> BlockBlobClient {
        BlockBlobClient::new(self.url.clone(), self.pipeline.clone())
    }

    /// A client for page blob operations on this blob
    pub fn page_blob_client(&self) -> PageBlobClient {
        PageBlobClient::new(self.url.clone(), self.pipeline.clone())
    }

    /// Get the properties and metadata of the blob
    pub async fn get_properties(
        &self,
        options: &GetBlobPropertiesOptions,
    ) -> Result<Response<BlobProperties>> {
        let mut request = new_request(Method::HEAD, &self.url, options.timeout);
        options.conditions.apply(&mut request)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let properties = BlobProperties::from_headers(response.headers())?;
        Ok(Response::new(properties, response))
    }

    /// Mark the blob for deletion
    pub async fn delete(&self, options: &DeleteBlobOptions) -> Result<Response<()>> {
        let mut request = new_request(Method::DELETE, &self.url, options.timeout);
        if let Some(delete_snapshots) = options.delete_snapshots {
            request.set_header("x-ms-delete-snapshots", delete_snapshots.as_str())?;
        }
        options.conditions.apply(&mut request)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::ACCEPTED).await?;
        Ok(Response::new((), response))
    }

    /// Read the contents of the blob
    ///
    /// The returned body is not buffered; it is streamed from the connection as it
    /// is consumed.
    pub async fn download(&self, options: &DownloadBlobOptions) -> Result<Response<BlobDownload>> {
        let mut request = new_request(Method::GET, &self.url, options.timeout);
        request.set_buffer_response(false);
        if let Some(range) = &options.range {
            request.set_header("x-ms-range", &format_range(range)?)?;
        }
        options.conditions.apply(&mut request)?;

        let expected = match options.range {
            Some(_) => StatusCode::PARTIAL_CONTENT,
            None => StatusCode::OK,
        };
        let response = self.pipeline.send(&options.context, &mut request).await?;
        let mut response = check_status(response, expected)?;

        let headers = response.headers();
        let properties = BlobProperties::from_headers(headers)?;
        let content_range = get_string(headers, "content-range")?;

        let download = BlobDownload {
            body: response.take_body(),
            content_range,
            properties,
        };
        Ok(Response::new(download, response))
    }

    /// Replace the metadata of the blob
    pub async fn set_metadata(
        &self,
        options: &SetBlobMetadataOptions,
    ) -> Result<Response<BlobInfo>> {
        let mut request = new_request(Method::PUT, &self.url, options.timeout);
        request.set_query("comp", "metadata");
        set_metadata(&mut request, &options.metadata)?;
        options.conditions.apply(&mut request)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let info = BlobInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock_transport::{mock_pipeline, write_headers, MockTransport};
    use crate::error::{CancelReason, RequestError};
    use crate::models::{AccessTier, BlobType, MatchConditions};
    use crate::{Context, Error};
    use std::sync::Arc;
    use std::time::Duration;

    fn client(mock: &Arc<MockTransport>) -> BlobClient {
        let url = Url::parse("https://myaccount.blob.core.windows.net/images/cat.png").unwrap();
        BlobClient::new(url, mock_pipeline(mock))
    }

    #[tokio::test]
    async fn test_get_properties() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(
            StatusCode::OK,
            write_headers(&[
                ("content-length", "2048"),
                ("content-type", "image/png"),
                ("x-ms-blob-type", "BlockBlob"),
                ("x-ms-access-tier", "Cool"),
                ("x-ms-meta-camera", "x100"),
                ("x-ms-server-encrypted", "true"),
            ]),
            "",
        );
        let options = GetBlobPropertiesOptions {
            conditions: BlobAccessConditions {
                matching: MatchConditions {
                    if_match: Some("\"0x8D83204F5E6CF1B\"".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let properties = client(&mock).get_properties(&options).await.unwrap();

        let request = mock.last_request();
        assert_eq!(request.method, Method::HEAD);
        assert_eq!(request.headers["if-match"], "\"0x8D83204F5E6CF1B\"");
        assert_eq!(properties.content_length, 2048);
        assert_eq!(properties.blob_type, Some(BlobType::BlockBlob));
        assert_eq!(properties.access_tier, Some(AccessTier::Cool));
        assert_eq!(properties.metadata["camera"], "x100");
        assert!(properties.is_server_encrypted);
    }

    #[tokio::test]
    async fn test_delete_snapshots() {
        let mock = Arc::new(MockTransport::new());
        mock.push_status(StatusCode::ACCEPTED);
        let options = DeleteBlobOptions {
            delete_snapshots: Some(DeleteSnapshotsOption::Include),
            ..Default::default()
        };
        client(&mock).delete(&options).await.unwrap();
        let request = mock.last_request();
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.headers["x-ms-delete-snapshots"], "include");
    }

    #[tokio::test]
    async fn test_download_range() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(
            StatusCode::PARTIAL_CONTENT,
            write_headers(&[
                ("content-length", "4"),
                ("content-range", "bytes 0-3/2048"),
                ("x-ms-blob-type", "BlockBlob"),
            ]),
            "\u{89}PNG",
        );
        let options = DownloadBlobOptions {
            range: Some(0..4),
            ..Default::default()
        };
        let download = client(&mock).download(&options).await.unwrap().into_value();

        assert_eq!(mock.last_request().headers["x-ms-range"], "bytes=0-3");
        assert_eq!(download.content_range.as_deref(), Some("bytes 0-3/2048"));
        assert_eq!(download.properties.content_length, 4);
        assert_eq!(download.body.as_bytes().unwrap().as_ref(), "\u{89}PNG".as_bytes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_body_stops_at_deadline() {
        let mock = Arc::new(MockTransport::new());
        mock.push_stalled(
            StatusCode::OK,
            write_headers(&[("content-length", "4"), ("x-ms-blob-type", "BlockBlob")]),
        );
        let options = DownloadBlobOptions {
            context: Context::new().with_timeout(Duration::from_secs(5)),
            ..Default::default()
        };
        let download = client(&mock).download(&options).await.unwrap().into_value();

        let err = download.body.bytes().await.unwrap_err();
        assert_eq!(err.cancel_reason(), Some(CancelReason::DeadlineExceeded));
        assert!(matches!(
            Error::from(err),
            Error::Cancelled {
                reason: CancelReason::DeadlineExceeded
            }
        ));
    }

    #[tokio::test]
    async fn test_download_whole_blob_expects_ok() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(
            StatusCode::PARTIAL_CONTENT,
            write_headers(&[("content-length", "0")]),
            "",
        );
        let err = client(&mock)
            .download(&DownloadBlobOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::PARTIAL_CONTENT));
    }

    #[tokio::test]
    async fn test_download_empty_range() {
        let mock = Arc::new(MockTransport::new());
        let options = DownloadBlobOptions {
            range: Some(10..10),
            ..Default::default()
        };
        let err = client(&mock).download(&options).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidRequest {
                source: RequestError::EmptyRange { .. }
            }
        ));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_set_metadata() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(StatusCode::OK, write_headers(&[]), "");
        let options = SetBlobMetadataOptions {
            metadata: Metadata::from([("camera".to_string(), "x100".to_string())]),
            ..Default::default()
        };
        let info = client(&mock).set_metadata(&options).await.unwrap();
        assert_eq!(info.etag, "\"0x8D83204F5E6CF1B\"");

        let request = mock.last_request();
        assert!(request.url.ends_with("/cat.png?comp=metadata"));
        assert_eq!(request.headers["x-ms-meta-camera"], "x100");
    }

    #[test]
    fn test_typed_clients_share_url() {
        let mock = Arc::new(MockTransport::new());
        let blob = client(&mock);
        assert_eq!(blob.block_blob_client().url(), blob.url());
        assert_eq!(blob.page_blob_client().url(), blob.url());
    }
}
