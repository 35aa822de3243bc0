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
    AccessTier, BlobAccessConditions, BlobContentInfo, BlobType, HttpHeaders, Metadata,
};
use crate::protocol::header::set_metadata;
use crate::protocol::{self, new_request};
use crate::{Context, Result};
use http::{Method, StatusCode};
use url::Url;

/// Options for [`BlockBlobClient::upload`]
#[derive(Debug, Clone, Default)]
pub struct UploadBlockBlobOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// HTTP headers stored with the blob
    pub http_headers: HttpHeaders,
    /// Metadata of the blob
    pub metadata: Metadata,
    /// Access tier of the blob, the account default if not set
    pub access_tier: Option<AccessTier>,
    /// Preconditions of the write
    pub conditions: BlobAccessConditions,
}

/// A client for a block blob
#[derive(Debug, Clone)]
pub struct BlockBlobClient {
    pipeline: Pipeline,
    url: Url,
}

impl BlockBlobClient {
    /// Create a client for the block blob at `url`, sending requests through `pipeline`
    pub fn new(url: Url, pipeline: Pipeline) -> Self {
        Self { pipeline, url }
    }

    /// The URL of the blob
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Create or replace the blob with `body` in a single request
    ///
    /// The body must have a known length. Any existing blob of any type is
    /// overwritten, use [`MatchConditions::if_none_match`] of `*` to prevent this.
    ///
    /// [`MatchConditions::if_none_match`]: crate::models::MatchConditions::if_none_match
    pub async fn upload(
        &self,
        body: impl Into<RequestBody>,
        options: &UploadBlockBlobOptions,
    ) -> Result<Response<BlobContentInfo>> {
        let body = body.into();
        if body.content_length().is_none() {
            return Err(RequestError::UnknownContentLength.into());
        }

        let mut request = new_request(Method::PUT, &self.url, options.timeout);
        request.set_header("x-ms-blob-type", BlobType::BlockBlob.as_str())?;
        options.http_headers.apply(&mut request, "x-ms-blob-")?;
        set_metadata(&mut request, &options.metadata)?;
        if let Some(tier) = options.access_tier {
            request.set_header("x-ms-access-tier", tier.as_str())?;
        }
        options.conditions.apply(&mut request)?;
        request.set_body(body);

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = BlobContentInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }
}
