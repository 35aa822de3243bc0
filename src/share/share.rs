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
    DeleteSnapshotsOption, Metadata, RequestOptions, SetMetadataOptions, ShareAccessPolicy,
    ShareInfo, SharePermission, SharePermissionInfo, SharePropertiesInfo, ShareSnapshotInfo,
    ShareStats, SignedIdentifier, SignedIdentifiers,
};
use crate::protocol::header::set_metadata;
use crate::protocol::{self, decode_json, decode_xml, new_request, set_xml_body};
use crate::share::{DirectoryClient, FileClient};
use crate::util::append_path;
use crate::{Context, Result};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use url::Url;

/// Options for [`ShareClient::create`]
#[derive(Debug, Clone, Default)]
pub struct CreateShareOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Metadata of the new share
    pub metadata: Metadata,
    /// Maximum size of the share in GiB
    pub quota: Option<i32>,
}

/// Options for [`ShareClient::delete`]
#[derive(Debug, Clone, Default)]
pub struct DeleteShareOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Whether to delete the snapshots of the share, required if it has any
    pub delete_snapshots: Option<DeleteSnapshotsOption>,
}

/// Options for [`ShareClient::create_snapshot`]
#[derive(Debug, Clone, Default)]
pub struct CreateSnapshotOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Metadata of the snapshot, defaults to the metadata of the share
    pub metadata: Metadata,
}

/// Options for [`ShareClient::set_quota`]
#[derive(Debug, Clone, Default)]
pub struct SetQuotaOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// New maximum size of the share in GiB
    pub quota: i32,
}

/// Options for [`ShareClient::create_permission`]
#[derive(Debug, Clone, Default)]
pub struct CreatePermissionOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Permission in Security Descriptor Definition Language
    pub permission: String,
}

/// Options for [`ShareClient::get_permission`]
#[derive(Debug, Clone, Default)]
pub struct GetPermissionOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// Key returned by [`ShareClient::create_permission`]
    pub permission_key: String,
}

/// Options for [`ShareClient::set_access_policy`]
#[derive(Debug, Clone, Default)]
pub struct SetAccessPolicyOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// The stored access policies, replacing all existing ones
    pub signed_identifiers: Vec<SignedIdentifier>,
}

/// A client for a single file share
#[derive(Debug, Clone)]
pub struct ShareClient {
    pipeline: Pipeline,
    url: Url,
}

impl ShareClient {
    /// Create a client for the share at `url`, sending requests through `pipeline`
    pub fn new(url: Url, pipeline: Pipeline) -> Self {
        Self { pipeline, url }
    }

    /// The URL of the share
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// A client addressing the snapshot `snapshot` of this share
    ///
    /// Directory and file clients derived from the returned client read from the
    /// snapshot as well.
    pub fn with_snapshot(&self, snapshot: &str) -> Self {
        let mut url = self.url.clone();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "sharesnapshot")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair("sharesnapshot", snapshot);
        Self::new(url, self.pipeline.clone())
    }

    /// A client for the root directory of this share
    pub fn root_directory_client(&self) -> DirectoryClient {
        DirectoryClient::new(self.url.clone(), self.pipeline.clone())
    }

    /// A client for the directory at `path`, relative to the share root
    pub fn directory_client(&self, path: &str) -> DirectoryClient {
        DirectoryClient::new(append_path(&self.url, path), self.pipeline.clone())
    }

    /// A client for the file at `path`, relative to the share root
    pub fn file_client(&self, path: &str) -> FileClient {
        FileClient::new(append_path(&self.url, path), self.pipeline.clone())
    }

    fn request(&self, method: Method, timeout: Option<u32>) -> Request {
        let mut request = new_request(method, &self.url, timeout);
        request.set_query("restype", "share");
        request
    }

    /// Create the share, failing with `ShareAlreadyExists` if it exists
    pub async fn create(&self, options: &CreateShareOptions) -> Result<Response<ShareInfo>> {
        let mut request = self.request(Method::PUT, options.timeout);
        set_metadata(&mut request, &options.metadata)?;
        if let Some(quota) = options.quota {
            request.set_header("x-ms-share-quota", &quota.to_string())?;
        }

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = ShareInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Mark the share for deletion
    pub async fn delete(&self, options: &DeleteShareOptions) -> Result<Response<()>> {
        let mut request = self.request(Method::DELETE, options.timeout);
        if let Some(delete_snapshots) = options.delete_snapshots {
            request.set_header("x-ms-delete-snapshots", delete_snapshots.as_str())?;
        }

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::ACCEPTED).await?;
        Ok(Response::new((), response))
    }

    /// Get the properties and metadata of the share
    pub async fn get_properties(
        &self,
        options: &RequestOptions,
    ) -> Result<Response<SharePropertiesInfo>> {
        let request = self.request(Method::GET, options.timeout);
        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let info = SharePropertiesInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Take a read-only snapshot of the share
    pub async fn create_snapshot(
        &self,
        options: &CreateSnapshotOptions,
    ) -> Result<Response<ShareSnapshotInfo>> {
        let mut request = self.request(Method::PUT, options.timeout);
        request.set_query("comp", "snapshot");
        set_metadata(&mut request, &options.metadata)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = ShareSnapshotInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Change the maximum size of the share
    pub async fn set_quota(&self, options: &SetQuotaOptions) -> Result<Response<ShareInfo>> {
        let mut request = self.request(Method::PUT, options.timeout);
        request.set_query("comp", "properties");
        request.set_header("x-ms-share-quota", &options.quota.to_string())?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let info = ShareInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Replace the metadata of the share
    pub async fn set_metadata(&self, options: &SetMetadataOptions) -> Result<Response<ShareInfo>> {
        let mut request = self.request(Method::PUT, options.timeout);
        request.set_query("comp", "metadata");
        set_metadata(&mut request, &options.metadata)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let info = ShareInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Store a security descriptor at the share level and return its key
    ///
    /// The key can be passed as [`SmbProperties::permission_key`](crate::models::SmbProperties::permission_key)
    /// when creating files and directories.
    pub async fn create_permission(
        &self,
        options: &CreatePermissionOptions,
    ) -> Result<Response<SharePermissionInfo>> {
        let mut request = self.request(Method::PUT, options.timeout);
        request.set_query("comp", "filepermission");
        let body = serde_json::to_vec(&SharePermission {
            permission: options.permission.clone(),
        })
        .map_err(crate::DecodeError::from)?;
        request.insert_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request.set_body(body);

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::CREATED).await?;
        let info = SharePermissionInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Fetch a security descriptor stored with [`ShareClient::create_permission`]
    pub async fn get_permission(
        &self,
        options: &GetPermissionOptions,
    ) -> Result<Response<SharePermission>> {
        let mut request = self.request(Method::GET, options.timeout);
        request.set_query("comp", "filepermission");
        request.set_header("x-ms-file-permission-key", &options.permission_key)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let permission = decode_json(&response)?;
        Ok(Response::new(permission, response))
    }

    /// Get the stored access policies of the share
    pub async fn get_access_policy(
        &self,
        options: &RequestOptions,
    ) -> Result<Response<ShareAccessPolicy>> {
        let mut request = self.request(Method::GET, options.timeout);
        request.set_query("comp", "acl");

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let identifiers: SignedIdentifiers = decode_xml(&response)?;
        let info = ShareInfo::from_headers(response.headers())?;
        let policy = ShareAccessPolicy {
            etag: info.etag,
            last_modified: info.last_modified,
            signed_identifiers: identifiers.signed_identifiers,
        };
        Ok(Response::new(policy, response))
    }

    /// Replace the stored access policies of the share
    pub async fn set_access_policy(
        &self,
        options: &SetAccessPolicyOptions,
    ) -> Result<Response<ShareInfo>> {
        let mut request = self.request(Method::PUT, options.timeout);
        request.set_query("comp", "acl");
        let identifiers = SignedIdentifiers {
            signed_identifiers: options.signed_identifiers.clone(),
        };
        set_xml_body(&mut request, &identifiers)?;

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let info = ShareInfo::from_headers(response.headers())?;
        Ok(Response::new(info, response))
    }

    /// Get the approximate storage used by the share
    pub async fn get_statistics(&self, options: &RequestOptions) -> Result<Response<ShareStats>> {
        let mut request = self.request(Method::GET, options.timeout);
        request.set_query("comp", "stats");

        let response =
            protocol::send(&self.pipeline, &options.context, request, StatusCode::OK).await?;
        let stats = decode_xml(&response)?;
        Ok(Response::new(stats, response))
    }
}
