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

//! Clients for the [Azure File Share] service
//!
//! A [`ShareServiceClient`] addresses a storage account and hands out
//! [`ShareClient`]s, which in turn hand out [`DirectoryClient`]s and
//! [`FileClient`]s. Child clients share the pipeline of their parent.
//!
//! [Azure File Share]: https://learn.microsoft.com/rest/api/storageservices/file-service-rest-api

mod directory;
mod file;
mod service;
#[allow(clippy::module_inception)]
mod share;

pub use directory::{CreateDirectoryOptions, DirectoryClient, ListFilesAndDirectoriesOptions};
pub use file::{
    ClearRangeOptions, CreateFileOptions, DownloadFileOptions, FileClient, GetRangeListOptions,
    UploadRangeOptions,
};
pub use service::{ListSharesOptions, ShareServiceClient};
pub use share::{
    CreatePermissionOptions, CreateShareOptions, CreateSnapshotOptions, DeleteShareOptions,
    GetPermissionOptions, SetAccessPolicyOptions, SetQuotaOptions, ShareClient,
};

/// Default attributes of a new directory
const DIRECTORY_ATTRIBUTES: &str = "Directory";

/// Default attributes of a new file
const FILE_ATTRIBUTES: &str = "None";
