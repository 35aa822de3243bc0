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

//! Clients for the [Azure Blob] service
//!
//! A [`BlobServiceClient`] addresses a storage account and hands out
//! [`ContainerClient`]s. A [`BlobClient`] performs the operations common to every
//! blob type and converts into a [`BlockBlobClient`] or [`PageBlobClient`] for the
//! type specific ones.
//!
//! [Azure Blob]: https://learn.microsoft.com/rest/api/storageservices/blob-service-rest-api

#[allow(clippy::module_inception)]
mod blob;
mod block;
mod container;
mod page;
mod service;

pub use blob::{
    BlobClient, DeleteBlobOptions, DownloadBlobOptions, GetBlobPropertiesOptions,
    SetBlobMetadataOptions,
};
pub use block::{BlockBlobClient, UploadBlockBlobOptions};
pub use container::{
    ContainerClient, CreateContainerOptions, DeleteContainerOptions,
    GetContainerPropertiesOptions, ListBlobsOptions, SetContainerMetadataOptions,
};
pub use page::{
    ClearPagesOptions, CreatePageBlobOptions, GetPageRangesOptions, PageBlobClient,
    UploadPagesOptions,
};
pub use service::{BlobServiceClient, ListContainersOptions};

/// Page blob writes must be aligned to this many bytes
pub const PAGE_SIZE: u64 = 512;
