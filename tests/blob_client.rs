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

mod common;

use azure_storage_rest::blob::{
    CreatePageBlobOptions, GetPageRangesOptions, ListBlobsOptions, UploadBlockBlobOptions,
};
use azure_storage_rest::models::{BlobType, PageRange};
use azure_storage_rest::{ClientOptions, HttpTransport, StorageClientBuilder};
use bytes::Bytes;
use common::{builder, fast_retry, StubTransport};
use http::{Method, StatusCode};
use std::sync::Arc;

#[tokio::test]
async fn bearer_token_authorizes_blob_requests() {
    let transport = StubTransport::new();
    transport.push_response(
        StatusCode::OK,
        &[],
        r#"<EnumerationResults ContainerName="images"><Blobs><Blob><Name>cat.png</Name><Properties><Content-Length>10</Content-Length><BlobType>BlockBlob</BlobType></Properties></Blob></Blobs><NextMarker/></EnumerationResults>"#,
    );
    let options =
        ClientOptions::new().with_transport(Arc::clone(&transport) as Arc<dyn HttpTransport>);
    let service = StorageClientBuilder::new()
        .with_account("myaccount")
        .with_bearer_token("token-1")
        .with_client_options(options)
        .with_retry(fast_retry(0))
        .build_blob_service()
        .unwrap();

    let segment = service
        .container_client("images")
        .list_blobs_flat_segment(&ListBlobsOptions::default())
        .await
        .unwrap();
    assert_eq!(segment.items.len(), 1);
    assert_eq!(segment.items[0].properties.blob_type, Some(BlobType::BlockBlob));

    let seen = &transport.seen()[0];
    assert_eq!(seen.headers["authorization"], "Bearer token-1");
    assert_eq!(
        seen.url,
        "https://myaccount.blob.core.windows.net/images?restype=container&comp=list"
    );
}

#[tokio::test]
async fn upload_block_blob_is_signed() {
    let transport = StubTransport::new();
    transport.push_response(
        StatusCode::CREATED,
        &[
            ("etag", "\"0x1\""),
            ("last-modified", "Mon, 27 Jul 2020 08:55:24 GMT"),
        ],
        "",
    );
    let service = builder(&transport).build_blob_service().unwrap();
    let blob = service
        .container_client("docs")
        .blob_client("guide/intro.md")
        .block_blob_client();

    let info = blob
        .upload(Bytes::from_static(b"# intro"), &UploadBlockBlobOptions::default())
        .await
        .unwrap();
    assert_eq!(info.etag, "\"0x1\"");

    let seen = &transport.seen()[0];
    assert_eq!(seen.method, Method::PUT);
    assert_eq!(
        seen.url,
        "https://myaccount.blob.core.windows.net/docs/guide/intro.md"
    );
    assert_eq!(seen.headers["x-ms-blob-type"], "BlockBlob");
    assert!(seen.headers["authorization"]
        .to_str()
        .unwrap()
        .starts_with("SharedKey myaccount:"));
}

#[tokio::test]
async fn page_blob_lifecycle() {
    let transport = StubTransport::new();
    let written = [
        ("etag", "\"0x2\""),
        ("last-modified", "Mon, 27 Jul 2020 08:55:24 GMT"),
    ];
    transport.push_response(StatusCode::CREATED, &written, "");
    transport.push_response(
        StatusCode::OK,
        &[
            ("etag", "\"0x2\""),
            ("last-modified", "Mon, 27 Jul 2020 08:55:24 GMT"),
            ("x-ms-blob-content-length", "1024"),
        ],
        "<PageList><PageRange><Start>0</Start><End>511</End></PageRange></PageList>",
    );
    let service = builder(&transport).build_blob_service().unwrap();
    let page_blob = service
        .container_client("disks")
        .blob_client("data.vhd")
        .page_blob_client();

    let create = CreatePageBlobOptions {
        size: 1024,
        ..Default::default()
    };
    page_blob.create(&create).await.unwrap();
    let ranges = page_blob
        .get_page_ranges(&GetPageRangesOptions::default())
        .await
        .unwrap();

    assert_eq!(ranges.blob_content_length, 1024);
    assert_eq!(ranges.page_ranges, vec![PageRange { offset: 0, length: 512 }]);
    assert!(ranges.clear_ranges.is_empty());
    assert_eq!(transport.seen()[1].url, format!("{}?comp=pagelist", page_blob.url()));
}
