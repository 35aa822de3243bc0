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

use crate::client::ResponseBody;
use crate::error::DecodeError;
use crate::models::decode_md5;
use crate::models::{
    AccessTier, BlobType, CopyInfo, HttpHeaders, LeaseDuration, LeaseInfo, LeaseState,
    LeaseStatus, Metadata, PublicAccessType,
};
use crate::protocol::header::{
    get_bool, get_date, get_etag, get_last_modified, get_metadata, get_parsed,
    get_required_parsed, get_string,
};
use crate::xml::{
    parse_datetime, parse_value, read_metadata, walk, FromXml, Visit, XmlNode, XmlReader,
};
use chrono::{DateTime, Utc};
use http::HeaderMap;

xml_tags! {
    enum BlobTag {
        EnumerationResults => "EnumerationResults",
        Prefix => "Prefix",
        Marker => "Marker",
        MaxResults => "MaxResults",
        NextMarker => "NextMarker",
        Containers => "Containers",
        Container => "Container",
        Blobs => "Blobs",
        Blob => "Blob",
        Name => "Name",
        Deleted => "Deleted",
        Version => "Version",
        Snapshot => "Snapshot",
        Properties => "Properties",
        Metadata => "Metadata",
        CreationTime => "Creation-Time",
        LastModified => "Last-Modified",
        Etag => "Etag",
        ContentLength => "Content-Length",
        ContentType => "Content-Type",
        ContentEncoding => "Content-Encoding",
        ContentLanguage => "Content-Language",
        ContentMd5 => "Content-MD5",
        CacheControl => "Cache-Control",
        ContentDisposition => "Content-Disposition",
        BlobType => "BlobType",
        AccessTier => "AccessTier",
        LeaseStatus => "LeaseStatus",
        LeaseState => "LeaseState",
        LeaseDuration => "LeaseDuration",
        PublicAccess => "PublicAccess",
        HasImmutabilityPolicy => "HasImmutabilityPolicy",
        HasLegalHold => "HasLegalHold",
        ServerEncrypted => "ServerEncrypted",
        SequenceNumber => "x-ms-blob-sequence-number",
        PageList => "PageList",
        PageRange => "PageRange",
        ClearRange => "ClearRange",
        Start => "Start",
        End => "End",
    }
}

/// Properties of a container returned by a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerProperties {
    /// Time the container or its properties were last changed
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag of the container
    pub etag: String,
    /// Anonymous access level
    pub public_access: Option<PublicAccessType>,
    /// Whether the container is locked by a lease
    pub lease_status: Option<LeaseStatus>,
    /// State of the lease
    pub lease_state: Option<LeaseState>,
    /// Duration of the lease
    pub lease_duration: Option<LeaseDuration>,
    /// Whether an immutability policy is set
    pub has_immutability_policy: bool,
    /// Whether a legal hold is set
    pub has_legal_hold: bool,
}

/// A container returned by [`list_containers_segment`](crate::blob::BlobServiceClient::list_containers_segment)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerItem {
    /// Name of the container
    pub name: String,
    /// Whether the container is soft-deleted
    pub deleted: bool,
    /// Version of a soft-deleted container
    pub version: String,
    /// Properties of the container
    pub properties: ContainerProperties,
    /// Metadata of the container, if requested
    pub metadata: Metadata,
}

/// One page of a container listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListContainersSegment {
    /// Endpoint of the blob service
    pub service_endpoint: String,
    /// Prefix the listing was filtered by
    pub prefix: String,
    /// Marker the listing started at
    pub marker: String,
    /// Page size requested
    pub max_results: Option<i32>,
    /// Containers in this page, in listing order
    pub items: Vec<ContainerItem>,
    /// Marker of the next page, empty on the last page
    pub next_marker: String,
}

/// Properties of a blob returned by a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobItemProperties {
    /// Time the blob was created
    pub creation_time: Option<DateTime<Utc>>,
    /// Time the blob was last changed
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag of the blob
    pub etag: String,
    /// Size of the blob in bytes
    pub content_length: u64,
    /// Stored HTTP headers
    pub http_headers: HttpHeaders,
    /// Kind of the blob
    pub blob_type: Option<BlobType>,
    /// Access tier of the blob
    pub access_tier: Option<AccessTier>,
    /// Whether the blob is locked by a lease
    pub lease_status: Option<LeaseStatus>,
    /// State of the lease
    pub lease_state: Option<LeaseState>,
    /// Duration of the lease
    pub lease_duration: Option<LeaseDuration>,
    /// Whether the blob data and metadata are encrypted
    pub server_encrypted: bool,
    /// Sequence number of a page blob
    pub sequence_number: Option<i64>,
}

/// A blob returned by [`list_blobs_flat_segment`](crate::blob::ContainerClient::list_blobs_flat_segment)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobItem {
    /// Name of the blob
    pub name: String,
    /// Whether the blob is soft-deleted
    pub deleted: bool,
    /// Snapshot timestamp, empty for the base blob
    pub snapshot: String,
    /// Properties of the blob
    pub properties: BlobItemProperties,
    /// Metadata of the blob, if requested
    pub metadata: Metadata,
}

/// One page of a flat blob listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBlobsFlatSegment {
    /// Endpoint of the blob service
    pub service_endpoint: String,
    /// Name of the container
    pub container_name: String,
    /// Prefix the listing was filtered by
    pub prefix: String,
    /// Marker the listing started at
    pub marker: String,
    /// Page size requested
    pub max_results: Option<i32>,
    /// Blobs in this page, in listing order
    pub items: Vec<BlobItem>,
    /// Marker of the next page, empty on the last page
    pub next_marker: String,
}

/// Result of operations that change a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    /// ETag of the container
    pub etag: String,
    /// Time the container was last changed
    pub last_modified: DateTime<Utc>,
}

impl ContainerInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
        })
    }
}

/// Result of [`get_properties`](crate::blob::ContainerClient::get_properties)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerPropertiesInfo {
    /// ETag of the container
    pub etag: String,
    /// Time the container was last changed
    pub last_modified: DateTime<Utc>,
    /// Metadata of the container
    pub metadata: Metadata,
    /// Anonymous access level
    pub public_access: Option<PublicAccessType>,
    /// Lease of the container
    pub lease: LeaseInfo,
    /// Whether an immutability policy is set
    pub has_immutability_policy: bool,
    /// Whether a legal hold is set
    pub has_legal_hold: bool,
}

impl ContainerPropertiesInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
            metadata: get_metadata(headers)?,
            public_access: get_parsed(headers, "x-ms-blob-public-access")?,
            lease: LeaseInfo::from_headers(headers)?,
            has_immutability_policy: get_bool(headers, "x-ms-has-immutability-policy")?,
            has_legal_hold: get_bool(headers, "x-ms-has-legal-hold")?,
        })
    }
}

/// Result of [`get_properties`](crate::blob::BlobClient::get_properties)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobProperties {
    /// ETag of the blob
    pub etag: String,
    /// Time the blob was last changed
    pub last_modified: DateTime<Utc>,
    /// Time the blob was created
    pub creation_time: Option<DateTime<Utc>>,
    /// Metadata of the blob
    pub metadata: Metadata,
    /// Kind of the blob
    pub blob_type: Option<BlobType>,
    /// Size of the returned content in bytes
    pub content_length: u64,
    /// Stored HTTP headers
    pub http_headers: HttpHeaders,
    /// Lease of the blob
    pub lease: LeaseInfo,
    /// State of the last copy into the blob
    pub copy: CopyInfo,
    /// Whether the blob data and metadata are encrypted
    pub is_server_encrypted: bool,
    /// Access tier of the blob
    pub access_tier: Option<AccessTier>,
    /// Sequence number of a page blob
    pub sequence_number: Option<i64>,
}

impl BlobProperties {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
            creation_time: get_date(headers, "x-ms-creation-time")?,
            metadata: get_metadata(headers)?,
            blob_type: get_parsed(headers, "x-ms-blob-type")?,
            content_length: get_required_parsed(headers, "content-length")?,
            http_headers: HttpHeaders::from_headers(headers)?,
            lease: LeaseInfo::from_headers(headers)?,
            copy: CopyInfo::from_headers(headers)?,
            is_server_encrypted: get_bool(headers, "x-ms-server-encrypted")?,
            access_tier: get_parsed(headers, "x-ms-access-tier")?,
            sequence_number: get_parsed(headers, "x-ms-blob-sequence-number")?,
        })
    }
}

/// Result of [`download`](crate::blob::BlobClient::download)
///
/// The body is streamed from the service as it is read.
#[derive(Debug)]
pub struct BlobDownload {
    /// Blob contents
    pub body: ResponseBody,
    /// Range of the blob returned, e.g. `bytes 0-511/1024`
    pub content_range: Option<String>,
    /// Properties of the blob, with `content_length` the length of the body
    pub properties: BlobProperties,
}

/// Result of operations that change blob metadata or properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    /// ETag of the blob
    pub etag: String,
    /// Time the blob was last changed
    pub last_modified: DateTime<Utc>,
}

impl BlobInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
        })
    }
}

/// Result of operations that write blob content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobContentInfo {
    /// ETag of the blob
    pub etag: String,
    /// Time the blob was last changed
    pub last_modified: DateTime<Utc>,
    /// MD5 of the written content as computed by the service
    pub content_md5: Option<Vec<u8>>,
    /// Whether the content was encrypted by the service
    pub is_server_encrypted: bool,
    /// Sequence number of a page blob after the write
    pub sequence_number: Option<i64>,
}

impl BlobContentInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
            content_md5: decode_md5(get_string(headers, "content-md5")?.as_deref())?,
            is_server_encrypted: get_bool(headers, "x-ms-request-server-encrypted")?,
            sequence_number: get_parsed(headers, "x-ms-blob-sequence-number")?,
        })
    }
}

/// A range of a page blob
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRange {
    /// First byte of the range
    pub offset: u64,
    /// Number of bytes in the range
    pub length: u64,
}

/// Result of [`get_page_ranges`](crate::blob::PageBlobClient::get_page_ranges)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRangesInfo {
    /// ETag of the blob
    pub etag: String,
    /// Time the blob was last changed
    pub last_modified: Option<DateTime<Utc>>,
    /// Size of the blob in bytes
    pub blob_content_length: u64,
    /// Ranges containing data, in ascending order
    pub page_ranges: Vec<PageRange>,
    /// Ranges cleared since a previous snapshot
    pub clear_ranges: Vec<PageRange>,
}

impl PageRangesInfo {
    pub(crate) fn with_headers(mut self, headers: &HeaderMap) -> Result<Self, DecodeError> {
        self.etag = get_etag(headers)?;
        self.last_modified = Some(get_last_modified(headers)?);
        self.blob_content_length = get_required_parsed(headers, "x-ms-blob-content-length")?;
        Ok(self)
    }
}

impl FromXml for ContainerProperties {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut p = Self::default();
        walk::<BlobTag, _>(reader, |_, path, node| {
            let XmlNode::Text(text) = node else {
                return Ok(Visit::Continue);
            };
            match path.as_slice() {
                [BlobTag::LastModified] => {
                    p.last_modified = Some(parse_datetime("Last-Modified", &text)?)
                }
                [BlobTag::Etag] => p.etag = text,
                [BlobTag::PublicAccess] => p.public_access = Some(text.parse()?),
                [BlobTag::LeaseStatus] => p.lease_status = Some(text.parse()?),
                [BlobTag::LeaseState] => p.lease_state = Some(text.parse()?),
                [BlobTag::LeaseDuration] => p.lease_duration = Some(text.parse()?),
                [BlobTag::HasImmutabilityPolicy] => {
                    p.has_immutability_policy = parse_value("HasImmutabilityPolicy", &text)?
                }
                [BlobTag::HasLegalHold] => p.has_legal_hold = parse_value("HasLegalHold", &text)?,
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(p)
    }
}

impl FromXml for ContainerItem {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut item = Self::default();
        walk::<BlobTag, _>(reader, |reader, path, node| {
            match (path.as_slice(), node) {
                ([BlobTag::Properties], XmlNode::StartTag(_)) => {
                    item.properties = ContainerProperties::from_xml(reader)?;
                    return Ok(Visit::Consumed);
                }
                ([BlobTag::Metadata], XmlNode::StartTag(_)) => {
                    item.metadata = read_metadata(reader)?;
                    return Ok(Visit::Consumed);
                }
                ([BlobTag::Name], XmlNode::Text(text)) => item.name = text,
                ([BlobTag::Deleted], XmlNode::Text(text)) => {
                    item.deleted = parse_value("Deleted", &text)?
                }
                ([BlobTag::Version], XmlNode::Text(text)) => item.version = text,
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(item)
    }
}

impl FromXml for ListContainersSegment {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        use BlobTag::{Container, Containers, EnumerationResults as Root};

        let mut segment = Self::default();
        walk::<BlobTag, _>(reader, |reader, path, node| {
            match (path.as_slice(), node) {
                ([Root, Containers, Container], XmlNode::StartTag(_)) => {
                    segment.items.push(ContainerItem::from_xml(reader)?);
                    return Ok(Visit::Consumed);
                }
                ([Root], XmlNode::Attribute { name, value }) if name == "ServiceEndpoint" => {
                    segment.service_endpoint = value
                }
                ([Root, BlobTag::Prefix], XmlNode::Text(text)) => segment.prefix = text,
                ([Root, BlobTag::Marker], XmlNode::Text(text)) => segment.marker = text,
                ([Root, BlobTag::MaxResults], XmlNode::Text(text)) => {
                    segment.max_results = Some(parse_value("MaxResults", &text)?)
                }
                ([Root, BlobTag::NextMarker], XmlNode::Text(text)) => segment.next_marker = text,
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(segment)
    }
}

impl FromXml for BlobItemProperties {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut p = Self::default();
        walk::<BlobTag, _>(reader, |_, path, node| {
            let XmlNode::Text(text) = node else {
                return Ok(Visit::Continue);
            };
            let headers = &mut p.http_headers;
            match path.as_slice() {
                [BlobTag::CreationTime] => {
                    p.creation_time = Some(parse_datetime("Creation-Time", &text)?)
                }
                [BlobTag::LastModified] => {
                    p.last_modified = Some(parse_datetime("Last-Modified", &text)?)
                }
                [BlobTag::Etag] => p.etag = text,
                [BlobTag::ContentLength] => {
                    p.content_length = parse_value("Content-Length", &text)?
                }
                [BlobTag::ContentType] => headers.content_type = Some(text),
                [BlobTag::ContentEncoding] => headers.content_encoding = Some(text),
                [BlobTag::ContentLanguage] => headers.content_language = Some(text),
                [BlobTag::ContentMd5] => headers.content_md5 = decode_md5(Some(text.as_str()))?,
                [BlobTag::CacheControl] => headers.cache_control = Some(text),
                [BlobTag::ContentDisposition] => headers.content_disposition = Some(text),
                [BlobTag::BlobType] => p.blob_type = Some(text.parse()?),
                [BlobTag::AccessTier] => p.access_tier = Some(text.parse()?),
                [BlobTag::LeaseStatus] => p.lease_status = Some(text.parse()?),
                [BlobTag::LeaseState] => p.lease_state = Some(text.parse()?),
                [BlobTag::LeaseDuration] => p.lease_duration = Some(text.parse()?),
                [BlobTag::ServerEncrypted] => {
                    p.server_encrypted = parse_value("ServerEncrypted", &text)?
                }
                [BlobTag::SequenceNumber] => {
                    p.sequence_number = Some(parse_value("x-ms-blob-sequence-number", &text)?)
                }
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(p)
    }
}

impl FromXml for BlobItem {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut item = Self::default();
        walk::<BlobTag, _>(reader, |reader, path, node| {
            match (path.as_slice(), node) {
                ([BlobTag::Properties], XmlNode::StartTag(_)) => {
                    item.properties = BlobItemProperties::from_xml(reader)?;
                    return Ok(Visit::Consumed);
                }
                ([BlobTag::Metadata], XmlNode::StartTag(_)) => {
                    item.metadata = read_metadata(reader)?;
                    return Ok(Visit::Consumed);
                }
                ([BlobTag::Name], XmlNode::Text(text)) => item.name = text,
                ([BlobTag::Deleted], XmlNode::Text(text)) => {
                    item.deleted = parse_value("Deleted", &text)?
                }
                ([BlobTag::Snapshot], XmlNode::Text(text)) => item.snapshot = text,
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(item)
    }
}

impl FromXml for ListBlobsFlatSegment {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        use BlobTag::{Blob, Blobs, EnumerationResults as Root};

        let mut segment = Self::default();
        walk::<BlobTag, _>(reader, |reader, path, node| {
            match (path.as_slice(), node) {
                ([Root, Blobs, Blob], XmlNode::StartTag(_)) => {
                    segment.items.push(BlobItem::from_xml(reader)?);
                    return Ok(Visit::Consumed);
                }
                ([Root], XmlNode::Attribute { name, value }) => match name.as_str() {
                    "ServiceEndpoint" => segment.service_endpoint = value,
                    "ContainerName" => segment.container_name = value,
                    _ => {}
                },
                ([Root, BlobTag::Prefix], XmlNode::Text(text)) => segment.prefix = text,
                ([Root, BlobTag::Marker], XmlNode::Text(text)) => segment.marker = text,
                ([Root, BlobTag::MaxResults], XmlNode::Text(text)) => {
                    segment.max_results = Some(parse_value("MaxResults", &text)?)
                }
                ([Root, BlobTag::NextMarker], XmlNode::Text(text)) => segment.next_marker = text,
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(segment)
    }
}

#[derive(Debug, Default)]
struct RangeBounds {
    start: u64,
    end: u64,
}

impl FromXml for RangeBounds {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut bounds = Self::default();
        walk::<BlobTag, _>(reader, |_, path, node| {
            if let XmlNode::Text(text) = node {
                match path.as_slice() {
                    [BlobTag::Start] => bounds.start = parse_value("Start", &text)?,
                    [BlobTag::End] => bounds.end = parse_value("End", &text)?,
                    _ => {}
                }
            }
            Ok(Visit::Continue)
        })?;
        Ok(bounds)
    }
}

impl RangeBounds {
    fn into_page_range(self) -> Result<PageRange, DecodeError> {
        match self.end.checked_sub(self.start) {
            Some(delta) => Ok(PageRange {
                offset: self.start,
                length: delta + 1,
            }),
            None => Err(DecodeError::InvalidValue {
                field: "PageRange",
                value: format!("{}-{}", self.start, self.end),
                message: "end precedes start".to_string(),
            }),
        }
    }
}

impl FromXml for PageRangesInfo {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut info = Self::default();
        walk::<BlobTag, _>(reader, |reader, path, node| {
            if let XmlNode::StartTag(_) = node {
                match path.as_slice() {
                    [BlobTag::PageList, BlobTag::PageRange] => {
                        let range = RangeBounds::from_xml(reader)?.into_page_range()?;
                        info.page_ranges.push(range);
                        return Ok(Visit::Consumed);
                    }
                    [BlobTag::PageList, BlobTag::ClearRange] => {
                        let range = RangeBounds::from_xml(reader)?.into_page_range()?;
                        info.clear_ranges.push(range);
                        return Ok(Visit::Consumed);
                    }
                    _ => {}
                }
            }
            Ok(Visit::Continue)
        })?;
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::from_slice;

    #[test]
    fn test_list_containers() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://myaccount.blob.core.windows.net/">
  <MaxResults>5</MaxResults>
  <Containers>
    <Container>
      <Name>images</Name>
      <Properties>
        <Last-Modified>Mon, 27 Jul 2020 08:55:24 GMT</Last-Modified>
        <Etag>"0x8D8"</Etag>
        <LeaseStatus>unlocked</LeaseStatus>
        <LeaseState>available</LeaseState>
        <PublicAccess>blob</PublicAccess>
        <HasImmutabilityPolicy>false</HasImmutabilityPolicy>
        <HasLegalHold>true</HasLegalHold>
        <DefaultEncryptionScope>$account-encryption-key</DefaultEncryptionScope>
      </Properties>
      <Metadata><purpose>thumbnails</purpose></Metadata>
    </Container>
  </Containers>
  <NextMarker>next</NextMarker>
</EnumerationResults>"#;
        let segment: ListContainersSegment = from_slice(body.as_bytes()).unwrap();
        assert_eq!(segment.max_results, Some(5));
        assert_eq!(segment.next_marker, "next");
        let item = &segment.items[0];
        assert_eq!(item.name, "images");
        assert_eq!(item.properties.public_access, Some(PublicAccessType::Blob));
        assert_eq!(item.properties.lease_status, Some(LeaseStatus::Unlocked));
        assert!(item.properties.has_legal_hold);
        assert!(!item.properties.has_immutability_policy);
        assert_eq!(item.metadata["purpose"], "thumbnails");
    }

    #[test]
    fn test_list_blobs() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://myaccount.blob.core.windows.net/" ContainerName="images">
  <Prefix>2020/</Prefix>
  <Blobs>
    <Blob>
      <Name>2020/a.png</Name>
      <Properties>
        <Creation-Time>Mon, 27 Jul 2020 08:55:24 GMT</Creation-Time>
        <Etag>0x1</Etag>
        <Content-Length>2048</Content-Length>
        <Content-Type>image/png</Content-Type>
        <Content-MD5>AQID</Content-MD5>
        <BlobType>BlockBlob</BlobType>
        <AccessTier>Hot</AccessTier>
        <ServerEncrypted>true</ServerEncrypted>
      </Properties>
    </Blob>
    <Blob>
      <Name>2020/disk.vhd</Name>
      <Properties>
        <BlobType>PageBlob</BlobType>
        <x-ms-blob-sequence-number>4</x-ms-blob-sequence-number>
      </Properties>
    </Blob>
  </Blobs>
  <NextMarker/>
</EnumerationResults>"#;
        let segment: ListBlobsFlatSegment = from_slice(body.as_bytes()).unwrap();
        assert_eq!(segment.container_name, "images");
        assert_eq!(segment.prefix, "2020/");
        assert_eq!(segment.items.len(), 2);

        let png = &segment.items[0].properties;
        assert_eq!(png.content_length, 2048);
        assert_eq!(png.http_headers.content_type.as_deref(), Some("image/png"));
        assert_eq!(png.http_headers.content_md5, Some(vec![1, 2, 3]));
        assert_eq!(png.blob_type, Some(BlobType::BlockBlob));
        assert_eq!(png.access_tier, Some(AccessTier::Hot));
        assert!(png.server_encrypted);

        let vhd = &segment.items[1].properties;
        assert_eq!(vhd.blob_type, Some(BlobType::PageBlob));
        assert_eq!(vhd.sequence_number, Some(4));
    }

    #[test]
    fn test_padded_names_are_preserved() {
        let body = r#"<EnumerationResults ContainerName="images">
  <Prefix> </Prefix>
  <Blobs>
    <Blob>
      <Name> my blob </Name>
      <Properties><Content-Length> 12 </Content-Length></Properties>
      <Metadata><k>  v  </k></Metadata>
    </Blob>
  </Blobs>
  <NextMarker/>
</EnumerationResults>"#;
        let segment: ListBlobsFlatSegment = from_slice(body.as_bytes()).unwrap();
        assert_eq!(segment.prefix, " ");
        assert_eq!(segment.items[0].name, " my blob ");
        assert_eq!(segment.items[0].properties.content_length, 12);
        assert_eq!(segment.items[0].metadata["k"], "  v  ");
        assert_eq!(segment.next_marker, "");
    }

    #[test]
    fn test_unknown_enum_value() {
        let body = "<EnumerationResults><Blobs><Blob><Properties><BlobType>CubeBlob</BlobType></Properties></Blob></Blobs></EnumerationResults>";
        let err = from_slice::<ListBlobsFlatSegment>(body.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownVariant {
                type_name: "BlobType",
                ..
            }
        ));
    }

    #[test]
    fn test_page_ranges() {
        let body = "<PageList><PageRange><Start>0</Start><End>511</End></PageRange><ClearRange><Start>512</Start><End>1023</End></ClearRange><PageRange><Start>1024</Start><End>4095</End></PageRange></PageList>";
        let info: PageRangesInfo = from_slice(body.as_bytes()).unwrap();
        assert_eq!(
            info.page_ranges,
            vec![
                PageRange {
                    offset: 0,
                    length: 512
                },
                PageRange {
                    offset: 1024,
                    length: 3072
                }
            ]
        );
        assert_eq!(
            info.clear_ranges,
            vec![PageRange {
                offset: 512,
                length: 512
            }]
        );

        let bad = "<PageList><PageRange><Start>10</Start><End>5</End></PageRange></PageList>";
        assert!(from_slice::<PageRangesInfo>(bad.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_bodies() {
        assert_eq!(from_slice::<ListContainersSegment>(b"").unwrap(), Default::default());
        assert_eq!(from_slice::<ListBlobsFlatSegment>(b" ").unwrap(), Default::default());
        assert_eq!(from_slice::<PageRangesInfo>(b"").unwrap(), Default::default());
    }
}
