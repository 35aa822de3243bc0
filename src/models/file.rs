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

use crate::client::{Request, ResponseBody};
use crate::error::{DecodeError, RequestError};
use crate::models::decode_md5;
use crate::models::{CopyStatus, HttpHeaders, LeaseDuration, LeaseState, LeaseStatus, Metadata};
use crate::protocol::header::{
    get_bool, get_date, get_etag, get_last_modified, get_metadata, get_parsed, get_required_parsed,
    get_string,
};
use crate::xml::{parse_value, walk, FromXml, Visit, XmlNode, XmlReader};
use chrono::{DateTime, Utc};
use http::HeaderMap;

xml_tags! {
    enum FileTag {
        EnumerationResults => "EnumerationResults",
        Prefix => "Prefix",
        Marker => "Marker",
        MaxResults => "MaxResults",
        NextMarker => "NextMarker",
        Entries => "Entries",
        Directory => "Directory",
        File => "File",
        Name => "Name",
        Properties => "Properties",
        ContentLength => "Content-Length",
        Ranges => "Ranges",
        Range => "Range",
        Start => "Start",
        End => "End",
    }
}

/// SMB properties set when creating a file or directory
///
/// Unset times default to the time of the request and an unset permission is
/// inherited from the parent directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmbProperties {
    /// Attributes such as `ReadOnly|Archive`
    pub attributes: Option<String>,
    /// Creation time in ISO 8601 format, or `now`
    pub creation_time: Option<String>,
    /// Last write time in ISO 8601 format, or `now`
    pub last_write_time: Option<String>,
    /// Key of a permission stored with [`create_permission`](crate::share::ShareClient::create_permission)
    pub permission_key: Option<String>,
}

impl SmbProperties {
    pub(crate) fn apply(
        &self,
        request: &mut Request,
        permission: Option<&str>,
        default_attributes: &str,
    ) -> Result<(), RequestError> {
        let attributes = self.attributes.as_deref().unwrap_or(default_attributes);
        request.set_header("x-ms-file-attributes", attributes)?;
        let creation = self.creation_time.as_deref().unwrap_or("now");
        request.set_header("x-ms-file-creation-time", creation)?;
        let last_write = self.last_write_time.as_deref().unwrap_or("now");
        request.set_header("x-ms-file-last-write-time", last_write)?;

        match (permission, &self.permission_key) {
            (Some(permission), _) => request.set_header("x-ms-file-permission", permission),
            (None, Some(key)) => request.set_header("x-ms-file-permission-key", key),
            (None, None) => request.set_header("x-ms-file-permission", "inherit"),
        }
    }
}

/// SMB properties returned for a file or directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSmbInfo {
    /// Key of the security descriptor of the item
    pub file_permission_key: Option<String>,
    /// Attributes of the item
    pub file_attributes: Option<String>,
    /// Creation time
    pub file_creation_time: Option<DateTime<Utc>>,
    /// Last write time
    pub file_last_write_time: Option<DateTime<Utc>>,
    /// Time the attributes were last changed
    pub file_change_time: Option<DateTime<Utc>>,
    /// Unique id of the item
    pub file_id: Option<String>,
    /// Unique id of the parent directory
    pub file_parent_id: Option<String>,
}

impl FileSmbInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            file_permission_key: get_string(headers, "x-ms-file-permission-key")?,
            file_attributes: get_string(headers, "x-ms-file-attributes")?,
            file_creation_time: get_date(headers, "x-ms-file-creation-time")?,
            file_last_write_time: get_date(headers, "x-ms-file-last-write-time")?,
            file_change_time: get_date(headers, "x-ms-file-change-time")?,
            file_id: get_string(headers, "x-ms-file-id")?,
            file_parent_id: get_string(headers, "x-ms-file-parent-id")?,
        })
    }
}

/// Result of creating a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryInfo {
    /// ETag of the directory
    pub etag: String,
    /// Time the directory was last changed
    pub last_modified: DateTime<Utc>,
    /// Whether the request contents were encrypted by the service
    pub is_server_encrypted: bool,
    /// SMB properties of the directory
    pub smb_properties: FileSmbInfo,
}

impl DirectoryInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
            is_server_encrypted: get_bool(headers, "x-ms-request-server-encrypted")?,
            smb_properties: FileSmbInfo::from_headers(headers)?,
        })
    }
}

/// Result of [`get_properties`](crate::share::DirectoryClient::get_properties)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryProperties {
    /// ETag of the directory
    pub etag: String,
    /// Time the directory was last changed
    pub last_modified: DateTime<Utc>,
    /// Metadata of the directory
    pub metadata: Metadata,
    /// Whether the directory metadata is encrypted
    pub is_server_encrypted: bool,
    /// SMB properties of the directory
    pub smb_properties: FileSmbInfo,
}

impl DirectoryProperties {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
            metadata: get_metadata(headers)?,
            is_server_encrypted: get_bool(headers, "x-ms-server-encrypted")?,
            smb_properties: FileSmbInfo::from_headers(headers)?,
        })
    }
}

/// Result of setting the metadata of a directory or file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMetadataInfo {
    /// ETag of the item
    pub etag: String,
    /// Whether the metadata was encrypted by the service
    pub is_server_encrypted: bool,
}

impl SetMetadataInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            is_server_encrypted: get_bool(headers, "x-ms-request-server-encrypted")?,
        })
    }
}

/// Result of creating a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// ETag of the file
    pub etag: String,
    /// Time the file was last changed
    pub last_modified: DateTime<Utc>,
    /// Whether the request contents were encrypted by the service
    pub is_server_encrypted: bool,
    /// SMB properties of the file
    pub smb_properties: FileSmbInfo,
}

impl FileInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
            is_server_encrypted: get_bool(headers, "x-ms-request-server-encrypted")?,
            smb_properties: FileSmbInfo::from_headers(headers)?,
        })
    }
}

/// State of the last copy into a file or blob
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyInfo {
    /// Identifier of the copy operation
    pub copy_id: Option<String>,
    /// State of the copy
    pub copy_status: Option<CopyStatus>,
    /// URL of the copy source
    pub copy_source: Option<String>,
    /// Bytes copied out of the total, e.g. `512/1024`
    pub copy_progress: Option<String>,
    /// Time the copy finished
    pub copy_completion_time: Option<DateTime<Utc>>,
}

impl CopyInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            copy_id: get_string(headers, "x-ms-copy-id")?,
            copy_status: get_parsed(headers, "x-ms-copy-status")?,
            copy_source: get_string(headers, "x-ms-copy-source")?,
            copy_progress: get_string(headers, "x-ms-copy-progress")?,
            copy_completion_time: get_date(headers, "x-ms-copy-completion-time")?,
        })
    }
}

/// Lease information of a file or blob
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseInfo {
    /// Duration of the current lease
    pub lease_duration: Option<LeaseDuration>,
    /// State of the lease
    pub lease_state: Option<LeaseState>,
    /// Whether the item is locked
    pub lease_status: Option<LeaseStatus>,
}

impl LeaseInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            lease_duration: get_parsed(headers, "x-ms-lease-duration")?,
            lease_state: get_parsed(headers, "x-ms-lease-state")?,
            lease_status: get_parsed(headers, "x-ms-lease-status")?,
        })
    }
}

/// Result of [`get_properties`](crate::share::FileClient::get_properties)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProperties {
    /// ETag of the file
    pub etag: String,
    /// Time the file was last changed
    pub last_modified: DateTime<Utc>,
    /// Metadata of the file
    pub metadata: Metadata,
    /// Size of the returned content in bytes
    pub content_length: u64,
    /// Stored HTTP headers
    pub http_headers: HttpHeaders,
    /// State of the last copy into the file
    pub copy: CopyInfo,
    /// Whether the file data and metadata are encrypted
    pub is_server_encrypted: bool,
    /// SMB properties of the file
    pub smb_properties: FileSmbInfo,
    /// Lease of the file
    pub lease: LeaseInfo,
}

impl FileProperties {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
            metadata: get_metadata(headers)?,
            content_length: get_required_parsed(headers, "content-length")?,
            http_headers: HttpHeaders::from_headers(headers)?,
            copy: CopyInfo::from_headers(headers)?,
            is_server_encrypted: get_bool(headers, "x-ms-server-encrypted")?,
            smb_properties: FileSmbInfo::from_headers(headers)?,
            lease: LeaseInfo::from_headers(headers)?,
        })
    }
}

/// Result of [`download`](crate::share::FileClient::download)
///
/// The body is streamed from the service as it is read.
#[derive(Debug)]
pub struct FileDownload {
    /// File contents
    pub body: ResponseBody,
    /// Range of the file returned, e.g. `bytes 0-511/1024`
    pub content_range: Option<String>,
    /// MD5 of the returned range, if requested
    pub transactional_md5: Option<Vec<u8>>,
    /// Properties of the file, with `content_length` the length of the body
    pub properties: FileProperties,
}

/// Result of writing or clearing a range of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRangeInfo {
    /// ETag of the file
    pub etag: String,
    /// Time the file was last changed
    pub last_modified: DateTime<Utc>,
    /// MD5 of the written range as computed by the service
    pub content_md5: Option<Vec<u8>>,
    /// Whether the range was encrypted by the service
    pub is_server_encrypted: bool,
}

impl FileRangeInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
            content_md5: decode_md5(get_string(headers, "content-md5")?.as_deref())?,
            is_server_encrypted: get_bool(headers, "x-ms-request-server-encrypted")?,
        })
    }
}

/// A range of bytes with an inclusive end, as reported by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileRange {
    /// First byte of the range
    pub start: u64,
    /// Last byte of the range
    pub end: u64,
}

/// Result of [`get_range_list`](crate::share::FileClient::get_range_list)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRangeList {
    /// ETag of the file
    pub etag: String,
    /// Time the file was last changed
    pub last_modified: Option<DateTime<Utc>>,
    /// Size of the file in bytes
    pub file_content_length: u64,
    /// Ranges containing data, in ascending order
    pub ranges: Vec<FileRange>,
}

impl FileRangeList {
    pub(crate) fn with_headers(mut self, headers: &HeaderMap) -> Result<Self, DecodeError> {
        self.etag = get_etag(headers)?;
        self.last_modified = Some(get_last_modified(headers)?);
        self.file_content_length = get_required_parsed(headers, "x-ms-content-length")?;
        Ok(self)
    }
}

impl FromXml for FileRange {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut range = Self::default();
        walk::<FileTag, _>(reader, |_, path, node| {
            if let XmlNode::Text(text) = node {
                match path.as_slice() {
                    [FileTag::Start] => range.start = parse_value("Start", &text)?,
                    [FileTag::End] => range.end = parse_value("End", &text)?,
                    _ => {}
                }
            }
            Ok(Visit::Continue)
        })?;
        Ok(range)
    }
}

impl FromXml for FileRangeList {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut list = Self::default();
        walk::<FileTag, _>(reader, |reader, path, node| {
            if let ([FileTag::Ranges, FileTag::Range], XmlNode::StartTag(_)) =
                (path.as_slice(), node)
            {
                list.ranges.push(FileRange::from_xml(reader)?);
                return Ok(Visit::Consumed);
            }
            Ok(Visit::Continue)
        })?;
        Ok(list)
    }
}

/// A directory returned by a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryItem {
    /// Name of the directory
    pub name: String,
}

/// A file returned by a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileItem {
    /// Name of the file
    pub name: String,
    /// Size of the file in bytes, may be stale while handles are open
    pub content_length: u64,
}

/// One page of a directory listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilesAndDirectoriesSegment {
    /// Endpoint of the file service
    pub service_endpoint: String,
    /// Name of the share
    pub share_name: String,
    /// Snapshot of the share, if listing a snapshot
    pub share_snapshot: String,
    /// Path of the listed directory
    pub directory_path: String,
    /// Prefix the listing was filtered by
    pub prefix: String,
    /// Marker the listing started at
    pub marker: String,
    /// Page size requested
    pub max_results: Option<i32>,
    /// Directories in this page
    pub directory_items: Vec<DirectoryItem>,
    /// Files in this page
    pub file_items: Vec<FileItem>,
    /// Marker of the next page, empty on the last page
    pub next_marker: String,
}

impl FromXml for DirectoryItem {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut item = Self::default();
        walk::<FileTag, _>(reader, |_, path, node| {
            if let ([FileTag::Name], XmlNode::Text(text)) = (path.as_slice(), node) {
                item.name = text;
            }
            Ok(Visit::Continue)
        })?;
        Ok(item)
    }
}

impl FromXml for FileItem {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut item = Self::default();
        walk::<FileTag, _>(reader, |_, path, node| {
            if let XmlNode::Text(text) = node {
                match path.as_slice() {
                    [FileTag::Name] => item.name = text,
                    [FileTag::Properties, FileTag::ContentLength] => {
                        item.content_length = parse_value("Content-Length", &text)?
                    }
                    _ => {}
                }
            }
            Ok(Visit::Continue)
        })?;
        Ok(item)
    }
}

impl FromXml for ListFilesAndDirectoriesSegment {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        use FileTag::{EnumerationResults as Root, Entries};

        let mut segment = Self::default();
        walk::<FileTag, _>(reader, |reader, path, node| {
            match (path.as_slice(), node) {
                ([Root, Entries, FileTag::Directory], XmlNode::StartTag(_)) => {
                    segment.directory_items.push(DirectoryItem::from_xml(reader)?);
                    return Ok(Visit::Consumed);
                }
                ([Root, Entries, FileTag::File], XmlNode::StartTag(_)) => {
                    segment.file_items.push(FileItem::from_xml(reader)?);
                    return Ok(Visit::Consumed);
                }
                ([Root], XmlNode::Attribute { name, value }) => match name.as_str() {
                    "ServiceEndpoint" => segment.service_endpoint = value,
                    "ShareName" => segment.share_name = value,
                    "ShareSnapshot" => segment.share_snapshot = value,
                    "DirectoryPath" => segment.directory_path = value,
                    _ => {}
                },
                ([Root, FileTag::Prefix], XmlNode::Text(text)) => segment.prefix = text,
                ([Root, FileTag::Marker], XmlNode::Text(text)) => segment.marker = text,
                ([Root, FileTag::MaxResults], XmlNode::Text(text)) => {
                    segment.max_results = Some(parse_value("MaxResults", &text)?)
                }
                ([Root, FileTag::NextMarker], XmlNode::Text(text)) => segment.next_marker = text,
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(segment)
    }
}
