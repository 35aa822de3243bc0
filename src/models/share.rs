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

use crate::error::DecodeError;
use crate::models::Metadata;
use crate::protocol::header::{
    get_date, get_etag, get_last_modified, get_metadata, get_parsed, get_required,
    get_required_parsed,
};
use crate::xml::{
    parse_datetime, parse_value, read_metadata, walk, write_element, write_optional_element,
    FromXml, ToXml, Visit, XmlNode, XmlReader,
};
use chrono::{DateTime, SecondsFormat, Utc};
use http::HeaderMap;
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

xml_tags! {
    enum ShareTag {
        EnumerationResults => "EnumerationResults",
        Prefix => "Prefix",
        Marker => "Marker",
        MaxResults => "MaxResults",
        NextMarker => "NextMarker",
        Shares => "Shares",
        Share => "Share",
        Name => "Name",
        Snapshot => "Snapshot",
        Deleted => "Deleted",
        Version => "Version",
        Properties => "Properties",
        Metadata => "Metadata",
        LastModified => "Last-Modified",
        Etag => "Etag",
        Quota => "Quota",
        ProvisionedIops => "ProvisionedIops",
        ProvisionedIngressMBps => "ProvisionedIngressMBps",
        ProvisionedEgressMBps => "ProvisionedEgressMBps",
        NextAllowedQuotaDowngradeTime => "NextAllowedQuotaDowngradeTime",
        DeletedTime => "DeletedTime",
        RemainingRetentionDays => "RemainingRetentionDays",
        SignedIdentifiers => "SignedIdentifiers",
        SignedIdentifier => "SignedIdentifier",
        Id => "Id",
        AccessPolicy => "AccessPolicy",
        Start => "Start",
        Expiry => "Expiry",
        Permission => "Permission",
        ShareStats => "ShareStats",
        ShareUsageBytes => "ShareUsageBytes",
    }
}

/// Properties of a share
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareProperties {
    /// Time the share or its properties were last changed
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag of the share
    pub etag: String,
    /// Maximum size of the share in GiB
    pub quota: i64,
    /// Provisioned IOPS of a premium share
    pub provisioned_iops: Option<i32>,
    /// Provisioned ingress of a premium share in MiB/s
    pub provisioned_ingress_mbps: Option<i32>,
    /// Provisioned egress of a premium share in MiB/s
    pub provisioned_egress_mbps: Option<i32>,
    /// Earliest time the quota of a premium share may be lowered
    pub next_allowed_quota_downgrade_time: Option<DateTime<Utc>>,
    /// Time a soft-deleted share was deleted
    pub deleted_time: Option<DateTime<Utc>>,
    /// Days until a soft-deleted share is removed permanently
    pub remaining_retention_days: Option<i32>,
}

/// A share returned by [`list_shares_segment`](crate::share::ShareServiceClient::list_shares_segment)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareItem {
    /// Name of the share
    pub name: String,
    /// Snapshot timestamp, empty for the base share
    pub snapshot: String,
    /// Whether the share is soft-deleted
    pub deleted: bool,
    /// Version of a soft-deleted share
    pub version: String,
    /// Properties of the share
    pub properties: ShareProperties,
    /// Metadata of the share, if requested
    pub metadata: Metadata,
}

/// One page of a share listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSharesSegment {
    /// Endpoint of the file service
    pub service_endpoint: String,
    /// Prefix the listing was filtered by
    pub prefix: String,
    /// Marker the listing started at
    pub marker: String,
    /// Page size requested
    pub max_results: Option<i32>,
    /// Shares in this page, in listing order
    pub share_items: Vec<ShareItem>,
    /// Marker of the next page, empty on the last page
    pub next_marker: String,
}

/// Time window and permissions of a stored access policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Time the policy becomes valid
    pub start: Option<DateTime<Utc>>,
    /// Time the policy expires
    pub expiry: Option<DateTime<Utc>>,
    /// Permission letters, e.g. `rwdl`
    pub permission: String,
}

/// A stored access policy referenced by shared access signatures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedIdentifier {
    /// Unique identifier of the policy, at most 64 characters
    pub id: String,
    /// The policy
    pub policy: AccessPolicy,
}

/// The stored access policies of a share
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedIdentifiers {
    /// Policies in document order
    pub signed_identifiers: Vec<SignedIdentifier>,
}

/// Storage used by a share
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareStats {
    /// Approximate size of the data in the share, in bytes
    pub share_usage_bytes: i64,
}

/// A security descriptor stored at the share level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePermission {
    /// Permission in Security Descriptor Definition Language
    pub permission: String,
}

/// Result of operations that change a share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareInfo {
    /// ETag of the share
    pub etag: String,
    /// Time the share was last changed
    pub last_modified: DateTime<Utc>,
}

/// Result of [`create_snapshot`](crate::share::ShareClient::create_snapshot)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareSnapshotInfo {
    /// Opaque timestamp identifying the snapshot
    pub snapshot: String,
    /// ETag of the snapshot
    pub etag: String,
    /// Time the snapshot was taken
    pub last_modified: DateTime<Utc>,
}

/// Result of [`get_properties`](crate::share::ShareClient::get_properties)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePropertiesInfo {
    /// Properties of the share
    pub properties: ShareProperties,
    /// Metadata of the share
    pub metadata: Metadata,
}

/// Result of [`get_access_policy`](crate::share::ShareClient::get_access_policy)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareAccessPolicy {
    /// ETag of the share
    pub etag: String,
    /// Time the share was last changed
    pub last_modified: DateTime<Utc>,
    /// Stored access policies
    pub signed_identifiers: Vec<SignedIdentifier>,
}

/// Result of [`create_permission`](crate::share::ShareClient::create_permission)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePermissionInfo {
    /// Key referencing the stored permission
    pub file_permission_key: String,
}

impl ShareInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
        })
    }
}

impl ShareSnapshotInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            snapshot: get_required(headers, "x-ms-snapshot")?,
            etag: get_etag(headers)?,
            last_modified: get_last_modified(headers)?,
        })
    }
}

impl SharePropertiesInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        let properties = ShareProperties {
            last_modified: Some(get_last_modified(headers)?),
            etag: get_etag(headers)?,
            quota: get_required_parsed(headers, "x-ms-share-quota")?,
            provisioned_iops: get_parsed(headers, "x-ms-share-provisioned-iops")?,
            provisioned_ingress_mbps: get_parsed(headers, "x-ms-share-provisioned-ingress-mbps")?,
            provisioned_egress_mbps: get_parsed(headers, "x-ms-share-provisioned-egress-mbps")?,
            next_allowed_quota_downgrade_time: get_date(
                headers,
                "x-ms-share-next-allowed-quota-downgrade-time",
            )?,
            deleted_time: None,
            remaining_retention_days: None,
        };
        Ok(Self {
            properties,
            metadata: get_metadata(headers)?,
        })
    }
}

impl SharePermissionInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, DecodeError> {
        Ok(Self {
            file_permission_key: get_required(headers, "x-ms-file-permission-key")?,
        })
    }
}

impl FromXml for ShareProperties {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut p = Self::default();
        walk::<ShareTag, _>(reader, |_, path, node| {
            let XmlNode::Text(text) = node else {
                return Ok(Visit::Continue);
            };
            match path.as_slice() {
                [ShareTag::LastModified] => {
                    p.last_modified = Some(parse_datetime("Last-Modified", &text)?)
                }
                [ShareTag::Etag] => p.etag = text,
                [ShareTag::Quota] => p.quota = parse_value("Quota", &text)?,
                [ShareTag::ProvisionedIops] => {
                    p.provisioned_iops = Some(parse_value("ProvisionedIops", &text)?)
                }
                [ShareTag::ProvisionedIngressMBps] => {
                    p.provisioned_ingress_mbps = Some(parse_value("ProvisionedIngressMBps", &text)?)
                }
                [ShareTag::ProvisionedEgressMBps] => {
                    p.provisioned_egress_mbps = Some(parse_value("ProvisionedEgressMBps", &text)?)
                }
                [ShareTag::NextAllowedQuotaDowngradeTime] => {
                    p.next_allowed_quota_downgrade_time =
                        Some(parse_datetime("NextAllowedQuotaDowngradeTime", &text)?)
                }
                [ShareTag::DeletedTime] => {
                    p.deleted_time = Some(parse_datetime("DeletedTime", &text)?)
                }
                [ShareTag::RemainingRetentionDays] => {
                    p.remaining_retention_days = Some(parse_value("RemainingRetentionDays", &text)?)
                }
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(p)
    }
}

impl FromXml for ShareItem {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut item = Self::default();
        walk::<ShareTag, _>(reader, |reader, path, node| {
            match (path.as_slice(), node) {
                ([ShareTag::Properties], XmlNode::StartTag(_)) => {
                    item.properties = ShareProperties::from_xml(reader)?;
                    return Ok(Visit::Consumed);
                }
                ([ShareTag::Metadata], XmlNode::StartTag(_)) => {
                    item.metadata = read_metadata(reader)?;
                    return Ok(Visit::Consumed);
                }
                ([ShareTag::Name], XmlNode::Text(text)) => item.name = text,
                ([ShareTag::Snapshot], XmlNode::Text(text)) => item.snapshot = text,
                ([ShareTag::Deleted], XmlNode::Text(text)) => {
                    item.deleted = parse_value("Deleted", &text)?
                }
                ([ShareTag::Version], XmlNode::Text(text)) => item.version = text,
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(item)
    }
}

impl FromXml for ListSharesSegment {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        use ShareTag::{EnumerationResults as Root, Share, Shares};

        let mut segment = Self::default();
        walk::<ShareTag, _>(reader, |reader, path, node| {
            match (path.as_slice(), node) {
                ([Root, Shares, Share], XmlNode::StartTag(_)) => {
                    segment.share_items.push(ShareItem::from_xml(reader)?);
                    return Ok(Visit::Consumed);
                }
                ([Root], XmlNode::Attribute { name, value }) if name == "ServiceEndpoint" => {
                    segment.service_endpoint = value
                }
                ([Root, ShareTag::Prefix], XmlNode::Text(text)) => segment.prefix = text,
                ([Root, ShareTag::Marker], XmlNode::Text(text)) => segment.marker = text,
                ([Root, ShareTag::MaxResults], XmlNode::Text(text)) => {
                    segment.max_results = Some(parse_value("MaxResults", &text)?)
                }
                ([Root, ShareTag::NextMarker], XmlNode::Text(text)) => segment.next_marker = text,
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(segment)
    }
}

impl FromXml for AccessPolicy {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut policy = Self::default();
        walk::<ShareTag, _>(reader, |_, path, node| {
            if let XmlNode::Text(text) = node {
                match path.as_slice() {
                    [ShareTag::Start] => policy.start = Some(parse_datetime("Start", &text)?),
                    [ShareTag::Expiry] => policy.expiry = Some(parse_datetime("Expiry", &text)?),
                    [ShareTag::Permission] => policy.permission = text,
                    _ => {}
                }
            }
            Ok(Visit::Continue)
        })?;
        Ok(policy)
    }
}

impl FromXml for SignedIdentifier {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut identifier = Self::default();
        walk::<ShareTag, _>(reader, |reader, path, node| {
            match (path.as_slice(), node) {
                ([ShareTag::AccessPolicy], XmlNode::StartTag(_)) => {
                    identifier.policy = AccessPolicy::from_xml(reader)?;
                    return Ok(Visit::Consumed);
                }
                ([ShareTag::Id], XmlNode::Text(text)) => identifier.id = text,
                _ => {}
            }
            Ok(Visit::Continue)
        })?;
        Ok(identifier)
    }
}

impl FromXml for SignedIdentifiers {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        const IDENTIFIER: [ShareTag; 2] = [ShareTag::SignedIdentifiers, ShareTag::SignedIdentifier];
        let mut identifiers = Self::default();
        walk::<ShareTag, _>(reader, |reader, path, node| {
            if matches!(node, XmlNode::StartTag(_)) && path.is(&IDENTIFIER) {
                let identifier = SignedIdentifier::from_xml(reader)?;
                identifiers.signed_identifiers.push(identifier);
                return Ok(Visit::Consumed);
            }
            Ok(Visit::Continue)
        })?;
        Ok(identifiers)
    }
}

impl ToXml for SignedIdentifiers {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        let timestamp = |t: &DateTime<Utc>| t.to_rfc3339_opts(SecondsFormat::Secs, true);

        writer
            .create_element("SignedIdentifiers")
            .write_inner_content(|writer| {
                for identifier in &self.signed_identifiers {
                    let policy = &identifier.policy;
                    writer
                        .create_element("SignedIdentifier")
                        .write_inner_content(|writer| {
                            write_element(writer, "Id", &identifier.id)?;
                            writer
                                .create_element("AccessPolicy")
                                .write_inner_content(|writer| {
                                    let start = policy.start.as_ref().map(timestamp);
                                    let expiry = policy.expiry.as_ref().map(timestamp);
                                    write_optional_element(writer, "Start", start)?;
                                    write_optional_element(writer, "Expiry", expiry)?;
                                    write_element(writer, "Permission", &policy.permission)
                                })?;
                            Ok(())
                        })?;
                }
                Ok(())
            })?;
        Ok(())
    }
}

impl FromXml for ShareStats {
    fn from_xml(reader: &mut XmlReader<'_>) -> Result<Self, DecodeError> {
        let mut stats = Self::default();
        walk::<ShareTag, _>(reader, |_, path, node| {
            if let XmlNode::Text(text) = node {
                if path.is(&[ShareTag::ShareStats, ShareTag::ShareUsageBytes]) {
                    stats.share_usage_bytes = parse_value("ShareUsageBytes", &text)?;
                }
            }
            Ok(Visit::Continue)
        })?;
        Ok(stats)
    }
}
