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

//! Option and result types exchanged with the storage services

use crate::Context;
use std::collections::BTreeMap;

/// Declares an enumeration with a single table mapping variants to their service strings
///
/// Parsing a string not in the table fails with [`DecodeError::UnknownVariant`](crate::DecodeError::UnknownVariant).
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $value:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            /// The string used by the service for this value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)*
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)*
                    _ => Err($crate::DecodeError::UnknownVariant {
                        type_name: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }
    };
}

mod blob;
mod conditions;
mod file;
mod headers;
mod service;
mod share;

pub use blob::*;
pub use conditions::*;
pub use file::*;
pub(crate) use headers::decode_md5;
pub use headers::HttpHeaders;
pub use service::{CorsRule, Metrics, RetentionPolicy, StorageServiceProperties};
pub use share::*;

/// User-defined name/value pairs, sent and received as `x-ms-meta-*` headers
pub type Metadata = BTreeMap<String, String>;

/// Options for operations that take no parameters of their own
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
}

/// Options for replacing the metadata of a share, directory or file
#[derive(Debug, Clone, Default)]
pub struct SetMetadataOptions {
    /// Cancellation scope of the operation
    pub context: Context,
    /// Server side timeout in seconds
    pub timeout: Option<u32>,
    /// The new metadata, replacing all existing entries
    pub metadata: Metadata,
}

string_enum! {
    /// Whether a resource is locked by a lease
    pub enum LeaseStatus {
        /// A lease is held
        Locked => "locked",
        /// No lease is held
        Unlocked => "unlocked",
    }
}

string_enum! {
    /// The state of the lease on a resource
    pub enum LeaseState {
        /// The resource can be leased
        Available => "available",
        /// The resource is leased
        Leased => "leased",
        /// The lease expired
        Expired => "expired",
        /// The lease is being broken
        Breaking => "breaking",
        /// The lease was broken
        Broken => "broken",
    }
}

string_enum! {
    /// The duration of a lease
    pub enum LeaseDuration {
        /// The lease never expires
        Infinite => "infinite",
        /// The lease expires after a fixed period
        Fixed => "fixed",
    }
}

string_enum! {
    /// The state of a server side copy
    pub enum CopyStatus {
        /// The copy is in progress
        Pending => "pending",
        /// The copy completed
        Success => "success",
        /// The copy was aborted
        Aborted => "aborted",
        /// The copy failed
        Failed => "failed",
    }
}

string_enum! {
    /// Anonymous read access granted on a container
    pub enum PublicAccessType {
        /// Containers and blobs may be listed and read
        Container => "container",
        /// Blobs may be read
        Blob => "blob",
    }
}

string_enum! {
    /// The kind of a blob
    pub enum BlobType {
        /// A blob made of committed blocks
        BlockBlob => "BlockBlob",
        /// A blob of 512 byte pages
        PageBlob => "PageBlob",
        /// A blob that can only be appended to
        AppendBlob => "AppendBlob",
    }
}

string_enum! {
    /// The access tier of a blob
    pub enum AccessTier {
        /// Frequently accessed data
        Hot => "Hot",
        /// Infrequently accessed data
        Cool => "Cool",
        /// Offline data
        Archive => "Archive",
        /// Premium page blob tier P4
        P4 => "P4",
        /// Premium page blob tier P6
        P6 => "P6",
        /// Premium page blob tier P10
        P10 => "P10",
        /// Premium page blob tier P15
        P15 => "P15",
        /// Premium page blob tier P20
        P20 => "P20",
        /// Premium page blob tier P30
        P30 => "P30",
        /// Premium page blob tier P40
        P40 => "P40",
        /// Premium page blob tier P50
        P50 => "P50",
        /// Premium page blob tier P60
        P60 => "P60",
        /// Premium page blob tier P70
        P70 => "P70",
        /// Premium page blob tier P80
        P80 => "P80",
    }
}

string_enum! {
    /// How snapshots are handled when deleting a share or blob
    pub enum DeleteSnapshotsOption {
        /// Delete the base resource and its snapshots
        Include => "include",
        /// Delete only the snapshots
        Only => "only",
    }
}

string_enum! {
    /// Extra data included when listing shares
    pub enum ListSharesInclude {
        /// Include share snapshots
        Snapshots => "snapshots",
        /// Include share metadata
        Metadata => "metadata",
        /// Include soft-deleted shares
        Deleted => "deleted",
    }
}

string_enum! {
    /// Extra data included when listing containers
    pub enum ListContainersInclude {
        /// Include container metadata
        Metadata => "metadata",
        /// Include soft-deleted containers
        Deleted => "deleted",
    }
}

string_enum! {
    /// Extra data included when listing blobs
    pub enum ListBlobsInclude {
        /// Include copy properties
        Copy => "copy",
        /// Include soft-deleted blobs
        Deleted => "deleted",
        /// Include blob metadata
        Metadata => "metadata",
        /// Include blob snapshots
        Snapshots => "snapshots",
        /// Include blobs with uncommitted blocks
        UncommittedBlobs => "uncommittedblobs",
    }
}

string_enum! {
    /// The operation performed by a file range upload
    pub enum FileRangeWrite {
        /// Write the request body into the range
        Update => "update",
        /// Clear the range
        Clear => "clear",
    }
}

/// Join `values` into the comma separated form used by `include` query parameters
pub(crate) fn join_values<T: AsRef<str>>(values: &[T]) -> String {
    values
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecodeError;

    #[test]
    fn test_string_enum_table() {
        for state in [
            LeaseState::Available,
            LeaseState::Leased,
            LeaseState::Expired,
            LeaseState::Breaking,
            LeaseState::Broken,
        ] {
            assert_eq!(state.as_str().parse::<LeaseState>().unwrap(), state);
        }
        assert_eq!(BlobType::PageBlob.to_string(), "PageBlob");
        assert_eq!("uncommittedblobs".parse::<ListBlobsInclude>().unwrap(), ListBlobsInclude::UncommittedBlobs);
    }

    #[test]
    fn test_unknown_variant() {
        let err = "Locked".parse::<LeaseStatus>().unwrap_err();
        match err {
            DecodeError::UnknownVariant { type_name, value } => {
                assert_eq!(type_name, "LeaseStatus");
                assert_eq!(value, "Locked");
            }
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn test_join_values() {
        assert_eq!(
            join_values(&[ListSharesInclude::Snapshots, ListSharesInclude::Metadata]),
            "snapshots,metadata"
        );
        assert_eq!(join_values::<ListSharesInclude>(&[]), "");
    }
}
