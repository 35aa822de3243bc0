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

#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    clippy::explicit_iter_loop,
    clippy::future_not_send,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

//! # azure_storage_rest
//!
//! This crate provides typed clients for the Azure Storage
//! [Blob](https://learn.microsoft.com/rest/api/storageservices/blob-service-rest-api) and
//! [File](https://learn.microsoft.com/rest/api/storageservices/file-service-rest-api)
//! REST services.
//!
//! Every operation builds a [`Request`] from a typed options struct and hands it to a
//! [`Pipeline`]: an ordered list of [`Policy`] implementations that tag, retry,
//! sign and finally send the request. The raw response is then decoded into a typed
//! value, either from response headers or by walking the XML body with a
//! [`TagPath`](xml::TagPath), and returned as a [`Response`].
//!
//! # Create a client
//!
//! ```no_run
//! # async fn example() -> azure_storage_rest::Result<()> {
//! use azure_storage_rest::StorageClientBuilder;
//! use azure_storage_rest::share::ListSharesOptions;
//!
//! let service = StorageClientBuilder::new()
//!     .with_account("myaccount")
//!     .with_access_key("bXlrZXk=")
//!     .build_share_service()?;
//!
//! let shares = service
//!     .list_shares_segment(&ListSharesOptions::default())
//!     .await?;
//! for share in &shares.share_items {
//!     println!("{}", share.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Pipeline
//!
//! Clients built by [`StorageClientBuilder`] use the following policy order:
//!
//! 1. [`TelemetryPolicy`](client::TelemetryPolicy), once per call
//! 2. user supplied per-operation policies, once per call
//! 3. [`RetryPolicy`](client::RetryPolicy)
//! 4. user supplied per-retry policies, once per attempt
//! 5. [`CommonHeadersPolicy`](client::CommonHeadersPolicy), once per attempt
//! 6. an authentication policy from [`credential`], once per attempt
//! 7. [`TransportPolicy`](client::TransportPolicy), the terminal policy
//!
//! # Cancellation
//!
//! Every options struct carries a [`Context`]. Cancelling it, or letting its deadline
//! pass, aborts in-flight transport calls and pending retry backoffs with
//! [`Error::Cancelled`].

use http::StatusCode;

#[macro_use]
pub mod xml;

pub mod blob;
mod builder;
pub mod client;
mod config;
mod context;
pub mod credential;
mod error;
pub mod models;
mod protocol;
pub mod share;
mod util;

pub use builder::{StorageClientBuilder, StorageConfigKey};
pub use client::{
    ClientConfigKey, ClientOptions, HttpTransport, Next, Pipeline, Policy, RawResponse, Request,
    RequestBody, Response, ResponseBody, RetryConfig, TransportError, TransportErrorKind,
};
pub use context::Context;
pub use error::{CancelReason, DecodeError, RequestError, StorageError};

/// A specialized `Result` for storage client errors
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A specialized `Error` for storage client errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The [`Context`] of the operation was cancelled or its deadline passed
    #[error("Operation cancelled: {reason}")]
    Cancelled {
        /// Why the operation stopped
        reason: CancelReason,
    },

    /// The request could not be sent or the response could not be received
    #[error("Transport error: {source}")]
    Transport {
        /// The underlying transport failure
        source: TransportError,
    },

    /// The service answered with a status code the operation does not expect
    #[error("{0}")]
    Service(Box<StorageError>),

    /// The response did not have the expected shape
    #[error("Error decoding response: {source}")]
    Decode {
        /// The decoding failure
        #[from]
        source: DecodeError,
    },

    /// The request could not be built from the supplied options
    #[error("Invalid request: {source}")]
    InvalidRequest {
        /// What was wrong with the request
        #[from]
        source: RequestError,
    },

    /// A credential could not be obtained or applied
    #[error("Error authorizing request: {source}")]
    Authentication {
        /// The underlying credential failure
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The client configuration is not usable
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the problem
        message: String,
    },

    /// A configuration key was not recognised
    #[error("Configuration key: '{key}' is not known.")]
    UnknownConfigurationKey {
        /// The unrecognised key
        key: String,
    },

    /// Any other failure
    #[error("{message}")]
    Generic {
        /// Description of the failure
        message: String,
    },
}

impl Error {
    /// Returns the HTTP status code associated with this error if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Service(e) => Some(e.status()),
            _ => None,
        }
    }

    /// Returns the service error code, e.g. `ShareNotFound`, if any
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Service(e) => e.code(),
            _ => None,
        }
    }

    /// Returns true if this error was caused by cancellation of the [`Context`]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<StorageError> for Error {
    fn from(value: StorageError) -> Self {
        Self::Service(Box::new(value))
    }
}

impl From<TransportError> for Error {
    fn from(source: TransportError) -> Self {
        match source.cancel_reason() {
            Some(reason) => Self::Cancelled { reason },
            None => Self::Transport { source },
        }
    }
}

impl From<CancelReason> for Error {
    fn from(reason: CancelReason) -> Self {
        Self::Cancelled { reason }
    }
}
