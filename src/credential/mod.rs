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

//! Credentials and the policies that apply them to requests
//!
//! Authorization runs inside the retry boundary so every attempt is signed with a
//! fresh `x-ms-date`.

use crate::client::{Next, Policy, RawResponse, Request};
use crate::{Context, Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

mod bearer;
mod shared_key;
mod token;

pub use bearer::{BearerTokenPolicy, STORAGE_SCOPE};
pub use shared_key::{SharedKeyCredential, SharedKeyPolicy};
pub use token::{AccessToken, StaticTokenCredential, TokenCredential};

/// How the requests of a client are authorized
#[derive(Debug, Clone)]
pub enum StorageCredential {
    /// Sign requests with the account access key
    SharedKey(SharedKeyCredential),
    /// Send an OAuth bearer token
    Token(Arc<dyn TokenCredential>),
    /// Append shared access signature query pairs
    SasToken(Vec<(String, String)>),
    /// Send requests without authorization, e.g. public containers or URLs already
    /// carrying a SAS
    Anonymous,
}

impl StorageCredential {
    /// Parse a shared access signature such as `sv=2019-12-12&ss=b&sig=...`
    ///
    /// A leading `?` is ignored.
    pub fn sas_token(token: &str) -> Result<Self> {
        let token = token.trim_start_matches('?');
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(token.as_bytes())
            .into_owned()
            .collect();
        if pairs.is_empty() {
            return Err(Error::InvalidConfiguration {
                message: "SAS token is empty".to_string(),
            });
        }
        Ok(Self::SasToken(pairs))
    }

    /// The policy applying this credential, if any
    pub(crate) fn policy(&self) -> Option<Arc<dyn Policy>> {
        match self {
            Self::SharedKey(credential) => {
                Some(Arc::new(SharedKeyPolicy::new(credential.clone())))
            }
            Self::Token(credential) => Some(Arc::new(BearerTokenPolicy::for_storage(Arc::clone(
                credential,
            )))),
            Self::SasToken(pairs) => Some(Arc::new(SasPolicy::new(pairs.clone()))),
            Self::Anonymous => None,
        }
    }
}

/// Appends shared access signature query pairs to every attempt
#[derive(Debug)]
pub struct SasPolicy {
    pairs: Vec<(String, String)>,
}

impl SasPolicy {
    /// Create a policy appending `pairs`
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

#[async_trait]
impl Policy for SasPolicy {
    async fn send(
        &self,
        ctx: &Context,
        request: &mut Request,
        next: Next<'_>,
    ) -> Result<RawResponse> {
        for (name, value) in &self.pairs {
            request.set_query(name.as_str(), value.as_str());
        }
        next.run(ctx, request).await
    }
}
