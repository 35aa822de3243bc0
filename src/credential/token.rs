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

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use tokio::sync::Mutex;

/// Tokens expiring within this window are refreshed before use
const REFRESH_WINDOW_SECS: i64 = 300;

/// An OAuth bearer token with an associated expiry
#[derive(Clone)]
pub struct AccessToken {
    /// The token
    pub token: String,
    /// The time at which this token is no longer valid
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    /// Create a new [`AccessToken`]
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"******")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Provides OAuth tokens for [`BearerTokenPolicy`](super::BearerTokenPolicy)
#[async_trait]
pub trait TokenCredential: std::fmt::Debug + Send + Sync {
    /// Fetch a token valid for `scopes`
    ///
    /// Failures should be reported as [`Error::Authentication`](crate::Error::Authentication).
    async fn get_token(&self, scopes: &[String]) -> Result<AccessToken>;
}

/// A [`TokenCredential`] that always returns the same token
#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    /// Create a credential returning `token`
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scopes: &[String]) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

/// Caches an [`AccessToken`] until it is close to expiry
#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    cache: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub(crate) async fn get_or_insert_with<F, Fut>(&self, f: F) -> Result<AccessToken>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<AccessToken>> + Send,
    {
        let mut locked = self.cache.lock().await;

        if let Some(cached) = locked.as_ref() {
            let remaining = cached.expires_on - Utc::now();
            if remaining > Duration::seconds(REFRESH_WINDOW_SECS) {
                return Ok(cached.clone());
            }
        }

        let fresh = f().await?;
        *locked = Some(fresh.clone());
        Ok(fresh)
    }
}
