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

use crate::client::{Next, Policy, RawResponse, Request};
use crate::credential::token::{TokenCache, TokenCredential};
use crate::{Context, Error, Result};
use async_trait::async_trait;
use http::header::{HeaderValue, AUTHORIZATION};
use std::sync::Arc;

/// The OAuth scope of the storage data plane
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

#[derive(Debug, thiserror::Error)]
#[error("Bearer token authorization requires an https URL, got {scheme}")]
struct InsecureScheme {
    scheme: String,
}

/// Authorizes every attempt with an OAuth token from a [`TokenCredential`]
///
/// Tokens are cached and only fetched again when within five minutes of expiry.
#[derive(Debug)]
pub struct BearerTokenPolicy {
    credential: Arc<dyn TokenCredential>,
    scopes: Vec<String>,
    cache: TokenCache,
}

impl BearerTokenPolicy {
    /// Create a policy requesting tokens for `scopes`
    pub fn new(credential: Arc<dyn TokenCredential>, scopes: Vec<String>) -> Self {
        Self {
            credential,
            scopes,
            cache: TokenCache::default(),
        }
    }

    /// Create a policy requesting tokens for the storage scope
    pub fn for_storage(credential: Arc<dyn TokenCredential>) -> Self {
        Self::new(credential, vec![STORAGE_SCOPE.to_string()])
    }
}

#[async_trait]
impl Policy for BearerTokenPolicy {
    async fn send(
        &self,
        ctx: &Context,
        request: &mut Request,
        next: Next<'_>,
    ) -> Result<RawResponse> {
        let scheme = request.base_url().scheme();
        if scheme != "https" {
            return Err(Error::Authentication {
                source: Box::new(InsecureScheme {
                    scheme: scheme.to_string(),
                }),
            });
        }

        let token = self
            .cache
            .get_or_insert_with(|| self.credential.get_token(&self.scopes))
            .await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.token))
            .map_err(|e| Error::Authentication { source: Box::new(e) })?;
        value.set_sensitive(true);
        request.insert_header(AUTHORIZATION, value);
        next.run(ctx, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResponseBody;
    use crate::credential::AccessToken;
    use crate::Pipeline;
    use chrono::{Duration, Utc};
    use http::{HeaderMap, Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use url::Url;

    #[derive(Debug, Default)]
    struct CountingCredential(AtomicUsize);

    #[async_trait]
    impl TokenCredential for CountingCredential {
        async fn get_token(&self, scopes: &[String]) -> Result<AccessToken> {
            assert_eq!(scopes, [STORAGE_SCOPE]);
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Ok(AccessToken::new(format!("t{n}"), Utc::now() + Duration::hours(1)))
        }
    }

    #[derive(Debug, Default)]
    struct Capture(Mutex<Vec<String>>);

    #[async_trait]
    impl Policy for Capture {
        async fn send(
            &self,
            _: &Context,
            request: &mut Request,
            _: Next<'_>,
        ) -> Result<RawResponse> {
            let auth = request.header("authorization").unwrap_or_default().to_string();
            self.0.lock().unwrap().push(auth);
            Ok(RawResponse::new(StatusCode::OK, HeaderMap::new(), ResponseBody::default()))
        }
    }

    #[tokio::test]
    async fn test_bearer_token_cached() {
        let credential = Arc::new(CountingCredential::default());
        let capture = Arc::new(Capture::default());
        let pipeline = Pipeline::new(vec![
            Arc::new(BearerTokenPolicy::for_storage(credential.clone())),
            capture.clone(),
        ]);
        let url = Url::parse("https://myaccount.blob.core.windows.net/c").unwrap();
        for _ in 0..2 {
            let mut request = Request::new(Method::GET, url.clone());
            pipeline.send(&Context::new(), &mut request).await.unwrap();
        }
        assert_eq!(credential.0.load(Ordering::SeqCst), 1);
        assert_eq!(*capture.0.lock().unwrap(), vec!["Bearer t0", "Bearer t0"]);
    }

    #[tokio::test]
    async fn test_bearer_requires_https() {
        let credential = Arc::new(CountingCredential::default());
        let pipeline = Pipeline::new(vec![
            Arc::new(BearerTokenPolicy::for_storage(credential.clone())),
            Arc::new(Capture::default()),
        ]);
        let url = Url::parse("http://127.0.0.1:10000/devstoreaccount1/c").unwrap();
        let mut request = Request::new(Method::GET, url);
        let err = pipeline.send(&Context::new(), &mut request).await.unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
        assert_eq!(credential.0.load(Ordering::SeqCst), 0);
    }
}
