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

use crate::client::common_headers::CommonHeadersPolicy;
use crate::client::request::Request;
use crate::client::response::RawResponse;
use crate::client::retry::{RetryConfig, RetryPolicy};
use crate::client::telemetry::TelemetryPolicy;
use crate::client::transport::{HttpTransport, TransportPolicy};
use crate::client::ClientOptions;
use crate::context::Context;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A stage of a [`Pipeline`]
///
/// A policy may inspect and modify the [`Request`], then either produce a
/// [`RawResponse`] itself or hand the request to the remaining policies with
/// [`Next::run`]. Only a retry policy should call [`Next::run`] more than once.
///
/// ```
/// # use azure_storage_rest::{Context, Next, Policy, RawResponse, Request, Result};
/// # use async_trait::async_trait;
/// #[derive(Debug)]
/// struct TagPolicy;
///
/// #[async_trait]
/// impl Policy for TagPolicy {
///     async fn send(&self, ctx: &Context, request: &mut Request, next: Next<'_>) -> Result<RawResponse> {
///         request.set_header("x-ms-meta-tag", "example")?;
///         next.run(ctx, request).await
///     }
/// }
/// ```
#[async_trait]
pub trait Policy: std::fmt::Debug + Send + Sync {
    /// Process `request`, typically by calling `next`
    async fn send(&self, ctx: &Context, request: &mut Request, next: Next<'_>)
        -> Result<RawResponse>;
}

/// The policies following the current one in a [`Pipeline`]
#[derive(Debug, Clone, Copy)]
pub struct Next<'a> {
    policies: &'a [Arc<dyn Policy>],
}

impl<'a> Next<'a> {
    /// Send `request` through the remaining policies
    pub async fn run(self, ctx: &Context, request: &mut Request) -> Result<RawResponse> {
        match self.policies.split_first() {
            Some((policy, rest)) => policy.send(ctx, request, Next { policies: rest }).await,
            None => Err(Error::Generic {
                message: "pipeline ended without a transport policy".to_string(),
            }),
        }
    }

    /// The number of policies remaining
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns true if no policies remain
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// An ordered list of [`Policy`] through which every request of a client is sent
#[derive(Debug, Clone)]
pub struct Pipeline {
    policies: Arc<[Arc<dyn Policy>]>,
}

impl Pipeline {
    /// Create a [`Pipeline`] from an ordered list of policies
    ///
    /// The last policy should not call [`Next::run`], see [`TransportPolicy`].
    pub fn new(policies: Vec<Arc<dyn Policy>>) -> Self {
        Self {
            policies: policies.into(),
        }
    }

    /// Create the standard client pipeline
    ///
    /// Telemetry, per-operation policies, retry, per-retry policies, common headers,
    /// authentication when present and finally the transport.
    pub(crate) fn for_client(
        component: &'static str,
        options: &ClientOptions,
        retry: RetryConfig,
        auth: Option<Arc<dyn Policy>>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let mut policies: Vec<Arc<dyn Policy>> = Vec::with_capacity(
            options.per_operation_policies.len() + options.per_retry_policies.len() + 5,
        );
        policies.push(Arc::new(TelemetryPolicy::new(
            component,
            options.application_id.as_deref(),
        )?));
        policies.extend(options.per_operation_policies.iter().cloned());
        policies.push(Arc::new(RetryPolicy::new(retry)));
        policies.extend(options.per_retry_policies.iter().cloned());
        policies.push(Arc::new(CommonHeadersPolicy::new()));
        policies.extend(auth);
        policies.push(Arc::new(TransportPolicy::new(transport)));
        Ok(Self::new(policies))
    }

    /// The policies of this pipeline in order
    pub fn policies(&self) -> &[Arc<dyn Policy>] {
        &self.policies
    }

    /// Send `request` through every policy of this pipeline
    ///
    /// Fails with [`Error::Cancelled`] without running any policy if `ctx` is
    /// already cancelled or past its deadline.
    pub async fn send(&self, ctx: &Context, request: &mut Request) -> Result<RawResponse> {
        ctx.check()?;
        Next {
            policies: &self.policies,
        }
        .run(ctx, request)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResponseBody;
    use http::{HeaderMap, Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    #[derive(Debug, Default)]
    struct Recorder {
        name: &'static str,
        log: Arc<std::sync::Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Policy for Recorder {
        async fn send(
            &self,
            ctx: &Context,
            request: &mut Request,
            next: Next<'_>,
        ) -> Result<RawResponse> {
            self.log.lock().unwrap().push(self.name);
            next.run(ctx, request).await
        }
    }

    #[derive(Debug, Default)]
    struct Terminal(AtomicUsize);

    #[async_trait]
    impl Policy for Terminal {
        async fn send(&self, _: &Context, _: &mut Request, next: Next<'_>) -> Result<RawResponse> {
            assert!(next.is_empty());
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(RawResponse::new(
                StatusCode::OK,
                HeaderMap::new(),
                ResponseBody::default(),
            ))
        }
    }

    fn request() -> Request {
        Request::new(Method::GET, Url::parse("http://localhost/").unwrap())
    }

    #[tokio::test]
    async fn test_policy_order() {
        let log = Arc::new(std::sync::Mutex::new(vec![]));
        let terminal = Arc::new(Terminal::default());
        let pipeline = Pipeline::new(vec![
            Arc::new(Recorder {
                name: "first",
                log: Arc::clone(&log),
            }),
            Arc::new(Recorder {
                name: "second",
                log: Arc::clone(&log),
            }),
            Arc::clone(&terminal) as Arc<dyn Policy>,
        ]);

        let response = pipeline.send(&Context::new(), &mut request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(terminal.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_policy() {
        let log = Arc::new(std::sync::Mutex::new(vec![]));
        let pipeline = Pipeline::new(vec![
            Arc::new(Recorder {
                name: "first",
                log: Arc::clone(&log),
            }),
            Arc::new(Terminal::default()),
        ]);

        let ctx = Context::new();
        ctx.cancel();
        let err = pipeline.send(&ctx, &mut request()).await.unwrap_err();
        assert!(err.is_cancelled(), "{err}");
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_terminal_policy() {
        let pipeline = Pipeline::new(vec![Arc::new(Recorder::default())]);
        let err = pipeline
            .send(&Context::new(), &mut request())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generic { .. }), "{err}");
    }
}
