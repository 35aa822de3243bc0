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

//! A retrying pipeline stage

use crate::client::backoff::{Backoff, BackoffConfig};
use crate::client::pipeline::{Next, Policy};
use crate::client::request::Request;
use crate::client::response::RawResponse;
use crate::context::Context;
use crate::{Error, Result};
use async_trait::async_trait;
use http::header::RETRY_AFTER;
use http::StatusCode;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Contains the configuration for how to respond to server errors
///
/// By default they will be retried up to some limit, using exponential
/// backoff with jitter. See [`BackoffConfig`] for more information
///
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// The backoff configuration
    pub backoff: BackoffConfig,

    /// The maximum number of times to retry a request
    ///
    /// Set to 0 to disable retries
    pub max_retries: usize,

    /// The maximum length of time from the initial request
    /// after which no further retries will be attempted
    ///
    /// This not only bounds the length of time before a server
    /// error will be surfaced to the application, but also bounds
    /// the length of time a request's `x-ms-date` must remain valid.
    pub retry_timeout: Duration,

    /// The response statuses that are retried
    pub retryable_statuses: Vec<StatusCode>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff: Default::default(),
            max_retries: 3,
            retry_timeout: Duration::from_secs(3 * 60),
            retryable_statuses: vec![
                StatusCode::REQUEST_TIMEOUT,
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
        }
    }
}

impl RetryConfig {
    fn should_retry(&self, result: &Result<RawResponse>) -> bool {
        match result {
            Ok(r) => self.retryable_statuses.contains(&r.status()),
            Err(Error::Transport { source }) => source.is_retryable(),
            Err(_) => false,
        }
    }
}

/// A [`Policy`] re-running the remainder of the pipeline on transient failures
///
/// Every policy after this one runs once per attempt. An attempt is repeated only
/// if its request is retryable, its body can be rewound, and the retry budget of
/// the [`RetryConfig`] is not exhausted. Otherwise the last response or error is
/// returned unchanged.
#[derive(Debug)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new [`RetryPolicy`]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// The configuration of this policy
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// The time to wait before the next attempt
    ///
    /// A `Retry-After` header given in seconds raises the backoff, up to the
    /// configured maximum.
    fn sleep_duration(&self, backoff: &mut Backoff, result: &Result<RawResponse>) -> Duration {
        let sleep = backoff.next();
        let retry_after = result
            .as_ref()
            .ok()
            .and_then(|r| r.header(RETRY_AFTER.as_str()))
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        match retry_after {
            Some(after) => sleep.max(after.min(self.config.backoff.max_backoff)),
            None => sleep,
        }
    }
}

#[async_trait]
impl Policy for RetryPolicy {
    async fn send(
        &self,
        ctx: &Context,
        request: &mut Request,
        next: Next<'_>,
    ) -> Result<RawResponse> {
        let mut backoff = Backoff::new(&self.config.backoff);
        let max_retries = self.config.max_retries;
        let start = Instant::now();
        let mut retries = 0;

        loop {
            let result = next.run(ctx, request).await;
            if !self.config.should_retry(&result) {
                return result;
            }

            let reason = match &result {
                Ok(r) => r.status().to_string(),
                Err(e) => e.to_string(),
            };

            if retries == max_retries || start.elapsed() > self.config.retry_timeout {
                warn!(
                    "Giving up after {} retries, last attempt failed with {}",
                    retries, reason
                );
                return result;
            }

            if !request.is_retryable() || !request.body_mut().rewind() {
                info!("Request cannot be replayed, not retrying {}", reason);
                return result;
            }

            let sleep = self.sleep_duration(&mut backoff, &result);
            retries += 1;
            info!(
                "Encountered {}, backing off for {} seconds, retry {} of {}",
                reason,
                sleep.as_secs_f32(),
                retries,
                max_retries
            );

            // Release the connection of the failed attempt before sleeping
            drop(result);
            ctx.run(tokio::time::sleep(sleep))
                .await
                .map_err(|reason| Error::Cancelled { reason })?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock_transport::MockTransport;
    use crate::client::{Pipeline, RequestBody, TransportErrorKind, TransportPolicy};
    use crate::error::CancelReason;
    use bytes::Bytes;
    use http::{HeaderMap, Method};
    use std::sync::Arc;
    use url::Url;

    fn pipeline(retry: RetryConfig, mock: &Arc<MockTransport>) -> Pipeline {
        Pipeline::new(vec![
            Arc::new(RetryPolicy::new(retry)),
            Arc::new(TransportPolicy::new(Arc::clone(mock) as _)),
        ])
    }

    fn retry_config(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            retry_timeout: Duration::from_secs(1000),
            ..Default::default()
        }
    }

    fn request(method: Method) -> Request {
        Request::new(method, Url::parse("http://localhost/share").unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry() {
        let mock = Arc::new(MockTransport::new());
        let pipeline = pipeline(retry_config(2), &mock);
        let ctx = Context::new();

        // Simple request should work
        let r = pipeline.send(&ctx, &mut request(Method::GET)).await.unwrap();
        assert_eq!(r.status(), StatusCode::OK);
        assert_eq!(mock.calls(), 1);

        // Returns client errors immediately
        mock.push_status(StatusCode::BAD_REQUEST);
        let r = pipeline.send(&ctx, &mut request(Method::GET)).await.unwrap();
        assert_eq!(r.status(), StatusCode::BAD_REQUEST);
        assert_eq!(mock.calls(), 2);

        // Should retry server error request
        mock.push_status(StatusCode::BAD_GATEWAY);
        let r = pipeline.send(&ctx, &mut request(Method::GET)).await.unwrap();
        assert_eq!(r.status(), StatusCode::OK);
        assert_eq!(mock.calls(), 4);

        // Should retry connection errors
        mock.push_error(TransportErrorKind::Connect);
        let r = pipeline.send(&ctx, &mut request(Method::GET)).await.unwrap();
        assert_eq!(r.status(), StatusCode::OK);
        assert_eq!(mock.calls(), 6);

        // Does not retry request errors
        mock.push_error(TransportErrorKind::Request);
        let e = pipeline
            .send(&ctx, &mut request(Method::GET))
            .await
            .unwrap_err();
        assert!(matches!(e, Error::Transport { .. }), "{e}");
        assert_eq!(mock.calls(), 7);

        // Gives up after the retrying the specified number of times
        for _ in 0..=2 {
            mock.push_status(StatusCode::SERVICE_UNAVAILABLE);
        }
        let r = pipeline.send(&ctx, &mut request(Method::GET)).await.unwrap();
        assert_eq!(r.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(mock.calls(), 10);

        // Gives up after retrying multiple transport errors
        for _ in 0..=2 {
            mock.push_error(TransportErrorKind::Interrupted);
        }
        let e = pipeline
            .send(&ctx, &mut request(Method::GET))
            .await
            .unwrap_err();
        assert!(matches!(e, Error::Transport { .. }), "{e}");
        assert_eq!(mock.calls(), 13);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_until_success() {
        let mock = Arc::new(MockTransport::new());
        let pipeline = pipeline(retry_config(3), &mock);
        for _ in 0..3 {
            mock.push_status(StatusCode::SERVICE_UNAVAILABLE);
        }
        mock.push_status(StatusCode::OK);

        let r = pipeline
            .send(&Context::new(), &mut request(Method::PUT))
            .await
            .unwrap();
        assert_eq!(r.status(), StatusCode::OK);
        assert_eq!(mock.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_post() {
        let mock = Arc::new(MockTransport::new());
        let pipeline = pipeline(retry_config(3), &mock);
        mock.push_status(StatusCode::INTERNAL_SERVER_ERROR);

        let mut req = request(Method::POST);
        let r = pipeline.send(&Context::new(), &mut req).await.unwrap();
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(mock.calls(), 1);

        mock.push_status(StatusCode::INTERNAL_SERVER_ERROR);
        req.set_retryable(true);
        let r = pipeline.send(&Context::new(), &mut req).await.unwrap();
        assert_eq!(r.status(), StatusCode::OK);
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_consumed_stream() {
        let mock = Arc::new(MockTransport::new());
        let pipeline = pipeline(retry_config(3), &mock);
        mock.push_status(StatusCode::SERVICE_UNAVAILABLE);

        let stream = futures::stream::iter(vec![Ok(Bytes::from_static(b"data"))]);
        let mut req = request(Method::PUT);
        req.set_body(RequestBody::from_stream(stream, Some(4)));

        let r = pipeline.send(&Context::new(), &mut req).await.unwrap();
        assert_eq!(r.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bytes_body() {
        let mock = Arc::new(MockTransport::new());
        let pipeline = pipeline(retry_config(3), &mock);
        mock.push_status(StatusCode::SERVICE_UNAVAILABLE);

        let mut req = request(Method::PUT);
        req.set_body(Bytes::from_static(b"data"));
        let r = pipeline.send(&Context::new(), &mut req).await.unwrap();
        assert_eq!(r.status(), StatusCode::OK);
        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.bodies(), vec![Bytes::from_static(b"data"); 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after() {
        let mock = Arc::new(MockTransport::new());
        let pipeline = pipeline(retry_config(3), &mock);

        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, "10".parse().unwrap());
        mock.push_response(StatusCode::TOO_MANY_REQUESTS, headers, "");

        let start = Instant::now();
        let r = pipeline
            .send(&Context::new(), &mut request(Method::GET))
            .await
            .unwrap();
        assert_eq!(r.status(), StatusCode::OK);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_cancelled() {
        let mock = Arc::new(MockTransport::new());
        let pipeline = pipeline(retry_config(3), &mock);
        mock.push_status(StatusCode::SERVICE_UNAVAILABLE);

        let ctx = Context::new().with_timeout(Duration::from_millis(1));
        let e = pipeline
            .send(&ctx, &mut request(Method::GET))
            .await
            .unwrap_err();
        assert!(
            matches!(
                e,
                Error::Cancelled {
                    reason: CancelReason::DeadlineExceeded
                }
            ),
            "{e}"
        );
        assert_eq!(mock.calls(), 1);
    }
}
