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

#![allow(dead_code)]

use async_trait::async_trait;
use azure_storage_rest::client::BackoffConfig;
use azure_storage_rest::{
    ClientOptions, Context, HttpTransport, Next, Policy, RawResponse, Request, Result,
    RetryConfig, StorageClientBuilder, TransportError,
};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the stub saw of one attempt
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
}

/// An [`HttpTransport`] replaying canned responses, `200 OK` once exhausted
///
/// Mirrors the crate's internal mock transport, which is not visible to these tests.
#[derive(Debug, Default)]
pub struct StubTransport {
    responses: Mutex<VecDeque<(StatusCode, HeaderMap, Bytes)>>,
    seen: Mutex<Vec<Seen>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_response(
        &self,
        status: StatusCode,
        headers: &[(&'static str, &'static str)],
        body: &'static str,
    ) {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_static(value));
        }
        self.responses
            .lock()
            .unwrap()
            .push_back((status, map, Bytes::from_static(body.as_bytes())));
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: &mut Request) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(Seen {
            method: request.method().clone(),
            url: request.url().to_string(),
            headers: request.headers().clone(),
        });
        let (status, headers, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((StatusCode::OK, HeaderMap::new(), Bytes::new()));
        Ok(RawResponse::new(status, headers, body.into()))
    }
}

/// A policy counting how often it runs
#[derive(Debug, Default)]
pub struct CountingPolicy(AtomicUsize);

impl CountingPolicy {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Policy for CountingPolicy {
    async fn send(
        &self,
        ctx: &Context,
        request: &mut Request,
        next: Next<'_>,
    ) -> Result<RawResponse> {
        self.0.fetch_add(1, Ordering::SeqCst);
        next.run(ctx, request).await
    }
}

pub fn fast_retry(max_retries: usize) -> RetryConfig {
    RetryConfig {
        backoff: BackoffConfig {
            init_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
            base: 2.,
        },
        max_retries,
        ..Default::default()
    }
}

/// A builder for `myaccount` sending through `transport`
pub fn builder(transport: &Arc<StubTransport>) -> StorageClientBuilder {
    let options =
        ClientOptions::new().with_transport(Arc::clone(transport) as Arc<dyn HttpTransport>);
    StorageClientBuilder::new()
        .with_account("myaccount")
        .with_access_key("bXlrZXk=")
        .with_client_options(options)
        .with_retry(fast_retry(3))
}
