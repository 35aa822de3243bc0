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

use crate::client::pipeline::{Next, Policy};
use crate::client::request::Request;
use crate::client::response::RawResponse;
use crate::context::Context;
use crate::error::RequestError;
use crate::Result;
use async_trait::async_trait;
use http::header::{HeaderValue, USER_AGENT};

/// Maximum length of an application id
const MAX_APPLICATION_ID_LEN: usize = 24;

/// A [`Policy`] identifying the library and application in the `User-Agent` header
///
/// The header has the form `[<application id> ]azsdk-rust-<component>/<version> (<os>)`.
#[derive(Debug)]
pub struct TelemetryPolicy {
    user_agent: HeaderValue,
}

impl TelemetryPolicy {
    /// Create a new [`TelemetryPolicy`] for the named component
    ///
    /// Application ids longer than 24 characters are truncated.
    pub fn new(component: &str, application_id: Option<&str>) -> Result<Self, RequestError> {
        let mut user_agent = format!(
            "azsdk-rust-{}/{} ({}; {})",
            component,
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        if let Some(id) = application_id.map(str::trim).filter(|id| !id.is_empty()) {
            let id: String = id.chars().take(MAX_APPLICATION_ID_LEN).collect();
            user_agent = format!("{id} {user_agent}");
        }

        let user_agent =
            HeaderValue::from_str(&user_agent).map_err(|_| RequestError::InvalidHeaderValue {
                name: USER_AGENT.to_string(),
            })?;
        Ok(Self { user_agent })
    }

    /// The `User-Agent` value set by this policy
    pub fn user_agent(&self) -> &str {
        self.user_agent.to_str().unwrap_or_default()
    }
}

#[async_trait]
impl Policy for TelemetryPolicy {
    async fn send(
        &self,
        ctx: &Context,
        request: &mut Request,
        next: Next<'_>,
    ) -> Result<RawResponse> {
        request.insert_header(USER_AGENT, self.user_agent.clone());
        next.run(ctx, request).await
    }
}
