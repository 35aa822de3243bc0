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
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use http::header::{HeaderName, HeaderValue};

pub(crate) const RFC1123_FMT: &str = "%a, %d %h %Y %T GMT";

pub(crate) static MS_DATE: HeaderName = HeaderName::from_static("x-ms-date");
pub(crate) static MS_CLIENT_REQUEST_ID: HeaderName =
    HeaderName::from_static("x-ms-client-request-id");

/// A [`Policy`] stamping each attempt with `x-ms-date` and `x-ms-client-request-id`
///
/// The date is refreshed on every attempt. A client request id already present on the
/// request is kept, otherwise a random UUID is generated.
#[derive(Debug, Default)]
pub struct CommonHeadersPolicy {}

impl CommonHeadersPolicy {
    /// Create a new [`CommonHeadersPolicy`]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Policy for CommonHeadersPolicy {
    async fn send(
        &self,
        ctx: &Context,
        request: &mut Request,
        next: Next<'_>,
    ) -> Result<RawResponse> {
        let date = Utc::now().format(RFC1123_FMT).to_string();
        // Always valid ASCII
        if let Ok(date) = HeaderValue::from_str(&date) {
            request.insert_header(MS_DATE.clone(), date);
        }

        if !request.headers().contains_key(&MS_CLIENT_REQUEST_ID) {
            let id = uuid::Uuid::new_v4().hyphenated().to_string();
            if let Ok(id) = HeaderValue::from_str(&id) {
                request.insert_header(MS_CLIENT_REQUEST_ID.clone(), id);
            }
        }
        next.run(ctx, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock_transport::MockTransport;
    use crate::client::{Pipeline, TransportPolicy};
    use http::Method;
    use std::sync::Arc;
    use url::Url;

    #[tokio::test]
    async fn test_common_headers() {
        let mock = Arc::new(MockTransport::new());
        let pipeline = Pipeline::new(vec![
            Arc::new(CommonHeadersPolicy::new()),
            Arc::new(TransportPolicy::new(Arc::clone(&mock) as _)),
        ]);

        let url = Url::parse("http://localhost/").unwrap();
        let mut request = Request::new(Method::GET, url.clone());
        pipeline.send(&Context::new(), &mut request).await.unwrap();

        let recorded = mock.last_request();
        let date = recorded.headers.get(&MS_DATE).unwrap().to_str().unwrap();
        assert!(date.ends_with(" GMT"), "{date}");
        chrono::DateTime::parse_from_rfc2822(&date.replace("GMT", "+0000")).unwrap();

        let id = recorded.headers.get(&MS_CLIENT_REQUEST_ID).unwrap();
        uuid::Uuid::parse_str(id.to_str().unwrap()).unwrap();

        let mut request = Request::new(Method::GET, url);
        request
            .set_header("x-ms-client-request-id", "caller-id")
            .unwrap();
        pipeline.send(&Context::new(), &mut request).await.unwrap();
        let recorded = mock.last_request();
        assert_eq!(recorded.headers.get(&MS_CLIENT_REQUEST_ID).unwrap(), "caller-id");
    }
}
