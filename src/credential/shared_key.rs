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

//! Shared key authorization
//!
//! <https://learn.microsoft.com/rest/api/storageservices/authorize-with-shared-key>

use crate::client::{Next, Policy, RawResponse, Request};
use crate::error::RequestError;
use crate::util::hmac_sha256;
use crate::{Context, Error, Result};
use async_trait::async_trait;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use http::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_ENCODING, CONTENT_LANGUAGE,
    CONTENT_LENGTH, CONTENT_TYPE, DATE, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    IF_UNMODIFIED_SINCE, RANGE,
};
use http::Method;
use std::collections::BTreeMap;
use url::Url;

static CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

/// A storage account name and access key
#[derive(Clone)]
pub struct SharedKeyCredential {
    account_name: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeyCredential")
            .field("account_name", &self.account_name)
            .field("key", &"******")
            .finish()
    }
}

impl SharedKeyCredential {
    /// Create a credential from an account name and a base64 encoded access key
    pub fn new(account_name: impl Into<String>, access_key: &str) -> Result<Self> {
        let key = BASE64_STANDARD
            .decode(access_key)
            .map_err(|e| Error::InvalidConfiguration {
                message: format!("access key is not valid base64: {e}"),
            })?;
        Ok(Self {
            account_name: account_name.into(),
            key,
        })
    }

    /// The storage account name
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Compute the `Authorization` header value for `request`
    pub(crate) fn authorization(&self, request: &Request) -> Result<String, RequestError> {
        let url = request.url();
        let to_sign =
            string_to_sign(request.headers(), &url, request.method(), &self.account_name)?;
        let signature = hmac_sha256(&self.key, to_sign);
        Ok(format!(
            "SharedKey {}:{}",
            self.account_name,
            BASE64_STANDARD.encode(signature)
        ))
    }
}

/// Signs every attempt with a [`SharedKeyCredential`]
#[derive(Debug)]
pub struct SharedKeyPolicy {
    credential: SharedKeyCredential,
}

impl SharedKeyPolicy {
    /// Create a policy signing with `credential`
    pub fn new(credential: SharedKeyCredential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl Policy for SharedKeyPolicy {
    async fn send(
        &self,
        ctx: &Context,
        request: &mut Request,
        next: Next<'_>,
    ) -> Result<RawResponse> {
        let authorization = self.credential.authorization(request)?;
        let value = HeaderValue::from_str(&authorization).map_err(|e| Error::Authentication {
            source: Box::new(e),
        })?;
        request.insert_header(AUTHORIZATION, value);
        next.run(ctx, request).await
    }
}

fn header_str<'a>(h: &'a HeaderMap, key: &HeaderName) -> Result<&'a str, RequestError> {
    match h.get(key) {
        Some(v) => v.to_str().map_err(|_| RequestError::InvalidHeaderValue {
            name: key.to_string(),
        }),
        None => Ok(""),
    }
}

fn string_to_sign(
    h: &HeaderMap,
    u: &Url,
    method: &Method,
    account: &str,
) -> Result<String, RequestError> {
    // A zero content length is signed as an empty string
    let content_length = match header_str(h, &CONTENT_LENGTH)? {
        "0" => "",
        v => v,
    };
    Ok(format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}{}",
        method.as_str(),
        header_str(h, &CONTENT_ENCODING)?,
        header_str(h, &CONTENT_LANGUAGE)?,
        content_length,
        header_str(h, &CONTENT_MD5)?,
        header_str(h, &CONTENT_TYPE)?,
        header_str(h, &DATE)?,
        header_str(h, &IF_MODIFIED_SINCE)?,
        header_str(h, &IF_MATCH)?,
        header_str(h, &IF_NONE_MATCH)?,
        header_str(h, &IF_UNMODIFIED_SINCE)?,
        header_str(h, &RANGE)?,
        canonicalize_headers(h)?,
        canonicalized_resource(account, u)
    ))
}

fn canonicalize_headers(headers: &HeaderMap) -> Result<String, RequestError> {
    let mut names = Vec::new();
    for (name, value) in headers {
        if name.as_str().starts_with("x-ms-") {
            let value = value.to_str().map_err(|_| RequestError::InvalidHeaderValue {
                name: name.to_string(),
            })?;
            names.push((name.as_str(), value.trim()));
        }
    }
    names.sort_unstable();

    let mut result = String::new();
    for (name, value) in names {
        result.push_str(name);
        result.push(':');
        result.push_str(value);
        result.push('\n');
    }
    Ok(result)
}

fn canonicalized_resource(account: &str, uri: &Url) -> String {
    let mut resource = format!("/{account}");
    for segment in uri.path_segments().into_iter().flatten() {
        resource.push('/');
        resource.push_str(segment);
    }

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in uri.query_pairs() {
        params
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into_owned());
    }
    for (name, mut values) in params {
        values.sort_unstable();
        resource.push('\n');
        resource.push_str(&name);
        resource.push(':');
        resource.push_str(&values.join(","));
    }
    resource
}
