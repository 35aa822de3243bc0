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

//! The HTTP pipeline shared by every storage client

pub(crate) mod backoff;

mod body;
pub use body::{ChunkStream, Payload, RequestBody, ResponseBody};

mod common_headers;
pub use common_headers::CommonHeadersPolicy;
pub(crate) use common_headers::{MS_CLIENT_REQUEST_ID, MS_DATE, RFC1123_FMT};

#[cfg(test)]
pub(crate) mod mock_transport;

mod pipeline;
pub use pipeline::{Next, Pipeline, Policy};

mod request;
pub use request::Request;

mod response;
pub use response::{RawResponse, Response};

mod retry;
pub use backoff::BackoffConfig;
pub use retry::{RetryConfig, RetryPolicy};

mod telemetry;
pub use telemetry::TelemetryPolicy;

mod transport;
pub use transport::{
    HttpTransport, ReqwestTransport, TransportError, TransportErrorKind, TransportPolicy,
};

use crate::config::{fmt_duration, ConfigValue};
use crate::{Error, Result};
use reqwest::header::HeaderMap;
use reqwest::{ClientBuilder, NoProxy, Proxy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

fn map_client_error(e: reqwest::Error) -> Error {
    Error::InvalidConfiguration {
        message: format!("failed to build HTTP client: {e}"),
    }
}

/// Configuration keys for [`ClientOptions`]
#[derive(PartialEq, Eq, Hash, Clone, Debug, Copy, Deserialize, Serialize)]
#[non_exhaustive]
pub enum ClientConfigKey {
    /// Allow non-TLS, i.e. non-HTTPS connections
    AllowHttp,
    /// Application id prepended to the `User-Agent` header
    ApplicationId,
    /// Timeout for only the connect phase of a Client
    ConnectTimeout,
    /// Only use http1 connections
    Http1Only,
    /// Only use http2 connections
    Http2Only,
    /// The pool max idle timeout
    ///
    /// This is the length of time an idle connection will be kept alive
    PoolIdleTimeout,
    /// maximum number of idle connections per host
    PoolMaxIdlePerHost,
    /// HTTP proxy to use for requests
    ProxyUrl,
    /// List of hosts that bypass proxy
    ProxyExcludes,
    /// Request timeout
    ///
    /// The timeout is applied from when the request starts connecting until the
    /// response body has finished
    Timeout,
}

impl AsRef<str> for ClientConfigKey {
    fn as_ref(&self) -> &str {
        match self {
            Self::AllowHttp => "allow_http",
            Self::ApplicationId => "application_id",
            Self::ConnectTimeout => "connect_timeout",
            Self::Http1Only => "http1_only",
            Self::Http2Only => "http2_only",
            Self::PoolIdleTimeout => "pool_idle_timeout",
            Self::PoolMaxIdlePerHost => "pool_max_idle_per_host",
            Self::ProxyUrl => "proxy_url",
            Self::ProxyExcludes => "proxy_excludes",
            Self::Timeout => "timeout",
        }
    }
}

impl FromStr for ClientConfigKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow_http" => Ok(Self::AllowHttp),
            "application_id" => Ok(Self::ApplicationId),
            "connect_timeout" => Ok(Self::ConnectTimeout),
            "http1_only" => Ok(Self::Http1Only),
            "http2_only" => Ok(Self::Http2Only),
            "pool_idle_timeout" => Ok(Self::PoolIdleTimeout),
            "pool_max_idle_per_host" => Ok(Self::PoolMaxIdlePerHost),
            "proxy_url" => Ok(Self::ProxyUrl),
            "proxy_excludes" => Ok(Self::ProxyExcludes),
            "timeout" => Ok(Self::Timeout),
            _ => Err(Error::UnknownConfigurationKey { key: s.into() }),
        }
    }
}

/// HTTP client configuration for storage clients
///
/// Besides the connection settings this carries the user supplied pipeline
/// policies and, optionally, a custom [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub(crate) application_id: Option<String>,
    pub(crate) per_operation_policies: Vec<Arc<dyn Policy>>,
    pub(crate) per_retry_policies: Vec<Arc<dyn Policy>>,
    transport: Option<Arc<dyn HttpTransport>>,
    default_headers: Option<HeaderMap>,
    proxy_url: Option<String>,
    proxy_excludes: Option<String>,
    allow_http: ConfigValue<bool>,
    timeout: Option<ConfigValue<Duration>>,
    connect_timeout: Option<ConfigValue<Duration>>,
    pool_idle_timeout: Option<ConfigValue<Duration>>,
    pool_max_idle_per_host: Option<ConfigValue<usize>>,
    http1_only: ConfigValue<bool>,
    http2_only: ConfigValue<bool>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        // Storage transfers can be large, so the request timeout is generous
        Self {
            application_id: None,
            per_operation_policies: vec![],
            per_retry_policies: vec![],
            transport: None,
            default_headers: None,
            proxy_url: None,
            proxy_excludes: None,
            allow_http: Default::default(),
            timeout: Some(Duration::from_secs(60).into()),
            connect_timeout: Some(Duration::from_secs(5).into()),
            pool_idle_timeout: None,
            pool_max_idle_per_host: None,
            http1_only: true.into(),
            http2_only: Default::default(),
        }
    }
}

impl ClientOptions {
    /// Create a new [`ClientOptions`] with default values
    pub fn new() -> Self {
        Default::default()
    }

    /// Set an option by key
    pub fn with_config(mut self, key: ClientConfigKey, value: impl Into<String>) -> Self {
        match key {
            ClientConfigKey::AllowHttp => self.allow_http.parse(value),
            ClientConfigKey::ApplicationId => self.application_id = Some(value.into()),
            ClientConfigKey::ConnectTimeout => {
                self.connect_timeout = Some(ConfigValue::Deferred(value.into()))
            }
            ClientConfigKey::Http1Only => self.http1_only.parse(value),
            ClientConfigKey::Http2Only => self.http2_only.parse(value),
            ClientConfigKey::PoolIdleTimeout => {
                self.pool_idle_timeout = Some(ConfigValue::Deferred(value.into()))
            }
            ClientConfigKey::PoolMaxIdlePerHost => {
                self.pool_max_idle_per_host = Some(ConfigValue::Deferred(value.into()))
            }
            ClientConfigKey::ProxyUrl => self.proxy_url = Some(value.into()),
            ClientConfigKey::ProxyExcludes => self.proxy_excludes = Some(value.into()),
            ClientConfigKey::Timeout => self.timeout = Some(ConfigValue::Deferred(value.into())),
        }
        self
    }

    /// Get an option by key
    pub fn get_config_value(&self, key: &ClientConfigKey) -> Option<String> {
        match key {
            ClientConfigKey::AllowHttp => Some(self.allow_http.to_string()),
            ClientConfigKey::ApplicationId => self.application_id.clone(),
            ClientConfigKey::ConnectTimeout => self.connect_timeout.as_ref().map(fmt_duration),
            ClientConfigKey::Http1Only => Some(self.http1_only.to_string()),
            ClientConfigKey::Http2Only => Some(self.http2_only.to_string()),
            ClientConfigKey::PoolIdleTimeout => self.pool_idle_timeout.as_ref().map(fmt_duration),
            ClientConfigKey::PoolMaxIdlePerHost => {
                self.pool_max_idle_per_host.as_ref().map(|v| v.to_string())
            }
            ClientConfigKey::ProxyUrl => self.proxy_url.clone(),
            ClientConfigKey::ProxyExcludes => self.proxy_excludes.clone(),
            ClientConfigKey::Timeout => self.timeout.as_ref().map(fmt_duration),
        }
    }

    /// Sets the application id prepended to the `User-Agent` header
    ///
    /// Ids longer than 24 characters are truncated
    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    /// Add a [`Policy`] run once per operation, before the retry policy
    pub fn with_per_operation_policy(mut self, policy: Arc<dyn Policy>) -> Self {
        self.per_operation_policies.push(policy);
        self
    }

    /// Add a [`Policy`] run once per attempt, after the retry policy
    pub fn with_per_retry_policy(mut self, policy: Arc<dyn Policy>) -> Self {
        self.per_retry_policies.push(policy);
        self
    }

    /// Send requests with the provided [`HttpTransport`] instead of reqwest
    ///
    /// The connection settings of these options are ignored when a transport is set.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the default headers for every request
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Sets what protocol is allowed. If `allow_http` is :
    /// * false (default):  Only HTTPS are allowed
    /// * true:  HTTP and HTTPS are allowed
    pub fn with_allow_http(mut self, allow_http: bool) -> Self {
        self.allow_http = allow_http.into();
        self
    }

    /// Only use http1 connections
    ///
    /// This is on by default
    pub fn with_http1_only(mut self) -> Self {
        self.http2_only = false.into();
        self.http1_only = true.into();
        self
    }

    /// Only use http2 connections
    pub fn with_http2_only(mut self) -> Self {
        self.http1_only = false.into();
        self.http2_only = true.into();
        self
    }

    /// Use http2 if supported, otherwise use http1.
    pub fn with_allow_http2(mut self) -> Self {
        self.http1_only = false.into();
        self.http2_only = false.into();
        self
    }

    /// Set an HTTP proxy to use for requests
    pub fn with_proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Set a list of hosts to exclude from proxy connections
    pub fn with_proxy_excludes(mut self, proxy_excludes: impl Into<String>) -> Self {
        self.proxy_excludes = Some(proxy_excludes.into());
        self
    }

    /// Set a request timeout
    ///
    /// The timeout is applied from when the request starts connecting until the
    /// response body has finished
    ///
    /// Default is 60 seconds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(ConfigValue::Parsed(timeout));
        self
    }

    /// Disables the request timeout
    ///
    /// See [`Self::with_timeout`]
    pub fn with_timeout_disabled(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set a timeout for only the connect phase of a Client
    ///
    /// Default is 5 seconds
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(ConfigValue::Parsed(timeout));
        self
    }

    /// Set the pool max idle timeout
    ///
    /// This is the length of time an idle connection will be kept alive
    ///
    /// Default is 90 seconds enforced by reqwest
    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(ConfigValue::Parsed(timeout));
        self
    }

    /// Set the maximum number of idle connections per host
    ///
    /// Default is no limit enforced by reqwest
    pub fn with_pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = Some(max.into());
        self
    }

    /// Returns true if plain HTTP endpoints are allowed
    pub(crate) fn allow_http(&self) -> Result<bool> {
        self.allow_http.get()
    }

    /// The [`HttpTransport`] requests are sent with
    pub(crate) fn transport(&self) -> Result<Arc<dyn HttpTransport>> {
        match &self.transport {
            Some(transport) => Ok(Arc::clone(transport)),
            None => Ok(Arc::new(ReqwestTransport::new(self.client()?))),
        }
    }

    pub(crate) fn client(&self) -> Result<reqwest::Client> {
        let mut builder = ClientBuilder::new();

        if let Some(headers) = &self.default_headers {
            builder = builder.default_headers(headers.clone())
        }

        if let Some(proxy) = &self.proxy_url {
            let mut proxy = Proxy::all(proxy).map_err(map_client_error)?;
            if let Some(excludes) = &self.proxy_excludes {
                let no_proxy = NoProxy::from_string(excludes);
                proxy = proxy.no_proxy(no_proxy);
            }
            builder = builder.proxy(proxy);
        }

        if let Some(timeout) = &self.timeout {
            builder = builder.timeout(timeout.get()?)
        }

        if let Some(timeout) = &self.connect_timeout {
            builder = builder.connect_timeout(timeout.get()?)
        }

        if let Some(timeout) = &self.pool_idle_timeout {
            builder = builder.pool_idle_timeout(timeout.get()?)
        }

        if let Some(max) = &self.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max.get()?)
        }

        if self.http1_only.get()? {
            builder = builder.http1_only()
        }

        if self.http2_only.get()? {
            builder = builder.http2_prior_knowledge()
        }

        builder
            .https_only(!self.allow_http.get()?)
            .build()
            .map_err(map_client_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn client_test_config_from_map() {
        let allow_http = "true".to_string();
        let application_id = "my-app".to_string();
        let connect_timeout = "90 seconds".to_string();
        let http1_only = "false".to_string();
        let pool_idle_timeout = "93 seconds".to_string();
        let pool_max_idle_per_host = "94".to_string();
        let proxy_url = "https://fake_proxy_url".to_string();
        let timeout = "95 seconds".to_string();

        let options = HashMap::from([
            ("allow_http", allow_http.clone()),
            ("application_id", application_id.clone()),
            ("connect_timeout", connect_timeout.clone()),
            ("http1_only", http1_only.clone()),
            ("pool_idle_timeout", pool_idle_timeout.clone()),
            ("pool_max_idle_per_host", pool_max_idle_per_host.clone()),
            ("proxy_url", proxy_url.clone()),
            ("timeout", timeout.clone()),
        ]);

        let builder = options
            .into_iter()
            .fold(ClientOptions::new(), |builder, (key, value)| {
                builder.with_config(key.parse().unwrap(), value)
            });

        let get = |key| builder.get_config_value(&key).unwrap();
        assert_eq!(get(ClientConfigKey::AllowHttp), allow_http);
        assert_eq!(get(ClientConfigKey::ApplicationId), application_id);
        assert_eq!(get(ClientConfigKey::ConnectTimeout), connect_timeout);
        assert_eq!(get(ClientConfigKey::Http1Only), http1_only);
        assert_eq!(get(ClientConfigKey::PoolIdleTimeout), pool_idle_timeout);
        assert_eq!(get(ClientConfigKey::PoolMaxIdlePerHost), pool_max_idle_per_host);
        assert_eq!(get(ClientConfigKey::ProxyUrl), proxy_url);
        assert_eq!(get(ClientConfigKey::Timeout), timeout);
    }

    #[test]
    fn client_test_unknown_key() {
        let err = "no_such_key".parse::<ClientConfigKey>().unwrap_err();
        assert!(matches!(err, Error::UnknownConfigurationKey { .. }));
        assert_eq!(ClientConfigKey::ProxyExcludes.as_ref(), "proxy_excludes");
    }

    #[test]
    fn client_test_invalid_value_deferred() {
        let options = ClientOptions::new().with_config(ClientConfigKey::Timeout, "soon");
        assert!(matches!(
            options.client().unwrap_err(),
            Error::InvalidConfiguration { .. }
        ));
    }

    #[test]
    fn client_test_default_formatting() {
        let options = ClientOptions::new();
        assert_eq!(
            options.get_config_value(&ClientConfigKey::Timeout).unwrap(),
            "1m"
        );
        assert_eq!(
            options.get_config_value(&ClientConfigKey::Http1Only).unwrap(),
            "true"
        );
        assert!(options.get_config_value(&ClientConfigKey::ProxyUrl).is_none());
    }
}
