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

use crate::blob::BlobServiceClient;
use crate::client::{ClientConfigKey, ClientOptions, Pipeline, RetryConfig};
use crate::config::ConfigValue;
use crate::credential::{
    AccessToken, SharedKeyCredential, StaticTokenCredential, StorageCredential, TokenCredential,
};
use crate::share::ShareServiceClient;
use crate::Result;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

const BLOB_COMPONENT: &str = "storage-blobs";
const FILE_COMPONENT: &str = "storage-files-shares";

/// A specialized `Error` for builder-related errors
#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Unable parse endpoint url. Url: {}, Error: {}", url, source)]
    UnableToParseUrl {
        source: url::ParseError,
        url: String,
    },

    #[error("Account must be specified")]
    MissingAccount {},

    #[error("Shared key authorization requires an account name")]
    MissingAccountForKey {},

    #[error("Endpoint {} uses http but allow_http is not set", url)]
    InsecureEndpoint { url: String },

    #[error("Configuration key: '{}' is not known.", key)]
    UnknownConfigurationKey { key: String },
}

impl From<Error> for crate::Error {
    fn from(source: Error) -> Self {
        match source {
            Error::UnknownConfigurationKey { key } => Self::UnknownConfigurationKey { key },
            _ => Self::InvalidConfiguration {
                message: source.to_string(),
            },
        }
    }
}

/// Configure clients for the blob and file services of a storage account
///
/// # Example
/// ```
/// # use azure_storage_rest::StorageClientBuilder;
/// let shares = StorageClientBuilder::new()
///     .with_account("myaccount")
///     .with_access_key("bXlrZXk=")
///     .build_share_service();
/// ```
#[derive(Debug, Default, Clone)]
pub struct StorageClientBuilder {
    /// Account name
    account_name: Option<String>,
    /// Base64 encoded access key
    access_key: Option<String>,
    /// Shared access signature
    sas_token: Option<String>,
    /// Static bearer token
    bearer_token: Option<String>,
    /// Blob service endpoint
    blob_endpoint: Option<String>,
    /// File service endpoint
    file_endpoint: Option<String>,
    /// Send requests without authorization
    skip_signature: ConfigValue<bool>,
    /// Retry config
    retry_config: RetryConfig,
    /// Client options
    client_options: ClientOptions,
    /// Credential taking precedence over the configured keys
    credential: Option<StorageCredential>,
}

/// Configuration keys for [`StorageClientBuilder`]
///
/// Configuration via keys can be done via [`StorageClientBuilder::with_config`]
///
/// # Example
/// ```
/// # use azure_storage_rest::{StorageClientBuilder, StorageConfigKey};
/// let builder = StorageClientBuilder::new()
///     .with_config("azure_storage_account_name".parse().unwrap(), "myaccount")
///     .with_config(StorageConfigKey::SasToken, "sv=2019-12-12&sig=abc");
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Debug, Copy, Deserialize, Serialize)]
#[non_exhaustive]
pub enum StorageConfigKey {
    /// The name of the storage account
    ///
    /// Supported keys:
    /// - `azure_storage_account_name`
    /// - `account_name`
    AccountName,

    /// Base64 encoded access key of the storage account
    ///
    /// Supported keys:
    /// - `azure_storage_account_key`
    /// - `azure_storage_access_key`
    /// - `account_key`
    /// - `access_key`
    AccessKey,

    /// Shared access signature query string
    ///
    /// Supported keys:
    /// - `azure_storage_sas_token`
    /// - `azure_storage_sas_key`
    /// - `sas_token`
    SasToken,

    /// Bearer token
    ///
    /// Supported keys:
    /// - `azure_storage_token`
    /// - `bearer_token`
    Token,

    /// Blob service endpoint, e.g. `https://myaccount.blob.core.windows.net`
    ///
    /// Supported keys:
    /// - `azure_storage_blob_endpoint`
    /// - `blob_endpoint`
    BlobEndpoint,

    /// File service endpoint, e.g. `https://myaccount.file.core.windows.net`
    ///
    /// Supported keys:
    /// - `azure_storage_file_endpoint`
    /// - `file_endpoint`
    FileEndpoint,

    /// Send requests without authorization
    ///
    /// Supported keys:
    /// - `azure_skip_signature`
    /// - `skip_signature`
    SkipSignature,

    /// Client options
    Client(ClientConfigKey),
}

impl AsRef<str> for StorageConfigKey {
    fn as_ref(&self) -> &str {
        match self {
            Self::AccountName => "azure_storage_account_name",
            Self::AccessKey => "azure_storage_account_key",
            Self::SasToken => "azure_storage_sas_token",
            Self::Token => "azure_storage_token",
            Self::BlobEndpoint => "azure_storage_blob_endpoint",
            Self::FileEndpoint => "azure_storage_file_endpoint",
            Self::SkipSignature => "azure_skip_signature",
            Self::Client(key) => key.as_ref(),
        }
    }
}

impl FromStr for StorageConfigKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "azure_storage_account_name" | "account_name" => Ok(Self::AccountName),
            "azure_storage_account_key"
            | "azure_storage_access_key"
            | "account_key"
            | "access_key" => Ok(Self::AccessKey),
            "azure_storage_sas_token" | "azure_storage_sas_key" | "sas_token" => {
                Ok(Self::SasToken)
            }
            "azure_storage_token" | "bearer_token" => Ok(Self::Token),
            "azure_storage_blob_endpoint" | "blob_endpoint" => Ok(Self::BlobEndpoint),
            "azure_storage_file_endpoint" | "file_endpoint" => Ok(Self::FileEndpoint),
            "azure_skip_signature" | "skip_signature" => Ok(Self::SkipSignature),
            // Backwards compatibility
            "azure_allow_http" => Ok(Self::Client(ClientConfigKey::AllowHttp)),
            _ => match s.strip_prefix("azure_").unwrap_or(s).parse() {
                Ok(key) => Ok(Self::Client(key)),
                Err(_) => Err(Error::UnknownConfigurationKey { key: s.into() }.into()),
            },
        }
    }
}

impl StorageClientBuilder {
    /// Create a new [`StorageClientBuilder`] with default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Create an instance of [`StorageClientBuilder`] with values pre-populated from environment variables.
    ///
    /// Variables extracted from environment:
    /// * AZURE_STORAGE_ACCOUNT_NAME: storage account name
    /// * AZURE_STORAGE_ACCOUNT_KEY: storage account master key
    /// * AZURE_STORAGE_SAS_TOKEN: shared access signature
    /// * AZURE_STORAGE_TOKEN: bearer token
    /// * AZURE_STORAGE_BLOB_ENDPOINT: blob service endpoint
    /// * AZURE_STORAGE_FILE_ENDPOINT: file service endpoint
    /// * AZURE_ALLOW_HTTP: allow plain http endpoints
    ///
    /// # Example
    /// ```
    /// use azure_storage_rest::StorageClientBuilder;
    ///
    /// let builder = StorageClientBuilder::from_env();
    /// ```
    pub fn from_env() -> Self {
        let mut builder = Self::default();
        for (os_key, os_value) in std::env::vars_os() {
            if let (Some(key), Some(value)) = (os_key.to_str(), os_value.to_str()) {
                if key.starts_with("AZURE_") {
                    if let Ok(config_key) = key.to_ascii_lowercase().parse() {
                        builder = builder.with_config(config_key, value);
                    }
                }
            }
        }
        builder
    }

    /// Set an option on the builder via a key - value pair.
    pub fn with_config(mut self, key: StorageConfigKey, value: impl Into<String>) -> Self {
        match key {
            StorageConfigKey::AccountName => self.account_name = Some(value.into()),
            StorageConfigKey::AccessKey => self.access_key = Some(value.into()),
            StorageConfigKey::SasToken => self.sas_token = Some(value.into()),
            StorageConfigKey::Token => self.bearer_token = Some(value.into()),
            StorageConfigKey::BlobEndpoint => self.blob_endpoint = Some(value.into()),
            StorageConfigKey::FileEndpoint => self.file_endpoint = Some(value.into()),
            StorageConfigKey::SkipSignature => self.skip_signature.parse(value),
            StorageConfigKey::Client(key) => {
                self.client_options = self.client_options.with_config(key, value)
            }
        };
        self
    }

    /// Get config value via a [`StorageConfigKey`].
    ///
    /// # Example
    /// ```
    /// use azure_storage_rest::{StorageClientBuilder, StorageConfigKey};
    ///
    /// let builder = StorageClientBuilder::from_env()
    ///     .with_account("foo");
    /// let account_name = builder.get_config_value(&StorageConfigKey::AccountName).unwrap_or_default();
    /// assert_eq!("foo", &account_name);
    /// ```
    pub fn get_config_value(&self, key: &StorageConfigKey) -> Option<String> {
        match key {
            StorageConfigKey::AccountName => self.account_name.clone(),
            StorageConfigKey::AccessKey => self.access_key.clone(),
            StorageConfigKey::SasToken => self.sas_token.clone(),
            StorageConfigKey::Token => self.bearer_token.clone(),
            StorageConfigKey::BlobEndpoint => self.blob_endpoint.clone(),
            StorageConfigKey::FileEndpoint => self.file_endpoint.clone(),
            StorageConfigKey::SkipSignature => Some(self.skip_signature.to_string()),
            StorageConfigKey::Client(key) => self.client_options.get_config_value(key),
        }
    }

    /// Set the storage account name
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account_name = Some(account.into());
        self
    }

    /// Set the base64 encoded access key of the storage account
    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// Authorize requests with a shared access signature such as `sv=...&sig=...`
    pub fn with_sas_token(mut self, sas_token: impl Into<String>) -> Self {
        self.sas_token = Some(sas_token.into());
        self
    }

    /// Authorize requests with a fixed bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Authorize requests with tokens from `credential`
    pub fn with_token_credential(mut self, credential: Arc<dyn TokenCredential>) -> Self {
        self.credential = Some(StorageCredential::Token(credential));
        self
    }

    /// Set the credential, taking precedence over any key, token or signature
    pub fn with_credential(mut self, credential: StorageCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Send requests without authorization
    pub fn with_skip_signature(mut self, skip_signature: bool) -> Self {
        self.skip_signature = skip_signature.into();
        self
    }

    /// Override the blob service endpoint
    pub fn with_blob_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.blob_endpoint = Some(endpoint.into());
        self
    }

    /// Override the file service endpoint
    pub fn with_file_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.file_endpoint = Some(endpoint.into());
        self
    }

    /// Sets what protocol is allowed. If `allow_http` is :
    /// * false (default):  Only HTTPS are allowed
    /// * true:  HTTP and HTTPS are allowed
    pub fn with_allow_http(mut self, allow_http: bool) -> Self {
        self.client_options = self.client_options.with_allow_http(allow_http);
        self
    }

    /// Set the retry configuration
    pub fn with_retry(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Sets the client options, overriding any already set
    pub fn with_client_options(mut self, options: ClientOptions) -> Self {
        self.client_options = options;
        self
    }

    /// Create a [`ShareServiceClient`] for the file service of the account
    pub fn build_share_service(&self) -> Result<ShareServiceClient> {
        let (url, pipeline) = self.build_parts(FILE_COMPONENT, &self.file_endpoint, "file")?;
        Ok(ShareServiceClient::new(url, pipeline))
    }

    /// Create a [`BlobServiceClient`] for the blob service of the account
    pub fn build_blob_service(&self) -> Result<BlobServiceClient> {
        let (url, pipeline) = self.build_parts(BLOB_COMPONENT, &self.blob_endpoint, "blob")?;
        Ok(BlobServiceClient::new(url, pipeline))
    }

    fn build_parts(
        &self,
        component: &'static str,
        endpoint: &Option<String>,
        service: &str,
    ) -> Result<(Url, Pipeline)> {
        let endpoint = match (endpoint, &self.account_name) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(account)) => format!("https://{account}.{service}.core.windows.net"),
            (None, None) => return Err(Error::MissingAccount {}.into()),
        };
        let url = Url::parse(&endpoint).map_err(|source| Error::UnableToParseUrl {
            url: endpoint.clone(),
            source,
        })?;
        if url.scheme() == "http" && !self.client_options.allow_http()? {
            return Err(Error::InsecureEndpoint { url: endpoint }.into());
        }

        let credential = self.credential()?;
        let pipeline = Pipeline::for_client(
            component,
            &self.client_options,
            self.retry_config.clone(),
            credential.policy(),
            self.client_options.transport()?,
        )?;
        Ok((url, pipeline))
    }

    fn credential(&self) -> Result<StorageCredential> {
        if let Some(credential) = &self.credential {
            return Ok(credential.clone());
        }
        if self.skip_signature.get()? {
            return Ok(StorageCredential::Anonymous);
        }
        if let Some(key) = &self.access_key {
            let account = self
                .account_name
                .as_ref()
                .ok_or(Error::MissingAccountForKey {})?;
            return Ok(StorageCredential::SharedKey(SharedKeyCredential::new(
                account, key,
            )?));
        }
        if let Some(token) = &self.bearer_token {
            let token = AccessToken::new(token, DateTime::<chrono::Utc>::MAX_UTC);
            return Ok(StorageCredential::Token(Arc::new(StaticTokenCredential::new(
                token,
            ))));
        }
        if let Some(sas) = &self.sas_token {
            return StorageCredential::sas_token(sas);
        }
        Ok(StorageCredential::Anonymous)
    }
}
