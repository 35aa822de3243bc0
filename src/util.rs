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

//! Common logic for interacting with remote storage resources

use url::Url;

pub(crate) fn hmac_sha256(secret: impl AsRef<[u8]>, bytes: impl AsRef<[u8]>) -> ring::hmac::Tag {
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret.as_ref());
    ring::hmac::sign(&key, bytes.as_ref())
}

/// Returns `url` with `path` appended as one or more percent-encoded segments
///
/// `path` is split on `/` so that nested directories map to nested segments. Empty
/// segments are dropped, and the query and fragment of `url` are kept.
pub(crate) fn append_path(url: &Url, path: &str) -> Url {
    let mut url = url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_path() {
        let base = Url::parse("https://account.file.core.windows.net/").unwrap();
        let share = append_path(&base, "logs");
        assert_eq!(share.as_str(), "https://account.file.core.windows.net/logs");

        let file = append_path(&share, "2020/07/a b#1.txt");
        assert_eq!(
            file.as_str(),
            "https://account.file.core.windows.net/logs/2020/07/a%20b%231.txt"
        );

        let with_sas = Url::parse("https://account.blob.core.windows.net/?sv=1&sig=x").unwrap();
        assert_eq!(
            append_path(&with_sas, "c").as_str(),
            "https://account.blob.core.windows.net/c?sv=1&sig=x"
        );
        assert_eq!(append_path(&share, "").as_str(), share.as_str());
    }

    #[test]
    fn test_hmac() {
        let tag = hmac_sha256(b"key", b"The quick brown fox jumps over the lazy dog");
        assert_eq!(
            tag.as_ref(),
            [
                0xf7, 0xbc, 0x83, 0xf4, 0x30, 0x53, 0x84, 0x24, 0xb1, 0x32, 0x98, 0xe6, 0xaa, 0x6f,
                0xb1, 0x43, 0xef, 0x4d, 0x59, 0xa1, 0x49, 0x46, 0x17, 0x59, 0x97, 0x47, 0x9d, 0xbc,
                0x2d, 0x1a, 0x3c, 0xd8
            ]
        );
    }
}
