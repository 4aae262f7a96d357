// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Result;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use http::header::HeaderValue;

/// Creates an `Authorization: Basic` header value.
pub(crate) fn build_basic_header(username: &str, password: &str) -> Result<HeaderValue> {
    let encoded = BASE64_STANDARD.encode(format!("{username}:{password}"));
    build_header_value(format!("Basic {encoded}"))
}

/// Creates an `Authorization: Bearer` header value.
pub(crate) fn build_bearer_header(token: &str) -> Result<HeaderValue> {
    build_header_value(format!("Bearer {token}"))
}

fn build_header_value(value: String) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&value)?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic() -> anyhow::Result<()> {
        let value = build_basic_header("test-user", "test-password")?;
        // echo -n "test-user:test-password" | base64
        assert_eq!(value, HeaderValue::from_static("Basic dGVzdC11c2VyOnRlc3QtcGFzc3dvcmQ="));
        assert!(value.is_sensitive());
        Ok(())
    }

    #[test]
    fn basic_with_symbols() -> anyhow::Result<()> {
        let value = build_basic_header("merchantapp1", "EnRZA3@B")?;
        let encoded = value.to_str()?.trim_start_matches("Basic ");
        let decoded = BASE64_STANDARD.decode(encoded)?;
        assert_eq!(decoded, b"merchantapp1:EnRZA3@B");
        Ok(())
    }

    #[test]
    fn bearer() -> anyhow::Result<()> {
        let value = build_bearer_header("test-token")?;
        assert_eq!(value, HeaderValue::from_static("Bearer test-token"));
        assert!(value.is_sensitive());
        Ok(())
    }

    #[test]
    fn bearer_invalid() {
        let err = build_bearer_header("bad\ntoken").unwrap_err();
        assert!(!err.is_authentication(), "{err:?}");
        assert!(!err.is_transport(), "{err:?}");
    }
}
