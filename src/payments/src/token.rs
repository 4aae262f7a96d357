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

use serde::{Deserialize, Serialize};

/// The credentials returned by a provider login or refresh.
///
/// The clients never store tokens. Applications receive a `Token` with every
/// successful authenticated call and should persist it (the type is
/// serializable) to avoid a new login on the next call.
///
/// Both expiration fields are Unix timestamps, in seconds.
///
/// # Example
/// ```
/// # use mobile_payments::token::Token;
/// let saved = r#"{
///     "access_token": "abc",
///     "refresh_token": "def",
///     "refresh_expires_in": 1767225600,
///     "expires_in": 1767139200
/// }"#;
/// let token: Token = serde_json::from_str(saved)?;
/// assert_eq!(token.refresh_expires_in, Some(1767225600));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The value sent in the `Authorization: Bearer` header.
    pub access_token: String,

    /// The value used to obtain a new access token, if the provider supports
    /// it.
    pub refresh_token: String,

    /// The instant at which the refresh token expires.
    ///
    /// If `None`, the refresh token cannot be trusted and some providers will
    /// login again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_expires_in: Option<i64>,

    /// The instant at which the access token expires.
    pub expires_in: i64,
}

impl Token {
    /// Returns true if the access token is expired at `now`.
    pub fn access_expired(&self, now: i64) -> bool {
        self.expires_in <= now
    }

    /// Returns true if the refresh token has a known expiration and it is
    /// expired at `now`.
    pub fn refresh_expired(&self, now: i64) -> bool {
        self.refresh_expires_in.is_some_and(|e| e <= now)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[censored]")
            .field("refresh_token", &"[censored]")
            .field("refresh_expires_in", &self.refresh_expires_in)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// The result of an authenticated operation.
///
/// Contains the provider response and the token used to make the request.
/// The token may differ from the one provided by the application if it was
/// refreshed or replaced by a new login.
#[derive(Clone, Debug)]
pub struct Response<T> {
    pub data: T,
    pub token: Token,
}

/// The current time as a Unix timestamp.
pub(crate) fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
