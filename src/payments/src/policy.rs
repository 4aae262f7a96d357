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

use crate::token::{Token, now};
use crate::{Provider, Result};

/// The rule used by a provider client to validate a token before each call.
///
/// All the rules login if there is no token, and never refresh when the
/// refresh token is known to be expired. They differ in how they treat a
/// token that still looks valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Refresh on every call, unless the refresh token is expired (or its
    /// expiration is unknown), in which case login again.
    ///
    /// A valid access token is never reused as-is. Used by QPay.
    Eager,

    /// Reuse the token until the access token expires, then login again.
    ///
    /// The provider has no refresh endpoint. Used by StorePay.
    LoginOnly,

    /// Reuse the token until the access token expires, then refresh it. Login
    /// again if the refresh token is expired (or its expiration is unknown).
    ///
    /// Used by UbPay.
    Standard,
}

/// The action required to obtain a usable token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStep {
    /// Exchange the static credentials for a new token.
    Login,
    /// Exchange the refresh token for a new access token.
    Refresh,
    /// Use the token as-is.
    Reuse,
}

impl RefreshPolicy {
    /// Returns the step required to turn `token` into a usable token at `now`
    /// (a Unix timestamp in seconds).
    ///
    /// # Example
    /// ```
    /// # use mobile_payments::policy::{RefreshPolicy, TokenStep};
    /// # use mobile_payments::token::Token;
    /// let token = Token {
    ///     access_token: "a".into(),
    ///     refresh_token: "r".into(),
    ///     refresh_expires_in: Some(2_000),
    ///     expires_in: 1_000,
    /// };
    /// assert_eq!(RefreshPolicy::Standard.next_step(Some(&token), 500), TokenStep::Reuse);
    /// assert_eq!(RefreshPolicy::Standard.next_step(Some(&token), 1_500), TokenStep::Refresh);
    /// assert_eq!(RefreshPolicy::Eager.next_step(Some(&token), 500), TokenStep::Refresh);
    /// assert_eq!(RefreshPolicy::Eager.next_step(None, 500), TokenStep::Login);
    /// ```
    pub fn next_step(&self, token: Option<&Token>, now: i64) -> TokenStep {
        let Some(token) = token else {
            return TokenStep::Login;
        };
        match self {
            RefreshPolicy::Eager => {
                if token.refresh_expires_in.is_none() || token.refresh_expired(now) {
                    TokenStep::Login
                } else {
                    TokenStep::Refresh
                }
            }
            RefreshPolicy::LoginOnly => {
                if token.access_expired(now) {
                    TokenStep::Login
                } else {
                    TokenStep::Reuse
                }
            }
            RefreshPolicy::Standard => {
                if token.refresh_expires_in.is_none() || token.refresh_expired(now) {
                    TokenStep::Login
                } else if token.access_expired(now) {
                    TokenStep::Refresh
                } else {
                    TokenStep::Reuse
                }
            }
        }
    }
}

/// The token endpoints of a provider.
#[async_trait::async_trait]
pub(crate) trait TokenEndpoint: std::fmt::Debug + Send + Sync {
    fn provider(&self) -> Provider;

    fn policy(&self) -> RefreshPolicy;

    async fn login(&self) -> Result<Token>;

    async fn refresh(&self, token: Token) -> Result<Token>;
}

/// Returns a usable token, calling the provider endpoints if needed.
pub(crate) async fn ensure_token<E>(endpoint: &E, token: Option<Token>) -> Result<Token>
where
    E: TokenEndpoint + ?Sized,
{
    ensure_token_at(endpoint, token, now()).await
}

async fn ensure_token_at<E>(endpoint: &E, token: Option<Token>, now: i64) -> Result<Token>
where
    E: TokenEndpoint + ?Sized,
{
    let step = endpoint.policy().next_step(token.as_ref(), now);
    tracing::debug!(provider = %endpoint.provider(), ?step, "validating token");
    match (step, token) {
        (TokenStep::Reuse, Some(token)) => Ok(token),
        (TokenStep::Refresh, Some(token)) => endpoint.refresh(token).await,
        _ => endpoint.login().await,
    }
}
