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

//! Client for the [StorePay] merchant lending API.
//!
//! StorePay uses an OAuth2 password grant: the merchant user credentials are
//! sent as a form, and the merchant application credentials as HTTP Basic
//! authentication. There is no refresh endpoint, the client logs in again
//! once the access token expires.
//!
//! [StorePay]: https://storepay.mn

use crate::build_errors::{Error as BuildError, required_env};
use crate::constants::{PASSWORD_GRANT_TYPE, STOREPAY_ENDPOINT, STOREPAY_SUCCESS};
use crate::errors::Error;
use crate::headers_util::{build_basic_header, build_bearer_header};
use crate::http::{ReqwestClient, enc, first_str, is_set};
use crate::policy::{RefreshPolicy, TokenEndpoint, ensure_token};
use crate::token::{Response, Token, now};
use crate::{Provider, Result};
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const USERNAME_VAR: &str = "STOREPAY_USERNAME";
const PASSWORD_VAR: &str = "STOREPAY_PASSWORD";
const APP_USERNAME_VAR: &str = "STOREPAY_APP_USERNAME";
const APP_PASSWORD_VAR: &str = "STOREPAY_APP_PASSWORD";
const ENDPOINT_VAR: &str = "STOREPAY_ENDPOINT";

/// A builder for [Client].
pub struct Builder {
    credentials: Credentials,
    endpoint: Option<String>,
    http_client: Option<reqwest::Client>,
}

impl Builder {
    /// Creates a new builder.
    ///
    /// `username` and `password` identify the merchant user. `app_username`
    /// and `app_password` identify the merchant application and are issued
    /// by StorePay.
    pub fn new<U, P, AU, AP>(username: U, password: P, app_username: AU, app_password: AP) -> Self
    where
        U: Into<String>,
        P: Into<String>,
        AU: Into<String>,
        AP: Into<String>,
    {
        Self {
            credentials: Credentials {
                username: username.into(),
                password: password.into(),
                app_username: app_username.into(),
                app_password: app_password.into(),
            },
            endpoint: None,
            http_client: None,
        }
    }

    /// Creates a new builder from the `STOREPAY_USERNAME`,
    /// `STOREPAY_PASSWORD`, `STOREPAY_APP_USERNAME` and
    /// `STOREPAY_APP_PASSWORD` environment variables.
    ///
    /// If `STOREPAY_ENDPOINT` is set, it overrides the default endpoint.
    pub fn from_env() -> std::result::Result<Self, BuildError> {
        let builder = Self::new(
            required_env(USERNAME_VAR)?,
            required_env(PASSWORD_VAR)?,
            required_env(APP_USERNAME_VAR)?,
            required_env(APP_PASSWORD_VAR)?,
        );
        Ok(match std::env::var(ENDPOINT_VAR) {
            Ok(endpoint) => builder.with_endpoint(endpoint),
            Err(_) => builder,
        })
    }

    /// Sets the endpoint. Defaults to `https://service.storepay.mn:8778`.
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Returns a [Client] with the configured settings.
    pub fn build(self) -> std::result::Result<Client, BuildError> {
        let endpoint = self.endpoint.unwrap_or_else(|| STOREPAY_ENDPOINT.to_string());
        Ok(Client {
            http: ReqwestClient::new(Provider::StorePay, endpoint, self.http_client)?,
            credentials: self.credentials,
        })
    }
}

/// A client for the StorePay merchant API.
#[derive(Clone, Debug)]
pub struct Client {
    http: ReqwestClient,
    credentials: Credentials,
}

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
    app_username: String,
    app_password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[censored]")
            .field("app_username", &self.app_username)
            .field("app_password", &"[censored]")
            .finish()
    }
}

impl Client {
    /// Returns a builder for a client using the given credentials.
    pub fn builder<U, P, AU, AP>(
        username: U,
        password: P,
        app_username: AU,
        app_password: AP,
    ) -> Builder
    where
        U: Into<String>,
        P: Into<String>,
        AU: Into<String>,
        AP: Into<String>,
    {
        Builder::new(username, password, app_username, app_password)
    }

    /// Exchanges the merchant credentials for a new token.
    ///
    /// StorePay reports the token lifetime in seconds. The returned token
    /// holds the absolute expiration time, like the other providers.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn login(&self) -> Result<Token> {
        let auth = build_basic_header(
            &self.credentials.app_username,
            &self.credentials.app_password,
        )?;
        let form = [
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("grant_type", PASSWORD_GRANT_TYPE),
        ];
        let builder = self
            .http
            .prepare_request(Method::POST, "/merchant-uaa/oauth/token")
            .header(AUTHORIZATION, auth)
            .form(&form);
        let response: TokenResponse = self.http.execute_as(builder, check_token_error).await?;
        Ok(response.into_token(now()))
    }

    /// Creates a loan request, the StorePay equivalent of an invoice.
    ///
    /// StorePay sends a confirmation request to the customer's mobile
    /// application.
    #[tracing::instrument(level = "debug", skip_all, fields(store_id = input.store_id))]
    pub async fn create_invoice(
        &self,
        input: &CreateInvoiceRequest,
        token: Option<Token>,
    ) -> Result<Response<InvoiceResponse>> {
        let token = ensure_token(self, token).await?;
        let builder = self
            .http
            .prepare_request(Method::POST, "/lend-merchant/merchant/loan")
            .header(AUTHORIZATION, build_bearer_header(&token.access_token)?)
            .json(input);
        let data = self.http.execute_as(builder, check_status).await?;
        Ok(Response { data, token })
    }

    /// Checks if the customer confirmed a loan request.
    #[tracing::instrument(level = "debug", skip(self, token))]
    pub async fn check_invoice(
        &self,
        invoice_id: &str,
        token: Option<Token>,
    ) -> Result<Response<InvoiceCheckResponse>> {
        let token = ensure_token(self, token).await?;
        let path = format!("/lend-merchant/merchant/loan/check/{}", enc(invoice_id));
        let builder = self
            .http
            .prepare_request(Method::GET, &path)
            .header(AUTHORIZATION, build_bearer_header(&token.access_token)?)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let data = self.http.execute_as(builder, check_status).await?;
        Ok(Response { data, token })
    }
}

#[async_trait::async_trait]
impl TokenEndpoint for Client {
    fn provider(&self) -> Provider {
        Provider::StorePay
    }

    fn policy(&self) -> RefreshPolicy {
        RefreshPolicy::LoginOnly
    }

    async fn login(&self) -> Result<Token> {
        Client::login(self).await
    }

    async fn refresh(&self, _token: Token) -> Result<Token> {
        Err(Error::refresh_unsupported(Provider::StorePay))
    }
}

fn check_token_error(value: &Value) -> Result<()> {
    if !is_set(value, "error") {
        return Ok(());
    }
    let message = first_str(value, &["error_description", "error"])
        .unwrap_or("unknown StorePay error");
    Err(Error::authentication(Provider::StorePay, message))
}

fn check_status(value: &Value) -> Result<()> {
    // Bodies without a `status` are not business responses, for example a
    // gateway error page. They are reported using the HTTP status.
    let Some(status) = value.get("status").and_then(Value::as_str) else {
        return Ok(());
    };
    if status == STOREPAY_SUCCESS {
        return Ok(());
    }
    let message = value
        .get("msgList")
        .and_then(|list| list.get(0))
        .and_then(|m| m.as_str().or_else(|| m.get("text").and_then(Value::as_str)))
        .filter(|m| !m.is_empty())
        .unwrap_or(status);
    Err(Error::business(Provider::StorePay, message))
}

/// The fields required to create a StorePay loan request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub store_id: i64,
    /// The customer's registered mobile number.
    pub mobile_number: i64,
    pub description: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// A merchant-assigned identifier, used to deduplicate requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// The response of a loan request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    /// The loan request identifier, use it to check the request status.
    pub value: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub msg_list: Vec<Value>,
    #[serde(default)]
    pub attrs: Value,
    pub status: String,
}

/// The response of a loan check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCheckResponse {
    /// True once the customer confirmed the loan.
    pub value: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub msg_list: Vec<Value>,
    #[serde(default)]
    pub attrs: Value,
    pub status: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    /// Seconds from now.
    expires_in: i64,
}

impl TokenResponse {
    fn into_token(self, now: i64) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            refresh_expires_in: None,
            expires_in: now.saturating_add(self.expires_in),
        }
    }
}
