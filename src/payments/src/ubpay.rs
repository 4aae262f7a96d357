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

//! Client for the UbPay merchant payment API.
//!
//! UbPay exchanges a client id and secret for an access token and a refresh
//! token, both with absolute expiration times. The client reuses the access
//! token until it expires, then refreshes it.

use crate::build_errors::{Error as BuildError, required_env};
use crate::constants::UBPAY_ENDPOINT;
use crate::errors::Error;
use crate::headers_util::build_bearer_header;
use crate::http::{ReqwestClient, enc, is_set};
use crate::policy::{RefreshPolicy, TokenEndpoint, ensure_token};
use crate::token::{Response, Token};
use crate::{Provider, Result};
use http::header::AUTHORIZATION;
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const CLIENT_ID_VAR: &str = "UBPAY_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "UBPAY_CLIENT_SECRET";
const ENDPOINT_VAR: &str = "UBPAY_ENDPOINT";

/// A builder for [Client].
///
/// # Example
/// ```
/// # use mobile_payments::ubpay::Builder;
/// let client = Builder::new("my-client-id", "my-client-secret")
///     .with_endpoint("https://merchant-payment-api.example.com")
///     .build();
/// ```
pub struct Builder {
    client_id: String,
    client_secret: String,
    endpoint: Option<String>,
    http_client: Option<reqwest::Client>,
}

impl Builder {
    pub fn new<I, S>(client_id: I, client_secret: S) -> Self
    where
        I: Into<String>,
        S: Into<String>,
    {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            endpoint: None,
            http_client: None,
        }
    }

    /// Creates a new builder from the `UBPAY_CLIENT_ID` and
    /// `UBPAY_CLIENT_SECRET` environment variables.
    ///
    /// If `UBPAY_ENDPOINT` is set, it overrides the default endpoint.
    pub fn from_env() -> std::result::Result<Self, BuildError> {
        let builder = Self::new(
            required_env(CLIENT_ID_VAR)?,
            required_env(CLIENT_SECRET_VAR)?,
        );
        Ok(match std::env::var(ENDPOINT_VAR) {
            Ok(endpoint) => builder.with_endpoint(endpoint),
            Err(_) => builder,
        })
    }

    /// Sets the endpoint.
    ///
    /// Defaults to `https://merchant-payment-api.dev.p.ubcabtech.com`, the
    /// UbPay development environment.
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
        let endpoint = self.endpoint.unwrap_or_else(|| UBPAY_ENDPOINT.to_string());
        Ok(Client {
            http: ReqwestClient::new(Provider::UbPay, endpoint, self.http_client)?,
            client_id: self.client_id,
            client_secret: self.client_secret,
        })
    }
}

/// A client for the UbPay merchant payment API.
#[derive(Clone)]
pub struct Client {
    http: ReqwestClient,
    client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("http", &self.http)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .finish()
    }
}

impl Client {
    /// Returns a builder for a client using the given credentials.
    pub fn builder<I, S>(client_id: I, client_secret: S) -> Builder
    where
        I: Into<String>,
        S: Into<String>,
    {
        Builder::new(client_id, client_secret)
    }

    /// Exchanges the client credentials for a new token.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn login(&self) -> Result<Token> {
        let body = LoginRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
        };
        let builder = self
            .http
            .prepare_request(Method::POST, "/auth/token")
            .json(&body);
        let response: Envelope<LoginData> = self.http.execute_as(builder, check_token_error).await?;
        Ok(response.data.into())
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// UbPay does not rotate refresh tokens, the returned token keeps the
    /// refresh token (and its expiration) from `token`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn refresh_token(&self, token: &Token) -> Result<Token> {
        let body = RefreshRequest {
            refresh_token: &token.refresh_token,
        };
        let builder = self
            .http
            .prepare_request(Method::POST, "/auth/refresh-token")
            .json(&body);
        let response: Envelope<RefreshData> =
            self.http.execute_as(builder, check_token_error).await?;
        Ok(Token {
            access_token: response.data.access_token,
            expires_in: response.data.access_token_expires_in,
            ..token.clone()
        })
    }

    /// Creates an invoice.
    #[tracing::instrument(level = "debug", skip_all, fields(amount = input.amount))]
    pub async fn create_invoice(
        &self,
        input: &CreateInvoiceRequest,
        token: Option<Token>,
    ) -> Result<Response<InvoiceResponse>> {
        let token = ensure_token(self, token).await?;
        let builder = self
            .http
            .prepare_request(Method::POST, "/api/v1/invoices")
            .header(AUTHORIZATION, build_bearer_header(&token.access_token)?)
            .json(input);
        let data = self.http.execute_as(builder, check_error).await?;
        Ok(Response { data, token })
    }

    /// Fetches an invoice, including its payment status.
    #[tracing::instrument(level = "debug", skip(self, token))]
    pub async fn check_invoice(
        &self,
        invoice_id: &str,
        token: Option<Token>,
    ) -> Result<Response<InvoiceCheckResponse>> {
        let token = ensure_token(self, token).await?;
        let path = format!("/api/v1/invoices/{}", enc(invoice_id));
        let builder = self
            .http
            .prepare_request(Method::GET, &path)
            .header(AUTHORIZATION, build_bearer_header(&token.access_token)?);
        let data = self.http.execute_as(builder, check_error).await?;
        Ok(Response { data, token })
    }
}

#[async_trait::async_trait]
impl TokenEndpoint for Client {
    fn provider(&self) -> Provider {
        Provider::UbPay
    }

    fn policy(&self) -> RefreshPolicy {
        RefreshPolicy::Standard
    }

    async fn login(&self) -> Result<Token> {
        Client::login(self).await
    }

    async fn refresh(&self, token: Token) -> Result<Token> {
        self.refresh_token(&token).await
    }
}

/// UbPay wraps all responses as `{"success": bool, "data": ..., "error": ...}`.
fn check_error(value: &Value) -> Result<()> {
    let failed = value.get("success").and_then(Value::as_bool) == Some(false);
    if !failed && !is_set(value, "error") {
        return Ok(());
    }
    let message = value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("unknown UbPay error");
    Err(Error::business(Provider::UbPay, message))
}

fn check_token_error(value: &Value) -> Result<()> {
    check_error(value).map_err(Error::into_authentication)
}

/// The fields required to create an UbPay invoice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub amount: f64,
    pub description: String,
    /// Arbitrary data attached to the invoice, returned in the responses.
    #[serde(default)]
    pub custom_data: Value,
    /// UbPay calls this URL when the invoice status changes.
    pub callback_url: String,
}

/// The status of an UbPay invoice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Open,
    Paid,
    Void,
    /// A status not known to this version of the crate.
    #[serde(other)]
    Unknown,
}

/// The response of a successful invoice creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub success: bool,
    pub data: CreatedInvoice,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInvoice {
    pub status: InvoiceStatus,
    pub amount: f64,
    pub invoice_number: String,
    /// The custom data from the request, with the `qrCode` and `callbackUrl`
    /// fields added by UbPay.
    #[serde(default)]
    pub custom_data: Value,
}

/// The response of an invoice check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCheckResponse {
    pub success: bool,
    pub data: Invoice,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub amount: f64,
    pub qr_code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    access_token: String,
    refresh_token: String,
    access_token_expires_in: i64,
    refresh_token_expires_in: i64,
}

impl From<LoginData> for Token {
    fn from(value: LoginData) -> Self {
        Token {
            access_token: value.access_token,
            refresh_token: value.refresh_token,
            refresh_expires_in: Some(value.refresh_token_expires_in),
            expires_in: value.access_token_expires_in,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshData {
    access_token: String,
    // The field name is misspelled in the UbPay API.
    #[serde(
        rename = "accessTokenExpriresIn",
        alias = "accessTokenExpiresIn",
        deserialize_with = "timestamp"
    )]
    access_token_expires_in: i64,
}

/// Accepts a timestamp sent as a number or as a decimal string.
fn timestamp<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Timestamp {
        Number(i64),
        Text(String),
    }
    match Timestamp::deserialize(deserializer)? {
        Timestamp::Number(n) => Ok(n),
        Timestamp::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
