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

//! Client for the [QPay] merchant API (v2).
//!
//! QPay authenticates merchants with HTTP Basic credentials and returns a
//! short-lived access token plus a refresh token. This client follows the
//! [Eager][RefreshPolicy::Eager] policy: as long as the refresh token is
//! valid, every call refreshes the access token first.
//!
//! # Example
//! ```no_run
//! # use mobile_payments::qpay::{Client, CreateInvoiceRequest};
//! # async fn sample() -> anyhow::Result<()> {
//! let client = Client::builder("username", "password", "MY_INVOICE_CODE").build()?;
//! let request = CreateInvoiceRequest {
//!     sender_invoice_no: "1234567".into(),
//!     invoice_receiver_code: "terminal".into(),
//!     invoice_description: "order #42".into(),
//!     amount: 100.0,
//!     callback_url: "https://example.com/callback?payment_id=1234567".into(),
//! };
//! let response = client.create_invoice(&request, None).await?;
//! println!("scan {}", response.data.qr_text);
//! # Ok(()) }
//! ```
//!
//! [QPay]: https://developer.qpay.mn

use crate::build_errors::{Error as BuildError, required_env};
use crate::constants::{QPAY_ENDPOINT, QPAY_INVOICE_OBJECT_TYPE};
use crate::errors::Error;
use crate::headers_util::{build_basic_header, build_bearer_header};
use crate::http::{ReqwestClient, first_str, is_set};
use crate::policy::{RefreshPolicy, TokenEndpoint, ensure_token};
use crate::token::{Response, Token};
use crate::{Provider, Result};
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const USERNAME_VAR: &str = "QPAY_USERNAME";
const PASSWORD_VAR: &str = "QPAY_PASSWORD";
const INVOICE_CODE_VAR: &str = "QPAY_INVOICE_CODE";
const ENDPOINT_VAR: &str = "QPAY_ENDPOINT";

/// A builder for [Client].
///
/// # Example
/// ```
/// # use mobile_payments::qpay::Builder;
/// let client = Builder::new("username", "password", "MY_INVOICE_CODE")
///     .with_endpoint("https://merchant-sandbox.qpay.mn")
///     .build();
/// ```
pub struct Builder {
    username: String,
    password: String,
    invoice_code: String,
    endpoint: Option<String>,
    http_client: Option<reqwest::Client>,
}

impl Builder {
    /// Creates a new builder with the merchant credentials and the invoice
    /// code assigned by QPay.
    pub fn new<U, P, C>(username: U, password: P, invoice_code: C) -> Self
    where
        U: Into<String>,
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            username: username.into(),
            password: password.into(),
            invoice_code: invoice_code.into(),
            endpoint: None,
            http_client: None,
        }
    }

    /// Creates a new builder from the `QPAY_USERNAME`, `QPAY_PASSWORD` and
    /// `QPAY_INVOICE_CODE` environment variables.
    ///
    /// If `QPAY_ENDPOINT` is set, it overrides the default endpoint.
    pub fn from_env() -> std::result::Result<Self, BuildError> {
        let builder = Self::new(
            required_env(USERNAME_VAR)?,
            required_env(PASSWORD_VAR)?,
            required_env(INVOICE_CODE_VAR)?,
        );
        Ok(match std::env::var(ENDPOINT_VAR) {
            Ok(endpoint) => builder.with_endpoint(endpoint),
            Err(_) => builder,
        })
    }

    /// Sets the endpoint. Defaults to `https://merchant.qpay.mn`.
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the HTTP client, for example, to configure timeouts or proxies.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Returns a [Client] with the configured settings.
    pub fn build(self) -> std::result::Result<Client, BuildError> {
        let endpoint = self.endpoint.unwrap_or_else(|| QPAY_ENDPOINT.to_string());
        let http = ReqwestClient::new(Provider::QPay, endpoint, self.http_client)?;
        Ok(Client {
            http,
            credentials: Credentials {
                username: self.username,
                password: self.password,
            },
            invoice_code: self.invoice_code,
        })
    }
}

/// A client for the QPay merchant API.
#[derive(Clone, Debug)]
pub struct Client {
    http: ReqwestClient,
    credentials: Credentials,
    invoice_code: String,
}

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[censored]")
            .finish()
    }
}

impl Client {
    /// Returns a builder for a client using the given credentials.
    pub fn builder<U, P, C>(username: U, password: P, invoice_code: C) -> Builder
    where
        U: Into<String>,
        P: Into<String>,
        C: Into<String>,
    {
        Builder::new(username, password, invoice_code)
    }

    /// Exchanges the merchant credentials for a new token.
    ///
    /// The authenticated operations call this automatically when needed.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn login(&self) -> Result<Token> {
        let auth = build_basic_header(&self.credentials.username, &self.credentials.password)?;
        let builder = self
            .http
            .prepare_request(Method::POST, "/v2/auth/token")
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(AUTHORIZATION, auth);
        let response: TokenResponse = self.http.execute_as(builder, check_token_error).await?;
        Ok(response.into())
    }

    /// Exchanges the refresh token for a new token.
    ///
    /// The authenticated operations call this automatically when needed.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn refresh_token(&self, token: &Token) -> Result<Token> {
        let auth = build_bearer_header(&token.refresh_token)?;
        let builder = self
            .http
            .prepare_request(Method::POST, "/v2/auth/refresh")
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(AUTHORIZATION, auth);
        let response: TokenResponse = self.http.execute_as(builder, check_token_error).await?;
        Ok(response.into())
    }

    /// Creates an invoice.
    ///
    /// The invoice code configured in the builder is added to the request.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(sender_invoice_no = %input.sender_invoice_no)
    )]
    pub async fn create_invoice(
        &self,
        input: &CreateInvoiceRequest,
        token: Option<Token>,
    ) -> Result<Response<InvoiceResponse>> {
        let token = ensure_token(self, token).await?;
        let body = InvoiceRequestBody {
            input,
            invoice_code: &self.invoice_code,
        };
        let builder = self
            .http
            .prepare_request(Method::POST, "/v2/invoice")
            .header(AUTHORIZATION, build_bearer_header(&token.access_token)?)
            .json(&body);
        let data = self.http.execute_as(builder, check_error).await?;
        Ok(Response { data, token })
    }

    /// Checks the payments made for an invoice.
    ///
    /// The response is returned as-is, applications should inspect
    /// [InvoiceCheckResponse::rows] to determine if the invoice is paid.
    #[tracing::instrument(level = "debug", skip(self, token))]
    pub async fn check_invoice(
        &self,
        invoice_id: &str,
        token: Option<Token>,
    ) -> Result<Response<InvoiceCheckResponse>> {
        let token = ensure_token(self, token).await?;
        let body = PaymentCheckRequest {
            object_type: QPAY_INVOICE_OBJECT_TYPE,
            object_id: invoice_id,
        };
        let builder = self
            .http
            .prepare_request(Method::POST, "/v2/payment/check")
            .header(AUTHORIZATION, build_bearer_header(&token.access_token)?)
            .json(&body);
        let data = self.http.execute_as(builder, check_error).await?;
        Ok(Response { data, token })
    }
}

#[async_trait::async_trait]
impl TokenEndpoint for Client {
    fn provider(&self) -> Provider {
        Provider::QPay
    }

    fn policy(&self) -> RefreshPolicy {
        RefreshPolicy::Eager
    }

    async fn login(&self) -> Result<Token> {
        Client::login(self).await
    }

    async fn refresh(&self, token: Token) -> Result<Token> {
        self.refresh_token(&token).await
    }
}

/// QPay reports errors as `{"error": "CODE", "message": "text"}`.
fn check_error(value: &Value) -> Result<()> {
    if !is_set(value, "error") {
        return Ok(());
    }
    let message = first_str(value, &["message", "error"]).unwrap_or("unknown QPay error");
    Err(Error::business(Provider::QPay, message))
}

fn check_token_error(value: &Value) -> Result<()> {
    check_error(value).map_err(Error::into_authentication)
}

/// The fields required to create a QPay invoice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    /// The merchant's own invoice number.
    pub sender_invoice_no: String,
    /// Identifies the payer or terminal, as agreed with QPay.
    pub invoice_receiver_code: String,
    pub invoice_description: String,
    pub amount: f64,
    /// QPay calls this URL when the invoice is paid.
    pub callback_url: String,
}

#[derive(Serialize)]
struct InvoiceRequestBody<'a> {
    #[serde(flatten)]
    input: &'a CreateInvoiceRequest,
    invoice_code: &'a str,
}

#[derive(Serialize)]
struct PaymentCheckRequest<'a> {
    object_type: &'a str,
    object_id: &'a str,
}

/// The response of a successful invoice creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub invoice_id: String,
    /// The QR code contents.
    pub qr_text: String,
    /// The QR code as a base64-encoded PNG image.
    pub qr_image: String,
    #[serde(rename = "qPay_shortUrl", default, skip_serializing_if = "Option::is_none")]
    pub qpay_short_url: Option<String>,
    /// Deep links into the bank applications that can pay the invoice.
    #[serde(default)]
    pub urls: Vec<BankUrl>,
}

/// A deep link into a bank application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BankUrl {
    pub name: String,
    pub description: String,
    pub logo: String,
    pub link: String,
}

/// The response of a payment check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCheckResponse {
    pub count: i64,
    pub paid_amount: f64,
    #[serde(default)]
    pub rows: Vec<Payment>,
}

/// A payment made towards an invoice.
///
/// QPay omits or nulls some fields depending on the payment type. Such
/// fields decode as empty values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, deserialize_with = "nullable")]
    pub payment_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_amount: String,
    #[serde(default, deserialize_with = "nullable")]
    pub trx_fee: String,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_currency: String,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_wallet: String,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_type: String,
    #[serde(default)]
    pub next_payment_date: Value,
    #[serde(default)]
    pub next_payment_datetime: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub card_transactions: Vec<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub p2p_transactions: Vec<P2pTransaction>,
}

/// A bank-to-bank transfer that settled a payment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct P2pTransaction {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub transaction_bank_code: String,
    #[serde(default, deserialize_with = "nullable")]
    pub account_bank_code: String,
    #[serde(default, deserialize_with = "nullable")]
    pub account_bank_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub account_number: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub amount: String,
    #[serde(default, deserialize_with = "nullable")]
    pub currency: String,
    #[serde(default, deserialize_with = "nullable")]
    pub settlement_status: String,
}

/// Decodes `null` and missing values as `T::default()`.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    /// Unix timestamp.
    expires_in: i64,
    /// Unix timestamp.
    refresh_expires_in: i64,
}

impl From<TokenResponse> for Token {
    fn from(value: TokenResponse) -> Self {
        Token {
            access_token: value.access_token,
            refresh_token: value.refresh_token,
            refresh_expires_in: Some(value.refresh_expires_in),
            expires_in: value.expires_in,
        }
    }
}
