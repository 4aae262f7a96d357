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

//! Clients for Mobile Payment Providers
//!
//! This crate contains thin clients for three mobile payment providers:
//! [QPay][qpay], [StorePay][storepay] and [UbPay][ubpay]. Each client creates
//! invoices (or loans, in the case of StorePay) and checks their payment
//! status.
//!
//! All providers require an access token. The clients do not cache tokens:
//! every authenticated operation takes an optional [Token][token::Token] and
//! returns a [Response][token::Response] containing both the provider data and
//! the token that was used. Applications should persist the returned token
//! and pass it to the next call. The clients decide, per provider, whether the
//! token can be reused, must be refreshed, or a new login is required. See
//! [RefreshPolicy][policy::RefreshPolicy] for the details.
//!
//! # Example
//! ```no_run
//! # use mobile_payments::ubpay::{Client, CreateInvoiceRequest};
//! # async fn sample() -> anyhow::Result<()> {
//! let client = Client::builder("my-client-id", "my-client-secret").build()?;
//! let request = CreateInvoiceRequest {
//!     amount: 1000.0,
//!     description: "order #42".into(),
//!     custom_data: serde_json::json!({"order": 42}),
//!     callback_url: "https://example.com/callback".into(),
//! };
//! let created = client.create_invoice(&request, None).await?;
//! // Save `created.token` and use it in the next call.
//! let status = client
//!     .check_invoice(&created.data.data.invoice_number, Some(created.token))
//!     .await?;
//! println!("{:?}", status.data.data.status);
//! # Ok(()) }
//! ```

pub mod errors;

/// Errors returned by the client builders.
pub mod build_errors;

/// The token shared by all providers.
pub mod token;

/// Decide if a token is reused, refreshed, or replaced by a new login.
pub mod policy;

pub mod qpay;
pub mod storepay;
pub mod ubpay;

pub(crate) mod constants;
pub(crate) mod headers_util;
pub(crate) mod http;

/// A `Result` alias where the `Err` case is `mobile_payments::errors::Error`.
pub type Result<T> = std::result::Result<T, crate::errors::Error>;

/// The payment providers supported by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provider {
    QPay,
    StorePay,
    UbPay,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Provider::QPay => "QPay",
            Provider::StorePay => "StorePay",
            Provider::UbPay => "UbPay",
        };
        write!(f, "{name}")
    }
}
