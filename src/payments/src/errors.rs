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

//! Errors returned by the provider clients.

use crate::Provider;
use http::StatusCode;

/// The error type for all provider operations.
///
/// Errors reported by the providers themselves (rejected credentials, invalid
/// invoices) format as the provider's own message, without any decoration.
/// Transport and parsing errors are returned transparently: their `Display`
/// and `source()` are those of the underlying [reqwest::Error] or
/// [serde_json::Error].
///
/// # Example
/// ```
/// # use mobile_payments::errors::Error;
/// fn report(e: &Error) {
///     if e.is_authentication() {
///         println!("check the configured credentials: {e}");
///     } else if e.is_business() {
///         println!("the provider rejected the request: {e}");
///     }
/// }
/// ```
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    /// The provider rejected the credentials or the refresh token.
    pub fn is_authentication(&self) -> bool {
        matches!(self.0, ErrorKind::Authentication { .. })
    }

    /// The provider accepted the request but reported a failure.
    pub fn is_business(&self) -> bool {
        matches!(self.0, ErrorKind::Business { .. })
    }

    /// The request could not be sent, or the response could not be read.
    pub fn is_transport(&self) -> bool {
        matches!(self.0, ErrorKind::Transport(_))
    }

    /// The response was not in the format expected for this provider.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.0, ErrorKind::Deserialize(_))
    }

    /// The provider returned an HTTP error without a JSON body.
    pub fn is_http_status(&self) -> bool {
        matches!(self.0, ErrorKind::Status { .. })
    }

    /// The provider does not offer a refresh endpoint.
    pub fn is_refresh_unsupported(&self) -> bool {
        matches!(self.0, ErrorKind::RefreshUnsupported { .. })
    }

    /// The provider that produced this error, if known.
    pub fn provider(&self) -> Option<Provider> {
        match &self.0 {
            ErrorKind::Authentication { provider, .. }
            | ErrorKind::Business { provider, .. }
            | ErrorKind::Status { provider, .. }
            | ErrorKind::RefreshUnsupported { provider } => Some(*provider),
            _ => None,
        }
    }

    /// The message reported by the provider, for authentication and business
    /// errors.
    pub fn message(&self) -> Option<&str> {
        match &self.0 {
            ErrorKind::Authentication { message, .. } | ErrorKind::Business { message, .. } => {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    /// The HTTP status code, for errors without a JSON body.
    pub fn http_status_code(&self) -> Option<u16> {
        match &self.0 {
            ErrorKind::Status { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn authentication<T: Into<String>>(provider: Provider, message: T) -> Self {
        Error(ErrorKind::Authentication {
            provider,
            message: message.into(),
        })
    }

    pub(crate) fn business<T: Into<String>>(provider: Provider, message: T) -> Self {
        Error(ErrorKind::Business {
            provider,
            message: message.into(),
        })
    }

    pub(crate) fn status<T: Into<String>>(provider: Provider, status: StatusCode, body: T) -> Self {
        Error(ErrorKind::Status {
            provider,
            status,
            body: body.into(),
        })
    }

    pub(crate) fn refresh_unsupported(provider: Provider) -> Self {
        Error(ErrorKind::RefreshUnsupported { provider })
    }

    /// Reclassifies a business error as an authentication error. Used for
    /// error envelopes returned by the token endpoints.
    pub(crate) fn into_authentication(self) -> Self {
        match self.0 {
            ErrorKind::Business { provider, message } => Self::authentication(provider, message),
            kind => Error(kind),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error(ErrorKind::Transport(value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error(ErrorKind::Deserialize(value))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(value: http::header::InvalidHeaderValue) -> Self {
        Error(ErrorKind::InvalidHeader(value))
    }
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("{message}")]
    Authentication { provider: Provider, message: String },
    #[error("{message}")]
    Business { provider: Provider, message: String },
    #[error("{provider} returned HTTP status {status}: {body}")]
    Status {
        provider: Provider,
        status: StatusCode,
        body: String,
    },
    #[error("{provider} does not support refreshing access tokens")]
    RefreshUnsupported { provider: Provider },
    #[error("cannot create authorization header")]
    InvalidHeader(#[source] http::header::InvalidHeaderValue),
    #[error(transparent)]
    Transport(reqwest::Error),
    #[error(transparent)]
    Deserialize(serde_json::Error),
}
