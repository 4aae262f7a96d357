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

use crate::build_errors::Error as BuildError;
use crate::errors::Error;
use crate::{Provider, Result};
use serde_json::Value;
use tracing::Instrument;

/// A thin wrapper over `reqwest::Client` bound to one provider endpoint.
#[derive(Clone, Debug)]
pub(crate) struct ReqwestClient {
    inner: reqwest::Client,
    endpoint: String,
    provider: Provider,
}

impl ReqwestClient {
    pub(crate) fn new(
        provider: Provider,
        endpoint: String,
        inner: Option<reqwest::Client>,
    ) -> std::result::Result<Self, BuildError> {
        let inner = match inner {
            Some(c) => c,
            None => reqwest::Client::builder()
                .build()
                .map_err(BuildError::transport)?,
        };
        Ok(Self {
            inner,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            provider,
        })
    }

    pub(crate) fn prepare_request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> reqwest::RequestBuilder {
        self.inner.request(method, format!("{}{path}", &self.endpoint))
    }

    /// Sends the request and returns the decoded JSON body.
    ///
    /// `check` inspects the body for the provider's error envelope. It runs
    /// before the HTTP status is considered, so provider messages are
    /// preserved even when they arrive with an error status code.
    pub(crate) async fn execute<F>(
        &self,
        builder: reqwest::RequestBuilder,
        check: F,
    ) -> Result<Value>
    where
        F: FnOnce(&Value) -> Result<()>,
    {
        let request = builder.build()?;
        let span = tracing::info_span!(
            "http_request",
            provider = %self.provider,
            method = %request.method(),
            url = %request.url(),
            status = tracing::field::Empty,
        );
        let response = self
            .inner
            .execute(request)
            .instrument(span.clone())
            .await?;
        let status = response.status();
        span.record("status", status.as_u16());
        let body = response.text().instrument(span.clone()).await?;

        let _enter = span.enter();
        let value = match serde_json::from_str::<Value>(&body) {
            Ok(v) => v,
            Err(_) if !status.is_success() => {
                tracing::warn!("request failed without a JSON body");
                return Err(Error::status(self.provider, status, body));
            }
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = check(&value) {
            tracing::warn!(error = %e, "provider reported an error");
            return Err(e);
        }
        if !status.is_success() {
            tracing::warn!("request failed");
            return Err(Error::status(self.provider, status, body));
        }
        Ok(value)
    }

    /// Like `execute()`, but decodes the body into a provider-specific type.
    pub(crate) async fn execute_as<O, F>(
        &self,
        builder: reqwest::RequestBuilder,
        check: F,
    ) -> Result<O>
    where
        O: serde::de::DeserializeOwned,
        F: FnOnce(&Value) -> Result<()>,
    {
        let value = self.execute(builder, check).await?;
        Ok(serde_json::from_value::<O>(value)?)
    }
}

/// The characters percent encoded in a path segment.
///
/// Besides controls and space, this covers the URL delimiters and the
/// characters reserved by RFC 3986.
const ENCODED_CHARS: percent_encoding::AsciiSet = percent_encoding::CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent encode a value used as a single path segment.
pub(crate) fn enc(value: &str) -> String {
    percent_encoding::utf8_percent_encode(value, &ENCODED_CHARS).to_string()
}

/// Returns the first string found in `fields`, skipping empty values.
pub(crate) fn first_str<'a>(value: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|f| value.get(*f).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// Returns true if the field is present and not `null`, `false` or empty.
pub(crate) fn is_set(value: &Value, field: &str) -> bool {
    match value.get(field) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
