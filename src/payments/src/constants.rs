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

pub(crate) const QPAY_ENDPOINT: &str = "https://merchant.qpay.mn";
pub(crate) const STOREPAY_ENDPOINT: &str = "https://service.storepay.mn:8778";
pub(crate) const UBPAY_ENDPOINT: &str = "https://merchant-payment-api.dev.p.ubcabtech.com";

/// The OAuth 2.0 grant used by the StorePay login.
pub(crate) const PASSWORD_GRANT_TYPE: &str = "password";

/// The `object_type` for QPay payment checks.
pub(crate) const QPAY_INVOICE_OBJECT_TYPE: &str = "INVOICE";

/// The `status` value in successful StorePay responses.
pub(crate) const STOREPAY_SUCCESS: &str = "Success";
