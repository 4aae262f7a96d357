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

//! Verify how each client treats the token provided by the application.

use httptest::{Expectation, Server, matchers::*, responders::*};
use mobile_payments::token::Token;
use mobile_payments::{qpay, storepay, ubpay};
use serde_json::{Value, json};

type Result<T> = anyhow::Result<T>;

fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

fn enable_tracing() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::fmt::format::FmtSpan;
    let subscriber = tracing_subscriber::fmt()
        .with_level(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

fn token(expires_in: i64, refresh_expires_in: Option<i64>) -> Token {
    Token {
        access_token: "saved-access".to_string(),
        refresh_token: "saved-refresh".to_string(),
        refresh_expires_in,
        expires_in,
    }
}

mod qpay_tests {
    use super::*;

    fn client(server: &Server) -> Result<qpay::Client> {
        Ok(qpay::Client::builder("user", "password", "INVOICE_CODE")
            .with_endpoint(server.url_str(""))
            .build()?)
    }

    fn token_body(access_token: &str) -> Value {
        json!({
            "token_type": "bearer",
            "access_token": access_token,
            "refresh_token": format!("{access_token}-refresh"),
            "expires_in": now() + 3600,
            "refresh_expires_in": now() + 7200,
        })
    }

    fn expect_check(server: &Server, bearer: &'static str) {
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v2/payment/check"),
                request::headers(contains(("authorization", bearer))),
            ])
            .respond_with(json_encoded(json!({"count": 0, "paid_amount": 0, "rows": []}))),
        );
    }

    #[tokio::test]
    async fn no_token_logs_in_once() -> Result<()> {
        let _guard = enable_tracing();
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v2/auth/token"))
                .times(1)
                .respond_with(json_encoded(token_body("login"))),
        );
        server.expect(
            Expectation::matching(request::method_path("POST", "/v2/auth/refresh"))
                .times(0)
                .respond_with(status_code(500)),
        );
        expect_check(&server, "Bearer login");

        let response = client(&server)?.check_invoice("invoice-1", None).await?;
        assert_eq!(response.token.access_token, "login");
        assert_eq!(response.data.count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn valid_token_is_refreshed() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v2/auth/token"))
                .times(0)
                .respond_with(status_code(500)),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v2/auth/refresh"),
                request::headers(contains(("authorization", "Bearer saved-refresh"))),
            ])
            .times(1)
            .respond_with(json_encoded(token_body("refreshed"))),
        );
        expect_check(&server, "Bearer refreshed");

        let saved = token(now() + 3600, Some(now() + 7200));
        let response = client(&server)?.check_invoice("invoice-1", Some(saved)).await?;
        assert_eq!(response.token.access_token, "refreshed");
        Ok(())
    }

    #[tokio::test]
    async fn expired_refresh_token_logs_in() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v2/auth/token"))
                .times(1)
                .respond_with(json_encoded(token_body("login"))),
        );
        server.expect(
            Expectation::matching(request::method_path("POST", "/v2/auth/refresh"))
                .times(0)
                .respond_with(status_code(500)),
        );
        expect_check(&server, "Bearer login");

        let saved = token(now() + 3600, Some(now() - 1));
        let response = client(&server)?.check_invoice("invoice-1", Some(saved)).await?;
        assert_eq!(response.token.access_token, "login");
        Ok(())
    }

    #[tokio::test]
    async fn login_error_message() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v2/auth/token")).respond_with(
                status_code(401).body(
                    json!({
                        "error": "AUTHENTICATION_FAILED",
                        "message": "Invalid username or password",
                    })
                    .to_string(),
                ),
            ),
        );
        server.expect(
            Expectation::matching(request::method_path("POST", "/v2/payment/check"))
                .times(0)
                .respond_with(status_code(500)),
        );

        let err = client(&server)?
            .check_invoice("invoice-1", None)
            .await
            .unwrap_err();
        assert!(err.is_authentication(), "{err:?}");
        assert_eq!(err.to_string(), "Invalid username or password");
        Ok(())
    }
}

mod storepay_tests {
    use super::*;

    fn client(server: &Server) -> Result<storepay::Client> {
        Ok(
            storepay::Client::builder("88000000", "password", "merchantapp", "app-password")
                .with_endpoint(server.url_str(""))
                .build()?,
        )
    }

    fn check_body() -> Value {
        json!({"value": false, "data": {}, "msgList": [], "attrs": {}, "status": "Success"})
    }

    #[tokio::test]
    async fn check_invoice_without_token() -> Result<()> {
        let _guard = enable_tracing();
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/merchant-uaa/oauth/token"),
                request::body(url_decoded(contains(("grant_type", "password")))),
            ])
            .times(1)
            .respond_with(json_encoded(json!({
                "access_token": "storepay-access",
                "token_type": "bearer",
                "refresh_token": "storepay-refresh",
                "expires_in": 43199,
                "scope": "merchant",
            }))),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/lend-merchant/merchant/loan/check/12345"),
                request::headers(contains(("authorization", "Bearer storepay-access"))),
            ])
            .times(1)
            .respond_with(json_encoded(check_body())),
        );

        let response = client(&server)?.check_invoice("12345", None).await?;
        assert!(!response.data.value);
        assert_eq!(response.data.status, "Success");
        assert_eq!(response.token.access_token, "storepay-access");
        assert!(response.token.expires_in > now(), "{:?}", response.token);
        Ok(())
    }

    #[tokio::test]
    async fn returned_token_is_reused() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/merchant-uaa/oauth/token"))
                .times(1)
                .respond_with(json_encoded(json!({
                    "access_token": "storepay-access",
                    "refresh_token": "storepay-refresh",
                    "expires_in": 43199,
                }))),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/lend-merchant/merchant/loan/check/12345",
            ))
            .times(2)
            .respond_with(json_encoded(check_body())),
        );

        let client = client(&server)?;
        let first = client.check_invoice("12345", None).await?;
        let saved: Token = serde_json::from_str(&serde_json::to_string(&first.token)?)?;
        let second = client.check_invoice("12345", Some(saved)).await?;
        assert_eq!(second.token, first.token);
        Ok(())
    }

    #[tokio::test]
    async fn expired_token_logs_in() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/merchant-uaa/oauth/token"))
                .times(1)
                .respond_with(json_encoded(json!({
                    "access_token": "storepay-access",
                    "refresh_token": "storepay-refresh",
                    "expires_in": 43199,
                }))),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/lend-merchant/merchant/loan/check/12345"),
                request::headers(contains(("authorization", "Bearer storepay-access"))),
            ])
            .respond_with(json_encoded(check_body())),
        );

        let saved = token(now() - 1, None);
        let response = client(&server)?.check_invoice("12345", Some(saved)).await?;
        assert_eq!(response.token.access_token, "storepay-access");
        Ok(())
    }

    #[tokio::test]
    async fn login_error_message() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/merchant-uaa/oauth/token"))
                .respond_with(status_code(400).body(
                    json!({"error": "invalid_grant", "error_description": "Bad credentials"})
                        .to_string(),
                )),
        );

        let err = client(&server)?
            .check_invoice("12345", None)
            .await
            .unwrap_err();
        assert!(err.is_authentication(), "{err:?}");
        assert_eq!(err.to_string(), "Bad credentials");
        Ok(())
    }
}

mod ubpay_tests {
    use super::*;

    fn client(server: &Server) -> Result<ubpay::Client> {
        Ok(ubpay::Client::builder("client-id", "client-secret")
            .with_endpoint(server.url_str(""))
            .build()?)
    }

    fn login_body() -> Value {
        json!({
            "success": true,
            "data": {
                "refreshToken": "ubpay-refresh",
                "accessToken": "ubpay-access",
                "refreshTokenExpiresIn": now() + 86400,
                "accessTokenExpiresIn": now() + 3600,
                "tokenType": "Bearer",
            }
        })
    }

    fn expect_invoice(server: &Server, bearer: &'static str) {
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/v1/invoices/INV-1"),
                request::headers(contains(("authorization", bearer))),
            ])
            .respond_with(json_encoded(json!({
                "success": true,
                "data": {
                    "invoiceNumber": "INV-1",
                    "status": "open",
                    "amount": 1000,
                    "qrCode": "qr",
                    "description": "test",
                }
            }))),
        );
    }

    #[tokio::test]
    async fn no_token_logs_in_once() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/auth/token"))
                .times(1)
                .respond_with(json_encoded(login_body())),
        );
        server.expect(
            Expectation::matching(request::method_path("POST", "/auth/refresh-token"))
                .times(0)
                .respond_with(status_code(500)),
        );
        expect_invoice(&server, "Bearer ubpay-access");

        let response = client(&server)?.check_invoice("INV-1", None).await?;
        assert_eq!(response.data.data.status, ubpay::InvoiceStatus::Open);
        assert_eq!(response.token.refresh_token, "ubpay-refresh");
        Ok(())
    }

    #[tokio::test]
    async fn token_without_refresh_expiration_logs_in() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/auth/token"))
                .times(1)
                .respond_with(json_encoded(login_body())),
        );
        server.expect(
            Expectation::matching(request::method_path("POST", "/auth/refresh-token"))
                .times(0)
                .respond_with(status_code(500)),
        );
        expect_invoice(&server, "Bearer ubpay-access");

        let saved = token(now() + 3600, None);
        let response = client(&server)?.check_invoice("INV-1", Some(saved)).await?;
        assert_eq!(response.token.access_token, "ubpay-access");
        Ok(())
    }

    #[tokio::test]
    async fn expired_refresh_token_logs_in() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/auth/token"))
                .times(1)
                .respond_with(json_encoded(login_body())),
        );
        server.expect(
            Expectation::matching(request::method_path("POST", "/auth/refresh-token"))
                .times(0)
                .respond_with(status_code(500)),
        );
        expect_invoice(&server, "Bearer ubpay-access");

        let saved = token(now() - 60, Some(now() - 1));
        let response = client(&server)?.check_invoice("INV-1", Some(saved)).await?;
        assert_eq!(response.token.access_token, "ubpay-access");
        Ok(())
    }

    #[tokio::test]
    async fn returned_token_is_reused() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/auth/token"))
                .times(1)
                .respond_with(json_encoded(login_body())),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/v1/invoices/INV-1"))
                .times(2)
                .respond_with(json_encoded(json!({
                    "success": true,
                    "data": {
                        "invoiceNumber": "INV-1",
                        "status": "paid",
                        "amount": 1000,
                        "qrCode": "qr",
                        "description": "test",
                    }
                }))),
        );

        let client = client(&server)?;
        let first = client.check_invoice("INV-1", None).await?;
        let second = client.check_invoice("INV-1", Some(first.token.clone())).await?;
        assert_eq!(second.token, first.token);
        assert_eq!(second.data.data.status, ubpay::InvoiceStatus::Paid);
        Ok(())
    }

    #[tokio::test]
    async fn login_error_message() -> Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/auth/token")).respond_with(
                json_encoded(json!({
                    "success": false,
                    "error": {"code": 401, "message": "Client not found", "isReadableMessage": true}
                })),
            ),
        );

        let err = client(&server)?
            .check_invoice("INV-1", None)
            .await
            .unwrap_err();
        assert!(err.is_authentication(), "{err:?}");
        assert_eq!(err.to_string(), "Client not found");
        Ok(())
    }
}
