//! Native `AuthGateway` over reqwest.
//!
//! Mirrors the browser gateway's request shapes and error mapping: bearer
//! header when a credential is held, an in-process cookie jar for cookie
//! sessions, and the server's `detail` message on rejection.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;

use client::config::ApiConfig;
use client::net::api::{
    AuthGateway, EXTERNAL_LOGIN_FALLBACK, EXTERNAL_SESSION_PATH, LOGIN_FALLBACK, LOGIN_PATH, LOGOUT_PATH, ME_PATH,
    REGISTER_FALLBACK, REGISTER_PATH, bearer_header,
};
use client::net::checkout::{STATUS_FALLBACK, checkout_status_path};
use client::net::error::{ApiError, AuthError, detail_message};
use client::net::types::{AuthSession, CheckoutStatus, ExternalLoginSession, UserProfile};
use reqwest::header::AUTHORIZATION;
use serde_json::json;

/// `AuthGateway` for the terminal.
#[derive(Clone, Debug)]
pub struct ReqwestGateway {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ReqwestGateway {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built (TLS backend setup).
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: reqwest::Method, path: &str, credential: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.config.endpoint(path));
        match credential {
            Some(token) => builder.header(AUTHORIZATION, bearer_header(token)),
            None => builder,
        }
    }

    /// Payment state for a checkout session.
    ///
    /// # Errors
    ///
    /// `Status` with the server message on rejection, `Network` or `Decode`
    /// otherwise.
    pub async fn checkout_status(&self, credential: Option<&str>, session_id: &str) -> Result<CheckoutStatus, ApiError> {
        let resp = self
            .request(reqwest::Method::GET, &checkout_status_path(session_id), credential)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), &body, STATUS_FALLBACK));
        }
        resp.json::<CheckoutStatus>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn network(err: reqwest::Error) -> AuthError {
    AuthError::Network(err.to_string())
}

/// Read a non-2xx body and reduce it to a user message.
async fn error_detail(resp: reqwest::Response, fallback: &str) -> String {
    let body = resp.text().await.unwrap_or_default();
    detail_message(&body, fallback)
}

impl AuthGateway for ReqwestGateway {
    async fn check_session(&self, credential: Option<&str>) -> Result<UserProfile, AuthError> {
        let resp = self
            .request(reqwest::Method::GET, ME_PATH, credential)
            .send()
            .await
            .map_err(network)?;
        if !resp.status().is_success() {
            return Err(AuthError::Unauthenticated);
        }
        resp.json::<UserProfile>().await.map_err(network)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let resp = self
            .request(reqwest::Method::POST, LOGIN_PATH, None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(network)?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidCredentials(error_detail(resp, LOGIN_FALLBACK).await));
        }
        resp.json::<AuthSession>().await.map_err(network)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let resp = self
            .request(reqwest::Method::POST, REGISTER_PATH, None)
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .map_err(network)?;
        if !resp.status().is_success() {
            return Err(AuthError::Registration(error_detail(resp, REGISTER_FALLBACK).await));
        }
        resp.json::<AuthSession>().await.map_err(network)
    }

    fn begin_external_login(&self) -> Result<(), AuthError> {
        Err(AuthError::ExternalLogin(
            "Google login needs a browser; sign in on the web app, or pass --session-id from its callback".to_owned(),
        ))
    }

    async fn complete_external_login(&self, session_id: &str) -> Result<ExternalLoginSession, AuthError> {
        let resp = self
            .request(reqwest::Method::POST, EXTERNAL_SESSION_PATH, None)
            .json(&json!({ "session_id": session_id }))
            .send()
            .await
            .map_err(network)?;
        if !resp.status().is_success() {
            return Err(AuthError::ExternalLogin(error_detail(resp, EXTERNAL_LOGIN_FALLBACK).await));
        }
        resp.json::<ExternalLoginSession>().await.map_err(network)
    }

    async fn logout(&self, credential: Option<&str>) {
        match self.request(reqwest::Method::POST, LOGOUT_PATH, credential).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => tracing::warn!(status = resp.status().as_u16(), "logout rejected"),
            Err(err) => tracing::warn!(error = %err, "logout request failed"),
        }
    }
}
