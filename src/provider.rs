//! Hosted auth provider (GoTrue-compatible REST API).
//!
//! Only three calls are needed: send a magic link, send an admin invite and
//! exchange the callback code for the signed-in user's email.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub email: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    async fn send_magic_link(&self, email: &str, redirect_to: &str, challenge: &str)
        -> Result<()>;

    async fn invite_user_by_email(
        &self,
        email: &str,
        redirect_to: &str,
        invited_by: &str,
    ) -> Result<()>;

    /// `verifier` is present for magic links started by this server. Invite
    /// links carry no verifier and are redeemed as an invite token hash.
    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<ProviderSession>;
}

pub struct GoTrueProvider {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: Option<String>,
}

impl GoTrueProvider {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.auth_provider_url.clone(),
            anon_key: config.auth_provider_anon_key.clone(),
            service_key: config.auth_provider_service_key.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    email: Option<String>,
}

#[async_trait]
impl AuthProvider for GoTrueProvider {
    async fn send_magic_link(
        &self,
        email: &str,
        redirect_to: &str,
        challenge: &str,
    ) -> Result<()> {
        let payload = json!({
            "email": email,
            "create_user": false,
            "code_challenge": challenge,
            "code_challenge_method": "s256",
        });

        debug!(%email, "requesting magic link");
        let response = self
            .client
            .post(self.endpoint("otp"))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.anon_key)
            .json(&payload)
            .send()
            .await
            .context("auth provider unreachable")?;

        ensure_success(response).await.map(|_| ())
    }

    async fn invite_user_by_email(
        &self,
        email: &str,
        redirect_to: &str,
        invited_by: &str,
    ) -> Result<()> {
        let service_key = self
            .service_key
            .as_deref()
            .ok_or_else(|| anyhow!("Invitations are not configured"))?;

        let payload = json!({
            "email": email,
            "data": { "invited_by": invited_by },
        });

        debug!(%email, %invited_by, "requesting provider invite");
        let response = self
            .client
            .post(self.endpoint("invite"))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .json(&payload)
            .send()
            .await
            .context("auth provider unreachable")?;

        ensure_success(response).await.map(|_| ())
    }

    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<ProviderSession> {
        let request = match verifier {
            Some(verifier) => self
                .client
                .post(self.endpoint("token"))
                .query(&[("grant_type", "pkce")])
                .json(&json!({ "auth_code": code, "code_verifier": verifier })),
            None => self
                .client
                .post(self.endpoint("verify"))
                .json(&json!({ "type": "invite", "token_hash": code })),
        };

        let response = request
            .header("apikey", &self.anon_key)
            .send()
            .await
            .context("auth provider unreachable")?;

        let response = ensure_success(response).await?;
        let token: TokenResponse = response
            .json()
            .await
            .context("auth provider returned an unexpected session payload")?;
        let email = token
            .user
            .email
            .ok_or_else(|| anyhow!("auth provider session has no email"))?;

        Ok(ProviderSession {
            email: email.to_lowercase(),
        })
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!(%status, body = %body, "auth provider request failed");
    Err(anyhow!(
        provider_message(&body).unwrap_or_else(|| format!("auth provider returned {status}"))
    ))
}

/// The provider reports errors under one of several keys depending on the endpoint.
fn provider_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
