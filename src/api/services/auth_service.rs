//! Client for the external authentication service.
//!
//! A bearer credential is exchanged for a user identity with one HTTP call.

use crate::models::UserIdentity;
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("no credential supplied")]
    MissingCredential,
    #[error("unauthorized!")]
    Unauthorized,
    #[error("unknown connection error: {0}")]
    ConnectionFailed(String),
}

/// Exchanges a credential for the identity it belongs to.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credential: &str) -> Result<UserIdentity, AuthError>;
}

/// `POST {base}/users` with the credential as the `Authorization` header.
#[derive(Clone)]
pub struct HttpAuthenticator {
    users_url: Url,
    http_client: reqwest::Client,
}

impl HttpAuthenticator {
    pub fn new(base_url: &Url) -> Result<Self, url::ParseError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            users_url: base.join("users")?,
            http_client: reqwest::Client::new(),
        })
    }

    pub fn users_url(&self) -> &Url {
        &self.users_url
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<UserIdentity, AuthError> {
        if credential.trim().is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let response = self
            .http_client
            .post(self.users_url.clone())
            .header(reqwest::header::AUTHORIZATION, credential)
            .send()
            .await
            .map_err(|e| {
                warn!("[Auth] Request to authentication service failed: {}", e);
                AuthError::ConnectionFailed(e.to_string())
            })?;

        match response.status() {
            StatusCode::OK => {
                let identity: UserIdentity = response.json().await.map_err(|e| {
                    warn!("[Auth] Unreadable identity from authentication service: {}", e);
                    AuthError::ConnectionFailed(e.to_string())
                })?;
                debug!("[Auth] Authenticated user {}", identity.id);
                Ok(identity)
            }
            StatusCode::UNAUTHORIZED => Err(AuthError::Unauthorized),
            status => Err(AuthError::ConnectionFailed(format!(
                "authentication service answered {}",
                status
            ))),
        }
    }
}
