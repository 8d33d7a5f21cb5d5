//! Credential seam for the remote file host.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::util::now_millis;

const EXPIRY_SKEW_MILLIS: i64 = 60_000;

/// Bearer token for the remote file host
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    /// Unix ms; `None` never expires
    expires_at: Option<i64>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: None,
        }
    }

    #[must_use]
    pub const fn with_expiry(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub const fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= now_millis() + EXPIRY_SKEW_MILLIS)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Supplies credentials for remote calls.
///
/// `ensure_valid_token` may prompt the user to sign in again and can therefore
/// wait indefinitely.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;

    async fn ensure_valid_token(&self) -> Result<AccessToken>;
}

#[async_trait]
impl<T: CredentialProvider + ?Sized> CredentialProvider for Arc<T> {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    async fn ensure_valid_token(&self) -> Result<AccessToken> {
        (**self).ensure_valid_token().await
    }
}

/// Fixed credentials: either signed in with one token or signed out.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<AccessToken>,
}

impl StaticCredentials {
    pub const fn signed_in(token: AccessToken) -> Self {
        Self { token: Some(token) }
    }

    pub const fn signed_out() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn ensure_valid_token(&self) -> Result<AccessToken> {
        match &self.token {
            Some(token) if token.is_expired() => Err(Error::RemoteUnavailable(
                "access token expired; sign in again".to_string(),
            )),
            Some(token) => Ok(token.clone()),
            None => Err(Error::RemoteUnavailable("not signed in".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secret() {
        let token = AccessToken::new("super-secret").with_expiry(42);
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("42"));
    }

    #[test]
    fn expiry_includes_skew() {
        assert!(!AccessToken::new("t").is_expired());
        assert!(AccessToken::new("t").with_expiry(now_millis()).is_expired());
        assert!(!AccessToken::new("t")
            .with_expiry(now_millis() + 10 * EXPIRY_SKEW_MILLIS)
            .is_expired());
    }

    #[tokio::test]
    async fn static_credentials_report_sign_in_state() {
        let signed_in = StaticCredentials::signed_in(AccessToken::new("token"));
        assert!(signed_in.is_authenticated());
        assert_eq!(signed_in.ensure_valid_token().await.unwrap().secret(), "token");

        let signed_out = StaticCredentials::signed_out();
        assert!(!signed_out.is_authenticated());
        assert!(matches!(
            signed_out.ensure_valid_token().await,
            Err(Error::RemoteUnavailable(_))
        ));

        let expired = StaticCredentials::signed_in(AccessToken::new("old").with_expiry(0));
        assert!(expired.ensure_valid_token().await.unwrap_err().is_transient());
    }
}
