//! Delegated access tokens for the Graph-backed collaborators.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use tokio::sync::Mutex;

use crate::error::AuthError;

/// A bearer token with its expiry.
#[derive(Clone)]
pub struct AccessToken {
    secret: SecretString,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(secret: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self { secret, expires_at }
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Source of delegated access tokens for a fixed scope set.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Acquire a token covering `scopes` on behalf of the signed-in user.
    ///
    /// A provider that cannot mint the token without fresh user consent
    /// returns `AuthError::ConsentRequired`.
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessToken, AuthError>;
}

/// Token source over a pre-acquired delegated bearer token.
///
/// The token is minted and refreshed outside the process (identity sidecar)
/// and handed in via configuration; expiry is stamped at one hour from
/// acquisition.
pub struct BearerTokenSource {
    token: SecretString,
}

impl BearerTokenSource {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for BearerTokenSource {
    async fn access_token(&self, _scopes: &[&str]) -> Result<AccessToken, AuthError> {
        Ok(AccessToken::new(
            self.token.clone(),
            Utc::now() + Duration::hours(1),
        ))
    }
}

/// Caching decorator: re-acquires from the inner source only once the held
/// token has expired. Assumes the wrapped source serves a single scope set
/// (true here: every collaborator uses [`super::REQUIRED_SCOPES`]).
pub struct CachedTokenSource<S> {
    inner: S,
    cached: Mutex<Option<AccessToken>>,
}

impl<S: TokenSource> CachedTokenSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<S: TokenSource> TokenSource for CachedTokenSource<S> {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessToken, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && !token.is_expired()
        {
            return Ok(token.clone());
        }

        tracing::debug!("Cached token missing or expired, acquiring a fresh one");
        let token = self.inner.access_token(scopes).await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}
