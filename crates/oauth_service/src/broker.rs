use domain::OAuthCredential;
use serde::Deserialize;
use tokio::sync::RwLock;
use url::Url;

use crate::AuthError;

pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scope needed to edit videos and manage comments
pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

/// OAuth client registration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
}

impl OAuthConfig {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Token endpoint response, Google OAuth2 format
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Exchanges authorization codes and hands out the current access token.
///
/// Holds a single credential for the whole process; a new exchange
/// overwrites it.
pub struct OAuthBroker {
    http: reqwest::Client,
    config: OAuthConfig,
    credential: RwLock<Option<OAuthCredential>>,
}

impl OAuthBroker {
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: OAuthConfig) -> Self {
        Self {
            http,
            config,
            credential: RwLock::new(None),
        }
    }

    /// Consent screen URL the user is redirected to
    pub fn auth_url(&self) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("scope", YOUTUBE_SCOPE),
            ],
        )?;
        Ok(url.into())
    }

    /// Exchange an authorization code for a token pair and keep it
    pub async fn exchange_code(&self, code: &str) -> Result<(), AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::MissingCode);
        }

        let token = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .await?;

        let credential = OAuthCredential::new(
            token.access_token,
            token.refresh_token,
            token.expires_in,
            token.scope,
        );
        self.store_credential(credential).await;
        tracing::info!("authorization code exchanged");
        Ok(())
    }

    /// Replace the held credential
    pub async fn store_credential(&self, credential: OAuthCredential) {
        *self.credential.write().await = Some(credential);
    }

    /// Holds a credential that is still valid or can be refreshed
    pub async fn is_authenticated(&self) -> bool {
        self.credential
            .read()
            .await
            .as_ref()
            .is_some_and(|credential| !credential.is_expired() || credential.can_refresh())
    }

    /// Current bearer token, refreshed first when it has expired
    pub async fn access_token(&self) -> Result<String, AuthError> {
        {
            let guard = self.credential.read().await;
            match guard.as_ref() {
                None => return Err(AuthError::NotAuthenticated),
                Some(credential) if !credential.is_expired() => {
                    return Ok(credential.access_token.clone());
                }
                Some(_) => {}
            }
        }

        let mut guard = self.credential.write().await;
        let current = guard.as_ref().ok_or(AuthError::NotAuthenticated)?;
        // Another request may have refreshed while we waited for the lock.
        if !current.is_expired() {
            return Ok(current.access_token.clone());
        }
        if !current.can_refresh() {
            return Err(AuthError::Expired);
        }
        let refresh_token = current.refresh_token.clone().unwrap_or_default();

        let token = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .await?;

        let credential = OAuthCredential::new(
            token.access_token,
            token.refresh_token.or(Some(refresh_token)),
            token.expires_in,
            token.scope.or_else(|| current.scope.clone()),
        );
        let access_token = credential.access_token.clone();
        *guard = Some(credential);
        tracing::info!("access token refreshed");
        Ok(access_token)
    }

    /// Access token when one is usable, `None` otherwise; used for reads
    /// that can fall back to the API key
    pub async fn optional_access_token(&self) -> Option<String> {
        match self.access_token().await {
            Ok(token) => Some(token),
            Err(AuthError::NotAuthenticated) => None,
            Err(err) => {
                tracing::warn!(error = %err, "no usable access token, falling back to API key");
                None
            }
        }
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<TokenResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker() -> OAuthBroker {
        OAuthBroker::new(OAuthConfig::new(
            "client-1".into(),
            "secret".into(),
            "http://localhost:3000/auth/callback".into(),
        ))
    }

    #[test]
    fn auth_url_carries_client_and_scope() {
        let url = Url::parse(&broker().auth_url().unwrap()).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-1");
        assert_eq!(params["redirect_uri"], "http://localhost:3000/auth/callback");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["scope"], YOUTUBE_SCOPE);
    }

    #[tokio::test]
    async fn blank_code_is_rejected_before_any_request() {
        let err = broker().exchange_code("  ").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCode));
    }

    #[tokio::test]
    async fn no_credential_means_not_authenticated() {
        let broker = broker();
        assert!(!broker.is_authenticated().await);
        assert!(matches!(
            broker.access_token().await,
            Err(AuthError::NotAuthenticated)
        ));
        assert_eq!(broker.optional_access_token().await, None);
    }

    #[tokio::test]
    async fn fresh_credential_is_returned_as_is() {
        let broker = broker();
        broker
            .store_credential(OAuthCredential::new("ya29.a".into(), None, Some(3600), None))
            .await;
        assert_eq!(broker.access_token().await.unwrap(), "ya29.a");
    }

    #[tokio::test]
    async fn expired_credential_without_refresh_token_fails() {
        let broker = broker();
        broker
            .store_credential(OAuthCredential::new("ya29.a".into(), None, Some(-10), None))
            .await;
        assert!(matches!(broker.access_token().await, Err(AuthError::Expired)));
        assert_eq!(broker.optional_access_token().await, None);
        assert!(!broker.is_authenticated().await);
    }

    #[tokio::test]
    async fn expired_credential_with_refresh_token_still_counts_as_authenticated() {
        let broker = broker();
        broker
            .store_credential(OAuthCredential::new(
                "ya29.a".into(),
                Some("1//r".into()),
                Some(-10),
                None,
            ))
            .await;
        assert!(broker.is_authenticated().await);
    }
}
