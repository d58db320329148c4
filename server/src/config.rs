use oauth_service::{DEFAULT_AUTH_URL, DEFAULT_TOKEN_URL, OAuthConfig};
use youtube_client::DEFAULT_BASE_URL;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Connection string for the user store; optional.
    pub database_url: Option<String>,
    pub youtube_api_key: String,
    pub youtube_api_base_url: String,
    pub oauth: OAuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                                 |
    /// |------------------------|-----------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                               |
    /// | `PORT`                 | `3000`                                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`                 |
    /// | `DATABASE_URL`         | unset                                   |
    /// | `YOUTUBE_API_KEY`      | required                                |
    /// | `GOOGLE_CLIENT_ID`     | required                                |
    /// | `GOOGLE_CLIENT_SECRET` | required                                |
    /// | `GOOGLE_REDIRECT_URI`  | `http://localhost:3000/auth/callback`   |
    /// | `YOUTUBE_API_BASE_URL` | `https://www.googleapis.com/youtube/v3` |
    /// | `OAUTH_AUTH_URL`       | Google consent endpoint                 |
    /// | `OAUTH_TOKEN_URL`      | Google token endpoint                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port = match var("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value })?,
            None => 3000,
        };

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mut oauth = OAuthConfig::new(
            required("GOOGLE_CLIENT_ID")?,
            required("GOOGLE_CLIENT_SECRET")?,
            var("GOOGLE_REDIRECT_URI")
                .unwrap_or_else(|| format!("http://localhost:{port}/auth/callback")),
        );
        oauth.auth_url = var("OAUTH_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.into());
        oauth.token_url = var("OAUTH_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.into());

        Ok(Self {
            host,
            port,
            cors_origins,
            database_url: var("DATABASE_URL"),
            youtube_api_key: required("YOUTUBE_API_KEY")?,
            youtube_api_base_url: var("YOUTUBE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            oauth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("YOUTUBE_API_KEY", "key"),
        ("GOOGLE_CLIENT_ID", "client"),
        ("GOOGLE_CLIENT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = ServerConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.oauth.redirect_uri, "http://localhost:3000/auth/callback");
        assert_eq!(config.oauth.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.youtube_api_base_url, DEFAULT_BASE_URL);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PORT", "8080"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("DATABASE_URL", "mongodb://localhost/mini"),
        ]);
        let config = ServerConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.oauth.redirect_uri, "http://localhost:8080/auth/callback");
        assert_eq!(config.database_url.as_deref(), Some("mongodb://localhost/mini"));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GOOGLE_CLIENT_SECRET")));
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "http"));
        let err = ServerConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err.to_string(), "PORT is invalid: http");
    }
}
