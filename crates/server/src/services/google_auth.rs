//! Google service-account authentication.
//!
//! Signs a short-lived RS256 JWT grant with the service account's
//! private key and exchanges it at the Google token endpoint for a
//! bearer token, which is cached until shortly before it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

/// OAuth scope granting read/write access to spreadsheets.
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// JWT bearer grant type for service accounts.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each token (the Google maximum).
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Refresh this long before the reported expiry.
const EXPIRY_SLACK_SECS: i64 = 60;

/// Errors that can occur when obtaining an access token.
#[derive(Debug, Error)]
pub enum GoogleAuthError {
    /// The service account key JSON could not be parsed or used.
    #[error("invalid service account key: {0}")]
    InvalidKey(String),

    /// Signing the JWT grant failed.
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// HTTP request to the token endpoint failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token endpoint returned an error response.
    #[error("token endpoint error: {status} - {message}")]
    Token { status: u16, message: String },
}

/// Relevant fields of a service account key file.
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Claim set of the JWT grant.
#[derive(Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Token source for Google API requests.
#[derive(Debug)]
pub struct GoogleAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleAuth {
    /// Parse the service account key and prepare the signing key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key JSON is malformed, the private key is
    /// not valid RSA PEM, or the HTTP client fails to build.
    pub fn new(service_account_json: &SecretString) -> Result<Self, GoogleAuthError> {
        let key: ServiceAccountKey = serde_json::from_str(service_account_json.expose_secret())
            .map_err(|e| GoogleAuthError::InvalidKey(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            key,
            encoding_key,
            client,
            cached: Mutex::new(None),
        })
    }

    /// A bearer token valid for at least [`EXPIRY_SLACK_SECS`] seconds.
    ///
    /// Serves from cache when possible; otherwise performs the grant
    /// exchange and caches the result.
    ///
    /// # Errors
    ///
    /// Returns an error if signing or the token exchange fails.
    pub async fn bearer_token(&self) -> Result<String, GoogleAuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Utc::now() < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        let response = self.exchange_grant().await?;
        let expires_at =
            Utc::now() + Duration::seconds(response.expires_in - EXPIRY_SLACK_SECS);
        let token = response.access_token;
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });

        tracing::debug!("Obtained Google access token");
        Ok(token)
    }

    /// Sign the JWT grant and exchange it for an access token.
    async fn exchange_grant(&self) -> Result<TokenResponse, GoogleAuthError> {
        let now = Utc::now().timestamp();
        let claims = GrantClaims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;

        let params = [
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ];
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&params)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GoogleAuthError::Token {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
