use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use spelt_types::User;

const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleIdClaims {
    pub aud: String,
    pub iss: String,
    pub exp: u64,
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksKey {
    pub kty: String,
    pub kid: String,
    pub n: Option<String>,
    pub e: Option<String>,
    pub alg: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<JwksKey>,
}

/// Verifies Google ID tokens and turns them into signed-in users.
pub struct AuthService {
    client: Client,
    jwks_cache: Arc<RwLock<HashMap<String, (DecodingKey, SystemTime)>>>,
    client_id: String,
    dev_mode: bool,
}

impl AuthService {
    pub fn new(client_id: String) -> Self {
        Self {
            client: Client::new(),
            jwks_cache: Arc::new(RwLock::new(HashMap::new())),
            client_id,
            dev_mode: false,
        }
    }

    /// Accepts unsigned tokens; local development only
    pub fn new_dev_mode() -> Self {
        Self {
            client: Client::new(),
            jwks_cache: Arc::new(RwLock::new(HashMap::new())),
            client_id: "dev".to_string(),
            dev_mode: true,
        }
    }

    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AuthError> {
        if self.dev_mode {
            return self.validate_dev_token(token);
        }

        let header = decode_header(token).map_err(|e| {
            tracing::warn!("Failed to decode ID token header: {:?}", e);
            AuthError::InvalidToken
        })?;
        let kid = header.kid.ok_or_else(|| {
            tracing::warn!("ID token header missing 'kid' field");
            AuthError::InvalidToken
        })?;

        let decoding_key = self.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let token_data =
            decode::<GoogleIdClaims>(token, &decoding_key, &validation).map_err(|e| {
                tracing::warn!("ID token validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    ErrorKind::InvalidAudience => AuthError::AudienceMismatch,
                    ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
                    _ => AuthError::InvalidToken,
                }
            })?;

        Ok(user_from_claims(token_data.claims))
    }

    async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.jwks_cache.read().await;
            if let Some((key, cached_time)) = cache.get(kid) {
                let elapsed = cached_time.elapsed().unwrap_or(JWKS_CACHE_TTL);
                if elapsed < JWKS_CACHE_TTL {
                    return Ok(key.clone());
                }
                tracing::debug!("Cached key for kid '{}' is stale, fetching fresh", kid);
            }
        }

        let response = self
            .client
            .get(GOOGLE_JWKS_URL)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to fetch JWKS: {:?}", e);
                AuthError::JwksFetchError
            })?;

        if !response.status().is_success() {
            tracing::warn!("JWKS fetch returned status: {}", response.status());
            return Err(AuthError::JwksFetchError);
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse JWKS JSON: {:?}", e);
            AuthError::JwksFetchError
        })?;

        let jwks_key = jwks.keys.iter().find(|key| key.kid == kid).ok_or_else(|| {
            tracing::warn!("Key with kid '{}' not found in Google JWKS", kid);
            AuthError::KeyNotFound
        })?;

        let decoding_key = match (&jwks_key.n, &jwks_key.e) {
            (Some(n), Some(e)) => DecodingKey::from_rsa_components(n, e)?,
            _ => {
                tracing::warn!("JWKS key '{}' has no RSA components", kid);
                return Err(AuthError::InvalidKey);
            }
        };

        {
            let mut cache = self.jwks_cache.write().await;
            cache.insert(kid.to_string(), (decoding_key.clone(), SystemTime::now()));
        }

        Ok(decoding_key)
    }

    fn validate_dev_token(&self, token: &str) -> Result<User, AuthError> {
        let parts: Vec<&str> = token.split('.').collect();

        // JWT-shaped: read the payload without checking the signature
        if parts.len() == 3 {
            let payload_bytes = URL_SAFE_NO_PAD
                .decode(parts[1].trim_end_matches('='))
                .map_err(|e| {
                    tracing::warn!("Failed to decode token payload in dev mode: {:?}", e);
                    AuthError::InvalidToken
                })?;

            let claims: GoogleIdClaims = serde_json::from_slice(&payload_bytes).map_err(|e| {
                tracing::warn!("Failed to parse token claims in dev mode: {:?}", e);
                AuthError::InvalidToken
            })?;

            return Ok(user_from_claims(claims));
        }

        // Simple string format: "user_id:email:name"
        let string_parts: Vec<&str> = token.splitn(3, ':').collect();
        match string_parts.as_slice() {
            [id, email, name] if !id.is_empty() && !name.is_empty() => Ok(User {
                id: id.to_string(),
                email: (!email.is_empty()).then(|| email.to_string()),
                display_name: name.to_string(),
            }),
            _ => Err(AuthError::InvalidToken),
        }
    }
}

fn user_from_claims(claims: GoogleIdClaims) -> User {
    let display_name = claims
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| {
            claims
                .email
                .as_deref()
                .and_then(|email| email.split('@').next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Player".to_string());

    User {
        id: claims.sub,
        email: claims.email,
        display_name,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to fetch JWKS")]
    JwksFetchError,
    #[error("Key not found")]
    KeyNotFound,
    #[error("Invalid key")]
    InvalidKey,
    #[error("Audience mismatch")]
    AudienceMismatch,
    #[error("Issuer mismatch")]
    IssuerMismatch,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AuthError::InvalidKey
    }
}
