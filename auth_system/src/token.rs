use crate::credentials::{CredentialResolver, Credentials};
use crate::errors::{AuthError, AuthResult};
use config::AuthConfig;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const ALGORITHM: Algorithm = Algorithm::HS256;
const REQUIRED_CLAIMS: &[&str] = &["exp", "iat", "sub", "iss", "aud"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub scopes: Vec<String>,
}

/// What a successful issuance hands back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub scopes: Vec<String>,
}

/// Signs and verifies access tokens
///
/// Tokens are immutable once issued and are never revoked; expiry is the
/// only way a token stops being valid.
pub struct TokenService {
    issuer: String,
    audience: String,
    ttl: Duration,
    leeway: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    resolver: Arc<dyn CredentialResolver>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .field("leeway", &self.leeway)
            .finish()
    }
}

impl TokenService {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        ttl: Duration,
        leeway: u64,
        secret: &[u8],
        resolver: Arc<dyn CredentialResolver>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            ttl,
            leeway,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            resolver,
        }
    }

    /// Build from configuration; an empty secret gets a random one
    pub fn from_config(config: &AuthConfig, resolver: Arc<dyn CredentialResolver>) -> Self {
        let secret = if config.signing_secret.is_empty() {
            tracing::warn!("no signing secret configured, tokens will not survive a restart");
            let mut secret = vec![0u8; 32];
            rand::rng().fill_bytes(&mut secret);
            secret
        } else {
            config.signing_secret.as_bytes().to_vec()
        };

        Self::new(
            config.issuer.clone(),
            config.audience.clone(),
            Duration::from_secs(config.token_ttl_seconds),
            config.leeway_seconds,
            &secret,
            resolver,
        )
    }

    /// Check credentials and issue a token carrying the principal's role scopes
    pub async fn issue(&self, credentials: &Credentials) -> AuthResult<IssuedToken> {
        let principal = match self.resolver.resolve(credentials).await? {
            Some(principal) => principal,
            None => {
                tracing::warn!(username = %credentials.username, "rejected credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let issued = self.mint(&principal.subject, principal.role.scopes())?;
        tracing::info!(
            subject = %principal.subject,
            role = %principal.role,
            "issued access token"
        );
        Ok(issued)
    }

    /// Sign a fresh token for `subject` with exactly `scopes`
    pub fn mint(&self, subject: &str, scopes: Vec<String>) -> AuthResult<IssuedToken> {
        let now = now_epoch_seconds();
        let claims = Claims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: subject.to_string(),
            exp: now + self.ttl.as_secs() as i64,
            iat: now,
            jti: Some(uuid::Uuid::new_v4().to_string()),
            scopes,
        };
        let access_token = self.sign(&claims)?;
        Ok(IssuedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl.as_secs(),
            scopes: claims.scopes,
        })
    }

    /// Sign arbitrary claims with this service's key
    pub fn sign(&self, claims: &Claims) -> AuthResult<String> {
        jsonwebtoken::encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(AuthError::Signing)
    }

    /// Verify a token string and return its claims
    ///
    /// Expiry is checked before the signature, so an expired token reports
    /// `Expired` even when its signature is also bad.
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let header = jsonwebtoken::decode_header(token).map_err(classify)?;
        if header.alg != ALGORITHM {
            return Err(AuthError::Malformed(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }

        let unverified = self.peek_claims(token)?;
        if self.is_expired(unverified.exp) {
            return Err(AuthError::Expired);
        }

        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map_err(classify)?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::Malformed("empty subject".to_string()));
        }
        if claims.iat > claims.exp {
            return Err(AuthError::Malformed(
                "issued-at is later than expiry".to_string(),
            ));
        }
        Ok(claims)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, exp: i64) -> bool {
        now_epoch_seconds() >= exp.saturating_add(self.leeway as i64)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(REQUIRED_CLAIMS);
        validation.leeway = self.leeway;
        validation
    }

    /// Decode claims without checking the signature
    fn peek_claims(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(ALGORITHM);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(classify)
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        _ => AuthError::Malformed(err.to_string()),
    }
}

pub(crate) fn now_epoch_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}
