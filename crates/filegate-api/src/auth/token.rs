//! Token service
//!
//! Issues and validates HS256 bearer tokens. Validation runs with zero leeway;
//! a token whose `exp` has passed is reported as expired even when its
//! signature is also wrong, so clients know to log in again.

use chrono::{Duration, Utc};
use filegate_core::models::User;
use filegate_core::AppError;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use super::models::Claims;

/// A freshly signed token with its lifetime in seconds
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str, lifetime_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::minutes(lifetime_minutes),
        }
    }

    pub fn lifetime_seconds(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.username.clone(),
            role: user.role,
            id: user.id,
            client_id: user.tenant_id,
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
        };
        self.sign(&claims).map(|token| IssuedToken {
            token,
            expires_in: self.lifetime_seconds(),
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry and return the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AppError::TokenExpired),
                _ if Self::unverified_expired(token) => Err(AppError::TokenExpired),
                _ => Err(AppError::TokenInvalid(e.to_string())),
            },
        }
    }

    /// Whether the payload, read without checking the signature, is past its `exp`.
    fn unverified_expired(token: &str) -> bool {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims.exp < Utc::now().timestamp())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filegate_core::models::UserRole;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters";

    fn user() -> User {
        User {
            id: 42,
            username: "client1".to_string(),
            password_hash: String::new(),
            role: UserRole::Client,
            tenant_id: Some(7),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_then_validate_round_trips_claims() {
        let service = TokenService::new(SECRET, 120);
        let issued = service.issue(&user()).unwrap();
        assert_eq!(issued.expires_in, 120 * 60);

        let claims = service.validate(&issued.token).unwrap();
        assert_eq!(claims.sub, "client1");
        assert_eq!(claims.role, UserRole::Client);
        assert_eq!(claims.id, 42);
        assert_eq!(claims.client_id, Some(7));
        assert_eq!(claims.exp - claims.iat, 120 * 60);
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let service = TokenService::new(SECRET, 120);
        let now = Utc::now().timestamp();
        let token = service
            .sign(&Claims {
                sub: "client1".to_string(),
                role: UserRole::Client,
                id: 42,
                client_id: Some(7),
                exp: now - 1,
                iat: now - 7200,
            })
            .unwrap();

        assert!(matches!(service.validate(&token), Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_expired_token_with_bad_signature_is_still_expired() {
        let other = TokenService::new("another-secret-that-is-also-32-characters!", 120);
        let now = Utc::now().timestamp();
        let token = other
            .sign(&Claims {
                sub: "client1".to_string(),
                role: UserRole::Client,
                id: 42,
                client_id: Some(7),
                exp: now - 60,
                iat: now - 7200,
            })
            .unwrap();

        let service = TokenService::new(SECRET, 120);
        assert!(matches!(service.validate(&token), Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let service = TokenService::new(SECRET, 120);
        let issued = service.issue(&user()).unwrap();

        let mut parts: Vec<String> = issued.token.split('.').map(String::from).collect();
        let sig = parts[2].clone();
        let flipped = if sig.starts_with('A') { "B" } else { "A" };
        parts[2] = format!("{}{}", flipped, &sig[1..]);
        let tampered = parts.join(".");

        assert!(matches!(
            service.validate(&tampered),
            Err(AppError::TokenInvalid(_))
        ));
        assert!(matches!(
            service.validate("not.a.token"),
            Err(AppError::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let other = TokenService::new("another-secret-that-is-also-32-characters!", 120);
        let issued = other.issue(&user()).unwrap();

        let service = TokenService::new(SECRET, 120);
        assert!(matches!(
            service.validate(&issued.token),
            Err(AppError::TokenInvalid(_))
        ));
    }
}
