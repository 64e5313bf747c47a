use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::store::CredentialStore;

/// Represents the claims encoded within a bearer token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: Uuid,
    /// Issuance id, random per login, checked against the user's active set.
    pub jti: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// A freshly signed token together with its issuance id.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: Uuid,
}

/// What a token proves once its signature and issuance have been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: Uuid,
    pub token_id: Uuid,
}

/// Issues and verifies HS256-signed bearer tokens.
///
/// The signing secret is handed in once at startup and lives only inside the
/// encoding/decoding keys. Signature comparison happens inside `jsonwebtoken`,
/// which checks HMACs in constant time.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    credentials: Arc<dyn CredentialStore>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration, credentials: Arc<dyn CredentialStore>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
            credentials,
        }
    }

    /// Signs a new token for `user_id` and records its issuance.
    pub async fn issue(&self, user_id: Uuid) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = self.sign(&claims)?;
        self.credentials
            .record_token_issuance(user_id, claims.jti)
            .await?;

        Ok(IssuedToken {
            token,
            token_id: claims.jti,
        })
    }

    /// Checks signature, structure and expiry, then that the issuance is still active.
    ///
    /// Every failure is `AppError::Unauthorized`; store failures stay `Internal`.
    pub async fn verify(&self, token: &str) -> Result<VerifiedToken, AppError> {
        let claims = self.decode(token)?;
        let active = self
            .credentials
            .has_token_issuance(claims.sub, claims.jti)
            .await?;
        if !active {
            log::debug!("Token {} of user {} is not an active issuance", claims.jti, claims.sub);
            return Err(AppError::Unauthorized);
        }

        Ok(VerifiedToken {
            user_id: claims.sub,
            token_id: claims.jti,
        })
    }

    /// Removes one issuance so its token stops verifying.
    pub async fn revoke(&self, user_id: Uuid, token_id: Uuid) -> Result<bool, AppError> {
        self.credentials
            .revoke_token_issuance(user_id, token_id)
            .await
    }

    /// Removes every issuance of `user_id`.
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.credentials.revoke_all_token_issuances(user_id).await
    }

    /// Signature and claim checks only, without consulting the issuance record.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal("Failed to generate token", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, PasswordDigest};
    use crate::store::MemoryCredentialStore;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    async fn setup() -> (TokenService, Arc<dyn CredentialStore>, Uuid) {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let user = store
            .create_user(NewUser {
                name: "mostafa".into(),
                email: "a@b.com".into(),
                password_hash: PasswordDigest::new("digest".into()),
            })
            .await
            .unwrap();
        let service = TokenService::new(SECRET, Duration::hours(24), store.clone());
        (service, store, user.id)
    }

    fn flip_bit(token: &str, index: usize) -> String {
        let mut bytes = token.as_bytes().to_vec();
        // stay inside the base64url alphabet so only the value changes
        bytes[index] = match bytes[index] {
            b'A' => b'B',
            _ => b'A',
        };
        String::from_utf8(bytes).unwrap()
    }

    #[actix_rt::test]
    async fn test_token_generation_and_verification() {
        let (service, _, user_id) = setup().await;
        let issued = service.issue(user_id).await.unwrap();

        let verified = service.verify(&issued.token).await.unwrap();
        assert_eq!(verified.user_id, user_id);
        assert_eq!(verified.token_id, issued.token_id);
    }

    #[actix_rt::test]
    async fn test_issuance_ids_are_unique() {
        let (service, _, user_id) = setup().await;
        let first = service.issue(user_id).await.unwrap();
        let second = service.issue(user_id).await.unwrap();

        assert_ne!(first.token_id, second.token_id);
        assert!(service.verify(&first.token).await.is_ok());
        assert!(service.verify(&second.token).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_tampered_signature_is_rejected() {
        let (service, _, user_id) = setup().await;
        let issued = service.issue(user_id).await.unwrap();
        let signature_start = issued.token.rfind('.').unwrap() + 1;

        for index in [signature_start, signature_start + 5, issued.token.len() - 2] {
            let tampered = flip_bit(&issued.token, index);
            assert!(matches!(
                service.verify(&tampered).await,
                Err(AppError::Unauthorized)
            ));
        }
    }

    #[actix_rt::test]
    async fn test_tampered_payload_is_rejected() {
        let (service, _, user_id) = setup().await;
        let issued = service.issue(user_id).await.unwrap();
        let payload_start = issued.token.find('.').unwrap() + 1;

        let tampered = flip_bit(&issued.token, payload_start + 3);
        assert!(matches!(
            service.verify(&tampered).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[actix_rt::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let (service, store, user_id) = setup().await;
        let other = TokenService::new(
            b"a_completely_different_secret_value!",
            Duration::hours(24),
            store,
        );
        let foreign = other.issue(user_id).await.unwrap();

        assert!(matches!(
            service.verify(&foreign.token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[actix_rt::test]
    async fn test_expired_token_is_rejected() {
        let (service, store, user_id) = setup().await;
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: (now - Duration::hours(3)).timestamp(),
            exp: (now - Duration::hours(2)).timestamp(),
        };
        store.record_token_issuance(user_id, claims.jti).await.unwrap();
        let expired = service.sign(&claims).unwrap();

        assert!(matches!(
            service.verify(&expired).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[actix_rt::test]
    async fn test_malformed_token_is_rejected() {
        let (service, _, _) = setup().await;
        for token in ["", "invalid.token.here", "a.b", "eyJhbGciOiJIUzI1NiJ9"] {
            assert!(matches!(
                service.verify(token).await,
                Err(AppError::Unauthorized)
            ));
        }
    }

    #[actix_rt::test]
    async fn test_unrecorded_issuance_is_rejected() {
        let (service, _, user_id) = setup().await;
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let forged_but_signed = service.sign(&claims).unwrap();

        assert!(service.decode(&forged_but_signed).is_ok());
        assert!(matches!(
            service.verify(&forged_but_signed).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[actix_rt::test]
    async fn test_revoke_single_and_all() {
        let (service, _, user_id) = setup().await;
        let first = service.issue(user_id).await.unwrap();
        let second = service.issue(user_id).await.unwrap();
        let third = service.issue(user_id).await.unwrap();

        assert!(service.revoke(user_id, first.token_id).await.unwrap());
        assert!(service.verify(&first.token).await.is_err());
        assert!(service.verify(&second.token).await.is_ok());

        assert_eq!(service.revoke_all(user_id).await.unwrap(), 2);
        assert!(service.verify(&second.token).await.is_err());
        assert!(service.verify(&third.token).await.is_err());
    }

    #[test]
    fn test_debug_does_not_expose_keys() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let service = TokenService::new(SECRET, Duration::hours(1), store);
        let debug = format!("{:?}", service);

        assert!(!debug.contains("test_secret"));
    }
}
