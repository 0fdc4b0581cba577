use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{AppError, AppResult};

/// The signed assertion a paired device carries: which device it is and which
/// room it may enter. Authorizes both REST history access and room joins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomClaims {
    pub device_id: String,
    pub room_id: String,
}

struct IssuerKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

/// Signs and verifies room claims with a process-wide HS256 secret, loaded once
/// at startup and never rotated at runtime.
#[derive(Clone)]
pub struct ClaimIssuer {
    keys: Arc<IssuerKeys>,
}

impl ClaimIssuer {
    pub fn new(secret: &str) -> ClaimIssuer {
        // Tokens carry no expiry claim; verification checks the signature
        // only, so a token stays valid until the secret changes.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        ClaimIssuer {
            keys: Arc::new(IssuerKeys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                validation,
            }),
        }
    }

    pub fn issue(&self, device_id: &str, room_id: &str) -> AppResult<String> {
        let claims = RoomClaims {
            device_id: device_id.to_owned(),
            room_id: room_id.to_owned(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.keys.encoding)
            .map_err(|e| AppError::Upstream(e.into()))
    }

    pub fn verify(&self, token: &str) -> AppResult<RoomClaims> {
        jsonwebtoken::decode::<RoomClaims>(token, &self.keys.decoding, &self.keys.validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Auth("invalid claim".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let issuer = ClaimIssuer::new("test-secret");
        let token = issuer.issue("dev-a", "r-1").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.device_id, "dev-a");
        assert_eq!(claims.room_id, "r-1");
    }

    #[test]
    fn each_device_gets_a_distinct_claim() {
        let issuer = ClaimIssuer::new("test-secret");
        let a = issuer.issue("dev-a", "r-1").unwrap();
        let b = issuer.issue("dev-b", "r-1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = ClaimIssuer::new("one").issue("dev-a", "r-1").unwrap();
        assert!(matches!(
            ClaimIssuer::new("two").verify(&token),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let issuer = ClaimIssuer::new("test-secret");
        assert!(issuer.verify("not-a-token").is_err());
        assert!(issuer.verify("").is_err());
    }
}
