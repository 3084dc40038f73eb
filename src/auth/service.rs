use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use log::{debug, warn};

use crate::user;

use super::TokenClaims;

pub trait AuthService {
    /// Verifies the session token and returns the id it was issued for.
    fn validate(&self, token: &str) -> super::Result<user::Id>;
}

#[derive(Clone)]
pub struct JwtAuthService {
    key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtAuthService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
        }
    }
}

impl AuthService for JwtAuthService {
    fn validate(&self, token: &str) -> super::Result<user::Id> {
        decode::<TokenClaims>(token, &self.key, &self.validation)
            .map(|data| {
                debug!("Token validated for {}", data.claims.user_id);
                data.claims.user_id
            })
            .map_err(|e| {
                warn!("Failed to decode token claims: {e:?}");
                super::Error::InvalidToken
            })
    }
}
