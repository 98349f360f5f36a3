//! Credential codec: issues and verifies the signed claims records that act
//! as access and refresh credentials.
//!
//! Tokens are HS256 JWTs over a closed claims struct - no open-ended payload
//! map. The codec is a pure function of the process-wide secret and the
//! clock; it holds no mutable state and never touches the database.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::entity::user;

/// Claims embedded in both credential kinds. Access and refresh credentials
/// share this shape and differ only in TTL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Session id anchoring this credential.
    pub session: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Snapshot a user into a claims record for the given session.
    pub fn for_session(user: &user::Model, session_id: &str, ttl_secs: i64) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            picture: user.picture.clone(),
            session: session_id.to_string(),
            iat: now,
            exp: now + ttl_secs,
        }
    }

    /// Same user snapshot and session, fresh issuance window. Used when a
    /// refresh credential mints a replacement access credential.
    pub fn reissue(&self, ttl_secs: i64) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            iat: now,
            exp: now + ttl_secs,
            ..self.clone()
        }
    }
}

/// Outcome of verifying a presented credential.
///
/// Three cases: bad signature or garbage (`valid=false, expired=false`),
/// good signature past expiry (`valid=false, expired=true`, claims still
/// decoded), good and current (`valid=true`).
#[derive(Clone, Debug)]
pub struct Verification {
    pub valid: bool,
    pub expired: bool,
    pub claims: Option<Claims>,
}

/// Signs and verifies credentials with the process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        // Signature check only; expiry is compared against the clock below
        // so that exp <= now counts as expired.
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a claims record. Fails only on serialization or key errors,
    /// which are configuration-level faults.
    pub fn issue(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), claims, &self.encoding)
    }

    /// Verify a presented credential. Malformed input is handled like a bad
    /// signature: rejected without an expiry flag.
    pub fn verify(&self, token: &str) -> Verification {
        let claims = match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "credential rejected");
                return Verification {
                    valid: false,
                    expired: false,
                    claims: None,
                };
            }
        };

        let now = OffsetDateTime::now_utc().unix_timestamp();
        if claims.exp <= now {
            return Verification {
                valid: false,
                expired: true,
                claims: Some(claims),
            };
        }

        Verification {
            valid: true,
            expired: false,
            claims: Some(claims),
        }
    }
}
