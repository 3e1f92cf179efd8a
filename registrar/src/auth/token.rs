//! JWT verification and the typed claims it produces.
//!
//! Tokens are verified structurally and cryptographically here; the identity
//! resolver trusts the [`Claims`] this module hands it. Expiry and issued-at
//! are checked explicitly with a configurable leeway window applied
//! symmetrically to both claims, and both claims are mandatory regardless of
//! leeway.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{config::JwtConfig, errors::Error};

/// Verified token payload.
///
/// `preferred_username` and `administrator` drive the identity resolver and
/// role synchronizer; the remaining claims are carried for validation and
/// logging. `administrator` absent is the same as false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub administrator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Verifies raw bearer tokens against the configured key, issuer and
/// audience.
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(config: &JwtConfig) -> Result<Self, Error> {
        let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
            operation: "JWT verification: secret_key is required".to_string(),
        })?;

        let mut validation = Validation::new(Algorithm::HS256);
        // exp and iat are checked by hand in validate() so that the leeway
        // window applies to both, and so a missing claim is always an
        // authentication failure rather than a deserialization error.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            validation,
        })
    }

    /// Verify and decode a raw token, allowing `leeway` of clock skew on the
    /// `exp` and `iat` claims.
    pub fn validate(&self, token: &str, leeway: Duration) -> Result<Claims, Error> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(classify_jwt_error)?;
        let claims = token_data.claims;

        let now = Utc::now().timestamp();
        let leeway = leeway.as_secs() as i64;

        match claims.exp {
            None => {
                return Err(Error::Unauthenticated {
                    message: Some("Token is missing the exp claim".to_string()),
                })
            }
            Some(exp) if exp + leeway < now => {
                return Err(Error::Unauthenticated {
                    message: Some("Token has expired".to_string()),
                })
            }
            Some(_) => {}
        }

        match claims.iat {
            None => {
                return Err(Error::Unauthenticated {
                    message: Some("Token is missing the iat claim".to_string()),
                })
            }
            Some(iat) if iat > now + leeway => {
                return Err(Error::Unauthenticated {
                    message: Some("Token was issued in the future".to_string()),
                })
            }
            Some(_) => {}
        }

        Ok(claims)
    }
}

fn classify_jwt_error(e: jsonwebtoken::errors::Error) -> Error {
    match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500) - key issues, internal failures
        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mint_token, test_jwt_config, TEST_JWT_SECRET};

    fn valid_claims(now: i64) -> Claims {
        Claims {
            preferred_username: Some("test-username".to_string()),
            administrator: false,
            exp: Some(now + 300),
            iat: Some(now),
            iss: None,
            sub: None,
            aud: None,
        }
    }

    fn validator() -> JwtValidator {
        JwtValidator::new(&test_jwt_config()).unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let now = Utc::now().timestamp();
        let token = mint_token(&valid_claims(now), TEST_JWT_SECRET);

        let claims = validator().validate(&token, Duration::ZERO).unwrap();
        assert_eq!(claims.preferred_username.as_deref(), Some("test-username"));
        assert!(!claims.administrator);
    }

    #[test]
    fn rejects_bad_signature() {
        let now = Utc::now().timestamp();
        let token = mint_token(&valid_claims(now), "not-the-right-secret");

        let err = validator().validate(&token, Duration::ZERO).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[test]
    fn leeway_shifts_expiry_acceptance() {
        // exp one second in the past: rejected without leeway
        let now = Utc::now().timestamp();
        let mut claims = valid_claims(now);
        claims.exp = Some(now - 1);
        let token = mint_token(&claims, TEST_JWT_SECRET);

        let err = validator().validate(&token, Duration::ZERO).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));

        // the same token is accepted once the leeway covers the skew
        validator().validate(&token, Duration::from_secs(60)).unwrap();
    }

    #[test]
    fn leeway_shifts_issued_at_acceptance() {
        // iat one second in the future: accepted with one second of leeway
        let now = Utc::now().timestamp();
        let mut claims = valid_claims(now);
        claims.iat = Some(now + 1);
        let token = mint_token(&claims, TEST_JWT_SECRET);
        validator().validate(&token, Duration::from_secs(1)).unwrap();

        // well into the future: rejected without leeway
        let now = Utc::now().timestamp();
        let mut claims = valid_claims(now);
        claims.iat = Some(now + 30);
        let token = mint_token(&claims, TEST_JWT_SECRET);
        let err = validator().validate(&token, Duration::ZERO).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[test]
    fn missing_exp_is_rejected_regardless_of_leeway() {
        let now = Utc::now().timestamp();
        let mut claims = valid_claims(now);
        claims.exp = None;
        let token = mint_token(&claims, TEST_JWT_SECRET);

        for leeway in [Duration::ZERO, Duration::from_secs(3600)] {
            let err = validator().validate(&token, leeway).unwrap_err();
            assert!(matches!(err, Error::Unauthenticated { .. }));
        }
    }

    #[test]
    fn missing_iat_is_rejected_regardless_of_leeway() {
        let now = Utc::now().timestamp();
        let mut claims = valid_claims(now);
        claims.iat = None;
        let token = mint_token(&claims, TEST_JWT_SECRET);

        for leeway in [Duration::ZERO, Duration::from_secs(3600)] {
            let err = validator().validate(&token, leeway).unwrap_err();
            assert!(matches!(err, Error::Unauthenticated { .. }));
        }
    }

    #[test]
    fn administrator_claim_defaults_to_false() {
        let raw = serde_json::json!({
            "preferred_username": "test-username",
            "exp": Utc::now().timestamp() + 300,
            "iat": Utc::now().timestamp(),
        });
        let claims: Claims = serde_json::from_value(raw).unwrap();
        assert!(!claims.administrator);
    }
}
