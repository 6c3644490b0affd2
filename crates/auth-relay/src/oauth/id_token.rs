//! Reading claims out of an OpenID Connect id token.
//!
//! The id token handed to us comes straight from the token endpoint over TLS,
//! so the subject is read without verifying the signature. Nothing here is
//! used to make an authorization decision.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
}

/// Extract the `sub` claim from an id token.
pub fn subject(id_token: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<IdTokenClaims>(
        id_token,
        &DecodingKey::from_secret(&[]),
        &validation,
    )?;

    Ok(token_data.claims.sub)
}
