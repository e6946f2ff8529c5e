use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

/// Validates a Supabase HS256 JWT and returns the embedded user.
///
/// Signature verification happens before any claim is parsed, so a
/// tampered token is rejected without touching its payload.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| "Invalid claims encoding".to_string())?;

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let created_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        metadata: claims.user_metadata,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{JwtTestUtils, TestUser};

    const SECRET: &str = "unit-test-secret-key-for-token-validation";

    #[test]
    fn valid_token_round_trips_claims() {
        let user = TestUser::doctor("doc@example.com");
        let token = JwtTestUtils::create_test_token(&user, SECRET, Some(1));

        let validated = validate_token(&token, SECRET).unwrap();

        assert_eq!(validated.id, user.id);
        assert_eq!(validated.email, Some(user.email.clone()));
        assert_eq!(validated.role, Some("doctor".to_string()));
    }

    #[test]
    fn expired_token_is_rejected() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_expired_token(&user, SECRET);

        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Token expired");
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_invalid_signature_token(&user);

        assert_eq!(
            validate_token(&token, SECRET).unwrap_err(),
            "Invalid token signature"
        );
    }

    #[test]
    fn malformed_token_is_rejected() {
        let token = JwtTestUtils::create_malformed_token();
        assert!(validate_token(&token, SECRET).is_err());

        // Too few segments never reaches the signature check.
        assert_eq!(
            validate_token("missing.signature", SECRET).unwrap_err(),
            "Invalid token format"
        );
    }

    #[test]
    fn empty_secret_is_rejected() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, SECRET, Some(1));

        assert_eq!(
            validate_token(&token, "").unwrap_err(),
            "JWT secret is not set"
        );
    }
}
