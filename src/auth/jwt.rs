use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::OffsetDateTime;
use tracing::debug;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState, store::User};

/// The only algorithm tokens are signed with or accepted under.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("missing Authorization header")]
    MissingCredential,
    #[error("invalid token")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl_secs: i64,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl_secs: (cfg.ttl_hours * 3600.0).round() as i64,
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        self.issue_at(user, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn issue_at(&self, user: &User, now: i64) -> anyhow::Result<String> {
        let claims = Claims {
            user_id: user.id,
            user_email: user.email.clone(),
            iat: now,
            exp: now + self.ttl_secs,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id = %user.id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Verifies a raw `Authorization` header value against the current time.
    pub fn verify(&self, raw_header: Option<&str>) -> Result<Claims, TokenError> {
        self.verify_at(raw_header, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn verify_at(&self, raw_header: Option<&str>, now: i64) -> Result<Claims, TokenError> {
        let raw = raw_header.ok_or(TokenError::MissingCredential)?;
        let token = bearer_token(raw).ok_or(TokenError::InvalidSignature)?;
        self.decode_at(token, now)
    }

    fn decode_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        // Expiry is judged below against the caller's clock.
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(reason = ?e.kind(), "jwt rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            }
        })?;

        if now > data.claims.exp {
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

/// Extracts the token from `Bearer <token>`. The scheme is matched
/// case-insensitively and surrounding whitespace is ignored.
fn bearer_token(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    let scheme = raw.get(..6)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = raw[6..].trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use uuid::Uuid;

    const NOW: i64 = 1_700_000_000;

    fn make_keys(secret: &str, ttl_hours: f64) -> JwtKeys {
        JwtKeys::from(&AppConfig::for_tests(secret, ttl_hours).jwt)
    }

    fn user(email: &str) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let keys = make_keys("dev-secret", 1.0);
        let u = user("a@x.com");
        let token = keys.issue_at(&u, NOW).expect("sign");
        let claims = keys.verify_at(Some(&bearer(&token)), NOW + 10).expect("verify");
        assert_eq!(claims.user_id, u.id);
        assert_eq!(claims.user_email, "a@x.com");
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + 3600);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn fractional_lifetime_is_honoured() {
        let keys = make_keys("dev-secret", 0.5);
        let token = keys.issue_at(&user("a@x.com"), NOW).unwrap();
        let claims = keys.verify_at(Some(&bearer(&token)), NOW).unwrap();
        assert_eq!(claims.exp - claims.iat, 1800);
    }

    #[test]
    fn missing_header_is_missing_credential() {
        let keys = make_keys("dev-secret", 1.0);
        assert_eq!(keys.verify_at(None, NOW), Err(TokenError::MissingCredential));
    }

    #[test]
    fn expired_after_lifetime() {
        let keys = make_keys("dev-secret", 1.0);
        let token = keys.issue_at(&user("a@x.com"), NOW).unwrap();
        let header = bearer(&token);
        assert!(keys.verify_at(Some(&header), NOW + 3600).is_ok());
        assert_eq!(
            keys.verify_at(Some(&header), NOW + 3601),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn real_clock_rejects_long_expired_token() {
        let keys = make_keys("dev-secret", 1.0);
        let token = keys.issue_at(&user("a@x.com"), NOW).unwrap();
        assert_eq!(keys.verify(Some(&bearer(&token))), Err(TokenError::Expired));
    }

    #[test]
    fn other_secret_is_rejected() {
        let good = make_keys("secret-one", 1.0);
        let bad = make_keys("secret-two", 1.0);
        for email in ["a@x.com", "b@y.org", "someone.else@example.com"] {
            let token = good.issue_at(&user(email), NOW).unwrap();
            assert_eq!(
                bad.verify_at(Some(&bearer(&token)), NOW),
                Err(TokenError::InvalidSignature)
            );
        }
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let keys = make_keys("dev-secret", 1.0);
        let claims = Claims {
            user_id: Uuid::new_v4(),
            user_email: "a@x.com".into(),
            iat: NOW,
            exp: NOW + 3600,
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
        };
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert_eq!(
            keys.verify_at(Some(&bearer(&hs512)), NOW),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let keys = make_keys("dev-secret", 1.0);
        let token = keys.issue_at(&user("a@x.com"), NOW).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        // {"alg":"none","typ":"JWT"}
        let forged = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{payload}.");
        assert_eq!(
            keys.verify_at(Some(&bearer(&forged)), NOW),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let keys = make_keys("dev-secret", 1.0);
        let a = keys.issue_at(&user("a@x.com"), NOW).unwrap();
        let b = keys.issue_at(&user("b@x.com"), NOW).unwrap();
        let a_parts: Vec<&str> = a.split('.').collect();
        let b_parts: Vec<&str> = b.split('.').collect();
        let spliced = format!("{}.{}.{}", a_parts[0], b_parts[1], a_parts[2]);
        assert_eq!(
            keys.verify_at(Some(&bearer(&spliced)), NOW),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let keys = make_keys("dev-secret", 1.0);
        let mut cfg = AppConfig::for_tests("dev-secret", 1.0).jwt;
        cfg.issuer = "someone-else".into();
        cfg.audience = "other-aud".into();
        let foreign = JwtKeys::from(&cfg);
        let token = foreign.issue_at(&user("a@x.com"), NOW).unwrap();
        assert_eq!(
            keys.verify_at(Some(&bearer(&token)), NOW),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_invalid_signature() {
        let keys = make_keys("dev-secret", 1.0);
        for raw in ["Bearer", "Bearer   ", "Bearer not.a.jwt", "Basic abc", "", "tok"] {
            assert_eq!(
                keys.verify_at(Some(raw), NOW),
                Err(TokenError::InvalidSignature),
                "header {raw:?}"
            );
        }
    }

    #[test]
    fn header_whitespace_is_tolerated() {
        let keys = make_keys("dev-secret", 1.0);
        let token = keys.issue_at(&user("a@x.com"), NOW).unwrap();
        for raw in [
            format!("Bearer {token}"),
            format!("  Bearer   {token}  "),
            format!("bearer\t{token}"),
            format!("BEARER {token}"),
        ] {
            assert!(keys.verify_at(Some(&raw), NOW).is_ok(), "header {raw:?}");
        }
    }
}
