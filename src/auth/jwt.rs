use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Decodes and validates a bearer token. Only access tokens are accepted.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("refresh tokens cannot be used for API calls".to_string());
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn token(token_type: TokenType, secret: &str) -> String {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize
            + 600;
        let claims = Claims {
            user_id: 10,
            sub: "jperez".into(),
            role: 3,
            exp,
            jti: "test-jti".into(),
            token_type,
            employee_id: Some(1000),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_access_token_verifies() {
        let claims = verify_token(&token(TokenType::Access, "s3cret"), "s3cret").unwrap();
        assert_eq!(claims.user_id, 10);
        assert_eq!(claims.employee_id, Some(1000));
    }

    #[test]
    fn test_refresh_token_rejected() {
        assert!(verify_token(&token(TokenType::Refresh, "s3cret"), "s3cret").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        assert!(verify_token(&token(TokenType::Access, "s3cret"), "other").is_err());
    }
}
