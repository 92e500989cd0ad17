//! Unit tests for JWT functionality.

#[cfg(test)]
mod tests {
    use crate::auth::Claims;
    use crate::jwt::{JwtConfig, JwtError, JwtService};
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig::new("test-secret-key-for-testing"))
    }

    #[test]
    fn test_claims_new_sets_correct_fields() {
        let expires_at = Utc::now() + Duration::hours(1);

        let claims = Claims::new("alice", "admin", expires_at);

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, "admin");
        assert!(claims.iat <= Utc::now().timestamp());
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_issue_and_validate_token() {
        let service = create_test_service();

        let token = service.issue_token("alice", "user").unwrap();
        assert!(!token.is_empty());

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.subject(), "alice");
        assert_eq!(claims.role(), "user");
    }

    #[test]
    fn test_unrecognized_role_survives_verification_verbatim() {
        let service = create_test_service();

        let token = service.issue_token("carol", "superuser").unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.role(), "superuser");
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        let result = service.validate_token("invalid.token.here");
        assert!(matches!(result, Err(JwtError::DecodingError(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new(JwtConfig::new("someone-elses-secret"));
        let service = create_test_service();

        let token = issuer.issue_token("mallory", "admin").unwrap();
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let secret = "test-secret-key-for-testing";
        let claims = Claims {
            sub: "alice".to_string(),
            role: "user".to_string(),
            iat: (Utc::now() - Duration::hours(2)).timestamp(),
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let result = create_test_service().validate_token(&token);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_empty_subject_is_invalid() {
        let service = create_test_service();

        let token = service.issue_token("  ", "admin").unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::Invalid)
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let service = JwtService::new(JwtConfig::new("super-secret-value"));
        let rendered = format!("{service:?}");

        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("[hidden]"));
    }

    #[test]
    fn test_token_lifetime_is_fifteen_minutes() {
        let service = create_test_service();
        let token = service.issue_token("alice", "user").unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert!((15 * 60 - 1..=15 * 60).contains(&(claims.exp - claims.iat)));
    }
}
