use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::JWT_SECRET_ENV;
use crate::database::error::ApiError;
use crate::database::schema::{User, UserRole, Uuid};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String, role: UserRole) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(24)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

fn session_key() -> Result<Hmac<Sha256>, ApiError> {
    let secret =
        std::env::var(JWT_SECRET_ENV).unwrap_or_else(|_| String::from("insecure-dev-secret"));
    Hmac::new_from_slice(secret.as_bytes())
        .map_err(|_| ApiError::Internal(String::from("Invalid session key")))
}

pub fn generate_jwt_session(user: &User) -> Result<String, ApiError> {
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims
        .sign_with_key(&session_key()?)
        .map_err(|_| ApiError::Internal(String::from("Failed to sign session token")))
}

pub fn verify_jwt_session(token: String) -> Result<JwtSessionData, ApiError> {
    let session: JwtSessionData = token
        .verify_with_key(&session_key()?)
        .map_err(|_| ApiError::PermissionDenied(String::from("Invalid session; Invalid token")))?;

    if session.exp <= Utc::now().timestamp() {
        return Err(ApiError::PermissionDenied(String::from(
            "Invalid session; Token expired",
        )));
    }
    Ok(session)
}

/// The resolved identity for one request, threaded explicitly through every
/// action and view composition. `current_user` is `None` for anonymous
/// requests, which is a first-class state rather than an error.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub current_user: Option<User>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { current_user: None }
    }

    pub fn for_user(user: User) -> Self {
        Self {
            current_user: Some(user),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.current_user.as_ref().map(|user| user.id)
    }

    pub fn require_user(&self) -> Result<&User, ApiError> {
        self.current_user
            .as_ref()
            .ok_or_else(|| ApiError::PermissionDenied(String::from("Authentication required")))
    }

    pub fn authenticate(&self, action: ActionType) -> Result<&User, ApiError> {
        let user = self.require_user()?;
        if !action.allowed_for(&user.role) {
            return Err(ApiError::PermissionDenied(String::from(
                "You don't have permission to perform this action",
            )));
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user(id: Uuid, role: UserRole) -> User {
        User {
            id,
            email: String::from("anna@example.com"),
            username: String::from("anna"),
            first_name: String::new(),
            last_name: String::new(),
            password: String::from("$argon2id$stub"),
            role,
            created: Utc::now(),
        }
    }

    #[test]
    fn test_session_roundtrip() {
        let token = generate_jwt_session(&user(7, UserRole::User)).unwrap();
        let session = verify_jwt_session(token).unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "anna");
    }

    #[test]
    fn test_expired_session_rejected() {
        let now = Utc::now().timestamp();
        let claims = JwtSessionData {
            user_id: 7,
            username: String::from("anna"),
            role: UserRole::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = claims.sign_with_key(&session_key().unwrap()).unwrap();
        assert!(verify_jwt_session(token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let token = generate_jwt_session(&user(7, UserRole::User)).unwrap();
        let mut tampered = token;
        tampered.push('x');
        assert!(verify_jwt_session(tampered).is_err());
    }

    #[test]
    fn test_context_authenticate() {
        let ctx = RequestContext::anonymous();
        assert!(ctx.authenticate(ActionType::CreateRecipes).is_err());

        let ctx = RequestContext::for_user(user(7, UserRole::User));
        assert!(ctx.authenticate(ActionType::CreateRecipes).is_ok());
        assert!(ctx.authenticate(ActionType::ManageAllRecipes).is_err());

        let ctx = RequestContext::for_user(user(1, UserRole::Admin));
        assert!(ctx.authenticate(ActionType::ManageAllRecipes).is_ok());
    }
}
