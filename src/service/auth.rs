//! Staff authentication: password hashing, bearer tokens and login

use super::AuditLog;
use crate::config::AuthConfig;
use crate::core::validation::{MIN_PASSWORD_LEN, normalize_username, validate_password};
use crate::core::{Actor, AuditAction, AuditResource, Role, User, UserId, UserSummary};
use crate::error::{ClinicError, Result};
use crate::storage::UserRepository;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// One-way password hashing
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(bcrypt::verify(password, hash)?)
    }
}

/// Hash on the blocking pool; bcrypt is deliberately slow
pub(crate) async fn hash_password(
    hasher: &Arc<dyn CredentialHasher>,
    password: &str,
) -> Result<String> {
    let hasher = hasher.clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ClinicError::custom(format!("Password hashing task failed: {e}")))?
}

pub(crate) async fn verify_password(
    hasher: &Arc<dyn CredentialHasher>,
    password: &str,
    hash: &str,
) -> Result<bool> {
    let hasher = hasher.clone();
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| ClinicError::custom(format!("Password check task failed: {e}")))?
}

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn actor(&self) -> Result<Actor> {
        let user_id = UserId::parse_str(&self.user_id).map_err(|_| ClinicError::InvalidToken)?;
        Ok(Actor::new(user_id, self.username.clone(), self.role))
    }
}

/// Issues and checks HS256 bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, Duration::hours(config.token_ttl_hours))
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn decode(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ClinicError::TokenExpired,
                _ => ClinicError::InvalidToken,
            })
    }
}

/// Successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: TokenIssuer,
    audit: AuditLog,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenIssuer,
        audit: AuditLog,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            audit,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(ClinicError::validation(
                "Username and password are required",
            ));
        }

        match self.check_credentials(&username, password).await {
            Ok(response) => Ok(response),
            Err(
                e @ (ClinicError::InvalidCredentials | ClinicError::AccountDeactivated),
            ) => {
                info!(%username, reason = %e, "Login rejected");
                Err(e)
            },
            Err(e) => {
                warn!(%username, error = %e, "Login failed");
                self.audit
                    .record(
                        None,
                        AuditAction::LoginError,
                        AuditResource::User,
                        json!({ "username": username, "error": e.to_string() }),
                    )
                    .await;
                Err(e)
            },
        }
    }

    async fn check_credentials(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(ClinicError::InvalidCredentials)?;

        if !user.is_active {
            return Err(ClinicError::AccountDeactivated);
        }
        if !verify_password(&self.hasher, password, &user.password_hash).await? {
            return Err(ClinicError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user)?;
        let actor = Actor::from(&user);
        self.audit
            .record(
                Some(&actor),
                AuditAction::LoginSuccess,
                AuditResource::User,
                json!({ "role": user.role }),
            )
            .await;
        info!(username = %user.username, "Login successful");

        Ok(LoginResponse {
            token,
            user: user.summary(),
        })
    }

    /// Actor named by a bearer token, trusting the signed claims
    pub fn authenticate(&self, token: &str) -> Result<Actor> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClinicError::MissingToken);
        }
        self.tokens.decode(token)?.actor()
    }

    /// Check a token and that its account still exists and is active
    pub async fn verify(&self, token: &str) -> Result<UserSummary> {
        let actor = self.authenticate(token)?;
        let user_id = actor.user_id.ok_or(ClinicError::InvalidToken)?;
        match self.users.get_user(&user_id).await {
            Ok(user) if user.is_active => Ok(user.summary()),
            Ok(_) | Err(ClinicError::UserNotFound { .. }) => Err(ClinicError::InactiveUser),
            Err(e) => Err(e),
        }
    }

    /// Only administrators may change their own password
    pub async fn change_password(
        &self,
        actor: &Actor,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if !actor.is_admin() {
            return Err(ClinicError::Forbidden(
                "Only admin users can change passwords".to_string(),
            ));
        }
        if current_password.is_empty() || new_password.is_empty() {
            return Err(ClinicError::validation(
                "Current password and new password are required",
            ));
        }
        validate_password(new_password).map_err(|_| {
            ClinicError::validation(format!(
                "New password must be at least {MIN_PASSWORD_LEN} characters long"
            ))
        })?;

        let user_id = actor.user_id.clone().ok_or_else(|| ClinicError::UserNotFound {
            id: actor.username.clone(),
        })?;
        let mut user = self.users.get_user(&user_id).await?;
        if !verify_password(&self.hasher, current_password, &user.password_hash).await? {
            return Err(ClinicError::IncorrectPassword);
        }

        user.password_hash = hash_password(&self.hasher, new_password).await?;
        user.updated_at = Utc::now();
        self.users.update_user(&user).await?;

        info!(username = %user.username, "Password changed");
        self.audit
            .record(
                Some(actor),
                AuditAction::ChangePassword,
                AuditResource::User,
                json!({ "role": user.role }),
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, MockUserRepository};

    const SECRET: &str = "test-secret";

    fn hasher() -> Arc<dyn CredentialHasher> {
        Arc::new(BcryptHasher::new(4))
    }

    async fn service_with(
        username: &str,
        password: &str,
        role: Role,
        active: bool,
    ) -> (AuthService, User) {
        let storage = Arc::new(MemoryStorage::new());
        let hasher = hasher();
        let mut user = User::new(
            username.to_string(),
            hasher.hash(password).unwrap(),
            role,
        );
        user.is_active = active;
        storage.insert_user(&user).await.unwrap();

        let service = AuthService::new(
            storage.clone(),
            hasher,
            TokenIssuer::new(SECRET, Duration::hours(1)),
            AuditLog::new(storage),
        );
        (service, user)
    }

    #[test]
    fn test_bcrypt_round_trip() {
        let hasher = BcryptHasher::new(4);
        let hash = hasher.hash("Admin@2024!").unwrap();
        assert!(hasher.verify("Admin@2024!", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_token_claims_are_camel_case() {
        let user = User::new("amina".to_string(), "h".to_string(), Role::Staff);
        let issuer = TokenIssuer::new(SECRET, Duration::hours(1));
        let claims = issuer.decode(&issuer.issue(&user).unwrap()).unwrap();
        assert_eq!(claims.user_id, user.id.to_string());
        assert_eq!(claims.role, Role::Staff);

        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_expired_and_forged_tokens() {
        let user = User::new("amina".to_string(), "h".to_string(), Role::Staff);
        let expired = TokenIssuer::new(SECRET, Duration::hours(-2)).issue(&user).unwrap();
        let issuer = TokenIssuer::new(SECRET, Duration::hours(1));
        assert!(matches!(issuer.decode(&expired), Err(ClinicError::TokenExpired)));

        let forged = TokenIssuer::new("other", Duration::hours(1)).issue(&user).unwrap();
        assert!(matches!(issuer.decode(&forged), Err(ClinicError::InvalidToken)));
        assert!(matches!(issuer.decode("garbage"), Err(ClinicError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_login_normalizes_username() {
        let (service, user) = service_with("admin", "Admin@2024!", Role::Admin, true).await;
        let response = service.login("  ADMIN ", "Admin@2024!").await.unwrap();
        assert_eq!(response.user.id, user.id);

        let actor = service.authenticate(&response.token).unwrap();
        assert!(actor.is_admin());
        assert_eq!(service.verify(&response.token).await.unwrap().username, "admin");
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (service, _) = service_with("reception", "password1", Role::Staff, true).await;
        assert!(matches!(
            service.login("reception", "wrong-pass").await,
            Err(ClinicError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody", "password1").await,
            Err(ClinicError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("", "password1").await,
            Err(ClinicError::Validation(_))
        ));

        let (service, _) = service_with("former", "password1", Role::Staff, false).await;
        assert!(matches!(
            service.login("former", "password1").await,
            Err(ClinicError::AccountDeactivated)
        ));
    }

    #[tokio::test]
    async fn test_login_storage_failure_is_audited() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_user_by_username()
            .returning(|_| Err(ClinicError::storage("connection reset")));
        let audit_store = Arc::new(MemoryStorage::new());
        let audit = AuditLog::new(audit_store);
        let service = AuthService::new(
            Arc::new(users),
            hasher(),
            TokenIssuer::new(SECRET, Duration::hours(1)),
            audit.clone(),
        );

        assert!(service.login("admin", "whatever1").await.is_err());
        let entries = audit.recent(1).await.unwrap();
        assert_eq!(entries[0].action, AuditAction::LoginError);
        assert_eq!(entries[0].details["username"], "admin");
    }

    #[tokio::test]
    async fn test_verify_rejects_deactivated_account() {
        let (service, user) = service_with("reception", "password1", Role::Staff, true).await;
        let token = service.login("reception", "password1").await.unwrap().token;

        let mut deactivated = user.clone();
        deactivated.is_active = false;
        service.users.update_user(&deactivated).await.unwrap();
        assert!(matches!(
            service.verify(&token).await,
            Err(ClinicError::InactiveUser)
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let (service, user) = service_with("admin", "Admin@2024!", Role::Admin, true).await;
        let actor = Actor::from(&user);

        assert!(matches!(
            service.change_password(&actor, "wrong-current", "NewPass#2026").await,
            Err(ClinicError::IncorrectPassword)
        ));
        assert!(matches!(
            service.change_password(&actor, "Admin@2024!", "short").await,
            Err(ClinicError::Validation(_))
        ));

        service
            .change_password(&actor, "Admin@2024!", "NewPass#2026")
            .await
            .unwrap();
        assert!(service.login("admin", "NewPass#2026").await.is_ok());
    }

    #[tokio::test]
    async fn test_staff_cannot_change_password() {
        let (service, user) = service_with("reception", "password1", Role::Staff, true).await;
        let err = service
            .change_password(&Actor::from(&user), "password1", "password2")
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::Forbidden(_)));
    }
}
