use super::AuditLog;
use super::auth::{CredentialHasher, hash_password};
use crate::core::validation::{MIN_PASSWORD_LEN, normalize_username, validate_password};
use crate::core::{Actor, AuditAction, AuditResource, Role, User, UserId, UserSummary};
use crate::error::{ClinicError, Result};
use crate::storage::UserRepository;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Username of the account created by `admin init`
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Request to create a staff account
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    /// Anything other than `admin` creates a staff account
    pub role: Option<String>,
}

/// Partial update of an account; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserUpdate {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Staff account administration
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    audit: AuditLog,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        audit: AuditLog,
    ) -> Self {
        Self {
            users,
            hasher,
            audit,
        }
    }

    fn require_admin(actor: &Actor) -> Result<()> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(ClinicError::Forbidden(
                "Access denied. Admin privileges required.".to_string(),
            ))
        }
    }

    /// All accounts, newest first
    pub async fn list(&self, actor: &Actor) -> Result<Vec<UserSummary>> {
        Self::require_admin(actor)?;
        Ok(self
            .users
            .list_users()
            .await?
            .iter()
            .map(UserSummary::from)
            .collect())
    }

    pub async fn create(&self, request: &NewUser, actor: &Actor) -> Result<UserSummary> {
        Self::require_admin(actor)?;

        let username = normalize_username(&request.username);
        if username.is_empty() || request.password.is_empty() {
            return Err(ClinicError::validation(
                "Username and password are required",
            ));
        }
        validate_password(&request.password)?;
        if self.users.find_user_by_username(&username).await?.is_some() {
            return Err(ClinicError::DuplicateUsername { username });
        }

        let role = match request.role.as_deref().map(str::parse::<Role>) {
            Some(Ok(Role::Admin)) => Role::Admin,
            _ => Role::Staff,
        };
        let hash = hash_password(&self.hasher, &request.password).await?;
        let user = User::new(username, hash, role);
        self.users.insert_user(&user).await?;

        info!(username = %user.username, role = %user.role, by = %actor.username, "Created user");
        self.audit
            .record(
                Some(actor),
                AuditAction::CreateUser,
                AuditResource::User,
                json!({
                    "createdUserId": user.id,
                    "createdUsername": user.username,
                    "createdRole": user.role,
                }),
            )
            .await;
        Ok(user.summary())
    }

    pub async fn update(
        &self,
        id: &UserId,
        update: &UserUpdate,
        actor: &Actor,
    ) -> Result<UserSummary> {
        Self::require_admin(actor)?;

        let mut user = self.users.get_user(id).await?;
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        self.users.update_user(&user).await?;

        info!(
            username = %user.username,
            role = %user.role,
            active = user.is_active,
            "Updated user"
        );
        self.audit
            .record(
                Some(actor),
                AuditAction::UpdateUser,
                AuditResource::User,
                json!({
                    "updatedUserId": user.id,
                    "updatedUsername": user.username,
                    "updatedRole": user.role,
                    "updatedIsActive": user.is_active,
                }),
            )
            .await;
        Ok(user.summary())
    }

    pub async fn reset_password(
        &self,
        id: &UserId,
        new_password: &str,
        actor: &Actor,
    ) -> Result<()> {
        Self::require_admin(actor)?;
        validate_password(new_password).map_err(|_| {
            ClinicError::validation(format!(
                "New password must be at least {MIN_PASSWORD_LEN} characters long"
            ))
        })?;

        let mut user = self.users.get_user(id).await?;
        user.password_hash = hash_password(&self.hasher, new_password).await?;
        user.updated_at = Utc::now();
        self.users.update_user(&user).await?;

        info!(username = %user.username, by = %actor.username, "Reset user password");
        self.audit
            .record(
                Some(actor),
                AuditAction::ResetUserPassword,
                AuditResource::User,
                json!({
                    "targetUserId": user.id,
                    "targetUsername": user.username,
                }),
            )
            .await;
        Ok(())
    }

    /// Resolve a user by id or username
    pub async fn find(&self, reference: &str) -> Result<User> {
        if let Ok(id) = UserId::parse_str(reference.trim()) {
            return self.users.get_user(&id).await;
        }
        self.users
            .find_user_by_username(&normalize_username(reference))
            .await?
            .ok_or_else(|| ClinicError::UserNotFound {
                id: reference.to_string(),
            })
    }

    /// Create the administrator account unless it already exists
    ///
    /// Returns `None` when an account with that username is already present;
    /// its password is left untouched.
    pub async fn bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserSummary>> {
        let username = normalize_username(username);
        if self.users.find_user_by_username(&username).await?.is_some() {
            return Ok(None);
        }
        let request = NewUser {
            username,
            password: password.to_string(),
            role: Some(Role::Admin.to_string()),
        };
        self.create(&request, &Actor::local_operator()).await.map(Some)
    }
}
