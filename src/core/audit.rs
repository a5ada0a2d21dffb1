use super::user::{Role, User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Who is performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<UserId>,
    pub username: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: Some(user_id),
            username: username.into(),
            role,
        }
    }

    /// Operator at the server console; acts with admin rights
    pub fn local_operator() -> Self {
        Self {
            user_id: None,
            username: "console".to_string(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id.clone(), user.username.clone(), user.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateTicket,
    UpdateTicketStatus,
    LoginSuccess,
    LoginError,
    ChangePassword,
    CreateUser,
    UpdateUser,
    ResetUserPassword,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateTicket => "CREATE_TICKET",
            Self::UpdateTicketStatus => "UPDATE_TICKET_STATUS",
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::LoginError => "LOGIN_ERROR",
            Self::ChangePassword => "CHANGE_PASSWORD",
            Self::CreateUser => "CREATE_USER",
            Self::UpdateUser => "UPDATE_USER",
            Self::ResetUserPassword => "RESET_USER_PASSWORD",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditResource {
    Ticket,
    User,
}

/// One line of the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub action: AuditAction,
    pub resource: AuditResource,
    #[serde(default)]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: Option<&Actor>,
        action: AuditAction,
        resource: AuditResource,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: actor.and_then(|a| a.user_id.clone()),
            username: actor.map(|a| a.username.clone()),
            action,
            resource,
            details,
            created_at: Utc::now(),
        }
    }
}
