use super::password_or_prompt;
use crate::cli::{AdminCommands, OutputFormatter};
use crate::error::{ClinicError, Result};
use crate::service::ClinicContext;
use serde_json::json;

pub async fn handle_admin_command(
    command: AdminCommands,
    context: &ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    match command {
        AdminCommands::Init { username, password } => {
            handle_init(&username, password, context, output).await
        },
    }
}

/// Create the administrator account unless it already exists
async fn handle_init(
    username: &str,
    password: Option<String>,
    context: &ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    match context.users.find(username).await {
        Ok(existing) => {
            if !output.json(&json!({ "created": false, "user": existing.summary() }))? {
                output.info(&format!(
                    "Account '{}' already exists; nothing to do",
                    existing.username
                ));
            }
            return Ok(());
        },
        Err(ClinicError::UserNotFound { .. }) => {},
        Err(e) => return Err(e),
    }

    let password = password_or_prompt(password, "Administrator password")?;
    let created = context.users.bootstrap_admin(username, &password).await?;

    match created {
        Some(user) => {
            if !output.json(&json!({ "created": true, "user": user }))? {
                output.success(&format!("Created administrator '{}'", user.username));
            }
        },
        None => {
            if !output.json(&json!({ "created": false }))? {
                output.info(&format!("Account '{username}' already exists; nothing to do"));
            }
        },
    }
    Ok(())
}
