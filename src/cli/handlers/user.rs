use super::password_or_prompt;
use crate::cli::{OutputFormatter, UserCommands};
use crate::core::{Actor, Role};
use crate::error::{ClinicError, Result};
use crate::service::{ClinicContext, NewUser, UserUpdate};

pub async fn handle_user_command(
    command: UserCommands,
    context: &ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    let actor = Actor::local_operator();
    match command {
        UserCommands::List => {
            let users = context.users.list(&actor).await?;
            if output.json(&users)? {
                return Ok(());
            }
            if users.is_empty() {
                output.info("No accounts yet. Run `clinic-desk admin init` to create one.");
            }
            for user in &users {
                output.info(&output.user_row(user));
            }
        },
        UserCommands::Add {
            username,
            password,
            admin,
        } => {
            let password = password_or_prompt(password, "Password")?;
            let role = if admin { Role::Admin } else { Role::Staff };
            let request = NewUser {
                username,
                password,
                role: Some(role.to_string()),
            };
            let user = context.users.create(&request, &actor).await?;
            if !output.json(&user)? {
                output.success(&format!("Created {} account '{}'", user.role, user.username));
            }
        },
        UserCommands::Set {
            user,
            role,
            activate,
            deactivate,
        } => {
            let role = role
                .map(|r| r.parse::<Role>().map_err(ClinicError::Validation))
                .transpose()?;
            let is_active = match (activate, deactivate) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let target = context.users.find(&user).await?;
            let updated = context
                .users
                .update(&target.id, &UserUpdate { role, is_active }, &actor)
                .await?;
            if !output.json(&updated)? {
                output.success(&format!("Updated account '{}'", updated.username));
                output.info(&output.user_row(&updated));
            }
        },
        UserCommands::ResetPassword { user, password } => {
            let target = context.users.find(&user).await?;
            let password = password_or_prompt(password, "New password")?;
            context
                .users
                .reset_password(&target.id, &password, &actor)
                .await?;
            if !output.json(&serde_json::json!({ "reset": true, "username": target.username }))? {
                output.success(&format!("Password reset for '{}'", target.username));
            }
        },
    }
    Ok(())
}
