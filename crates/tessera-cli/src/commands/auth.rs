//! Sign-in, sign-out and status commands.

use super::Runtime;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use serde_json::json;
use session_client::User;
use std::io::{self, Write};

/// Sign in with email and password.
pub async fn sign_in(runtime: &Runtime, email: Option<&str>, format: &OutputFormat) -> Result<()> {
    if let Some(user) = runtime.restore().await {
        output::print_success(&format!("Already signed in as {}", user.email), format);
        return Ok(());
    }

    let email = match email {
        Some(email) => email.trim().to_string(),
        None => {
            print!("Email: ");
            io::stdout().flush()?;
            let mut email = String::new();
            io::stdin().read_line(&mut email)?;
            email.trim().to_string()
        }
    };
    if email.is_empty() {
        anyhow::bail!("Email is required");
    }

    // Prompt for password (hidden)
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }

    let user = runtime
        .session()
        .sign_in(&email, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Sign-in failed: {}", e))?;

    match format {
        OutputFormat::Text => println!("Signed in as {}", user.email),
        OutputFormat::Json => output::print_json(&user_json(&user)),
    }
    Ok(())
}

/// Sign out and clear the stored credentials.
pub async fn sign_out(runtime: &Runtime, format: &OutputFormat) -> Result<()> {
    let was_signed_in = runtime
        .session()
        .client()
        .store()
        .has_access_token()
        .unwrap_or(false);
    runtime.session().sign_out();

    if was_signed_in {
        output::print_success("Signed out", format);
    } else {
        output::print_success("Not signed in", format);
    }
    Ok(())
}

/// Show the current session.
pub async fn status(runtime: &Runtime, format: &OutputFormat) -> Result<()> {
    let user = runtime.restore().await;

    match format {
        OutputFormat::Text => {
            output::print_row("API", &runtime.config().api_base_url);
            output::print_row("Cookies", &runtime.paths().cookie_file().display().to_string());
            match &user {
                Some(user) => {
                    output::print_row("Session", "signed in");
                    output::print_row("Email", &user.email);
                    output::print_row("Permissions", &output::join_or_dash(&user.grants.permissions));
                    output::print_row("Roles", &output::join_or_dash(&user.grants.roles));
                }
                None => output::print_row("Session", "signed out"),
            }
        }
        OutputFormat::Json => output::print_json(&json!({
            "api_base_url": runtime.config().api_base_url,
            "signed_in": user.is_some(),
            "state": runtime.session().state(),
            "user": user.as_ref().map(user_json),
        })),
    }
    Ok(())
}

fn user_json(user: &User) -> serde_json::Value {
    json!({
        "email": user.email,
        "permissions": user.grants.permissions,
        "roles": user.grants.roles,
    })
}
