//! API access commands.

use super::Runtime;
use crate::output::{self, OutputFormat};
use access_gate::AuthorizationRequirement;
use anyhow::Result;
use serde_json::{json, Value};
use tracing::debug;

/// GET `path` with the stored credentials and print the body.
///
/// An expired access token is refreshed transparently; a credential the
/// server rejects outright signs the CLI out.
pub async fn get(runtime: &Runtime, path: &str, format: &OutputFormat) -> Result<()> {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    let response = runtime.session().client().get(&path).await?;
    debug!(path = %path, status = response.status, "GET completed");

    match (serde_json::from_str::<Value>(&response.body), format) {
        (Ok(body), _) => output::print_json(&body),
        (Err(_), OutputFormat::Text) => println!("{}", response.body),
        (Err(_), OutputFormat::Json) => output::print_json(&json!({
            "status": response.status,
            "body": response.body,
        })),
    }
    Ok(())
}

/// Report whether the signed-in user satisfies the given permissions and roles.
pub async fn can(
    runtime: &Runtime,
    permissions: Vec<String>,
    roles: Vec<String>,
    format: &OutputFormat,
) -> Result<()> {
    let requirement = AuthorizationRequirement::permissions(permissions).with_roles(roles);
    let user = runtime.restore().await;
    let allowed = access_gate::can(runtime.session(), &requirement);

    match format {
        OutputFormat::Text => {
            let verdict = match (&user, allowed) {
                (None, _) => "denied (not signed in)",
                (Some(_), true) => "allowed",
                (Some(_), false) => "denied",
            };
            println!("{}", verdict);
        }
        OutputFormat::Json => output::print_json(&json!({
            "allowed": allowed,
            "signed_in": user.is_some(),
            "requirement": requirement,
        })),
    }
    Ok(())
}
