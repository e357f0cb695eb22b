//! Route guards for server-rendered pages.
//!
//! Each guard works on the inbound request's own cookie jar and never on
//! shared state. Credential problems become redirects, never errors handed
//! to the rendering framework.

use crate::claims::decode_grants;
use crate::client::AuthenticatedClient;
use crate::context::SessionOptions;
use crate::transport::Transport;
use crate::{ClientError, ClientResult};
use access_gate::{authorize, AuthorizationRequirement};
use credential_store::{CredentialStore, RequestCookieJar};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// What a guarded route produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome<T> {
    /// Render with these props
    Props(T),
    /// Send the visitor elsewhere instead of rendering
    Redirect { destination: String, permanent: bool },
}

impl<T> PageOutcome<T> {
    pub fn redirect(destination: impl Into<String>) -> Self {
        PageOutcome::Redirect {
            destination: destination.into(),
            permanent: false,
        }
    }

    pub fn props(self) -> Option<T> {
        match self {
            PageOutcome::Props(props) => Some(props),
            PageOutcome::Redirect { .. } => None,
        }
    }

    pub fn redirect_destination(&self) -> Option<&str> {
        match self {
            PageOutcome::Redirect { destination, .. } => Some(destination),
            PageOutcome::Props(_) => None,
        }
    }
}

/// Guard a route that requires a signed-in visitor.
///
/// - no access token cookie: redirect to the anonymous landing view before
///   the loader runs
/// - `requirement` not met by the token's grants: redirect to the
///   authenticated landing view; an undecodable token never meets one
/// - loader fails with `CredentialInvalid`: destroy both cookies on the
///   request jar and redirect to the anonymous landing view
///
/// The loader receives a client built for this request alone. Other loader
/// errors are returned unchanged.
pub async fn with_ssr_auth<T, F, Fut>(
    transport: Arc<dyn Transport>,
    cookies: Arc<RequestCookieJar>,
    requirement: Option<&AuthorizationRequirement>,
    options: &SessionOptions,
    loader: F,
) -> ClientResult<PageOutcome<T>>
where
    F: FnOnce(AuthenticatedClient) -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let store = CredentialStore::with_ttl(cookies, options.credential_ttl);
    let Some(token) = store.access_token()? else {
        debug!("No access token cookie, redirecting");
        return Ok(PageOutcome::redirect(&options.anonymous_landing));
    };

    if let Some(requirement) = requirement.filter(|r| !r.is_empty()) {
        let grants = decode_grants(&token);
        if !authorize(grants.as_ref(), requirement) {
            debug!(decodable = grants.is_some(), "Route requirement not met");
            return Ok(PageOutcome::redirect(&options.authenticated_landing));
        }
    }

    let client = AuthenticatedClient::server(transport, store.clone());
    match loader(client).await {
        Ok(props) => Ok(PageOutcome::Props(props)),
        Err(ClientError::CredentialInvalid) => {
            info!("Credential invalid during server render, clearing cookies");
            store.clear()?;
            Ok(PageOutcome::redirect(&options.anonymous_landing))
        }
        Err(e) => Err(e),
    }
}

/// Guard a route only anonymous visitors may see.
///
/// A request carrying an access token cookie is redirected to the
/// authenticated landing view; otherwise the loader runs.
pub async fn with_ssr_guest<T, F, Fut>(
    cookies: Arc<RequestCookieJar>,
    options: &SessionOptions,
    loader: F,
) -> ClientResult<PageOutcome<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let store = CredentialStore::with_ttl(cookies, options.credential_ttl);
    if store.has_access_token()? {
        debug!("Visitor already signed in, redirecting");
        return Ok(PageOutcome::redirect(&options.authenticated_landing));
    }
    Ok(PageOutcome::Props(loader().await?))
}
