//! Bearer-attaching HTTP client with transparent token refresh.
//!
//! Every request carries the client's default credential. Responses pass
//! through [`AuthenticatedClient::intercept`], the only place a 401 is looked
//! at:
//!
//! - 2xx: returned as is
//! - non-401 failure: `ClientError::Http`, untouched
//! - 401 `token.expired`: retry once with a token another caller already
//!   rotated into the store, or join the single-flight refresh and replay
//!   the request once with the new token, in queue order
//! - any other 401, or a 401 on the replay: the credential is invalid
//!
//! What "invalid" means depends on the [`ClientContext`]. A browser client
//! signs the whole session out; a server client reports
//! `ClientError::CredentialInvalid` and leaves cleanup to the route guard.

use crate::refresh::{Admission, RefreshCoordinator, ReplayTurn, Resumed};
use crate::transport::{ApiRequest, ApiResponse, Transport};
use crate::{ClientError, ClientResult, RefreshError};
use credential_store::CredentialStore;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::task::Poll;
use tracing::{debug, info, warn};

/// Where a client runs, which decides how credential failures surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientContext {
    /// Long-lived, shared by one browser context
    Browser,
    /// Built for one server-rendered request, never shared
    Server,
}

/// Callback that signs the owning session out.
pub type SignOutHook = Arc<dyn Fn() + Send + Sync>;

/// Body of `POST /refresh`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Token pair returned by `POST /refresh` and `POST /sessions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    store: CredentialStore,
    context: ClientContext,
    default_token: RwLock<Option<String>>,
    coordinator: RefreshCoordinator,
    sign_out_hook: RwLock<Option<SignOutHook>>,
}

/// HTTP client that owns its refresh coordinator.
///
/// Cheap to clone; clones share the coordinator and default credential.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<ClientInner>,
}

impl AuthenticatedClient {
    /// Build a client whose default credential is seeded from `store`.
    pub fn new(transport: Arc<dyn Transport>, store: CredentialStore, context: ClientContext) -> Self {
        let default_token = match store.access_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read access token, starting without one");
                None
            }
        };
        debug!(context = ?context, seeded = default_token.is_some(), "Created authenticated client");

        Self {
            inner: Arc::new(ClientInner {
                transport,
                store,
                context,
                default_token: RwLock::new(default_token),
                coordinator: RefreshCoordinator::new(),
                sign_out_hook: RwLock::new(None),
            }),
        }
    }

    pub fn browser(transport: Arc<dyn Transport>, store: CredentialStore) -> Self {
        Self::new(transport, store, ClientContext::Browser)
    }

    pub fn server(transport: Arc<dyn Transport>, store: CredentialStore) -> Self {
        Self::new(transport, store, ClientContext::Server)
    }

    pub fn context(&self) -> ClientContext {
        self.inner.context
    }

    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    pub fn default_token(&self) -> Option<String> {
        self.inner.default_token.read().clone()
    }

    /// Replace the bearer attached to subsequent requests.
    pub fn set_default_token(&self, token: Option<String>) {
        *self.inner.default_token.write() = token;
    }

    /// Install the callback run when a browser client must end the session.
    pub fn set_sign_out_hook(&self, hook: SignOutHook) {
        *self.inner.sign_out_hook.write() = Some(hook);
    }

    /// Send through the raw transport: no bearer, no interception.
    pub async fn send_unauthenticated(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        self.inner.transport.send(&request.with_bearer(None)).await
    }

    /// Send with the default credential and handle credential failures.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let request = request.with_bearer(self.default_token());
        let response = self.inner.transport.send(&request).await?;
        self.intercept(request, response).await
    }

    pub async fn get(&self, path: &str) -> ClientResult<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.get(path).await?.json()
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<ApiResponse> {
        self.send(ApiRequest::post(path).with_json(body)?).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post(path, body).await?.json()
    }

    async fn intercept(&self, request: ApiRequest, response: ApiResponse) -> ClientResult<ApiResponse> {
        if response.is_success() {
            return Ok(response);
        }
        if response.status != 401 {
            return response.error_for_status();
        }
        if !response.is_token_expired() {
            debug!(path = %request.path, "Access token rejected");
            return Err(self.credential_invalid());
        }

        // Someone already rotated the token since this request went out.
        let current = self.inner.store.access_token()?;
        if let Some(current) = current.filter(|token| Some(token) != request.bearer.as_ref()) {
            debug!(path = %request.path, "Retrying with already rotated token");
            self.set_default_token(Some(current.clone()));
            let retry = request.clone().with_bearer(Some(current));
            let response = self.inner.transport.send(&retry).await?;
            if !response.is_token_expired() {
                return self.settle_replay(&retry, response);
            }
            // The rotated token has expired as well: refresh it like any other.
            debug!(path = %request.path, "Rotated token expired too");
        }

        let pending = match self.inner.coordinator.admit() {
            Admission::Leader(pending) => {
                self.spawn_refresh();
                pending
            }
            Admission::Follower(pending) => pending,
        };

        match pending.resume().await {
            Ok(Resumed { token, turn }) => self.replay(request, token, turn).await,
            Err(e) => Err(match self.inner.context {
                ClientContext::Browser => ClientError::Refresh(e),
                ClientContext::Server => ClientError::CredentialInvalid,
            }),
        }
    }

    /// Re-issue `request` once with `token` when `turn` comes up.
    ///
    /// The turn is released as soon as the request has been handed to the
    /// transport, not when its response arrives.
    async fn replay(
        &self,
        request: ApiRequest,
        token: String,
        mut turn: ReplayTurn,
    ) -> ClientResult<ApiResponse> {
        let request = request.with_bearer(Some(token));
        turn.ready().await;

        let mut sending = self.inner.transport.send(&request);
        // One poll dispatches the request.
        let early = std::future::poll_fn(|cx| Poll::Ready(sending.as_mut().poll(cx))).await;
        turn.release();
        let response = match early {
            Poll::Ready(response) => response,
            Poll::Pending => sending.await,
        }?;
        self.settle_replay(&request, response)
    }

    /// A 401 on a replay is never refreshed again.
    fn settle_replay(&self, request: &ApiRequest, response: ApiResponse) -> ClientResult<ApiResponse> {
        match response.status {
            401 => {
                debug!(path = %request.path, "Replayed request rejected");
                Err(self.credential_invalid())
            }
            _ => response.error_for_status(),
        }
    }

    /// Run the refresh on its own task so no single caller can strand the queue.
    fn spawn_refresh(&self) {
        let client = self.clone();
        tokio::spawn(async move {
            let outcome = client.refresh().await;
            if let Err(e) = &outcome {
                warn!(error = %e, "Token refresh failed");
                // Once for the whole queue, before any waiter resumes.
                if client.inner.context == ClientContext::Browser {
                    client.trigger_sign_out();
                }
            }

            client.inner.coordinator.complete(outcome);
        });
    }

    async fn refresh(&self) -> Result<String, RefreshError> {
        let refresh_token = self
            .inner
            .store
            .refresh_token()
            .map_err(|e| RefreshError::Storage(e.to_string()))?
            .ok_or(RefreshError::MissingRefreshToken)?;

        let request = ApiRequest::post("/refresh")
            .with_json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;

        let response = self
            .inner
            .transport
            .send(&request)
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;
        if !response.is_success() {
            return Err(RefreshError::Rejected {
                status: response.status,
            });
        }

        let pair: TokenPair = response
            .json()
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;
        self.inner
            .store
            .set(&pair.token, &pair.refresh_token)
            .map_err(|e| RefreshError::Storage(e.to_string()))?;
        self.set_default_token(Some(pair.token.clone()));

        info!("Access token refreshed");
        Ok(pair.token)
    }

    fn credential_invalid(&self) -> ClientError {
        match self.inner.context {
            ClientContext::Browser => {
                self.trigger_sign_out();
                ClientError::SessionEnded
            }
            ClientContext::Server => ClientError::CredentialInvalid,
        }
    }

    fn trigger_sign_out(&self) {
        let hook = self.inner.sign_out_hook.read().clone();
        match hook {
            Some(hook) => hook(),
            None => {
                // No session attached: drop what this client can reach.
                warn!("No sign-out hook installed, clearing credentials only");
                if let Err(e) = self.inner.store.clear() {
                    warn!(error = %e, "Failed to clear credentials");
                }
                self.set_default_token(None);
            }
        }
    }
}
