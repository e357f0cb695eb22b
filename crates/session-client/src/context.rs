//! Browser session context: the application-facing session API.
//!
//! A `SessionContext` is one tab. It owns the tab's shared
//! [`AuthenticatedClient`], its endpoint on the session channel, and the
//! in-memory user. Tabs of one profile share only the cookie jar and the bus.

use crate::client::{AuthenticatedClient, TokenPair};
use crate::navigator::Navigator;
use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionState};
use crate::transport::{ApiRequest, Transport};
use crate::{ClientError, SessionError, SessionResult};
use access_gate::{Grants, SessionView};
use credential_store::{CookieStore, CredentialStore, DEFAULT_CREDENTIAL_TTL_DAYS};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use session_broadcast::{BroadcastBus, Inbound, SessionBroadcaster, SessionMessage, DEFAULT_CHANNEL};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The signed-in user as held in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(flatten)]
    pub grants: Grants,
}

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    #[serde(flatten)]
    tokens: TokenPair,
    #[serde(flatten)]
    grants: Grants,
}

/// Landing views, token lifetime and channel name for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub authenticated_landing: String,
    pub anonymous_landing: String,
    pub credential_ttl: chrono::Duration,
    pub channel: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            authenticated_landing: "/dashboard".to_string(),
            anonymous_landing: "/".to_string(),
            credential_ttl: chrono::Duration::days(DEFAULT_CREDENTIAL_TTL_DAYS),
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }
}

/// Callback type for session state change notifications.
pub type SessionStateCallback = Box<dyn Fn(SessionState, Option<&User>) + Send + Sync>;

struct ContextInner {
    client: AuthenticatedClient,
    store: CredentialStore,
    navigator: Arc<dyn Navigator>,
    broadcaster: SessionBroadcaster,
    user: watch::Sender<Option<User>>,
    fsm: Mutex<SessionMachine>,
    state_callback: Mutex<Option<SessionStateCallback>>,
    options: SessionOptions,
}

/// One tab's session.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<ContextInner>,
}

impl SessionContext {
    /// Create a tab over a shared jar and bus.
    ///
    /// The channel is subscribed immediately, so sign-outs posted by other
    /// tabs from this point on are buffered until [`mount`](Self::mount).
    pub fn new(
        transport: Arc<dyn Transport>,
        jar: Arc<dyn CookieStore>,
        bus: Arc<dyn BroadcastBus>,
        navigator: Arc<dyn Navigator>,
        options: SessionOptions,
    ) -> Self {
        let store = CredentialStore::with_ttl(jar, options.credential_ttl);
        let client = AuthenticatedClient::browser(transport, store.clone());
        let broadcaster = SessionBroadcaster::open(bus, options.channel.clone());
        let (user, _) = watch::channel(None);

        let context = Self {
            inner: Arc::new(ContextInner {
                client,
                store,
                navigator,
                broadcaster,
                user,
                fsm: Mutex::new(SessionMachine::new()),
                state_callback: Mutex::new(None),
                options,
            }),
        };

        let weak = Arc::downgrade(&context.inner);
        context.inner.client.set_sign_out_hook(Arc::new(move || {
            if let Some(context) = SessionContext::upgrade(&weak) {
                context.sign_out();
            }
        }));

        context
    }

    fn upgrade(weak: &Weak<ContextInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Start listening on the session channel, then bootstrap from stored credentials.
    pub async fn mount(&self) -> SessionResult<Option<User>> {
        self.listen()?;
        self.bootstrap().await
    }

    /// Start reacting to other tabs. Must be called within a tokio runtime.
    pub fn listen(&self) -> SessionResult<()> {
        let weak = Arc::downgrade(&self.inner);
        self.inner.broadcaster.listen(move |inbound| {
            if let Some(context) = SessionContext::upgrade(&weak) {
                context.handle_inbound(inbound);
            }
        })?;
        Ok(())
    }

    /// Restore the session from a persisted access token.
    ///
    /// No token means anonymous without any request. A token that fails
    /// `GET /me` signs the tab out.
    pub async fn bootstrap(&self) -> SessionResult<Option<User>> {
        self.transition(&SessionMachineInput::Bootstrap)?;

        let token = match self.inner.store.access_token() {
            Ok(token) => token,
            Err(e) => {
                self.sign_out();
                return Err(e.into());
            }
        };
        let Some(token) = token else {
            debug!("No stored access token, staying anonymous");
            self.transition(&SessionMachineInput::NoCredentials)?;
            return Ok(None);
        };
        // Another tab may have signed in since this client was built.
        self.inner.client.set_default_token(Some(token));

        match self.inner.client.get_json::<User>("/me").await {
            Ok(user) => {
                self.transition(&SessionMachineInput::UserLoaded)?;
                self.inner.user.send_replace(Some(user.clone()));
                info!(email = %user.email, "Session restored");
                self.notify_state_change();
                Ok(Some(user))
            }
            Err(e) => {
                warn!(error = %e, "Could not restore session");
                // A rejected credential has already signed the tab out.
                if self.state() != SessionState::Anonymous {
                    self.sign_out();
                }
                Err(e.into())
            }
        }
    }

    /// Exchange email and password for a session.
    ///
    /// Any failure leaves the tab fully signed out.
    pub async fn sign_in(&self, email: &str, password: &str) -> SessionResult<User> {
        self.transition(&SessionMachineInput::SignInAttempt)?;

        let response = match self.request_session(email, password).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                self.sign_out();
                return Err(e.into());
            }
        };

        // Fails if the tab was signed out while the request was in flight.
        self.transition(&SessionMachineInput::SignInSucceeded)?;

        if let Err(e) = self
            .inner
            .store
            .set(&response.tokens.token, &response.tokens.refresh_token)
        {
            warn!(error = %e, "Could not persist credentials");
            self.sign_out();
            return Err(e.into());
        }

        let user = User {
            email: email.to_string(),
            grants: response.grants,
        };
        self.inner.user.send_replace(Some(user.clone()));
        self.inner
            .client
            .set_default_token(Some(response.tokens.token));
        self.notify_state_change();

        info!(email = %user.email, "Signed in");
        self.inner
            .navigator
            .navigate(&self.inner.options.authenticated_landing);
        self.inner.broadcaster.post(SessionMessage::SignedIn);
        Ok(user)
    }

    async fn request_session(&self, email: &str, password: &str) -> Result<SignInResponse, ClientError> {
        let request = ApiRequest::post("/sessions").with_json(&SignInRequest { email, password })?;
        self.inner
            .client
            .send_unauthenticated(request)
            .await?
            .error_for_status()?
            .json()
    }

    /// End the session in this tab and tell every other tab to do the same.
    pub fn sign_out(&self) {
        self.tear_down(true);
    }

    /// Clear credentials, user and bearer, then go to the anonymous landing view.
    fn tear_down(&self, announce: bool) {
        if let Err(e) = self.transition(&SessionMachineInput::SignOutRequested) {
            debug!(error = %e, "Sign-out outside the session lifecycle");
        }

        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear credentials");
        }
        self.inner.user.send_replace(None);
        self.inner.client.set_default_token(None);

        if announce {
            self.inner.broadcaster.post(SessionMessage::SignedOut);
        }
        self.inner
            .navigator
            .navigate(&self.inner.options.anonymous_landing);

        if let Err(e) = self.transition(&SessionMachineInput::SignOutComplete) {
            debug!(error = %e, "Sign-out completion outside the session lifecycle");
        }
        self.notify_state_change();
        info!(announced = announce, "Signed out");
    }

    fn handle_inbound(&self, inbound: Inbound) {
        match inbound {
            Inbound::Message(SessionMessage::SignedOut) => {
                info!("Another tab signed out");
                self.tear_down(false);
            }
            Inbound::Message(SessionMessage::SignedIn) => {
                debug!("Another tab signed in");
            }
            Inbound::Missed(missed) => {
                // A dropped message may have been a sign-out: trust the shared jar.
                let has_token = self.inner.store.has_access_token().unwrap_or(false);
                if !has_token && self.is_authenticated() {
                    info!(missed, "Credentials gone after missed messages");
                    self.tear_down(false);
                }
            }
        }
    }

    pub fn user(&self) -> Option<User> {
        self.inner.user.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.user.borrow().is_some()
    }

    /// Watch the current user; changes on every sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.inner.user.subscribe()
    }

    pub fn state(&self) -> SessionState {
        SessionState::from(self.inner.fsm.lock().state())
    }

    /// The tab's shared client.
    pub fn client(&self) -> &AuthenticatedClient {
        &self.inner.client
    }

    pub fn options(&self) -> &SessionOptions {
        &self.inner.options
    }

    pub fn set_state_callback(&self, callback: SessionStateCallback) {
        *self.inner.state_callback.lock() = Some(callback);
    }

    fn transition(&self, input: &SessionMachineInput) -> SessionResult<SessionState> {
        let mut fsm = self.inner.fsm.lock();
        let old_state = SessionState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            SessionError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = SessionState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(old_state = ?old_state, new_state = ?new_state, "Session state transition");
        }
        Ok(new_state)
    }

    fn notify_state_change(&self) {
        let callback = self.inner.state_callback.lock();
        if let Some(callback) = callback.as_ref() {
            let user = self.user();
            callback(self.state(), user.as_ref());
        }
    }
}

impl SessionView for SessionContext {
    fn current_grants(&self) -> Option<Grants> {
        self.inner.user.borrow().as_ref().map(|user| user.grants.clone())
    }
}
