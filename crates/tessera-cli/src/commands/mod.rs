//! CLI command implementations.

mod api;
mod auth;

pub use api::{can, get};
pub use auth::{sign_in, sign_out, status};

use anyhow::{Context, Result};
use credential_store::FileCookieJar;
use session_broadcast::LocalBus;
use session_client::{HistoryNavigator, ReqwestTransport, SessionContext, SessionOptions};
use std::sync::Arc;
use tessera_config::{init_logging, Config, Paths};
use tracing::debug;

/// Command-line values that win over the config file and environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub api_url: Option<String>,
}

/// Everything a command needs: resolved config and one session over the
/// on-disk cookie jar.
pub struct Runtime {
    config: Config,
    paths: Paths,
    session: SessionContext,
}

impl Runtime {
    /// Resolve config, install logging and open the session.
    pub fn load(overrides: Overrides) -> Result<Self> {
        let paths = Paths::new()?;
        let mut config = Config::load(&paths).context("Failed to load configuration")?;
        if let Some(level) = overrides.log_level {
            config.log_level = level;
        }
        if let Some(url) = overrides.api_url {
            config.api_base_url = url;
        }
        config.validate()?;

        paths.ensure_dirs()?;
        // The CLI keeps stderr for command output.
        init_logging("cli", &config, Some(&paths), false);

        let transport = ReqwestTransport::with_timeout(config.api_base_url()?, config.request_timeout())?;
        let jar = FileCookieJar::new(paths.cookie_file());
        debug!(jar = %jar.path().display(), "Using file cookie jar");

        let session = SessionContext::new(
            Arc::new(transport),
            Arc::new(jar),
            Arc::new(LocalBus::new()),
            Arc::new(HistoryNavigator::new()),
            session_options(&config),
        );

        Ok(Self {
            config,
            paths,
            session,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Restore the stored session, treating a rejected credential as signed out.
    async fn restore(&self) -> Option<session_client::User> {
        match self.session.mount().await {
            Ok(user) => user,
            Err(e) => {
                debug!(error = %e, "Stored session could not be restored");
                None
            }
        }
    }
}

fn session_options(config: &Config) -> SessionOptions {
    SessionOptions {
        authenticated_landing: config.authenticated_landing.clone(),
        anonymous_landing: config.anonymous_landing.clone(),
        credential_ttl: chrono::Duration::days(config.credential_ttl_days),
        channel: config.broadcast_channel.clone(),
    }
}
