//! On-disk locations of the client's config, cookies and logs.

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Environment variable that relocates the whole Tessera directory.
pub const HOME_ENV: &str = "TESSERA_HOME";

/// Layout under the Tessera directory (`~/.tessera` unless `TESSERA_HOME` is set):
///
/// ```text
/// config.json          client settings
/// cookies.json         persisted credential cookies
/// logs/tessera.jsonl   structured log
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    pub fn new() -> CoreResult<Self> {
        Self::resolve(std::env::var_os(HOME_ENV).map(PathBuf::from), dirs::home_dir())
    }

    /// Pick the base directory: a non-empty override wins, then `<home>/.tessera`.
    fn resolve(override_dir: Option<PathBuf>, home: Option<PathBuf>) -> CoreResult<Self> {
        let base_dir = match override_dir.filter(|dir| !dir.as_os_str().is_empty()) {
            Some(dir) => dir,
            None => home.ok_or(CoreError::NoHomeDir)?.join(".tessera"),
        };
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// The file cookie jar. Holds live tokens.
    pub fn cookie_file(&self) -> PathBuf {
        self.base_dir.join("cookies.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("tessera.jsonl")
    }

    /// Create the directory tree. On unix the base directory is owner-only,
    /// since the cookie jar inside it carries credentials.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(self.logs_dir())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.base_dir, std::fs::Permissions::from_mode(0o700))?;
        }
        Ok(())
    }
}
