//! File-backed cookie jar.
//!
//! Keeps cookies in a JSON document so a session survives process restarts.
//! The file is re-read on every access; writes go to a sibling temp file and
//! are renamed into place so a reader never sees a partial document.

use crate::{CookieOptions, CookieStore, StorageResult, StoredCookie};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

type CookieMap = HashMap<String, StoredCookie>;

pub struct FileCookieJar {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StorageResult<CookieMap> {
        if !self.path.exists() {
            return Ok(CookieMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(CookieMap::new());
        }
        let mut cookies: CookieMap = serde_json::from_str(&content)?;
        cookies.retain(|_, cookie| !cookie.is_expired());
        Ok(cookies)
    }

    fn save(&self, cookies: &CookieMap) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(cookies)?)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), count = cookies.len(), "Saved cookie jar");
        Ok(())
    }
}

impl CookieStore for FileCookieJar {
    fn get(&self, name: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(name).map(|cookie| cookie.value))
    }

    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> StorageResult<()> {
        self.set_many(&[(name, value)], options)
    }

    fn destroy(&self, name: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock();
        let mut cookies = self.load()?;
        let existed = cookies.remove(name).is_some();
        if existed {
            self.save(&cookies)?;
        }
        Ok(existed)
    }

    fn get_many(&self, names: &[&str]) -> StorageResult<Vec<Option<String>>> {
        let _guard = self.lock.lock();
        let cookies = self.load()?;
        Ok(names
            .iter()
            .map(|name| cookies.get(*name).map(|cookie| cookie.value.clone()))
            .collect())
    }

    fn set_many(&self, entries: &[(&str, &str)], options: &CookieOptions) -> StorageResult<()> {
        let _guard = self.lock.lock();
        let mut cookies = self.load()?;
        for (name, value) in entries {
            cookies.insert(name.to_string(), StoredCookie::from_options(value, options));
        }
        self.save(&cookies)
    }

    fn destroy_many(&self, names: &[&str]) -> StorageResult<()> {
        let _guard = self.lock.lock();
        let mut cookies = self.load()?;
        for name in names {
            cookies.remove(*name);
        }
        self.save(&cookies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_file_jar_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cookies.json");

        let jar = FileCookieJar::new(&path);
        jar.set("session", "abc", &CookieOptions::default()).unwrap();
        assert!(path.exists());

        let reopened = FileCookieJar::new(&path);
        assert_eq!(reopened.get("session").unwrap(), Some("abc".to_string()));
    }

    #[test]
    fn test_file_jar_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let jar = FileCookieJar::new(dir.path().join("cookies.json"));
        assert_eq!(jar.get("session").unwrap(), None);
        assert!(!jar.destroy("session").unwrap());
    }

    #[test]
    fn test_file_jar_destroy_many() {
        let dir = tempdir().unwrap();
        let jar = FileCookieJar::new(dir.path().join("cookies.json"));
        jar.set_many(&[("a", "1"), ("b", "2"), ("c", "3")], &CookieOptions::default())
            .unwrap();

        jar.destroy_many(&["a", "b"]).unwrap();
        assert_eq!(
            jar.get_many(&["a", "b", "c"]).unwrap(),
            vec![None, None, Some("3".to_string())]
        );
    }

    #[test]
    fn test_file_jar_skips_expired() {
        let dir = tempdir().unwrap();
        let jar = FileCookieJar::new(dir.path().join("cookies.json"));
        jar.set("old", "x", &CookieOptions::new(Duration::seconds(-5)))
            .unwrap();
        assert_eq!(jar.get("old").unwrap(), None);
    }
}
