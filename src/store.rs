use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::lists::Site;

const APP_NAME: &str = "sitedeck";
const STORE_FILE_NAME: &str = "store.json";

/// Storage key for the imported site list. Holds a string-encoded JSON
/// array, matching how the original extension serialized it.
const SITE_LIST_KEY: &str = "siteList";
/// Storage key for the favorites list. Holds a native JSON array.
const FAVORITES_KEY: &str = "favorites";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store at {path}: {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("store at {path} is malformed: {detail}")]
    Malformed { path: PathBuf, detail: String },
    #[error("failed to write store at {path}: {source}")]
    Write {
        path: PathBuf,
        source: io::Error,
    },
}

/// Key-value store backing both persisted collections. One JSON object in
/// one file; a missing file or missing key reads as an empty collection.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl Store {
    pub fn default_path() -> Result<PathBuf> {
        let base = BaseDirs::new().context("unable to determine data directories")?;
        Ok(base.data_dir().join(APP_NAME).join(STORE_FILE_NAME))
    }

    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;
            let value: Value =
                serde_json::from_str(&raw).map_err(|err| StoreError::Malformed {
                    path: path.clone(),
                    detail: err.to_string(),
                })?;
            match value {
                Value::Object(map) => map,
                other => {
                    return Err(StoreError::Malformed {
                        path,
                        detail: format!("expected a JSON object, found {}", json_kind(&other)),
                    })
                }
            }
        } else {
            Map::new()
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the site list. The value is a JSON string containing a JSON
    /// array; absence of the key is an empty list.
    pub fn site_list(&self) -> Result<Vec<Site>, StoreError> {
        let Some(value) = self.entries.get(SITE_LIST_KEY) else {
            return Ok(Vec::new());
        };
        let Value::String(encoded) = value else {
            return Err(self.malformed(format!(
                "key {SITE_LIST_KEY:?} should be a string, found {}",
                json_kind(value)
            )));
        };
        serde_json::from_str(encoded)
            .map_err(|err| self.malformed(format!("key {SITE_LIST_KEY:?}: {err}")))
    }

    /// Read the favorites list, stored as a native array of records.
    pub fn favorites(&self) -> Result<Vec<Site>, StoreError> {
        let Some(value) = self.entries.get(FAVORITES_KEY) else {
            return Ok(Vec::new());
        };
        serde_json::from_value(value.clone())
            .map_err(|err| self.malformed(format!("key {FAVORITES_KEY:?}: {err}")))
    }

    pub fn set_site_list(&mut self, sites: &[Site]) -> Result<(), StoreError> {
        let encoded =
            serde_json::to_string(sites).map_err(|err| self.malformed(err.to_string()))?;
        self.entries
            .insert(SITE_LIST_KEY.to_string(), Value::String(encoded));
        self.flush()
    }

    pub fn set_favorites(&mut self, favorites: &[Site]) -> Result<(), StoreError> {
        let value =
            serde_json::to_value(favorites).map_err(|err| self.malformed(err.to_string()))?;
        self.entries.insert(FAVORITES_KEY.to_string(), value);
        self.flush()
    }

    pub fn remove_site_list(&mut self) -> Result<(), StoreError> {
        self.entries.remove(SITE_LIST_KEY);
        self.flush()
    }

    pub fn remove_favorites(&mut self) -> Result<(), StoreError> {
        self.entries.remove(FAVORITES_KEY);
        self.flush()
    }

    fn flush(&self) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(&Value::Object(self.entries.clone()))
            .map_err(|err| self.malformed(err.to_string()))?;
        write_atomic(&self.path, &data).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn malformed(&self, detail: String) -> StoreError {
        StoreError::Malformed {
            path: self.path.clone(),
            detail,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write via a temp file in the same directory, then rename over the target.
fn write_atomic(target: &Path, data: &[u8]) -> io::Result<()> {
    let parent = target.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("target path has no parent: {}", target.display()),
        )
    })?;
    fs::create_dir_all(parent)?;

    let file_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(STORE_FILE_NAME);

    let mut temp_path;
    let mut counter: u32 = 0;
    loop {
        let candidate = if counter == 0 {
            format!(".{file_name}.tmp")
        } else {
            format!(".{file_name}.{counter}.tmp")
        };
        temp_path = parent.join(candidate);
        if !temp_path.exists() {
            break;
        }
        counter += 1;
    }

    fs::write(&temp_path, data)?;
    match fs::rename(&temp_path, target) {
        Ok(()) => Ok(()),
        Err(err) => {
            let _ = fs::remove_file(&temp_path);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site(stack: &str, name: &str, url: &str) -> Site {
        Site {
            stack: stack.to_string(),
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn missing_file_reads_as_empty_collections() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("store.json")).unwrap();
        assert!(store.site_list().unwrap().is_empty());
        assert!(store.favorites().unwrap().is_empty());
    }

    #[test]
    fn site_list_round_trips_through_string_encoding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let sites = vec![site("tech", "GitHub", "https://github.com")];

        let mut store = Store::open(path.clone()).unwrap();
        store.set_site_list(&sites).unwrap();
        drop(store);

        // On disk the site list is a JSON string, not an array.
        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get(SITE_LIST_KEY).unwrap().is_string());

        let reopened = Store::open(path).unwrap();
        assert_eq!(reopened.site_list().unwrap(), sites);
    }

    #[test]
    fn favorites_are_stored_as_native_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let favorites = vec![site("tech", "GitHub", "https://github.com")];

        let mut store = Store::open(path.clone()).unwrap();
        store.set_favorites(&favorites).unwrap();
        drop(store);

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get(FAVORITES_KEY).unwrap().is_array());

        let reopened = Store::open(path).unwrap();
        assert_eq!(reopened.favorites().unwrap(), favorites);
    }

    #[test]
    fn removing_site_list_preserves_favorites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let mut store = Store::open(path.clone()).unwrap();
        store
            .set_site_list(&[site("tech", "GitHub", "https://github.com")])
            .unwrap();
        store
            .set_favorites(&[site("tech", "GitHub", "https://github.com")])
            .unwrap();
        store.remove_site_list().unwrap();

        let reopened = Store::open(path).unwrap();
        assert!(reopened.site_list().unwrap().is_empty());
        assert_eq!(reopened.favorites().unwrap().len(), 1);
    }

    #[test]
    fn malformed_store_is_an_error_not_a_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = Store::open(path).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }
}
