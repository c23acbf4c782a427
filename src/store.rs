//! Persistence of the configured PIN.
//!
//! A record is stored as a text body: a fixed prefix followed by a JSON map with the keys
//! `pin_is_configured` and `pin_code`. Anything else found in the backing store is treated as
//! corruption.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

pub const RECORD_PREFIX: &str = "const ENV = ";

pub const DEFAULT_PIN: &str = "1234";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRecord {
    #[serde(rename = "pin_is_configured")]
    pub configured: bool,
    #[serde(rename = "pin_code")]
    pub pin: String,
}

impl Default for PinRecord {
    fn default() -> Self {
        Self { configured: false, pin: DEFAULT_PIN.to_owned() }
    }
}

impl PinRecord {
    pub fn encode(&self) -> Result<String, StoreError> {
        let json = serde_json::to_string(self).map_err(StoreError::Serialization)?;
        Ok(format!("{}{}", RECORD_PREFIX, json))
    }

    pub fn decode(body: &str) -> Result<Self, StoreError> {
        let json = body
            .trim_end()
            .strip_prefix(RECORD_PREFIX)
            .ok_or_else(|| StoreError::Corrupted("missing record prefix".to_owned()))?;
        let record: Self =
            serde_json::from_str(json).map_err(|err| StoreError::Corrupted(err.to_string()))?;
        if record.pin.is_empty() || !record.pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(StoreError::Corrupted("pin_code must be one or more digits".to_owned()));
        }
        Ok(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unable to read PIN record: {0}")]
    Unreadable(#[source] io::Error),
    #[error("PIN record is corrupted: {0}")]
    Corrupted(String),
    #[error("unable to serialize PIN record: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("PIN record of {size} bytes exceeds the storage limit of {limit} bytes")]
    LimitExceeded { size: usize, limit: usize },
    #[error("unable to write PIN record: {0}")]
    Write(#[source] io::Error),
}

/// A place to keep the PIN record between runs.
pub trait PinStore {
    /// Returns `Ok(None)` if no record has been written yet.
    fn read(&self) -> Result<Option<PinRecord>, StoreError>;

    fn write(&mut self, record: &PinRecord) -> Result<(), StoreError>;

    /// Whether records survive a restart of the process.
    fn is_persistent(&self) -> bool {
        true
    }
}

pub struct FileStore {
    path: PathBuf,
    limit: Option<usize>,
}

impl FileStore {
    pub fn new(path: PathBuf, limit: Option<usize>) -> Self {
        Self { path, limit }
    }
}

impl PinStore for FileStore {
    fn read(&self) -> Result<Option<PinRecord>, StoreError> {
        let body = match fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Unreadable(err)),
        };
        PinRecord::decode(&body).map(Some)
    }

    fn write(&mut self, record: &PinRecord) -> Result<(), StoreError> {
        let body = record.encode()?;
        if let Some(limit) = self.limit {
            if body.len() > limit {
                return Err(StoreError::LimitExceeded { size: body.len(), limit });
            }
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(StoreError::Write)?;
        }
        fs::write(&self.path, body).map_err(StoreError::Write)?;

        log::debug!("Wrote PIN record to {}", self.path.display());
        Ok(())
    }
}

/// Keeps the encoded record body in memory only.
#[derive(Default)]
pub struct MemoryStore {
    body: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_body(body: &str) -> Self {
        Self { body: Some(body.to_owned()) }
    }

    #[cfg(test)]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

impl PinStore for MemoryStore {
    fn read(&self) -> Result<Option<PinRecord>, StoreError> {
        self.body.as_deref().map(PinRecord::decode).transpose()
    }

    fn write(&mut self, record: &PinRecord) -> Result<(), StoreError> {
        self.body = Some(record.encode()?);
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn configured(pin: &str) -> PinRecord {
        PinRecord { configured: true, pin: pin.to_owned() }
    }

    #[test]
    fn default_record() {
        let record = PinRecord::default();
        assert!(!record.configured);
        assert_eq!(record.pin, "1234");
    }

    #[test]
    fn body_layout() {
        let body = configured("5678").encode().unwrap();
        assert_eq!(body, r#"const ENV = {"pin_is_configured":true,"pin_code":"5678"}"#);
    }

    #[test]
    fn decode_tolerates_trailing_newline() {
        let body = "const ENV = {\"pin_is_configured\":false,\"pin_code\":\"1234\"}\n";
        assert_eq!(PinRecord::decode(body).unwrap(), PinRecord::default());
    }

    #[test]
    fn missing_prefix_is_corruption() {
        let body = r#"{"pin_is_configured":true,"pin_code":"5678"}"#;
        assert!(matches!(PinRecord::decode(body), Err(StoreError::Corrupted(_))));
    }

    #[test]
    fn malformed_json_is_corruption() {
        let body = "const ENV = {\"pin_is_configured\":tru";
        assert!(matches!(PinRecord::decode(body), Err(StoreError::Corrupted(_))));

        let body = "const ENV = {\"pin_code\":\"5678\"}";
        assert!(matches!(PinRecord::decode(body), Err(StoreError::Corrupted(_))));
    }

    #[test]
    fn pin_code_must_be_digits() {
        for pin in ["", "12a4", " 1234"] {
            let body = format!(r#"const ENV = {{"pin_is_configured":true,"pin_code":"{}"}}"#, pin);
            assert!(
                matches!(PinRecord::decode(&body), Err(StoreError::Corrupted(_))),
                "accepted pin_code {:?}",
                pin
            );
        }
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested").join("pin-record"), None);

        assert!(store.read().unwrap().is_none());

        store.write(&configured("5678")).unwrap();
        assert_eq!(store.read().unwrap(), Some(configured("5678")));
        assert!(store.is_persistent());
    }

    #[test]
    fn file_store_detects_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pin-record");
        fs::write(&path, "garbage").unwrap();

        let store = FileStore::new(path, None);
        assert!(matches!(store.read(), Err(StoreError::Corrupted(_))));
    }

    #[test]
    fn file_store_unreadable() {
        let dir = tempdir().unwrap();
        // Reading a directory as a file fails with something other than NotFound.
        let store = FileStore::new(dir.path().to_path_buf(), None);
        assert!(matches!(store.read(), Err(StoreError::Unreadable(_))));
    }

    #[test]
    fn file_store_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pin-record");
        let mut store = FileStore::new(path.clone(), Some(16));

        match store.write(&configured("5678")) {
            Err(StoreError::LimitExceeded { limit, .. }) => assert_eq!(limit, 16),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn file_store_write_failure() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let mut store = FileStore::new(blocker.join("pin-record"), None);
        assert!(matches!(store.write(&configured("5678")), Err(StoreError::Write(_))));
    }

    #[test]
    fn memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.read().unwrap().is_none());
        assert!(!store.is_persistent());

        store.write(&configured("0000")).unwrap();
        assert_eq!(store.read().unwrap(), Some(configured("0000")));
        assert!(store.body().unwrap().starts_with(RECORD_PREFIX));

        let store = MemoryStore::with_body("const ENV = nope");
        assert!(matches!(store.read(), Err(StoreError::Corrupted(_))));
    }
}
