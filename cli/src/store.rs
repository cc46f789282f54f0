use std::{collections::BTreeMap, fs, io, path::PathBuf};

use iodj_core::token::KeyValueStore;
use iodj_core::StorageError;

/// Key-value pairs kept as one JSON object in a file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.insideoutdj/session.json`, or the working directory without a home.
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join(".insideoutdj")
            .join("session.json")
    }

    fn read(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                StorageError::Unavailable(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::Unavailable(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write(&self, key: &str, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let fail = |reason: String| StorageError::Write {
            key: key.to_owned(),
            reason,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
        }
        let contents = serde_json::to_string_pretty(values).map_err(|e| fail(e.to_string()))?;
        fs::write(&self.path, contents).map_err(|e| fail(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.read()?;
        values.insert(key.to_owned(), value.to_owned());
        self.write(key, &values)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut values = self.read()?;
        if values.remove(key).is_some() {
            self.write(key, &values)?;
        }
        Ok(())
    }
}
