//! # Filesystem-backed storage
//!
//! [`FileStorage`] is the [`KeyValueStorage`] used by the dashboard server. Every
//! key is one JSON document on disk, so the data survives restarts.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── pawlos_local_db_projects.json
//! ├── pawlos_local_db_messages.json
//! ├── pawlos_mute_state.json
//! └── pawlos_auth_session.json
//! ```
//!
//! The base directory normally comes from `dirs::data_dir()`:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/pawlos/` |
//! | Linux | `~/.local/share/pawlos/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\pawlos\` |
//!
//! Writes go to a sibling temp file first and are renamed into place, so a crash
//! mid-write leaves the previous value intact.

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::StoreError;
use crate::storage::KeyValueStorage;

#[derive(Clone, Debug)]
pub struct FileStorage {
    base: PathBuf,
}

impl FileStorage {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &std::path::Path {
        &self.base
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.item_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.base)?;
        let path = self.item_path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
