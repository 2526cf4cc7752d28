//! Visitor preferences kept next to the local collections.

use crate::error::StoreError;
use crate::storage::SharedStorage;

/// Storage key of the sound-mute flag.
pub const MUTE_KEY: &str = "pawlos_mute_state";

#[derive(Clone, Debug)]
pub struct Preferences {
    storage: SharedStorage,
}

impl Preferences {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Whether sound effects are muted. Anything but `"true"` means unmuted.
    pub fn is_muted(&self) -> Result<bool, StoreError> {
        Ok(self.storage.get_item(MUTE_KEY)?.as_deref() == Some("true"))
    }

    /// Flip the mute flag and return the new state.
    pub fn toggle_mute(&self) -> Result<bool, StoreError> {
        let muted = !self.is_muted()?;
        self.storage.set_item(MUTE_KEY, if muted { "true" } else { "false" })?;
        Ok(muted)
    }
}
