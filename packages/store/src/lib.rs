pub mod collection;
pub mod error;
pub mod local_db;
pub mod models;
pub mod preferences;
pub mod record;
pub mod seed;
pub mod storage;

mod file_store;
mod memory;
pub use file_store::FileStorage;
pub use memory::MemoryStorage;

pub use collection::{LocalCollection, DEFAULT_LATENCY};
pub use error::{RemoteFailure, StoreError};
pub use local_db::LocalBackend;
pub use models::{Category, Message, MessageDraft, ProfileUpdate, Project, ProjectDraft, RecordId, User};
pub use preferences::Preferences;
pub use record::{Record, RecordStore, SortOrder};
pub use storage::{KeyValueStorage, SharedStorage};
