pub mod config;
pub mod error;
pub mod paths;
pub mod schema;
pub mod snapshot;
pub mod store;

pub use config::EngineConfig;
pub use error::{Result, StoreError};
pub use paths::{db_path, resolve_data_dir};
pub use snapshot::{LEGACY_SNAPSHOT_KEY, SNAPSHOT_KEY};
pub use store::Store;
