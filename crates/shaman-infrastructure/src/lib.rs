//! File-backed storage for the Shaman client: path resolution, `config.toml`
//! loading and `secret.json` credential persistence.

pub mod paths;
pub mod storage;

pub use paths::ShamanPaths;
pub use storage::{ConfigStorage, SecretStorage};
