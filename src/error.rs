use thiserror::Error;

use crate::actors::{Role, TaskId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Invalid transform reference: {0}")]
    InvalidTransform(String),

    #[error("Unknown transform: {0}")]
    UnknownTransform(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Relay attempted with no downstream workers")]
    EmptyDownstream,

    #[error("{role} task {id} is no longer reachable")]
    Disconnected { role: Role, id: TaskId },

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
