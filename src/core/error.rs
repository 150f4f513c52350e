use thiserror::Error;

use crate::core::types::{ClassId, IndividualId};

#[derive(Error, Debug)]
pub enum EcoError {
    #[error("simulation run in progress")]
    RunInProgress,

    #[error("no simulation run is active")]
    NotRunning,

    #[error("class is not a known species or plant: {0}")]
    UnknownSpecies(ClassId),

    #[error("individual not found: {0}")]
    IndividualNotFound(IndividualId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("parameter file error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EcoError>;
