use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("operator `{operator}` expects {expected} arguments but was given {actual}")]
    Arity {
        operator: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("parameter index {index} is out of range for an input of length {len}")]
    ParameterIndex { index: usize, len: usize },

    #[error("cannot rank an empty population")]
    EmptyPopulation,

    #[error("cannot score against an empty dataset")]
    EmptyDataset,

    #[error("population of {size} is too small, at least {required} individuals are required")]
    PopulationTooSmall { size: usize, required: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
