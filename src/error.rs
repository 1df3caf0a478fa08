use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Step error: {0}")]
    Step(String),

    #[error("Batch integration error: {0}")]
    BatchIntegration(String),

    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Step(s)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
