use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record: {0}")]
    Format(String),

    #[error("Incorrect password: {0}")]
    Authentication(String),

    #[error("Range starts at {offset} but source is only {size} bytes")]
    Range { offset: u64, size: u64 },

    #[error("Random source unavailable: {0}")]
    Entropy(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SignError>;
