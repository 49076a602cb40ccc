pub mod config;
pub mod crypto;
pub mod error;
pub mod fileio;
pub mod record;
pub mod store;

pub use config::{KdfAlgorithm, KdfParams, SignConfig};
pub use crypto::keys::{EncryptedPrivateKey, Keypair, PrivateKey, PublicKey};
pub use crypto::sensitive::Password;
pub use crypto::sign::Signature;
pub use error::{Result, SignError};

#[cfg(test)]
mod proptests;
