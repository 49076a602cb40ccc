/// Algorithm identifiers and cost parameters.
///
/// Values here are defaults for new keys only. Decryption always uses the
/// parameters stored in the key record, so changing a default never breaks
/// existing key files.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignError};

/// Default chunked-hash window: 1 GiB.
pub const DEFAULT_WINDOW_SIZE: u64 = 1024 * 1024 * 1024;

/// Signature algorithm: Ed25519 over the SHA-512 digest of the input.
pub const SIG_ALGO: &str = "sha512-ed25519";

/// Password-based key derivation used to protect private keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KdfAlgorithm {
    /// scrypt. `work_factor` is N, `block_size` is r, `parallelism` is p.
    #[serde(rename = "scrypt-sha256")]
    Scrypt,
    /// Argon2id. `work_factor` is memory in KiB, `block_size` is the
    /// iteration count, `parallelism` is the lane count. Extension of the
    /// key file format; records using it are only readable by this crate.
    #[serde(rename = "argon2id-sha256")]
    Argon2id,
}

impl KdfAlgorithm {
    pub fn id(&self) -> &'static str {
        match self {
            KdfAlgorithm::Scrypt => "scrypt-sha256",
            KdfAlgorithm::Argon2id => "argon2id-sha256",
        }
    }

    /// Parse a record identifier. Records written before the field existed
    /// carry no identifier and are scrypt.
    pub fn from_id(id: &str) -> Result<Self> {
        match id {
            "" | "scrypt-sha256" => Ok(KdfAlgorithm::Scrypt),
            "argon2id-sha256" => Ok(KdfAlgorithm::Argon2id),
            other => Err(SignError::Format(format!(
                "unsupported key derivation algorithm '{other}'"
            ))),
        }
    }
}

/// KDF cost parameters, persisted next to every encrypted private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    pub algorithm: KdfAlgorithm,
    pub work_factor: u32,
    pub block_size: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            algorithm: KdfAlgorithm::Scrypt,
            work_factor: 1 << 17,
            block_size: 16,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.parallelism == 0 {
            return Err(SignError::Config(
                "block size and parallelism must be positive".into(),
            ));
        }
        match self.algorithm {
            KdfAlgorithm::Scrypt if !self.work_factor.is_power_of_two() || self.work_factor < 2 => {
                Err(SignError::Config(format!(
                    "scrypt work factor must be a power of two > 1, got {}",
                    self.work_factor
                )))
            }
            KdfAlgorithm::Argon2id if self.work_factor == 0 => {
                Err(SignError::Config("argon2 memory cost must be positive".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Top-level configuration for key generation, encryption and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignConfig {
    pub kdf: KdfParams,
    /// Bytes hashed per window when digesting files.
    pub window_size: u64,
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl SignConfig {
    /// Load overrides from a TOML file. Keys not present keep their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| SignError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SignConfig =
            toml::from_str(text).map_err(|e| SignError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(SignError::Config("window size must be positive".into()));
        }
        self.kdf.validate()
    }
}
