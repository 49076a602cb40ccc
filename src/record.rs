/// On-disk text records for keys and signatures.
///
/// Records are small YAML mappings. Binary fields are standard base64 with
/// padding. Field names are part of the file format and must not change:
///
/// - public key:  `comment`, `pk`
/// - private key: `comment`, `esk`, `salt`, `algo`, `verify`, `Z`, `r`, `p`
/// - signature:   `comment`, `pkhash`, `signature`
///
/// New private keys use `algo: scrypt-sha256` unless configured otherwise.
/// `algo: argon2id-sha256` is an extension of this format (`Z` = memory in
/// KiB, `r` = iterations, `p` = lanes). Other implementations of the format
/// only read scrypt records, so keys meant for them must keep the default.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{KdfAlgorithm, KdfParams};
use crate::crypto::keys::{EncryptedPrivateKey, PublicKey};
use crate::crypto::sign::Signature;
use crate::error::{Result, SignError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    pub pk: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKeyRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    pub esk: String,
    pub salt: String,
    #[serde(default)]
    pub algo: String,
    pub verify: String,
    #[serde(rename = "Z")]
    pub z: u32,
    pub r: u32,
    pub p: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pkhash: String,
    pub signature: String,
}

fn b64_decode(field: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| SignError::Format(format!("field '{field}' is not valid base64: {e}")))
}

fn to_text<T: Serialize>(record: &T) -> Result<String> {
    serde_yaml::to_string(record).map_err(|e| SignError::Format(e.to_string()))
}

fn from_text<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_yaml::from_str(text).map_err(|e| SignError::Format(e.to_string()))
}

impl PublicKeyRecord {
    pub fn new(pk: &PublicKey, comment: &str) -> Self {
        Self {
            comment: comment.to_string(),
            pk: STANDARD.encode(pk.as_bytes()),
        }
    }

    pub fn to_key(&self) -> Result<PublicKey> {
        let bytes = b64_decode("pk", &self.pk)?;
        if bytes.is_empty() {
            return Err(SignError::Format("public key data is empty".into()));
        }
        PublicKey::from_slice(&bytes)
    }

    pub fn to_text(&self) -> Result<String> {
        to_text(self)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        from_text(text)
    }
}

impl PrivateKeyRecord {
    pub fn new(esk: &EncryptedPrivateKey, comment: &str) -> Self {
        Self {
            comment: comment.to_string(),
            esk: STANDARD.encode(&esk.ciphertext),
            salt: STANDARD.encode(&esk.salt),
            algo: esk.params.algorithm.id().to_string(),
            verify: STANDARD.encode(&esk.verify),
            z: esk.params.work_factor,
            r: esk.params.block_size,
            p: esk.params.parallelism,
        }
    }

    pub fn to_encrypted(&self) -> Result<EncryptedPrivateKey> {
        if self.z == 0 || self.r == 0 || self.p == 0 {
            return Err(SignError::Format(format!(
                "KDF parameters must be positive (Z={}, r={}, p={})",
                self.z, self.r, self.p
            )));
        }
        Ok(EncryptedPrivateKey {
            ciphertext: b64_decode("esk", &self.esk)?,
            salt: b64_decode("salt", &self.salt)?,
            verify: b64_decode("verify", &self.verify)?,
            params: KdfParams {
                algorithm: KdfAlgorithm::from_id(&self.algo)?,
                work_factor: self.z,
                block_size: self.r,
                parallelism: self.p,
            },
        })
    }

    pub fn to_text(&self) -> Result<String> {
        to_text(self)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        from_text(text)
    }
}

impl SignatureRecord {
    pub fn new(sig: &Signature, comment: &str) -> Self {
        Self {
            comment: comment.to_string(),
            pkhash: sig.key_hint.map(|h| STANDARD.encode(h)).unwrap_or_default(),
            signature: STANDARD.encode(sig.value),
        }
    }

    pub fn to_signature(&self) -> Result<Signature> {
        let value = b64_decode("signature", &self.signature)?;
        let hint = if self.pkhash.trim().is_empty() {
            None
        } else {
            Some(b64_decode("pkhash", &self.pkhash)?)
        };
        Signature::from_slices(&value, hint.as_deref())
    }

    pub fn to_text(&self) -> Result<String> {
        to_text(self)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        from_text(text)
    }
}
