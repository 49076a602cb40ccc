/// Ed25519 key types and password-based private key encryption.
///
/// A private key is the 64-byte Ed25519 keypair buffer (seed || public
/// key). At rest it is XORed with a scrypt (or argon2id) keystream of the
/// same length; a SHA-256 tag over salt and keystream lets decryption
/// reject a wrong password before producing a key.
///
/// The XOR container has no integrity protection of its own: flipping a
/// ciphertext bit flips the same key bit. The tag only proves the password.
use constant_time_eq::constant_time_eq;
use ed25519_dalek::SigningKey;
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroize;

use crate::config::KdfParams;
use crate::crypto::hash::key_hint;
use crate::crypto::kdf::{self, VERIFY_TAG_LEN};
use crate::crypto::sensitive::{Password, SensitiveBytes64};
use crate::error::{Result, SignError};

pub const SECRET_KEY_LEN: usize = 64;
pub const PUBLIC_KEY_LEN: usize = 32;
const SEED_LEN: usize = 32;

/// Ed25519 public (verifying) key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; PUBLIC_KEY_LEN] = slice.try_into().map_err(|_| {
            SignError::Format(format!(
                "public key must be {PUBLIC_KEY_LEN} bytes, got {}",
                slice.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Truncated SHA-256 of the key, used to pick candidate keys.
    pub fn key_hint(&self) -> [u8; 16] {
        key_hint(&self.0)
    }
}

/// Ed25519 private key. Owns its secret bytes; the public half is kept as a
/// separate copy derived from the seed.
#[derive(Clone)]
pub struct PrivateKey {
    secret: SensitiveBytes64,
    public: PublicKey,
}

impl PrivateKey {
    /// Build from the 64-byte keypair buffer. The public key is recomputed
    /// from the seed, never read from the buffer's second half.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let secret = SensitiveBytes64::from_slice(slice).ok_or_else(|| {
            SignError::Format(format!(
                "private key must be {SECRET_KEY_LEN} bytes, got {}",
                slice.len()
            ))
        })?;
        let public = derive_public(&secret);
        Ok(Self { secret, public })
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_LEN] {
        self.secret.as_bytes()
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    pub(crate) fn signing_key(&self) -> SigningKey {
        let mut seed = [0u8; SEED_LEN];
        seed.copy_from_slice(&self.secret.as_bytes()[..SEED_LEN]);
        let key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        key
    }

    /// Encrypt under `password` with a fresh salt.
    pub fn encrypt(&self, password: &Password, params: &KdfParams) -> Result<EncryptedPrivateKey> {
        let salt = kdf::generate_salt()?;
        let expanded = kdf::expand_password(password);
        let keystream = kdf::derive_keystream(&expanded, &salt, params, SECRET_KEY_LEN)?;

        let verify = kdf::verification_tag(&salt, &keystream);
        let ciphertext = self
            .secret
            .as_bytes()
            .iter()
            .zip(keystream.as_bytes())
            .map(|(k, x)| k ^ x)
            .collect();

        debug!(algo = params.algorithm.id(), n = params.work_factor, "Encrypted private key");

        Ok(EncryptedPrivateKey {
            ciphertext,
            salt: salt.to_vec(),
            verify: verify.to_vec(),
            params: *params,
        })
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

fn derive_public(secret: &SensitiveBytes64) -> PublicKey {
    let mut seed = [0u8; SEED_LEN];
    seed.copy_from_slice(&secret.as_bytes()[..SEED_LEN]);
    let public = SigningKey::from_bytes(&seed).verifying_key().to_bytes();
    seed.zeroize();
    PublicKey(public)
}

/// A private key encrypted under a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPrivateKey {
    pub ciphertext: Vec<u8>,
    pub salt: Vec<u8>,
    pub verify: Vec<u8>,
    /// KDF algorithm and cost parameters used for this record.
    pub params: KdfParams,
}

impl EncryptedPrivateKey {
    /// Decrypt with `password`. A wrong password is reported as
    /// [`SignError::Authentication`] and nothing is decrypted.
    pub fn decrypt(&self, password: &Password) -> Result<PrivateKey> {
        if self.ciphertext.len() != SECRET_KEY_LEN {
            return Err(SignError::Format(format!(
                "encrypted key must be {SECRET_KEY_LEN} bytes, got {}",
                self.ciphertext.len()
            )));
        }
        if self.salt.is_empty() {
            return Err(SignError::Format("salt is empty".into()));
        }
        if self.verify.len() != VERIFY_TAG_LEN {
            return Err(SignError::Format(format!(
                "verification tag must be {VERIFY_TAG_LEN} bytes, got {}",
                self.verify.len()
            )));
        }

        let expanded = kdf::expand_password(password);
        let keystream =
            kdf::derive_keystream(&expanded, &self.salt, &self.params, self.ciphertext.len())?;

        let expected = kdf::verification_tag(&self.salt, &keystream);
        if !constant_time_eq(&expected, &self.verify) {
            return Err(SignError::Authentication(
                "password verification tag mismatch".into(),
            ));
        }

        let mut plain = [0u8; SECRET_KEY_LEN];
        for (i, (c, x)) in self.ciphertext.iter().zip(keystream.as_bytes()).enumerate() {
            plain[i] = c ^ x;
        }
        let sk = PrivateKey::from_slice(&plain);
        plain.zeroize();
        sk
    }
}

/// A matched Ed25519 private/public key pair.
#[derive(Debug, Clone)]
pub struct Keypair {
    secret: PrivateKey,
    public: PublicKey,
}

impl Keypair {
    /// Generate a new keypair from the OS CSPRNG.
    pub fn generate() -> Result<Self> {
        let mut seed = [0u8; SEED_LEN];
        rand::rngs::OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| SignError::Entropy(e.to_string()))?;
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();

        let mut buf = signing_key.to_keypair_bytes();
        let secret = PrivateKey::from_slice(&buf);
        buf.zeroize();
        let secret = secret?;
        let public = secret.public_key();

        debug!(key_hint = %hex::encode(public.key_hint()), "Generated Ed25519 keypair");
        Ok(Self { secret, public })
    }

    /// Pair an existing private key with a public key, checking they match.
    pub fn from_parts(secret: PrivateKey, public: PublicKey) -> Result<Self> {
        if secret.public_key() != public {
            return Err(SignError::Format(
                "public key does not belong to private key".into(),
            ));
        }
        Ok(Self { secret, public })
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.secret
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}
