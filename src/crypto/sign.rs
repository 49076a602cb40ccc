/// Ed25519 signatures over SHA-512 file digests.
///
/// Files are never handed to Ed25519 directly. The file is digested with
/// SHA-512 (in bounded windows) and the 64-byte digest is signed as the
/// message. Signer and verifier must use the same hash over the whole
/// file or signatures will not validate.
use constant_time_eq::constant_time_eq;
use ed25519_dalek::{Signer, Verifier, VerifyingKey};
use tracing::debug;

use crate::config::SIG_ALGO;
use crate::crypto::hash::{HashAlgorithm, KEY_HINT_LEN};
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::crypto::streaming::{ChunkedHasher, WindowReader};
use crate::error::{Result, SignError};

pub const SIGNATURE_LEN: usize = 64;

/// An Ed25519 signature plus an optional hint naming the signing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub value: [u8; SIGNATURE_LEN],
    /// First 16 bytes of SHA-256 of the signer's public key. Advisory only.
    pub key_hint: Option<[u8; KEY_HINT_LEN]>,
}

impl Signature {
    pub fn from_slices(value: &[u8], key_hint: Option<&[u8]>) -> Result<Self> {
        let value: [u8; SIGNATURE_LEN] = value.try_into().map_err(|_| {
            SignError::Format(format!(
                "signature must be {SIGNATURE_LEN} bytes, got {}",
                value.len()
            ))
        })?;
        let key_hint = match key_hint {
            None => None,
            Some(h) => Some(h.try_into().map_err(|_| {
                SignError::Format(format!(
                    "key hint must be {KEY_HINT_LEN} bytes, got {}",
                    h.len()
                ))
            })?),
        };
        Ok(Self { value, key_hint })
    }

    /// True if the key hint names `pk`. Not proof of authenticity.
    pub fn is_key_hint_match(&self, pk: &PublicKey) -> bool {
        match &self.key_hint {
            Some(hint) => constant_time_eq(hint, &pk.key_hint()),
            None => false,
        }
    }
}

/// SHA-512 of the whole source, the message that gets signed.
pub fn file_digest<W: WindowReader + ?Sized>(source: &mut W, hasher: &ChunkedHasher) -> Result<Vec<u8>> {
    hasher.digest(source, 0, 0, HashAlgorithm::Sha512)
}

/// Sign a precomputed digest.
pub fn sign_message(sk: &PrivateKey, digest: &[u8]) -> Signature {
    let sig = sk.signing_key().sign(digest);
    Signature {
        value: sig.to_bytes(),
        key_hint: Some(sk.public_key().key_hint()),
    }
}

/// Digest `source` and sign the digest.
pub fn sign_file<W: WindowReader + ?Sized>(
    sk: &PrivateKey,
    source: &mut W,
    hasher: &ChunkedHasher,
) -> Result<Signature> {
    let digest = file_digest(source, hasher)?;
    debug!(algo = SIG_ALGO, "Signing file digest");
    Ok(sign_message(sk, &digest))
}

/// Check `signature` over a precomputed digest. A mismatch is `Ok(false)`,
/// and so is a key that is not a point on the curve. Key length is checked
/// when the [`PublicKey`] is built.
pub fn verify_message(pk: &PublicKey, digest: &[u8], signature: &Signature) -> Result<bool> {
    let vk = match VerifyingKey::from_bytes(pk.as_bytes()) {
        Ok(vk) => vk,
        Err(e) => {
            debug!(error = %e, "Public key does not decode");
            return Ok(false);
        }
    };
    let sig = ed25519_dalek::Signature::from_bytes(&signature.value);
    Ok(vk.verify(digest, &sig).is_ok())
}

/// Recompute the digest of `source` and check `signature` against it.
pub fn verify_file<W: WindowReader + ?Sized>(
    pk: &PublicKey,
    source: &mut W,
    signature: &Signature,
    hasher: &ChunkedHasher,
) -> Result<bool> {
    let digest = file_digest(source, hasher)?;
    let ok = verify_message(pk, &digest, signature)?;
    debug!(algo = SIG_ALGO, ok, "Verified file signature");
    Ok(ok)
}

/// First candidate whose key hint matches the signature.
pub fn select_key<'a>(signature: &Signature, candidates: &'a [PublicKey]) -> Option<&'a PublicKey> {
    candidates.iter().find(|pk| signature.is_key_hint_match(pk))
}
