/// SHA-2 hashing utilities.
///
/// SHA-512 digests file contents for signing, SHA-512 also expands
/// passwords, and SHA-256 is used for password verification tags and
/// public key hints.
use sha2::{Digest, Sha256, Sha512};

pub const KEY_HINT_LEN: usize = 16;

/// Digest algorithm for streaming file hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    Sha256,
    #[default]
    Sha512,
}

impl HashAlgorithm {
    /// Fresh streaming hash state for this algorithm.
    pub fn hasher(&self) -> Box<dyn sha2::digest::DynDigest> {
        match self {
            HashAlgorithm::Sha256 => Box::new(Sha256::new()),
            HashAlgorithm::Sha512 => Box::new(Sha512::new()),
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(data));
    out
}

/// SHA-256 over the concatenation of `parts`.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut h = Sha256::new();
    for part in parts {
        h.update(part);
    }
    h.finalize().into()
}

/// First 16 bytes of SHA-256 of a public key.
pub fn key_hint(public_key: &[u8]) -> [u8; KEY_HINT_LEN] {
    let full: [u8; 32] = Sha256::digest(public_key).into();
    let mut hint = [0u8; KEY_HINT_LEN];
    hint.copy_from_slice(&full[..KEY_HINT_LEN]);
    hint
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha512_known_vector() {
        // SHA-512("abc")
        assert_eq!(
            hex::encode(sha512(b"abc")),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn test_sha256_concat_matches_single_pass() {
        assert_eq!(
            sha256_concat(&[b"salt", b"keystream"]),
            sha256_concat(&[b"saltkeystream"])
        );
    }

    #[test]
    fn test_key_hint_is_prefix() {
        let pk = [0x11u8; 32];
        let full = sha256_concat(&[&pk]);
        assert_eq!(key_hint(&pk), full[..KEY_HINT_LEN]);
    }

    #[test]
    fn test_dyn_hasher_matches_direct() {
        let mut h = HashAlgorithm::Sha512.hasher();
        h.update(b"hello ");
        h.update(b"world");
        assert_eq!(&*h.finalize(), &sha512(b"hello world")[..]);
        assert_eq!(HashAlgorithm::Sha256.output_len(), 32);
    }
}
