/// Password-derived keystreams for private-key encryption.
///
/// The password is first stretched to 64 bytes with SHA-512 so that short
/// or empty passwords still give the KDF full-width input. The memory-hard
/// KDF then turns (expanded password, salt) into a keystream exactly as
/// long as the secret being protected.
use argon2::{Algorithm, Argon2, Version};
use rand::RngCore;
use zeroize::Zeroize;

use crate::config::{KdfAlgorithm, KdfParams};
use crate::crypto::hash::{sha256_concat, sha512};
use crate::crypto::sensitive::{Password, SensitiveBytes64, SensitiveVec};
use crate::error::{Result, SignError};

pub const SALT_LEN: usize = 32;
pub const VERIFY_TAG_LEN: usize = 32;

/// Generate a fresh random salt from the OS CSPRNG.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| SignError::Entropy(e.to_string()))?;
    Ok(salt)
}

/// SHA-512 of the password bytes.
pub fn expand_password(password: &Password) -> SensitiveBytes64 {
    let mut digest = sha512(password.as_bytes());
    let expanded = SensitiveBytes64::new(digest);
    digest.zeroize();
    expanded
}

/// Derive `len` keystream bytes from an expanded password and salt.
pub fn derive_keystream(
    expanded: &SensitiveBytes64,
    salt: &[u8],
    params: &KdfParams,
    len: usize,
) -> Result<SensitiveVec> {
    let mut out = SensitiveVec::zeroed(len);

    match params.algorithm {
        KdfAlgorithm::Scrypt => {
            if !params.work_factor.is_power_of_two() || params.work_factor < 2 {
                return Err(SignError::KeyDerivation(format!(
                    "scrypt N must be a power of two > 1, got {}",
                    params.work_factor
                )));
            }
            let log_n = params.work_factor.trailing_zeros() as u8;
            let scrypt_params =
                scrypt::Params::new(log_n, params.block_size, params.parallelism, len)
                    .map_err(|e| SignError::KeyDerivation(e.to_string()))?;
            scrypt::scrypt(expanded.as_bytes(), salt, &scrypt_params, out.as_mut_bytes())
                .map_err(|e| SignError::KeyDerivation(e.to_string()))?;
        }
        KdfAlgorithm::Argon2id => {
            let argon_params = argon2::Params::new(
                params.work_factor,
                params.block_size,
                params.parallelism,
                Some(len),
            )
            .map_err(|e| SignError::KeyDerivation(e.to_string()))?;
            Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params)
                .hash_password_into(expanded.as_bytes(), salt, out.as_mut_bytes())
                .map_err(|e| SignError::KeyDerivation(e.to_string()))?;
        }
    }

    Ok(out)
}

/// SHA-256(salt || keystream). Proves the password without exposing the
/// keystream.
pub fn verification_tag(salt: &[u8], keystream: &SensitiveVec) -> [u8; VERIFY_TAG_LEN] {
    sha256_concat(&[salt, keystream.as_bytes()])
}

/// Cheap parameters so tests don't spend seconds in the KDF.
#[cfg(test)]
pub fn test_params() -> KdfParams {
    KdfParams {
        algorithm: KdfAlgorithm::Scrypt,
        work_factor: 1 << 10,
        block_size: 8,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystream_deterministic() {
        let pw = expand_password(&Password::from("my passphrase"));
        let salt = [0x42u8; SALT_LEN];
        let k1 = derive_keystream(&pw, &salt, &test_params(), 64).unwrap();
        let k2 = derive_keystream(&pw, &salt, &test_params(), 64).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
        assert_eq!(k1.len(), 64);
    }

    #[test]
    fn test_keystream_different_password() {
        let salt = [0x42u8; SALT_LEN];
        let k1 = derive_keystream(&expand_password(&"a".into()), &salt, &test_params(), 64).unwrap();
        let k2 = derive_keystream(&expand_password(&"b".into()), &salt, &test_params(), 64).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_keystream_different_salt() {
        let pw = expand_password(&Password::from("passphrase"));
        let k1 = derive_keystream(&pw, &[0x01; SALT_LEN], &test_params(), 64).unwrap();
        let k2 = derive_keystream(&pw, &[0x02; SALT_LEN], &test_params(), 64).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_default_params_accepted() {
        // N = 2^17, r = 16, p = 1: about 256 MiB of scrypt memory.
        let params = KdfParams::default();
        let pw = expand_password(&Password::from("abc"));
        let k = derive_keystream(&pw, &[0x33; SALT_LEN], &params, 64).unwrap();
        assert_eq!(k.len(), 64);
        assert_ne!(k.as_bytes(), &[0u8; 64][..]);
    }

    #[test]
    fn test_argon2_keystream() {
        let params = KdfParams {
            algorithm: KdfAlgorithm::Argon2id,
            work_factor: 64,
            block_size: 1,
            parallelism: 1,
        };
        let pw = expand_password(&Password::from("passphrase"));
        let k = derive_keystream(&pw, &[0x07; SALT_LEN], &params, 64).unwrap();
        assert_eq!(k.len(), 64);
        let scrypt = derive_keystream(&pw, &[0x07; SALT_LEN], &test_params(), 64).unwrap();
        assert_ne!(k.as_bytes(), scrypt.as_bytes());
    }

    #[test]
    fn test_rejects_non_power_of_two_n() {
        let mut params = test_params();
        params.work_factor = 1000;
        let pw = expand_password(&Password::default());
        assert!(matches!(
            derive_keystream(&pw, &[0u8; SALT_LEN], &params, 64),
            Err(SignError::KeyDerivation(_))
        ));
    }

    #[test]
    fn test_empty_password_expands_to_full_width() {
        let expanded = expand_password(&Password::default());
        assert_eq!(expanded.as_bytes(), &sha512(b""));
    }

    #[test]
    fn test_generate_salt_unique() {
        let s1 = generate_salt().unwrap();
        let s2 = generate_salt().unwrap();
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_verification_tag_depends_on_salt() {
        let ks = SensitiveVec::new(vec![9u8; 64]);
        assert_ne!(verification_tag(&[1u8; 32], &ks), verification_tag(&[2u8; 32], &ks));
    }
}
