//! Property-based tests for key encryption, digests and signatures.

use proptest::prelude::*;
use std::io::Cursor;

use crate::crypto::hash::{sha512, HashAlgorithm};
use crate::crypto::kdf::test_params;
use crate::crypto::keys::{Keypair, PrivateKey};
use crate::crypto::sensitive::Password;
use crate::crypto::sign::{sign_message, verify_message};
use crate::crypto::streaming::ChunkedHasher;
use crate::error::SignError;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // decrypt(encrypt(sk, pw), pw) == sk for any password, empty included.
    #[test]
    fn property_encrypt_decrypt_roundtrip(
        secret in prop::collection::vec(any::<u8>(), 64),
        pw in ".{0,24}",
    ) {
        let sk = PrivateKey::from_slice(&secret).unwrap();
        let password = Password::from(pw.as_str());
        let esk = sk.encrypt(&password, &test_params()).unwrap();

        prop_assert_eq!(esk.ciphertext.len(), secret.len());
        let back = esk.decrypt(&password).unwrap();
        prop_assert_eq!(back.as_bytes().as_slice(), secret.as_slice());
    }

    #[test]
    fn property_wrong_password_rejected(
        pw in "[a-z]{0,12}",
        other in "[a-z]{0,12}",
    ) {
        prop_assume!(pw != other);
        let kp = Keypair::generate().unwrap();
        let esk = kp.private_key().encrypt(&pw.as_str().into(), &test_params()).unwrap();

        let result = esk.decrypt(&other.as_str().into());
        prop_assert!(matches!(result, Err(SignError::Authentication(_))));
    }
}

proptest! {
    // Windowing never changes the digest.
    #[test]
    fn property_chunked_digest_matches_single_pass(
        data in prop::collection::vec(any::<u8>(), 1..4096),
        window in 1u64..512,
    ) {
        let digest = ChunkedHasher::new(window)
            .digest(&mut Cursor::new(&data), 0, 0, HashAlgorithm::Sha512)
            .unwrap();
        prop_assert_eq!(digest, sha512(&data).to_vec());
    }

    #[test]
    fn property_sign_verify(digest in prop::collection::vec(any::<u8>(), 64)) {
        let kp = Keypair::generate().unwrap();
        let sig = sign_message(kp.private_key(), &digest);

        prop_assert!(sig.is_key_hint_match(kp.public_key()));
        prop_assert!(verify_message(kp.public_key(), &digest, &sig).unwrap());
    }
}
