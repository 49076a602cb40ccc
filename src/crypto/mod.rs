/// Cryptographic building blocks: hashing, key derivation, keys and
/// signatures.
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod sensitive;
pub mod sign;
pub mod streaming;
