/// Wrappers for secret material that is zeroized when dropped.
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 64-byte secret, e.g. an Ed25519 keypair buffer or an expanded password.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SensitiveBytes64([u8; 64]);

impl SensitiveBytes64 {
    pub fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(slice);
        Some(Self(bytes))
    }
}

impl AsRef<[u8]> for SensitiveBytes64 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A variable-length sensitive buffer that is zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SensitiveVec(Vec<u8>);

impl SensitiveVec {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn zeroed(len: usize) -> Self {
        Self(vec![0u8; len])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SensitiveVec {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A user password. Any length is accepted, including empty.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Password(Vec<u8>);

impl Password {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}
