/// Key and signature files.
///
/// A keypair is stored as `<basename>.pub` (public key, world readable) and
/// `<basename>.key` (encrypted private key, owner only). Signatures are
/// stored next to the signed file, conventionally as `<file>.sig`.
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::SignConfig;
use crate::crypto::keys::{Keypair, PrivateKey, PublicKey};
use crate::crypto::sensitive::Password;
use crate::crypto::sign::{self, Signature};
use crate::crypto::streaming::ChunkedHasher;
use crate::error::{Result, SignError};
use crate::fileio::{write_atomic, MODE_PRIVATE, MODE_PUBLIC};
use crate::record::{PrivateKeyRecord, PublicKeyRecord, SignatureRecord};

/// Paths of a serialized keypair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFiles {
    pub public: PathBuf,
    pub private: PathBuf,
}

impl KeyFiles {
    pub fn for_basename(basename: impl AsRef<Path>) -> Self {
        let base = basename.as_ref().as_os_str();
        let mut public = base.to_os_string();
        public.push(".pub");
        let mut private = base.to_os_string();
        private.push(".key");
        Self {
            public: PathBuf::from(public),
            private: PathBuf::from(private),
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

fn in_file(path: &Path, e: SignError) -> SignError {
    match e {
        SignError::Format(msg) => SignError::Format(format!("{}: {msg}", path.display())),
        SignError::Authentication(msg) => {
            SignError::Authentication(format!("{}: {msg}", path.display()))
        }
        other => other,
    }
}

/// Write `<basename>.pub` and `<basename>.key`. The private key is always
/// encrypted, even under an empty password.
pub fn write_keypair(
    kp: &Keypair,
    basename: impl AsRef<Path>,
    comment: &str,
    password: &Password,
    config: &SignConfig,
) -> Result<KeyFiles> {
    config.validate()?;
    let files = KeyFiles::for_basename(basename);

    write_public_key(&files.public, kp.public_key(), comment)?;
    write_private_key(&files.private, kp.private_key(), comment, password, config)?;

    info!(
        public = %files.public.display(),
        private = %files.private.display(),
        key_hint = %hex::encode(kp.public_key().key_hint()),
        "Wrote keypair"
    );
    Ok(files)
}

pub fn write_public_key(path: impl AsRef<Path>, pk: &PublicKey, comment: &str) -> Result<()> {
    let text = PublicKeyRecord::new(pk, comment).to_text()?;
    write_atomic(path, text.as_bytes(), MODE_PUBLIC)
}

pub fn write_private_key(
    path: impl AsRef<Path>,
    sk: &PrivateKey,
    comment: &str,
    password: &Password,
    config: &SignConfig,
) -> Result<()> {
    let esk = sk.encrypt(password, &config.kdf)?;
    let text = PrivateKeyRecord::new(&esk, comment).to_text()?;
    write_atomic(path, text.as_bytes(), MODE_PRIVATE)
}

pub fn read_public_key(path: impl AsRef<Path>) -> Result<PublicKey> {
    let path = path.as_ref();
    PublicKeyRecord::from_text(&read_text(path)?)
        .and_then(|rec| rec.to_key())
        .map_err(|e| in_file(path, e))
}

/// Read and decrypt a private key. A wrong password is
/// [`SignError::Authentication`].
pub fn read_private_key(path: impl AsRef<Path>, password: &Password) -> Result<PrivateKey> {
    let path = path.as_ref();
    PrivateKeyRecord::from_text(&read_text(path)?)
        .and_then(|rec| rec.to_encrypted())
        .and_then(|esk| esk.decrypt(password))
        .map_err(|e| in_file(path, e))
}

pub fn write_signature(path: impl AsRef<Path>, sig: &Signature, comment: &str) -> Result<()> {
    let text = SignatureRecord::new(sig, comment).to_text()?;
    write_atomic(path, text.as_bytes(), MODE_PUBLIC)
}

pub fn read_signature(path: impl AsRef<Path>) -> Result<Signature> {
    let path = path.as_ref();
    SignatureRecord::from_text(&read_text(path)?)
        .and_then(|rec| rec.to_signature())
        .map_err(|e| in_file(path, e))
}

/// Sign the file at `path`.
pub fn sign_path(sk: &PrivateKey, path: impl AsRef<Path>, config: &SignConfig) -> Result<Signature> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let sig = sign::sign_file(sk, &mut file, &ChunkedHasher::new(config.window_size))?;
    info!(path = %path.display(), "Signed file");
    Ok(sig)
}

/// Verify the file at `path` against `sig`.
pub fn verify_path(
    pk: &PublicKey,
    path: impl AsRef<Path>,
    sig: &Signature,
    config: &SignConfig,
) -> Result<bool> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let ok = sign::verify_file(pk, &mut file, sig, &ChunkedHasher::new(config.window_size))?;
    info!(path = %path.display(), ok, "Verified file");
    Ok(ok)
}
