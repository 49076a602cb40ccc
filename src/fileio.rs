/// Atomic file replacement.
///
/// Content is written to `<path>.tmp` in the same directory, synced, and
/// then renamed over `<path>`. Readers of `<path>` see either the old file
/// or the complete new one.
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

/// Owner read/write only. Used for private keys.
pub const MODE_PRIVATE: u32 = 0o600;
/// World readable. Used for public keys and signatures.
pub const MODE_PUBLIC: u32 = 0o644;

/// Temporary sibling path for `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// A fully written temporary file that has not yet replaced its target.
#[derive(Debug)]
pub struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Rename the temporary file over the target.
    pub fn commit(self) -> Result<()> {
        fs::rename(&self.temp, &self.target)?;
        debug!(path = %self.target.display(), "Replaced file");
        Ok(())
    }
}

/// Write `bytes` to the temporary sibling of `path` without touching `path`.
pub fn stage(path: &Path, bytes: &[u8], mode: u32) -> Result<StagedFile> {
    let temp = temp_path(path);
    remove_stale(&temp)?;

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let result = options.open(&temp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = result {
        // Best effort; the target is untouched either way.
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }

    Ok(StagedFile {
        temp,
        target: path.to_path_buf(),
    })
}

/// Atomically replace `path` with `bytes`, created with permission `mode`.
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8], mode: u32) -> Result<()> {
    stage(path.as_ref(), bytes, mode)?.commit()
}

fn remove_stale(temp: &Path) -> Result<()> {
    match fs::symlink_metadata(temp) {
        Ok(_) => {
            warn!(path = %temp.display(), "Removing stale temporary file");
            fs::remove_file(temp)?;
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignError;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");

        write_atomic(&path, b"hello", MODE_PUBLIC).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"hello");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, b"old contents").unwrap();

        write_atomic(&path, b"new", MODE_PUBLIC).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_interrupted_before_rename_keeps_old_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, b"old").unwrap();

        // Staged but never committed: the process "died" before rename.
        let staged = stage(&path, b"new", MODE_PUBLIC).unwrap();
        assert_eq!(fs::read(staged.temp_path()).unwrap(), b"new");
        drop(staged);

        assert_eq!(fs::read(&path).unwrap(), b"old");
    }

    #[test]
    fn test_interrupted_before_rename_keeps_absence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.txt");

        let _staged = stage(&path, b"new", MODE_PUBLIC).unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_stale_temp_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(temp_path(&path), b"garbage from a crashed run").unwrap();

        write_atomic(&path, b"fresh", MODE_PUBLIC).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"fresh");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no/such/dir/out.txt");

        let err = write_atomic(&path, b"x", MODE_PUBLIC).unwrap_err();

        assert!(matches!(err, SignError::Io(_)));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_private_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.key");
        write_atomic(&path, b"k", MODE_PRIVATE).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
