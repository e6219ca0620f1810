//! Key file persistence.

use anyhow::{Context, Result, bail};
use getrandom::fill;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A single key file on disk.
///
/// Writes go through a temporary file in the same directory and an atomic
/// replace, so a crash leaves either the old or the new file, never a
/// partial one. On Unix the file is readable by its owner only.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns `true` if the key file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Returns the path to the key file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Reads the whole key file.
    pub fn load(&self) -> Result<Vec<u8>> {
        fs::read(&self.path)
            .with_context(|| format!("failed to read key file {}", self.path.display()))
    }

    /// Writes a key file that must not exist yet.
    pub fn create(&self, data: &[u8]) -> Result<()> {
        if self.exists() {
            bail!("key file already exists: {}", self.path.display());
        }
        self.save(data)
    }

    /// Writes data to the key file, replacing it atomically.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.random_tmp_path()?;

        let mut tmp_file = open_private(&tmp_path).context("failed to create temporary file")?;

        tmp_file.write_all(data)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = self.atomic_replace(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // fsync directory
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(parent) = self.parent_dir() {
                let dir = File::open(parent)?;
                dir.sync_all()?;
            }
        }

        debug!(path = %self.path.display(), "wrote key file");
        Ok(())
    }

    /// `None` for bare file names relative to the working directory.
    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Format: `filename.tmp.<randomhex>`
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let mut buf = [0u8; 8];
        fill(&mut buf).context("OS random generator unavailable")?;

        let file_name = self
            .path
            .file_name()
            .context("key file path has no file name")?
            .to_string_lossy();

        let tmp_name = format!("{}.tmp.{}", file_name, hex::encode(buf));

        Ok(self.path.with_file_name(tmp_name))
    }

    /// Uses `ReplaceFileW` with `REPLACEFILE_WRITE_THROUGH`, falling back
    /// to a rename when there is no file to replace yet.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            fs::rename(tmp_path, &self.path)?;
            return Ok(());
        }

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY:
        // - Strings are valid UTF-16 and null-terminated
        // - Pointers remain valid during the call
        // - Windows does not retain the pointers after return
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            let err = std::io::Error::last_os_error();
            return Err(err).context("atomic replace failed");
        }

        Ok(())
    }

    /// `rename()` is atomic when both paths are on the same filesystem.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}
