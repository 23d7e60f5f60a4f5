//! Size-rotated log file.
//!
//! When a write would push the file past its size limit the file is renamed
//! to `<name>.1`, older backups shift up by one, and a fresh file is opened.
//! Backups beyond the configured count, or older than the maximum age, are
//! deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::config::LoggingConfig;

const MEGABYTE: u64 = 1024 * 1024;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
pub struct RollingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    max_backups: u32,
    max_age: Duration,
}

impl RollingFile {
    pub fn from_config(config: &LoggingConfig) -> io::Result<Self> {
        Self::open(
            &config.file,
            config.max_size.saturating_mul(MEGABYTE),
            config.max_backups,
            DAY * config.max_age,
        )
    }

    /// Opens `path` for appending, creating parent directories as needed.
    pub fn open(
        path: &Path,
        max_bytes: u64,
        max_backups: u32,
        max_age: Duration,
    ) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();

        let rolling = Self {
            path: path.to_path_buf(),
            file,
            written,
            max_bytes,
            max_backups,
            max_age,
        };
        rolling.prune_backups();
        Ok(rolling)
    }

    fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let oldest = self.backup_path(self.max_backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.max_backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        if self.max_backups > 0 {
            fs::rename(&self.path, self.backup_path(1))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        self.prune_backups();
        Ok(())
    }

    /// Best effort: a backup that cannot be inspected or removed is left alone.
    fn prune_backups(&self) {
        let now = SystemTime::now();
        for index in 1..=self.max_backups {
            let backup = self.backup_path(index);
            let expired = fs::metadata(&backup)
                .and_then(|m| m.modified())
                .map(|modified| now.duration_since(modified).unwrap_or_default() > self.max_age)
                .unwrap_or(false);
            if expired {
                let _ = fs::remove_file(&backup);
            }
        }
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
