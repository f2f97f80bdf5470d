//! Filesystem storage adapter.
//!
//! Implements both [`StoragePort`] and [`ConfigPort`] on top of a directory.
//!
//! - **`target_os = "espidf"`** — `mount()` registers the SPIFFS data
//!   partition with the VFS at the adapter's root, after which plain
//!   `std::fs` works on it.
//! - **`not(target_os = "espidf")`** — the root is an ordinary directory;
//!   `mount()` only checks that it exists.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::AlertConfig;

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

/// Name of the configuration file at the volume root.
pub const CONFIG_FILE: &str = "config.json";

/// Upper bound on `config.json`; anything larger is treated as corrupt.
const MAX_CONFIG_BYTES: u64 = 4096;

pub struct FsStorage {
    root: PathBuf,
    mounted: bool,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Only plain names at the volume root are accepted.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let plain = !name.is_empty()
            && !name.contains(['/', '\\'])
            && name != "."
            && name != "..";
        plain.then(|| self.root.join(name))
    }

    #[cfg(target_os = "espidf")]
    fn register_volume(&self) -> Result<(), StorageError> {
        use std::ffi::CString;

        let base = self
            .root
            .to_str()
            .and_then(|s| CString::new(s).ok())
            .ok_or(StorageError::Unavailable)?;
        let label = CString::new(crate::pins::STORAGE_PARTITION).map_err(|_| StorageError::Unavailable)?;

        let conf = esp_vfs_spiffs_conf_t {
            base_path: base.as_ptr(),
            partition_label: label.as_ptr(),
            max_files: 4,
            format_if_mount_failed: false,
            ..Default::default()
        };
        // SAFETY: conf and its strings outlive the call; the VFS copies
        // the base path.  Called from the main task during startup only.
        let ret = unsafe { esp_vfs_spiffs_register(&conf) };
        if ret == ESP_ERR_INVALID_STATE as i32 {
            log::warn!("Storage: SPIFFS already registered");
        } else if ret != ESP_OK as i32 {
            log::error!("Storage: SPIFFS mount failed ({})", ret);
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn register_volume(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

fn map_io(e: &io::Error) -> StorageError {
    match e.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound,
        _ => StorageError::IoError,
    }
}

// ── StoragePort implementation ────────────────────────────────

impl StoragePort for FsStorage {
    type Source = BufReader<File>;

    fn mount(&mut self) -> Result<(), StorageError> {
        if self.mounted {
            return Ok(());
        }

        self.register_volume()?;
        if !self.root.is_dir() {
            log::error!("Storage: {} is not a directory", self.root.display());
            return Err(StorageError::Unavailable);
        }

        self.mounted = true;
        info!("Storage: mounted at {}", self.root.display());
        Ok(())
    }

    fn open(&mut self, name: &str) -> Result<Self::Source, StorageError> {
        if !self.mounted {
            return Err(StorageError::Unavailable);
        }
        let path = self.resolve(name).ok_or(StorageError::NotFound)?;
        let file = File::open(&path).map_err(|e| map_io(&e))?;
        Ok(BufReader::new(file))
    }
}

// ── ConfigPort implementation ─────────────────────────────────

impl ConfigPort for FsStorage {
    fn load(&self) -> Result<AlertConfig, ConfigError> {
        if !self.mounted {
            return Err(ConfigError::IoError);
        }

        let path = self.root.join(CONFIG_FILE);
        let meta = match std::fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ConfigError::NotFound),
            Err(_) => return Err(ConfigError::IoError),
        };
        if meta.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::Corrupted);
        }

        let bytes = std::fs::read(&path).map_err(|_| ConfigError::IoError)?;
        AlertConfig::from_json(&bytes)
    }
}
