//! Project working-directory layout.
//!
//! A project directory holds the configuration file, the metadata database,
//! and the `Data` tree products are downloaded into.

use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;

#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn config(&self) -> PathBuf {
        self.root.join("sdm-config.toml")
    }

    pub fn database(&self) -> PathBuf {
        self.root.join("sdm-metadata.sqlite3")
    }

    pub fn raw_storage(&self) -> PathBuf {
        self.root.join("Data").join("raw")
    }

    pub fn processed_storage(&self) -> PathBuf {
        self.root.join("Data").join("proc")
    }

    pub fn quicklook_storage(&self) -> PathBuf {
        self.root.join("Data").join("quicklooks")
    }

    /// Creates the `Data` tree. Existing directories are left alone.
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(self.raw_storage())?;
        fs::create_dir_all(self.processed_storage())?;
        fs::create_dir_all(self.quicklook_storage())?;
        Ok(())
    }

    /// Removes the configuration file and the metadata database. Downloaded
    /// data is kept.
    pub fn clean(&self) -> Result<()> {
        for path in [self.config(), self.database()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
