//! Load/save directory handling shared by every persistence manager.

use std::path::{Path, PathBuf};

use crate::error::ShowersetError;

/// Optional load and save directories.
///
/// A directory is checked when it is assigned, so a set directory always
/// existed at assignment time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IoDirs {
    load_dir: Option<PathBuf>,
    save_dir: Option<PathBuf>,
}

impl IoDirs {
    /// Creates a pair of directories.
    ///
    /// # Errors
    /// Returns [`ShowersetError::InvalidDirectory`] if a given path is not an
    /// existing directory.
    pub fn new(load_dir: Option<&Path>, save_dir: Option<&Path>) -> Result<Self, ShowersetError> {
        let mut dirs = Self::default();
        dirs.set_load_dir(load_dir)?;
        dirs.set_save_dir(save_dir)?;
        Ok(dirs)
    }

    pub fn set_load_dir(&mut self, dir: Option<&Path>) -> Result<(), ShowersetError> {
        self.load_dir = dir.map(checked_dir).transpose()?;
        Ok(())
    }

    pub fn set_save_dir(&mut self, dir: Option<&Path>) -> Result<(), ShowersetError> {
        self.save_dir = dir.map(checked_dir).transpose()?;
        Ok(())
    }

    /// # Errors
    /// Returns [`ShowersetError::LoadDirUnset`] if no load directory is set.
    pub fn load_dir(&self) -> Result<&Path, ShowersetError> {
        self.load_dir.as_deref().ok_or(ShowersetError::LoadDirUnset)
    }

    /// # Errors
    /// Returns [`ShowersetError::SaveDirUnset`] if no save directory is set.
    pub fn save_dir(&self) -> Result<&Path, ShowersetError> {
        self.save_dir.as_deref().ok_or(ShowersetError::SaveDirUnset)
    }

    /// Path of an existing file `file_name` in the load directory.
    ///
    /// # Errors
    /// [`ShowersetError::LoadDirUnset`], or [`ShowersetError::FileNotFound`]
    /// if the file does not exist.
    pub fn load_path(&self, file_name: &str) -> Result<PathBuf, ShowersetError> {
        let path = self.load_dir()?.join(file_name);
        if !path.is_file() {
            return Err(ShowersetError::FileNotFound(path));
        }
        Ok(path)
    }

    /// Path for writing `file_name` into the save directory.
    ///
    /// # Errors
    /// [`ShowersetError::SaveDirUnset`], or [`ShowersetError::FileExists`]
    /// if the file exists and `overwrite` is false.
    pub fn save_path(&self, file_name: &str, overwrite: bool) -> Result<PathBuf, ShowersetError> {
        let path = self.save_dir()?.join(file_name);
        if !overwrite && path.exists() {
            return Err(ShowersetError::FileExists(path));
        }
        Ok(path)
    }
}

fn checked_dir(dir: &Path) -> Result<PathBuf, ShowersetError> {
    if dir.is_dir() {
        Ok(dir.to_path_buf())
    } else {
        Err(ShowersetError::InvalidDirectory(dir.to_path_buf()))
    }
}

/// The load-dir/save-dir contract shared by the persistence managers.
pub trait DirManaged {
    fn dirs(&self) -> &IoDirs;

    fn dirs_mut(&mut self) -> &mut IoDirs;

    /// Sets or clears the load directory.
    ///
    /// # Errors
    /// Returns [`ShowersetError::InvalidDirectory`] for a path that is not an
    /// existing directory; the previous value is kept then.
    fn set_load_dir(&mut self, dir: Option<&Path>) -> Result<(), ShowersetError> {
        self.dirs_mut().set_load_dir(dir)
    }

    /// Sets or clears the save directory. Same checks as [`set_load_dir`](Self::set_load_dir).
    fn set_save_dir(&mut self, dir: Option<&Path>) -> Result<(), ShowersetError> {
        self.dirs_mut().set_save_dir(dir)
    }

    fn load_dir(&self) -> Option<&Path> {
        self.dirs().load_dir().ok()
    }

    fn save_dir(&self) -> Option<&Path> {
        self.dirs().save_dir().ok()
    }
}
