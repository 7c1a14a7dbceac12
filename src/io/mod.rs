//! On-disk persistence of datasets.
//!
//! A dataset named `NAME` is stored in one directory as:
//!
//! | File                       | Content                                  |
//! |----------------------------|------------------------------------------|
//! | `NAME_config.ini`          | geometry, selected views, dtype, N       |
//! | `NAME_<view>.npy`          | one array per selected view              |
//! | `NAME_class_targets.npy`   | `(N, 2)` one-hot targets                 |
//! | `NAME_meta.tsv`            | metadata, one row per item               |
//!
//! Each file has its own manager ([`ConfigIo`], [`DataIo`], [`TargetsIo`],
//! [`MetadataIo`]) and [`DatasetIo`] drives all four. Every file is written
//! to a temporary file in the target directory first and renamed into
//! place, so a failed write never leaves a truncated file behind.

mod config;
mod coordinator;
mod data;
mod dirs;
mod metadata;
mod targets;

pub use config::{
    ConfigIo, ConfigParser, ConfigParserRegistry, DatasetAttrs, CURRENT_CONFIG_VERSION,
};
pub use coordinator::{DatasetIo, SavedFiles};
pub use data::DataIo;
pub(crate) use data::read_array;
pub use dirs::{DirManaged, IoDirs};
pub use metadata::{
    from_metadata_tsv_slice, read_metadata_tsv, to_metadata_tsv_string, MetadataIo,
    MetadataTable,
};
pub use targets::TargetsIo;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;

use crate::error::ShowersetError;

/// Writes `path` through a temporary file in the same directory that is
/// renamed over `path` once `write` succeeded. The file gets the mode a
/// plain `File::create` would give it.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<(), ShowersetError>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<(), ShowersetError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Narrowed by the umask, as for File::create.
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| ShowersetError::Io(e.error))?;
    Ok(())
}

/// Absolute form of a path that was just written.
pub(crate) fn absolute_path(path: &Path) -> Result<PathBuf, ShowersetError> {
    Ok(std::path::absolute(path)?)
}
