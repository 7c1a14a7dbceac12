//! Per-view item arrays stored as `.npy` files (`NAME_<view>.npy`).

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ndarray::{ArrayD, ArrayViewD, IxDyn};
use ndarray_npy::{ReadNpyExt, WriteNpyExt};

use super::dirs::{DirManaged, IoDirs};
use super::{absolute_path, write_atomic};
use crate::error::ShowersetError;
use crate::packet::{Element, SelectedViews, ViewKind};

/// Reads and writes the per-view item arrays of a dataset.
#[derive(Clone, Debug, Default)]
pub struct DataIo {
    dirs: IoDirs,
}

impl DataIo {
    pub fn new(load_dir: Option<&Path>, save_dir: Option<&Path>) -> Result<Self, ShowersetError> {
        Ok(Self {
            dirs: IoDirs::new(load_dir, save_dir)?,
        })
    }

    pub fn file_name(name: &str, view: ViewKind) -> String {
        format!("{}_{}.npy", name, view.name())
    }

    /// Loads the arrays of the selected views.
    ///
    /// The map has an entry for each of the four views; unselected views map
    /// to an empty one-dimensional placeholder and are not read from disk.
    pub fn load_data<T: Element>(
        &self,
        name: &str,
        selected: &SelectedViews,
    ) -> Result<BTreeMap<ViewKind, ArrayD<T>>, ShowersetError> {
        let mut arrays = BTreeMap::new();
        for view in ViewKind::ALL {
            let array = if selected.contains(view) {
                let path = self.dirs.load_path(&Self::file_name(name, view))?;
                let array = read_array(&path)?;
                log::debug!("Read {:?} from {}", array.shape(), path.display());
                array
            } else {
                ArrayD::default(IxDyn(&[0]))
            };
            arrays.insert(view, array);
        }
        Ok(arrays)
    }

    /// Writes one file per selected view and returns their absolute paths.
    ///
    /// # Errors
    /// - [`ShowersetError::PartialWriteUnsupported`] if `items` does not cover
    ///   exactly the selected views
    /// - [`ShowersetError::FileExists`] if a target exists and `overwrite`
    ///   is false; no file is written then
    pub fn save_data<T: Element>(
        &self,
        name: &str,
        items: &BTreeMap<ViewKind, ArrayViewD<'_, T>>,
        selected: &SelectedViews,
        overwrite: bool,
    ) -> Result<BTreeMap<ViewKind, PathBuf>, ShowersetError> {
        let provided: BTreeSet<ViewKind> = items.keys().copied().collect();
        let wanted: BTreeSet<ViewKind> = selected.iter().collect();
        if provided != wanted {
            return Err(ShowersetError::PartialWriteUnsupported {
                provided: provided
                    .iter()
                    .map(|v| v.name())
                    .collect::<Vec<_>>()
                    .join(", "),
                selected: selected.to_string(),
            });
        }

        let targets = items
            .keys()
            .map(|view| Ok((*view, self.dirs.save_path(&Self::file_name(name, *view), overwrite)?)))
            .collect::<Result<Vec<_>, ShowersetError>>()?;

        let mut written = BTreeMap::new();
        for (view, path) in targets {
            let array = &items[&view];
            write_atomic(&path, |w| {
                array.write_npy(w).map_err(|source| ShowersetError::NpyWrite {
                    path: path.clone(),
                    source,
                })
            })?;
            log::debug!("Wrote {:?} to {}", array.shape(), path.display());
            written.insert(view, absolute_path(&path)?);
        }
        Ok(written)
    }
}

impl DirManaged for DataIo {
    fn dirs(&self) -> &IoDirs {
        &self.dirs
    }

    fn dirs_mut(&mut self) -> &mut IoDirs {
        &mut self.dirs
    }
}

/// Reads a `.npy` file of any dimensionality.
pub(crate) fn read_array<T: Element>(path: &Path) -> Result<ArrayD<T>, ShowersetError> {
    let file = File::open(path)?;
    ArrayD::<T>::read_npy(BufReader::new(file)).map_err(|source| ShowersetError::NpyRead {
        path: path.to_path_buf(),
        source,
    })
}
