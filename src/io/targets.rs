//! Classification targets stored as an `(N, 2)` `uint8` array
//! (`NAME_class_targets.npy`).

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};

use super::dirs::{DirManaged, IoDirs};
use super::{absolute_path, write_atomic};
use crate::dataset::ClassTarget;
use crate::error::ShowersetError;

#[derive(Clone, Debug, Default)]
pub struct TargetsIo {
    dirs: IoDirs,
}

impl TargetsIo {
    pub fn new(load_dir: Option<&Path>, save_dir: Option<&Path>) -> Result<Self, ShowersetError> {
        Ok(Self {
            dirs: IoDirs::new(load_dir, save_dir)?,
        })
    }

    pub fn file_name(name: &str) -> String {
        format!("{}_class_targets.npy", name)
    }

    /// Loads the targets of dataset `name`.
    ///
    /// # Errors
    /// [`ShowersetError::ShapeMismatch`] if the array is not `(N, 2)`, and
    /// [`ShowersetError::UnknownTarget`] for a row other than `[1, 0]` or
    /// `[0, 1]`.
    pub fn load_targets(&self, name: &str) -> Result<Vec<ClassTarget>, ShowersetError> {
        let path = self.dirs.load_path(&Self::file_name(name))?;
        let file = File::open(&path)?;
        let array = Array2::<u8>::read_npy(BufReader::new(file)).map_err(|source| {
            ShowersetError::NpyRead {
                path: path.clone(),
                source,
            }
        })?;

        if array.ncols() != 2 {
            return Err(ShowersetError::ShapeMismatch {
                expected: vec![array.nrows(), 2],
                actual: array.shape().to_vec(),
            });
        }

        let targets = array
            .rows()
            .into_iter()
            .map(|row| {
                let vector: Vec<i64> = row.iter().map(|&v| i64::from(v)).collect();
                ClassTarget::from_vector(&vector)
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Read {} target(s) from {}", targets.len(), path.display());
        Ok(targets)
    }

    /// Writes `targets` as one-hot rows and returns the absolute path.
    pub fn save_targets(
        &self,
        name: &str,
        targets: &[ClassTarget],
        overwrite: bool,
    ) -> Result<PathBuf, ShowersetError> {
        let path = self.dirs.save_path(&Self::file_name(name), overwrite)?;
        let array = Array2::from_shape_fn((targets.len(), 2), |(i, j)| targets[i].vector()[j]);

        write_atomic(&path, |w| {
            array.write_npy(w).map_err(|source| ShowersetError::NpyWrite {
                path: path.clone(),
                source,
            })
        })?;
        log::debug!("Wrote {} target(s) to {}", targets.len(), path.display());
        absolute_path(&path)
    }
}

impl DirManaged for TargetsIo {
    fn dirs(&self) -> &IoDirs {
        &self.dirs
    }

    fn dirs_mut(&mut self) -> &mut IoDirs {
        &mut self.dirs
    }
}
