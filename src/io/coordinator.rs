//! Whole-dataset load and save across the four file managers.

use std::collections::BTreeMap;
use std::iter;
use std::path::{Path, PathBuf};

use super::config::{ConfigIo, DatasetAttrs};
use super::data::DataIo;
use super::dirs::DirManaged;
use super::metadata::MetadataIo;
use super::targets::TargetsIo;
use crate::dataset::{Dataset, MetaEntry, MetadataHolder, TargetsHolder};
use crate::error::ShowersetError;
use crate::packet::{Element, SelectedViews, ViewKind};

/// Absolute paths of the files written by [`DatasetIo::save_dataset`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedFiles {
    pub config: PathBuf,
    pub data: BTreeMap<ViewKind, PathBuf>,
    pub targets: PathBuf,
    pub metadata: PathBuf,
}

/// Loads and saves complete datasets.
///
/// Holds one manager per file kind; setting a directory sets it on all four.
#[derive(Debug)]
pub struct DatasetIo {
    config: ConfigIo,
    data: DataIo,
    targets: TargetsIo,
    metadata: MetadataIo,
}

impl DatasetIo {
    pub fn new(load_dir: Option<&Path>, save_dir: Option<&Path>) -> Result<Self, ShowersetError> {
        Ok(Self {
            config: ConfigIo::new(load_dir, save_dir)?,
            data: DataIo::new(load_dir, save_dir)?,
            targets: TargetsIo::new(load_dir, save_dir)?,
            metadata: MetadataIo::new(load_dir, save_dir)?,
        })
    }

    pub fn set_load_dir(&mut self, dir: Option<&Path>) -> Result<(), ShowersetError> {
        self.config.set_load_dir(dir)?;
        self.data.set_load_dir(dir)?;
        self.targets.set_load_dir(dir)?;
        self.metadata.set_load_dir(dir)
    }

    pub fn set_save_dir(&mut self, dir: Option<&Path>) -> Result<(), ShowersetError> {
        self.config.set_save_dir(dir)?;
        self.data.set_save_dir(dir)?;
        self.targets.set_save_dir(dir)?;
        self.metadata.set_save_dir(dir)
    }

    pub fn load_dir(&self) -> Option<&Path> {
        self.config.load_dir()
    }

    pub fn save_dir(&self) -> Option<&Path> {
        self.config.save_dir()
    }

    pub fn config_io(&self) -> &ConfigIo {
        &self.config
    }

    /// Config manager, e.g. to register parsers or pick the write version.
    pub fn config_io_mut(&mut self) -> &mut ConfigIo {
        &mut self.config
    }

    /// Stored attributes of dataset `name`, without loading any item.
    pub fn load_attrs(&self, name: &str) -> Result<DatasetAttrs, ShowersetError> {
        self.config.load_config(name)
    }

    /// An empty dataset with the stored geometry, views and metadata fields.
    ///
    /// # Errors
    /// Config errors, or [`ShowersetError::DtypeMismatch`] if `T` is not the
    /// stored dtype.
    pub fn load_empty_dataset<T: Element>(&self, name: &str) -> Result<Dataset<T>, ShowersetError> {
        self.load_attrs(name)?.empty_dataset(name)
    }

    /// Loads dataset `name`, restricted to `selected_views` if given.
    ///
    /// # Errors
    /// - [`ShowersetError::DtypeMismatch`] if `T` is not the stored dtype
    /// - [`ShowersetError::Incompatible`] if `selected_views` asks for a view
    ///   that was not stored
    /// - [`ShowersetError::LengthMismatch`] if the files disagree on the
    ///   number of items
    /// - any error of the individual managers
    pub fn load_dataset<T: Element>(
        &self,
        name: &str,
        selected_views: Option<&SelectedViews>,
    ) -> Result<Dataset<T>, ShowersetError> {
        let attrs = self.load_attrs(name)?;
        attrs.check_dtype::<T>()?;

        let views = match selected_views {
            Some(views) if !views.is_subset(&attrs.views) => {
                return Err(ShowersetError::Incompatible {
                    message: format!(
                        "requested views [{}] but '{}' stores [{}]",
                        views, name, attrs.views
                    ),
                });
            }
            Some(views) => views.clone(),
            None => attrs.views.clone(),
        };

        let mut data = self.data.load_data::<T>(name, &views)?;
        let items: BTreeMap<ViewKind, _> = views
            .iter()
            .filter_map(|view| data.remove(&view).map(|array| (view, array)))
            .collect();

        let targets = self.targets.load_targets(name)?;
        let table = self.metadata.load_metadata(name, None)?;

        let mut metadata = MetadataHolder::new();
        metadata.declare_fields(attrs.metadata_field_order.iter().cloned());
        metadata.declare_fields(table.field_order);
        if metadata.fields().is_empty() && table.rows.is_empty() {
            metadata.extend(iter::repeat_with(MetaEntry::new).take(targets.len()));
        } else {
            metadata.extend(table.rows);
        }

        let dataset = Dataset::from_parts(
            name,
            attrs.template,
            views,
            items,
            TargetsHolder::from_targets(targets),
            metadata,
        )?;

        if dataset.num_data() != attrs.num_data {
            return Err(ShowersetError::LengthMismatch {
                details: format!(
                    "config num_data={}, stored items={}",
                    attrs.num_data,
                    dataset.num_data()
                ),
            });
        }

        log::info!(
            "Loaded '{}' ({} item(s), views [{}]) from {}",
            name,
            dataset.num_data(),
            dataset.selected_views(),
            self.load_dir().map(|d| d.display().to_string()).unwrap_or_default()
        );
        Ok(dataset)
    }

    /// Saves config, view arrays, targets and metadata of `dataset` under its
    /// name, in that order.
    ///
    /// There is no rollback: if a step fails, the files written by earlier
    /// steps stay on disk and the saved dataset must be treated as invalid.
    pub fn save_dataset<T: Element>(
        &self,
        dataset: &Dataset<T>,
        overwrite: bool,
    ) -> Result<SavedFiles, ShowersetError> {
        let name = dataset.name();

        let config = self
            .config
            .save_config(name, &DatasetAttrs::of(dataset), overwrite)?;
        let data = self.data.save_data(
            name,
            &dataset.get_data(..)?,
            dataset.selected_views(),
            overwrite,
        )?;
        let targets = self
            .targets
            .save_targets(name, dataset.targets().as_slice(), overwrite)?;
        let metadata = self.metadata.save_metadata(
            name,
            dataset.metadata().entries(),
            dataset.metadata_field_order(),
            overwrite,
        )?;

        log::info!(
            "Saved '{}' ({} item(s)) to {}",
            name,
            dataset.num_data(),
            self.save_dir().map(|d| d.display().to_string()).unwrap_or_default()
        );
        Ok(SavedFiles {
            config,
            data,
            targets,
            metadata,
        })
    }
}
