//! Versioned INI config files (`NAME_config.ini`).
//!
//! The `general.version` key selects the parser. Files without the key are
//! version 0, the legacy layout that predates elementary cells.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};

use super::dirs::{DirManaged, IoDirs};
use super::{absolute_path, write_atomic};
use crate::dataset::Dataset;
use crate::error::ShowersetError;
use crate::packet::{Dtype, Element, PacketTemplate, SelectedViews};

/// Version written by default.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

const CONFIG_SUFFIX: &str = "_config.ini";

const GENERAL: &str = "general";
const ITEM_TYPES: &str = "item_types";
const METADATA: &str = "metadata";
const FIELD_ORDER: &str = "field_order";

/// Dataset attributes stored in a config file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetAttrs {
    pub template: PacketTemplate,
    pub views: SelectedViews,
    pub dtype: Dtype,
    pub num_data: usize,
    pub metadata_field_order: Vec<String>,
}

impl DatasetAttrs {
    /// Attributes describing `dataset`.
    pub fn of<T: Element>(dataset: &Dataset<T>) -> Self {
        Self {
            template: *dataset.template(),
            views: dataset.selected_views().clone(),
            dtype: dataset.dtype(),
            num_data: dataset.num_data(),
            metadata_field_order: dataset.metadata_field_order().to_vec(),
        }
    }

    /// An empty dataset with these attributes.
    ///
    /// # Errors
    /// Returns [`ShowersetError::DtypeMismatch`] if `T` is not the stored dtype.
    pub fn empty_dataset<T: Element>(&self, name: &str) -> Result<Dataset<T>, ShowersetError> {
        self.check_dtype::<T>()?;
        let mut dataset = Dataset::new(name, self.template, self.views.clone());
        dataset.declare_metadata_fields(self.metadata_field_order.iter().cloned());
        Ok(dataset)
    }

    pub(crate) fn check_dtype<T: Element>(&self) -> Result<(), ShowersetError> {
        if self.dtype == T::DTYPE {
            Ok(())
        } else {
            Err(ShowersetError::DtypeMismatch {
                expected: T::DTYPE.to_string(),
                found: self.dtype.to_string(),
            })
        }
    }
}

/// Parser and renderer of one config version.
pub trait ConfigParser: Send + Sync {
    /// The `general.version` value this parser handles.
    fn version(&self) -> u32;

    /// Reads the attributes from a parsed file. `path` is only used in
    /// error messages.
    fn parse(&self, ini: &Ini, path: &Path) -> Result<DatasetAttrs, ShowersetError>;

    /// Lays the attributes out in this version's format. `path` is only
    /// used in error messages.
    ///
    /// # Errors
    /// [`ShowersetError::ConfigInvalid`] if this version cannot express
    /// `attrs`.
    fn render(&self, attrs: &DatasetAttrs, path: &Path) -> Result<Ini, ShowersetError>;
}

/// Mapping from config version to its parser.
pub struct ConfigParserRegistry {
    parsers: BTreeMap<u32, Box<dyn ConfigParser>>,
}

impl ConfigParserRegistry {
    /// A registry without any parser.
    pub fn empty() -> Self {
        Self {
            parsers: BTreeMap::new(),
        }
    }

    /// Registers `parser` under its version, replacing any previous parser
    /// for that version.
    pub fn register(&mut self, parser: Box<dyn ConfigParser>) {
        self.parsers.insert(parser.version(), parser);
    }

    pub fn get(&self, version: u32) -> Option<&dyn ConfigParser> {
        self.parsers.get(&version).map(|p| p.as_ref())
    }

    pub fn versions(&self) -> impl Iterator<Item = u32> + '_ {
        self.parsers.keys().copied()
    }

    /// Parses config text with the parser selected by its version.
    ///
    /// # Errors
    /// [`ShowersetError::ConfigParse`] for malformed INI,
    /// [`ShowersetError::UnsupportedConfigVersion`] for an unregistered
    /// version, or any error of the version's parser.
    pub fn parse_str(&self, text: &str, path: &Path) -> Result<DatasetAttrs, ShowersetError> {
        let ini = parse_ini(text, path)?;
        let version = config_version(&ini, path)?;
        self.parser_for(version, path)?.parse(&ini, path)
    }

    /// Renders `attrs` in the layout of `version`.
    pub fn render_string(
        &self,
        attrs: &DatasetAttrs,
        version: u32,
    ) -> Result<String, ShowersetError> {
        let path = Path::new("<memory>");
        let parser = self.parser_for(version, path)?;
        let mut buf = Vec::new();
        parser.render(attrs, path)?.write_to(&mut buf)?;
        String::from_utf8(buf).map_err(|e| ShowersetError::ConfigInvalid {
            path: PathBuf::from("<memory>"),
            message: e.to_string(),
        })
    }

    fn parser_for(&self, version: u32, path: &Path) -> Result<&dyn ConfigParser, ShowersetError> {
        self.get(version)
            .ok_or_else(|| ShowersetError::UnsupportedConfigVersion {
                path: path.to_path_buf(),
                version,
            })
    }
}

impl Default for ConfigParserRegistry {
    /// A registry with the legacy (0) and current (1) parsers.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(LegacyConfigParser));
        registry.register(Box::new(ConfigParserV1));
        registry
    }
}

impl fmt::Debug for ConfigParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigParserRegistry")
            .field("versions", &self.parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Reads and writes `NAME_config.ini` files.
#[derive(Debug)]
pub struct ConfigIo {
    dirs: IoDirs,
    registry: ConfigParserRegistry,
    write_version: u32,
}

impl ConfigIo {
    pub fn new(load_dir: Option<&Path>, save_dir: Option<&Path>) -> Result<Self, ShowersetError> {
        Ok(Self {
            dirs: IoDirs::new(load_dir, save_dir)?,
            registry: ConfigParserRegistry::default(),
            write_version: CURRENT_CONFIG_VERSION,
        })
    }

    pub fn file_name(name: &str) -> String {
        format!("{}{}", name, CONFIG_SUFFIX)
    }

    pub fn registry(&self) -> &ConfigParserRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ConfigParserRegistry {
        &mut self.registry
    }

    pub fn write_version(&self) -> u32 {
        self.write_version
    }

    /// Selects the layout used by [`save_config`](Self::save_config).
    pub fn set_write_version(&mut self, version: u32) {
        self.write_version = version;
    }

    /// The `general.version` of a stored config, 0 when the key is absent.
    pub fn get_config_version(&self, name: &str) -> Result<u32, ShowersetError> {
        let (ini, path) = self.read_ini(name)?;
        config_version(&ini, &path)
    }

    /// Loads a stored config with the parser for its version.
    ///
    /// # Errors
    /// [`ShowersetError::FileNotFound`], [`ShowersetError::ConfigParse`],
    /// [`ShowersetError::UnsupportedConfigVersion`] or
    /// [`ShowersetError::ConfigInvalid`].
    pub fn load_config(&self, name: &str) -> Result<DatasetAttrs, ShowersetError> {
        let (ini, path) = self.read_ini(name)?;
        let version = config_version(&ini, &path)?;
        log::debug!("Loading config {} (version {})", path.display(), version);
        self.registry.parser_for(version, &path)?.parse(&ini, &path)
    }

    /// Writes `attrs` in the configured write version and returns the
    /// absolute path of the file. Nothing is written if the version cannot
    /// express `attrs`.
    pub fn save_config(
        &self,
        name: &str,
        attrs: &DatasetAttrs,
        overwrite: bool,
    ) -> Result<PathBuf, ShowersetError> {
        let path = self.dirs.save_path(&Self::file_name(name), overwrite)?;
        let ini = self
            .registry
            .parser_for(self.write_version, &path)?
            .render(attrs, &path)?;

        write_atomic(&path, |w| {
            ini.write_to(w)?;
            w.flush()?;
            Ok(())
        })?;
        log::debug!("Wrote config {}", path.display());
        absolute_path(&path)
    }

    fn read_ini(&self, name: &str) -> Result<(Ini, PathBuf), ShowersetError> {
        let path = self.dirs.load_path(&Self::file_name(name))?;
        let text = std::fs::read_to_string(&path)?;
        let ini = parse_ini(&text, &path)?;
        Ok((ini, path))
    }
}

impl DirManaged for ConfigIo {
    fn dirs(&self) -> &IoDirs {
        &self.dirs
    }

    fn dirs_mut(&mut self) -> &mut IoDirs {
        &mut self.dirs
    }
}

// ============================================================================
// Version parsers
// ============================================================================

/// Version 0: no `version` key and no elementary-cell keys. The whole frame
/// is one cell.
struct LegacyConfigParser;

impl ConfigParser for LegacyConfigParser {
    fn version(&self) -> u32 {
        0
    }

    fn parse(&self, ini: &Ini, path: &Path) -> Result<DatasetAttrs, ShowersetError> {
        let general = Section::required(ini, GENERAL, path)?;
        let template = PacketTemplate::single_cell(
            general.parse("num_frames")?,
            general.parse("frame_height")?,
            general.parse("frame_width")?,
        )?;

        Ok(DatasetAttrs {
            template,
            views: parse_item_types(ini, path)?,
            dtype: general.parse("dtype")?,
            num_data: general.parse("num_data")?,
            metadata_field_order: parse_field_order(ini),
        })
    }

    fn render(&self, attrs: &DatasetAttrs, path: &Path) -> Result<Ini, ShowersetError> {
        let t = &attrs.template;
        if t.num_ec() != 1 {
            return Err(ShowersetError::ConfigInvalid {
                path: path.to_path_buf(),
                message: format!(
                    "version 0 has no elementary-cell keys; a {}x{} cell in a {}x{} frame needs version 1",
                    t.ec_width(),
                    t.ec_height(),
                    t.frame_width(),
                    t.frame_height()
                ),
            });
        }
        let mut ini = Ini::new();
        ini.with_section(Some(GENERAL))
            .set("num_frames", t.num_frames().to_string())
            .set("frame_height", t.frame_height().to_string())
            .set("frame_width", t.frame_width().to_string())
            .set("num_data", attrs.num_data.to_string())
            .set("dtype", attrs.dtype.name());
        render_item_types(&mut ini, &attrs.views);
        render_field_order(&mut ini, &attrs.metadata_field_order, path)?;
        Ok(ini)
    }
}

/// Version 1: full geometry including the elementary cell.
struct ConfigParserV1;

impl ConfigParser for ConfigParserV1 {
    fn version(&self) -> u32 {
        1
    }

    fn parse(&self, ini: &Ini, path: &Path) -> Result<DatasetAttrs, ShowersetError> {
        let general = Section::required(ini, GENERAL, path)?;
        let template = PacketTemplate::new(
            general.parse("ec_width")?,
            general.parse("ec_height")?,
            general.parse("frame_width")?,
            general.parse("frame_height")?,
            general.parse("num_frames")?,
        )?;

        Ok(DatasetAttrs {
            template,
            views: parse_item_types(ini, path)?,
            dtype: general.parse("dtype")?,
            num_data: general.parse("num_data")?,
            metadata_field_order: parse_field_order(ini),
        })
    }

    fn render(&self, attrs: &DatasetAttrs, path: &Path) -> Result<Ini, ShowersetError> {
        let t = &attrs.template;
        let mut ini = Ini::new();
        ini.with_section(Some(GENERAL))
            .set("version", self.version().to_string())
            .set("num_frames", t.num_frames().to_string())
            .set("frame_height", t.frame_height().to_string())
            .set("frame_width", t.frame_width().to_string())
            .set("ec_height", t.ec_height().to_string())
            .set("ec_width", t.ec_width().to_string())
            .set("num_data", attrs.num_data.to_string())
            .set("dtype", attrs.dtype.name());
        render_item_types(&mut ini, &attrs.views);
        render_field_order(&mut ini, &attrs.metadata_field_order, path)?;
        Ok(ini)
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn parse_ini(text: &str, path: &Path) -> Result<Ini, ShowersetError> {
    Ini::load_from_str(text).map_err(|source| ShowersetError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

fn config_version(ini: &Ini, path: &Path) -> Result<u32, ShowersetError> {
    let general = Section::required(ini, GENERAL, path)?;
    if general.props.get("version").is_none() {
        log::warn!(
            "{} has no general.version key; reading it as version 0",
            path.display()
        );
        return Ok(0);
    }
    general.parse("version")
}

struct Section<'a> {
    name: &'static str,
    props: &'a Properties,
    path: &'a Path,
}

impl<'a> Section<'a> {
    fn required(ini: &'a Ini, name: &'static str, path: &'a Path) -> Result<Self, ShowersetError> {
        let props = ini
            .section(Some(name))
            .ok_or_else(|| ShowersetError::ConfigInvalid {
                path: path.to_path_buf(),
                message: format!("missing section [{}]", name),
            })?;
        Ok(Self { name, props, path })
    }

    fn get(&self, key: &str) -> Result<&'a str, ShowersetError> {
        self.props
            .get(key)
            .ok_or_else(|| ShowersetError::ConfigInvalid {
                path: self.path.to_path_buf(),
                message: format!("missing key {}.{}", self.name, key),
            })
    }

    fn parse<V>(&self, key: &str) -> Result<V, ShowersetError>
    where
        V: FromStr,
        V::Err: fmt::Display,
    {
        let raw = self.get(key)?;
        raw.trim()
            .parse()
            .map_err(|e: V::Err| ShowersetError::ConfigInvalid {
                path: self.path.to_path_buf(),
                message: format!("invalid {}.{} = '{}': {}", self.name, key, raw, e),
            })
    }
}

fn parse_item_types(ini: &Ini, path: &Path) -> Result<SelectedViews, ShowersetError> {
    let section = Section::required(ini, ITEM_TYPES, path)?;
    let flags = section
        .props
        .iter()
        .map(|(key, value)| {
            parse_flag(value)
                .map(|selected| (key, selected))
                .ok_or_else(|| ShowersetError::ConfigInvalid {
                    path: path.to_path_buf(),
                    message: format!("invalid {}.{} = '{}'", ITEM_TYPES, key, value),
                })
        })
        .collect::<Result<Vec<(&str, bool)>, _>>()?;
    SelectedViews::from_flags(flags)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_field_order(ini: &Ini) -> Vec<String> {
    ini.section(Some(METADATA))
        .and_then(|props| props.get(FIELD_ORDER))
        .map(|order| {
            order
                .split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn render_item_types(ini: &mut Ini, views: &SelectedViews) {
    let mut section = ini.with_section(Some(ITEM_TYPES));
    for (view, selected) in views.flags() {
        section.set(view.name(), selected.to_string());
    }
}

/// Field names must read back unchanged from the comma-joined list.
fn render_field_order(
    ini: &mut Ini,
    field_order: &[String],
    path: &Path,
) -> Result<(), ShowersetError> {
    if let Some(field) = field_order
        .iter()
        .find(|field| field.is_empty() || field.contains(',') || field.trim() != field.as_str())
    {
        return Err(ShowersetError::ConfigInvalid {
            path: path.to_path_buf(),
            message: format!(
                "metadata field name '{}' cannot be stored in {}.{}",
                field, METADATA, FIELD_ORDER
            ),
        });
    }
    ini.with_section(Some(METADATA))
        .set(FIELD_ORDER, field_order.join(","));
    Ok(())
}
