//! Item metadata stored as tab-separated text (`NAME_meta.tsv`).
//!
//! The first line holds the field names in declared order, then one line per
//! item. A field an item does not carry is an empty cell, and an empty cell
//! reads back as an absent key.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use super::dirs::{DirManaged, IoDirs};
use super::{absolute_path, write_atomic};
use crate::dataset::{empty_value_field, MetaEntry};
use crate::error::ShowersetError;

/// Metadata rows together with the column order they were stored in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataTable {
    pub field_order: Vec<String>,
    pub rows: Vec<MetaEntry>,
}

#[derive(Clone, Debug, Default)]
pub struct MetadataIo {
    dirs: IoDirs,
}

impl MetadataIo {
    pub fn new(load_dir: Option<&Path>, save_dir: Option<&Path>) -> Result<Self, ShowersetError> {
        Ok(Self {
            dirs: IoDirs::new(load_dir, save_dir)?,
        })
    }

    pub fn file_name(name: &str) -> String {
        format!("{}_meta.tsv", name)
    }

    /// Writes `rows` with columns in `field_order` and returns the absolute
    /// path of the file.
    ///
    /// # Errors
    /// - [`ShowersetError::UnaccountedFields`] if a row has a key outside
    ///   `field_order`; checked before anything is written
    /// - [`ShowersetError::EmptyMetadataValue`] if a row maps a key to an
    ///   empty string, which the table format cannot tell apart from absence
    /// - [`ShowersetError::FileExists`] if the file exists and `overwrite`
    ///   is false
    pub fn save_metadata(
        &self,
        name: &str,
        rows: &[MetaEntry],
        field_order: &[String],
        overwrite: bool,
    ) -> Result<PathBuf, ShowersetError> {
        check_rows(rows, field_order)?;
        let path = self.dirs.save_path(&Self::file_name(name), overwrite)?;

        write_atomic(&path, |w| {
            write_table(w, rows, field_order).map_err(|source| ShowersetError::MetadataWrite {
                path: path.clone(),
                source,
            })
        })?;
        log::debug!("Wrote {} metadata row(s) to {}", rows.len(), path.display());
        absolute_path(&path)
    }

    /// Loads the metadata of dataset `name`. With `selected_fields`, only
    /// those columns populate the rows and the returned field order.
    pub fn load_metadata(
        &self,
        name: &str,
        selected_fields: Option<&[String]>,
    ) -> Result<MetadataTable, ShowersetError> {
        let path = self.dirs.load_path(&Self::file_name(name))?;
        let table = read_metadata_tsv(&path, selected_fields)?;
        log::debug!(
            "Read {} metadata row(s) from {}",
            table.rows.len(),
            path.display()
        );
        Ok(table)
    }
}

impl DirManaged for MetadataIo {
    fn dirs(&self) -> &IoDirs {
        &self.dirs
    }

    fn dirs_mut(&mut self) -> &mut IoDirs {
        &mut self.dirs
    }
}

// ============================================================================
// Free-standing readers and writers
// ============================================================================

/// Reads a tab-separated file with a header row into a [`MetadataTable`].
pub fn read_metadata_tsv(
    path: &Path,
    selected_fields: Option<&[String]>,
) -> Result<MetadataTable, ShowersetError> {
    let file = File::open(path)?;
    read_table(BufReader::new(file), selected_fields).map_err(|source| {
        ShowersetError::MetadataRead {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Parses tab-separated bytes with a header row.
///
/// Useful for testing without file I/O.
pub fn from_metadata_tsv_slice(
    bytes: &[u8],
    selected_fields: Option<&[String]>,
) -> Result<MetadataTable, csv::Error> {
    read_table(bytes, selected_fields)
}

/// Renders rows as tab-separated text with a header row.
///
/// Useful for testing without file I/O.
pub fn to_metadata_tsv_string(
    rows: &[MetaEntry],
    field_order: &[String],
) -> Result<String, ShowersetError> {
    check_rows(rows, field_order)?;
    let mut buf = Vec::new();
    write_table(&mut buf, rows, field_order).map_err(|source| ShowersetError::MetadataWrite {
        path: PathBuf::from("<memory>"),
        source,
    })?;
    String::from_utf8(buf).map_err(|e| ShowersetError::Io(std::io::Error::other(e)))
}

fn check_rows(rows: &[MetaEntry], field_order: &[String]) -> Result<(), ShowersetError> {
    if let Some(field) = rows.iter().find_map(empty_value_field) {
        return Err(ShowersetError::EmptyMetadataValue {
            field: field.to_string(),
        });
    }

    let declared: BTreeSet<&str> = field_order.iter().map(String::as_str).collect();
    let unaccounted: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys())
        .map(String::as_str)
        .filter(|key| !declared.contains(key))
        .collect();

    if unaccounted.is_empty() {
        Ok(())
    } else {
        Err(ShowersetError::UnaccountedFields {
            fields: unaccounted.into_iter().map(String::from).collect(),
        })
    }
}

fn write_table<W: Write>(
    writer: W,
    rows: &[MetaEntry],
    field_order: &[String],
) -> Result<(), csv::Error> {
    // Without columns there is nothing to write; row count comes from the
    // other dataset files.
    if field_order.is_empty() {
        return Ok(());
    }

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    wtr.write_record(field_order)?;
    for row in rows {
        wtr.write_record(
            field_order
                .iter()
                .map(|field| row.get(field).map(String::as_str).unwrap_or("")),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_table<R: Read>(
    reader: R,
    selected_fields: Option<&[String]>,
) -> Result<MetadataTable, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
    let keep: Vec<bool> = headers
        .iter()
        .map(|h| selected_fields.is_none_or(|fields| fields.contains(h)))
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let entry: MetaEntry = headers
            .iter()
            .zip(record.iter())
            .zip(&keep)
            .filter(|((_, value), keep)| **keep && !value.is_empty())
            .map(|((field, value), _)| (field.clone(), value.to_string()))
            .collect();
        rows.push(entry);
    }

    let field_order = headers
        .into_iter()
        .zip(keep)
        .filter_map(|(field, keep)| keep.then_some(field))
        .collect();
    Ok(MetadataTable { field_order, rows })
}
