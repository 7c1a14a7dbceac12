use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for showerset operations.
#[derive(Debug, Error)]
pub enum ShowersetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid packet geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("Unknown view '{0}' (expected one of: raw, yx, gtux, gtuy)")]
    UnknownView(String),

    #[error("No view is selected; at least one of raw, yx, gtux, gtuy must be true")]
    EmptySelection,

    #[error("Item collections have diverging lengths: {details}")]
    LengthMismatch { details: String },

    #[error("Packet shape {actual:?} does not match the dataset packet shape {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Datasets are incompatible: {message}")]
    Incompatible { message: String },

    #[error("Not an existing directory: {}", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("Load directory is not set")]
    LoadDirUnset,

    #[error("Save directory is not set")]
    SaveDirUnset,

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("File already exists (pass overwrite to replace it): {}", .0.display())]
    FileExists(PathBuf),

    #[error("Unsupported config version {version} in {}", path.display())]
    UnsupportedConfigVersion { path: PathBuf, version: u32 },

    #[error("Failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },

    #[error("Invalid config {}: {message}", path.display())]
    ConfigInvalid { path: PathBuf, message: String },

    #[error("Failed to read array from {}: {source}", path.display())]
    NpyRead {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    #[error("Failed to write array to {}: {source}", path.display())]
    NpyWrite {
        path: PathBuf,
        #[source]
        source: ndarray_npy::WriteNpyError,
    },

    #[error("Failed to read metadata from {}: {source}", path.display())]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write metadata to {}: {source}", path.display())]
    MetadataWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Metadata rows contain fields missing from the declared order: {}", fields.join(", "))]
    UnaccountedFields { fields: Vec<String> },

    #[error("Metadata field '{field}' has an empty value; empty cells are read back as absent")]
    EmptyMetadataValue { field: String },

    #[error("Data files cover views [{provided}] but the dataset selects [{selected}]")]
    PartialWriteUnsupported { provided: String, selected: String },

    #[error("Unknown dtype '{0}'")]
    UnknownDtype(String),

    #[error("Stored dtype is {found} but {expected} was requested")]
    DtypeMismatch { expected: String, found: String },

    #[error("Unknown classification target {0:?} (expected [1, 0] or [0, 1])")]
    UnknownTarget(Vec<i64>),

    #[error("Index range {start}..{end} is out of bounds for {len} item(s)")]
    IndexOutOfRange { start: usize, end: usize, len: usize },

    #[error("Window {start}..{stop} does not fit a packet of {num_frames} frame(s)")]
    WindowOutOfBounds {
        start: i64,
        stop: i64,
        num_frames: usize,
    },

    #[error("Invalid event: {message}")]
    InvalidEvent { message: String },

    #[error("Cannot split {} into packets: {message}", path.display())]
    PacketStream { path: PathBuf, message: String },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
