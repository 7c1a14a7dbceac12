//! Dataset validation for showerset.
//!
//! This module provides the argument checks used when datasets are built
//! ([`check_selected_views`], [`check_items_length`]) and a full structural
//! validation of a dataset ([`validate_dataset`]) that reports:
//! - Collection alignment (views, targets and metadata of equal length)
//! - Item shapes matching the packet geometry
//! - Metadata keys outside the declared field set
//! - Data quality hints (empty dataset, single class)

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use ndarray::Axis;

use crate::dataset::Dataset;
use crate::error::ShowersetError;
use crate::packet::{Element, ViewKind};

/// Checks a `(view name, selected)` mapping.
///
/// # Errors
/// - [`ShowersetError::UnknownView`] if a name is not one of the four views
/// - [`ShowersetError::EmptySelection`] if no view is selected
pub fn check_selected_views<'a, I>(flags: I) -> Result<(), ShowersetError>
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let mut any_selected = false;
    for (name, selected) in flags {
        name.parse::<ViewKind>()?;
        any_selected |= selected;
    }

    if any_selected {
        Ok(())
    } else {
        Err(ShowersetError::EmptySelection)
    }
}

/// Checks that all named collections have the same length and returns it
/// (zero when no collection is given).
///
/// # Errors
/// Returns [`ShowersetError::LengthMismatch`] listing every collection's
/// length if they differ.
pub fn check_items_length<'a, I>(lengths: I) -> Result<usize, ShowersetError>
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let lengths: Vec<(&str, usize)> = lengths.into_iter().collect();
    let Some(&(_, first)) = lengths.first() else {
        return Ok(0);
    };

    if lengths.iter().all(|&(_, len)| len == first) {
        Ok(first)
    } else {
        let details = lengths
            .iter()
            .map(|(name, len)| format!("{}={}", name, len))
            .collect::<Vec<_>>()
            .join(", ");
        Err(ShowersetError::LengthMismatch { details })
    }
}

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Validates a dataset and returns a report of all issues found.
pub fn validate_dataset<T: Element>(
    dataset: &Dataset<T>,
    _opts: &ValidateOptions,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_alignment(dataset, &mut report);
    validate_item_shapes(dataset, &mut report);
    validate_metadata(dataset, &mut report);
    validate_contents(dataset, &mut report);

    report
}

fn validate_alignment<T: Element>(dataset: &Dataset<T>, report: &mut ValidationReport) {
    let expected = dataset.num_data();

    for view in dataset.selected_views() {
        let Some(items) = dataset.view_items(view) else {
            report.add(ValidationIssue::error(
                IssueCode::MissingViewItems,
                "Selected view has no item array",
                IssueContext::View { name: view.name() },
            ));
            continue;
        };

        let len = items.len_of(Axis(0));
        if len != expected {
            report.add(ValidationIssue::error(
                IssueCode::LengthMismatch,
                format!("{} item(s) but {} target(s)", len, expected),
                IssueContext::View { name: view.name() },
            ));
        }
    }

    if dataset.metadata().len() != expected {
        report.add(ValidationIssue::error(
            IssueCode::LengthMismatch,
            format!(
                "{} metadata entries but {} target(s)",
                dataset.metadata().len(),
                expected
            ),
            IssueContext::Dataset,
        ));
    }
}

fn validate_item_shapes<T: Element>(dataset: &Dataset<T>, report: &mut ValidationReport) {
    for (view, shape) in dataset.item_shapes() {
        if let Some(items) = dataset.view_items(view) {
            if items.ndim() == 0 || items.shape()[1..] != shape[..] {
                report.add(ValidationIssue::error(
                    IssueCode::ItemShapeMismatch,
                    format!(
                        "array shape {:?} does not hold items of shape {:?}",
                        items.shape(),
                        shape
                    ),
                    IssueContext::View { name: view.name() },
                ));
            }
        }
    }
}

fn validate_metadata<T: Element>(dataset: &Dataset<T>, report: &mut ValidationReport) {
    let fields = dataset.metadata_fields();

    for (index, entry) in dataset.metadata().entries().iter().enumerate() {
        for key in entry.keys().filter(|key| !fields.contains(*key)) {
            report.add(ValidationIssue::error(
                IssueCode::UnaccountedMetadataField,
                format!("Field '{}' is not a declared metadata field", key),
                IssueContext::Item { index },
            ));
        }
    }
}

fn validate_contents<T: Element>(dataset: &Dataset<T>, report: &mut ValidationReport) {
    if dataset.is_empty() {
        report.add(ValidationIssue::warning(
            IssueCode::EmptyDataset,
            "Dataset has no items",
            IssueContext::Dataset,
        ));
        return;
    }

    for (class, count) in dataset.targets().class_counts() {
        if count == 0 {
            report.add(ValidationIssue::warning(
                IssueCode::SingleClass,
                format!("No item is labelled '{}'", class),
                IssueContext::Dataset,
            ));
        }
    }
}
