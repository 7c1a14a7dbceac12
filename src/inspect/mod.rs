//! Dataset inspection.
//!
//! Produces a structured summary of a dataset: geometry, per-view item
//! shapes, class balance and how many items carry each metadata field.

mod report;

pub use report::{ClassCount, FieldFill, InspectReport, MetadataSection, SummarySection, ViewEntry};

use crate::dataset::Dataset;
use crate::packet::Element;

/// Options for dataset inspection.
#[derive(Clone, Debug)]
pub struct InspectOptions {
    /// Width of the class histogram bars (in characters).
    pub bar_width: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self { bar_width: 20 }
    }
}

/// Inspect a dataset and produce a report.
pub fn inspect_dataset<T: Element>(dataset: &Dataset<T>, opts: &InspectOptions) -> InspectReport {
    let template = dataset.template();

    let summary = SummarySection {
        name: dataset.name().to_string(),
        dtype: dataset.dtype().to_string(),
        num_data: dataset.num_data(),
        packet_shape: dataset.packet_shape(),
        ec_shape: [template.ec_height(), template.ec_width()],
        num_ec: template.num_ec(),
    };

    let views = dataset
        .item_shapes()
        .into_iter()
        .map(|(view, item_shape)| ViewEntry {
            view: view.to_string(),
            item_shape,
        })
        .collect();

    let classes = dataset
        .targets()
        .class_counts()
        .into_iter()
        .map(|(class, count)| ClassCount {
            class: class.to_string(),
            count,
        })
        .collect();

    let fields = dataset
        .metadata_field_order()
        .iter()
        .map(|field| FieldFill {
            field: field.clone(),
            present: dataset.metadata().count_present(field),
        })
        .collect();

    InspectReport {
        summary,
        views,
        classes,
        metadata: MetadataSection { fields },
        bar_width: opts.bar_width,
    }
}
