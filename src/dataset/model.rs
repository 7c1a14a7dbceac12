//! The multi-view dataset aggregate.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Bound, Range, RangeBounds};

use ndarray::{concatenate, ArrayD, ArrayView3, ArrayViewD, Axis, IxDyn, Slice};

use super::metadata::{empty_value_field, MetaEntry, MetadataHolder};
use super::shuffle::{RandomShuffler, Shuffler};
use super::targets::{ClassTarget, TargetsHolder};
use crate::error::ShowersetError;
use crate::packet::{item_shape, project, Dtype, Element, PacketTemplate, SelectedViews, ViewKind};
use crate::validation::check_items_length;

/// A dataset of packets reduced to their selected views, with one
/// classification target and one metadata entry per item.
///
/// For every selected view the dataset holds an array of shape
/// `(N, *item_shape(view))`. The view arrays, the targets and the metadata
/// always have the same length `N`; every mutating operation keeps them
/// index-aligned.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset<T: Element> {
    name: String,
    template: PacketTemplate,
    views: SelectedViews,
    items: BTreeMap<ViewKind, ArrayD<T>>,
    targets: TargetsHolder,
    metadata: MetadataHolder,
}

impl<T: Element> Dataset<T> {
    /// Creates an empty dataset.
    pub fn new(name: impl Into<String>, template: PacketTemplate, views: SelectedViews) -> Self {
        let items = views
            .iter()
            .map(|view| (view, empty_items(template.packet_shape(), view)))
            .collect();

        Self {
            name: name.into(),
            template,
            views,
            items,
            targets: TargetsHolder::new(),
            metadata: MetadataHolder::new(),
        }
    }

    /// Assembles a dataset from already-built parts, checking that every
    /// view array has the expected item shape and that all collections have
    /// the same length.
    ///
    /// # Errors
    /// Returns [`ShowersetError::ShapeMismatch`] for a view array with the
    /// wrong item shape, and [`ShowersetError::LengthMismatch`] for
    /// collections of different lengths or a missing/extra view array.
    pub fn from_parts(
        name: impl Into<String>,
        template: PacketTemplate,
        views: SelectedViews,
        items: BTreeMap<ViewKind, ArrayD<T>>,
        targets: TargetsHolder,
        metadata: MetadataHolder,
    ) -> Result<Self, ShowersetError> {
        let provided: BTreeSet<ViewKind> = items.keys().copied().collect();
        let selected: BTreeSet<ViewKind> = views.iter().collect();
        if provided != selected {
            return Err(ShowersetError::LengthMismatch {
                details: format!(
                    "item arrays cover views {:?} but the dataset selects {:?}",
                    provided, selected
                ),
            });
        }

        for (view, array) in &items {
            let expected = item_shape(template.packet_shape(), *view);
            if array.ndim() != expected.len() + 1 || array.shape()[1..] != expected[..] {
                let mut expected_full = vec![array.shape().first().copied().unwrap_or(0)];
                expected_full.extend(expected);
                return Err(ShowersetError::ShapeMismatch {
                    expected: expected_full,
                    actual: array.shape().to_vec(),
                });
            }
        }

        let dataset = Self {
            name: name.into(),
            template,
            views,
            items,
            targets,
            metadata,
        };
        dataset.check_invariants()?;
        Ok(dataset)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn template(&self) -> &PacketTemplate {
        &self.template
    }

    /// `(num_frames, frame_height, frame_width)` of the packets this dataset accepts.
    pub fn packet_shape(&self) -> [usize; 3] {
        self.template.packet_shape()
    }

    pub fn selected_views(&self) -> &SelectedViews {
        &self.views
    }

    pub fn dtype(&self) -> Dtype {
        T::DTYPE
    }

    /// Number of items.
    pub fn num_data(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_data() == 0
    }

    /// Shape of a single item for each selected view.
    pub fn item_shapes(&self) -> BTreeMap<ViewKind, Vec<usize>> {
        self.views
            .iter()
            .map(|view| (view, item_shape(self.packet_shape(), view)))
            .collect()
    }

    /// Union of metadata field names across all items.
    pub fn metadata_fields(&self) -> &BTreeSet<String> {
        self.metadata.fields()
    }

    pub fn metadata_field_order(&self) -> &[String] {
        self.metadata.field_order()
    }

    /// Declares metadata fields that no item needs to carry yet.
    pub fn declare_metadata_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.declare_fields(fields);
    }

    pub fn targets(&self) -> &TargetsHolder {
        &self.targets
    }

    /// Read-side settings of the targets holder (e.g. `copy_on_read`).
    pub fn targets_mut(&mut self) -> &mut TargetsHolder {
        &mut self.targets
    }

    pub fn metadata(&self) -> &MetadataHolder {
        &self.metadata
    }

    /// Mutable metadata access; entries may be edited but not added or
    /// removed, which would break alignment.
    pub fn metadata_entry_mut(&mut self, index: usize) -> Option<&mut MetaEntry> {
        self.metadata.get_mut(index)
    }

    /// All items of `view`, or `None` if the view is not selected.
    pub fn view_items(&self, view: ViewKind) -> Option<ArrayViewD<'_, T>> {
        self.items.get(&view).map(|array| array.view())
    }

    /// Projects `packet` onto every selected view and appends it as a new
    /// item at index `num_data()`, together with `target` and `meta`.
    ///
    /// # Errors
    /// - [`ShowersetError::ShapeMismatch`] if the packet shape differs from
    ///   [`packet_shape`](Self::packet_shape)
    /// - [`ShowersetError::EmptyMetadataValue`] if `meta` maps a field to an
    ///   empty string
    ///
    /// The dataset is left untouched on error.
    pub fn add_packet(
        &mut self,
        packet: ArrayView3<'_, T>,
        target: ClassTarget,
        meta: MetaEntry,
    ) -> Result<(), ShowersetError> {
        let expected = self.packet_shape();
        if packet.shape() != expected.as_slice() {
            return Err(ShowersetError::ShapeMismatch {
                expected: expected.to_vec(),
                actual: packet.shape().to_vec(),
            });
        }
        if let Some(field) = empty_value_field(&meta) {
            return Err(ShowersetError::EmptyMetadataValue {
                field: field.to_string(),
            });
        }

        let projections: Vec<(ViewKind, ArrayD<T>)> = self
            .views
            .iter()
            .map(|view| (view, project(packet, view)))
            .collect();

        for (view, projection) in projections {
            if let Some(items) = self.items.get_mut(&view) {
                items
                    .push(Axis(0), projection.view())
                    .map_err(|e| ShowersetError::LengthMismatch {
                        details: format!("appending to view {}: {}", view, e),
                    })?;
            }
        }
        self.targets.append(target);
        self.metadata.append(meta);
        Ok(())
    }

    /// Views of the selected item arrays restricted to `range`.
    ///
    /// # Errors
    /// Returns [`ShowersetError::IndexOutOfRange`] if `range` exceeds `num_data()`.
    pub fn get_data(
        &self,
        range: impl RangeBounds<usize>,
    ) -> Result<BTreeMap<ViewKind, ArrayViewD<'_, T>>, ShowersetError> {
        let range = resolve_range(range, self.num_data())?;
        Ok(self
            .items
            .iter()
            .map(|(view, array)| (*view, array.slice_axis(Axis(0), Slice::from(range.clone()))))
            .collect())
    }

    /// Like [`get_data`](Self::get_data), as a list in canonical view order.
    pub fn get_data_ordered(
        &self,
        range: impl RangeBounds<usize>,
    ) -> Result<Vec<ArrayViewD<'_, T>>, ShowersetError> {
        Ok(self.get_data(range)?.into_values().collect())
    }

    /// Targets restricted to `range`; borrowed unless the targets holder has
    /// `copy_on_read` set.
    pub fn get_targets(
        &self,
        range: impl RangeBounds<usize>,
    ) -> Result<Cow<'_, [ClassTarget]>, ShowersetError> {
        let range = resolve_range(range, self.num_data())?;
        self.targets.get(range)
    }

    /// Metadata entries restricted to `range`.
    pub fn get_metadata(
        &self,
        range: impl RangeBounds<usize>,
    ) -> Result<&[MetaEntry], ShowersetError> {
        let range = resolve_range(range, self.num_data())?;
        self.metadata.slice(range)
    }

    /// True iff both datasets have the same packet shape and the same
    /// selected views.
    pub fn is_compatible_with(&self, other: &Dataset<T>) -> bool {
        self.packet_shape() == other.packet_shape() && self.views == other.views
    }

    /// Appends copies of all of `other`'s items after this dataset's items.
    ///
    /// # Errors
    /// Returns [`ShowersetError::Incompatible`] if the datasets are not
    /// [compatible](Self::is_compatible_with); nothing is modified then.
    pub fn merge_with(&mut self, other: &Dataset<T>) -> Result<(), ShowersetError> {
        if !self.is_compatible_with(other) {
            return Err(ShowersetError::Incompatible {
                message: format!(
                    "'{}' has packet shape {:?} and views [{}], '{}' has packet shape {:?} and views [{}]",
                    self.name,
                    self.packet_shape(),
                    self.views,
                    other.name,
                    other.packet_shape(),
                    other.views
                ),
            });
        }

        for (view, items) in &mut self.items {
            if let Some(other_items) = other.items.get(view) {
                items
                    .append(Axis(0), other_items.view())
                    .map_err(|e| ShowersetError::Incompatible {
                        message: format!("view {}: {}", view, e),
                    })?;
            }
        }
        self.targets.extend(other.targets.as_slice().iter().copied());
        self.metadata.declare_fields(other.metadata.field_order().iter().cloned());
        self.metadata.extend(other.metadata.entries().iter().cloned());

        log::info!(
            "merged {} item(s) from '{}' into '{}' ({} total)",
            other.num_data(),
            other.name,
            self.name,
            self.num_data()
        );
        Ok(())
    }

    /// Moves the items in `range` into a new dataset named `name` with the
    /// same geometry. This dataset keeps the remaining items; both sides
    /// preserve the original order.
    ///
    /// # Errors
    /// Returns [`ShowersetError::IndexOutOfRange`] if `range` exceeds `num_data()`.
    pub fn split(
        &mut self,
        range: impl RangeBounds<usize>,
        name: impl Into<String>,
    ) -> Result<Dataset<T>, ShowersetError> {
        let range = resolve_range(range, self.num_data())?;

        let mut extracted_items = BTreeMap::new();
        for (view, items) in &mut self.items {
            let extracted = items
                .slice_axis(Axis(0), Slice::from(range.clone()))
                .to_owned();
            let head = items.slice_axis(Axis(0), Slice::from(..range.start));
            let tail = items.slice_axis(Axis(0), Slice::from(range.end..));
            let remaining = concatenate(Axis(0), &[head, tail]).map_err(|e| {
                ShowersetError::LengthMismatch {
                    details: format!("splitting view {}: {}", view, e),
                }
            })?;
            *items = remaining;
            extracted_items.insert(*view, extracted);
        }

        let targets = TargetsHolder::from_targets(self.targets.split_off_range(range.clone()));
        let metadata = self.metadata.split_off_range(range);

        Ok(Dataset {
            name: name.into(),
            template: self.template,
            views: self.views.clone(),
            items: extracted_items,
            targets,
            metadata,
        })
    }

    /// Splits off the trailing `fraction` of the items (rounded to the
    /// nearest item) as a new dataset named `name`.
    ///
    /// # Errors
    /// Returns [`ShowersetError::IndexOutOfRange`] if `fraction` is not in `[0, 1]`.
    pub fn split_ratio(
        &mut self,
        fraction: f64,
        name: impl Into<String>,
    ) -> Result<Dataset<T>, ShowersetError> {
        let len = self.num_data();
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ShowersetError::IndexOutOfRange {
                start: 0,
                end: (fraction.max(0.0) * len as f64).round() as usize,
                len,
            });
        }
        let taken = (len as f64 * fraction).round() as usize;
        self.split(len - taken.min(len).., name)
    }

    /// Shuffles all item collections `num_times` times with the same
    /// permutation per round.
    ///
    /// Each round snapshots the shuffler once and resets it before each
    /// collection, so every view, the targets and the metadata receive the
    /// same permutation. Successive rounds draw independent permutations.
    pub fn shuffle<S: Shuffler>(&mut self, num_times: usize, shuffler: &mut S) {
        let len = self.num_data();
        for _ in 0..num_times {
            shuffler.keep_state();
            for items in self.items.values_mut() {
                shuffler.reset_state();
                let order = shuffler.permutation(len);
                *items = items.select(Axis(0), &order);
            }
            shuffler.reset_state();
            self.targets.shuffle(shuffler);
            shuffler.reset_state();
            self.metadata.shuffle(shuffler);
        }
        log::info!("shuffled '{}' {} time(s) ({} item(s))", self.name, num_times, len);
    }

    /// [`shuffle`](Self::shuffle) with a fresh [`RandomShuffler`] seeded by `seed`.
    pub fn shuffle_seeded(&mut self, num_times: usize, seed: u64) {
        let mut shuffler = RandomShuffler::seeded(seed);
        self.shuffle(num_times, &mut shuffler);
    }

    /// Adds metadata field `name` with value `default` to every item.
    ///
    /// # Errors
    /// Returns [`ShowersetError::EmptyMetadataValue`] if `default` is empty.
    pub fn add_metafield(
        &mut self,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Result<(), ShowersetError> {
        self.metadata.add_metafield(name, default)
    }

    /// Verifies that all item collections have the same length.
    ///
    /// # Errors
    /// Returns [`ShowersetError::LengthMismatch`] naming each collection's length.
    pub fn check_invariants(&self) -> Result<usize, ShowersetError> {
        let mut lengths: Vec<(String, usize)> = self
            .items
            .iter()
            .map(|(view, array)| (view.name().to_string(), array.len_of(Axis(0))))
            .collect();
        lengths.push(("targets".to_string(), self.targets.len()));
        lengths.push(("metadata".to_string(), self.metadata.len()));
        check_items_length(lengths.iter().map(|(name, len)| (name.as_str(), *len)))
    }
}

/// An empty `(0, *item_shape)` array for `view`.
pub(crate) fn empty_items<T: Element>(packet_shape: [usize; 3], view: ViewKind) -> ArrayD<T> {
    let mut shape = vec![0];
    shape.extend(item_shape(packet_shape, view));
    ArrayD::default(IxDyn(&shape))
}

/// Turns any range expression into a concrete range within `0..len`.
pub(crate) fn resolve_range(
    range: impl RangeBounds<usize>,
    len: usize,
) -> Result<Range<usize>, ShowersetError> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };

    if start > end || end > len {
        return Err(ShowersetError::IndexOutOfRange { start, end, len });
    }
    Ok(start..end)
}
