//! Per-item metadata entries and the set of known fields.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use super::shuffle::Shuffler;
use crate::error::ShowersetError;

/// Attribute map attached to a single item.
///
/// A field that an entry does not carry is simply absent from the map.
pub type MetaEntry = BTreeMap<String, String>;

/// First key of `entry` whose value is the empty string.
///
/// Empty values are refused: the on-disk table writes an absent field as an
/// empty cell, so an empty value would load back as absence.
pub(crate) fn empty_value_field(entry: &MetaEntry) -> Option<&str> {
    entry
        .iter()
        .find(|(_, value)| value.is_empty())
        .map(|(key, _)| key.as_str())
}

/// Index-addressable list of [`MetaEntry`] values.
///
/// Tracks the union of field names seen so far, both as a set and as the
/// column order used on disk. A field takes its position when it is first
/// seen; fields new in the same entry are taken in key order, since entries
/// are sorted maps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataHolder {
    entries: Vec<MetaEntry>,
    fields: BTreeSet<String>,
    field_order: Vec<String>,
}

impl MetadataHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Known field names.
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    /// Known field names in column order.
    pub fn field_order(&self) -> &[String] {
        &self.field_order
    }

    /// Declares fields without adding any entry, e.g. when restoring a
    /// persisted field order.
    pub fn declare_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            self.register_field(field.into());
        }
    }

    /// Appends `entry` and records its fields.
    pub fn append(&mut self, entry: MetaEntry) {
        self.register_entry_fields(&entry);
        self.entries.push(entry);
    }

    /// Appends every entry, keeping the field set equal to the union of the
    /// previously known fields and the fields of all entries.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = MetaEntry>) {
        for entry in entries {
            self.append(entry);
        }
    }

    /// Sets `name = default` on every existing entry and declares `name`.
    ///
    /// # Errors
    /// Returns [`ShowersetError::EmptyMetadataValue`] if `default` is empty;
    /// the holder is left untouched.
    pub fn add_metafield(
        &mut self,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Result<(), ShowersetError> {
        let name = name.into();
        let default = default.into();
        if default.is_empty() {
            return Err(ShowersetError::EmptyMetadataValue { field: name });
        }
        for entry in &mut self.entries {
            entry.insert(name.clone(), default.clone());
        }
        self.register_field(name);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&MetaEntry> {
        self.entries.get(index)
    }

    /// Mutable access to a single entry.
    ///
    /// New keys inserted this way are not tracked until
    /// [`refresh_fields`](Self::refresh_fields) is called.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut MetaEntry> {
        self.entries.get_mut(index)
    }

    /// Re-scans all entries and declares any field not yet known.
    pub fn refresh_fields(&mut self) {
        let missing: Vec<String> = self
            .entries
            .iter()
            .flat_map(|entry| entry.keys())
            .filter(|key| !self.fields.contains(*key))
            .cloned()
            .collect();
        self.declare_fields(missing);
    }

    /// Entries in `range`.
    ///
    /// # Errors
    /// Returns [`ShowersetError::IndexOutOfRange`] if `range` exceeds the holder.
    pub fn slice(&self, range: Range<usize>) -> Result<&[MetaEntry], ShowersetError> {
        self.entries
            .get(range.clone())
            .ok_or(ShowersetError::IndexOutOfRange {
                start: range.start,
                end: range.end,
                len: self.entries.len(),
            })
    }

    pub fn entries(&self) -> &[MetaEntry] {
        &self.entries
    }

    /// Permutes the entries in place.
    pub fn shuffle<S: Shuffler>(&mut self, shuffler: &mut S) {
        shuffler.shuffle(&mut self.entries);
    }

    /// Removes `range` and returns a holder with its entries and the same
    /// declared fields; this holder keeps the remaining entries in order.
    pub(crate) fn split_off_range(&mut self, range: Range<usize>) -> MetadataHolder {
        let entries: Vec<MetaEntry> = self.entries.drain(range).collect();
        MetadataHolder {
            entries,
            fields: self.fields.clone(),
            field_order: self.field_order.clone(),
        }
    }

    /// Number of entries that carry `field`.
    pub fn count_present(&self, field: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.contains_key(field))
            .count()
    }

    fn register_entry_fields(&mut self, entry: &MetaEntry) {
        for key in entry.keys() {
            if !self.fields.contains(key) {
                self.register_field(key.clone());
            }
        }
    }

    fn register_field(&mut self, name: String) {
        if self.fields.insert(name.clone()) {
            self.field_order.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RandomShuffler;

    fn entry(pairs: &[(&str, &str)]) -> MetaEntry {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn append_tracks_union_of_keys() {
        let mut holder = MetadataHolder::new();
        holder.append(entry(&[("srcfile", "a.npy"), ("packet_id", "0")]));
        holder.append(entry(&[("srcfile", "b.npy"), ("theta", "0.3")]));

        let fields: Vec<&str> = holder.fields().iter().map(String::as_str).collect();
        assert_eq!(fields, vec!["packet_id", "srcfile", "theta"]);
        assert_eq!(holder.field_order(), &["packet_id", "srcfile", "theta"]);
        assert_eq!(holder.len(), 2);
    }

    #[test]
    fn add_metafield_sets_default_everywhere() {
        let mut holder = MetadataHolder::new();
        holder.extend([entry(&[("id", "0")]), entry(&[("id", "1")])]);
        holder.add_metafield("source", "simu").unwrap();

        assert!(holder
            .entries()
            .iter()
            .all(|e| e.get("source").map(String::as_str) == Some("simu")));
        assert!(holder.fields().contains("source"));
    }

    #[test]
    fn add_metafield_rejects_empty_default() {
        let mut holder = MetadataHolder::new();
        holder.append(entry(&[("id", "0")]));

        assert!(matches!(
            holder.add_metafield("note", ""),
            Err(ShowersetError::EmptyMetadataValue { ref field }) if field == "note"
        ));
        assert!(!holder.fields().contains("note"));
        assert!(!holder.entries()[0].contains_key("note"));
    }

    #[test]
    fn column_order_follows_key_order_within_an_entry() {
        let mut holder = MetadataHolder::new();
        holder.append(entry(&[("srcfile", "a.npy"), ("packet_id", "0")]));
        holder.append(entry(&[("theta", "0.1"), ("alpha", "2")]));

        assert_eq!(
            holder.field_order(),
            &["packet_id", "srcfile", "alpha", "theta"]
        );
    }

    #[test]
    fn declared_fields_survive_without_entries() {
        let mut holder = MetadataHolder::new();
        holder.declare_fields(["b", "a", "b"]);
        assert_eq!(holder.field_order(), &["b", "a"]);
        assert!(holder.is_empty());
    }

    #[test]
    fn refresh_picks_up_mutated_keys() {
        let mut holder = MetadataHolder::new();
        holder.append(entry(&[("id", "0")]));
        holder
            .get_mut(0)
            .expect("entry exists")
            .insert("note".into(), "x".into());
        assert!(!holder.fields().contains("note"));

        holder.refresh_fields();
        assert!(holder.fields().contains("note"));
    }

    #[test]
    fn slice_out_of_range_fails() {
        let holder = MetadataHolder::new();
        assert!(holder.slice(0..0).unwrap().is_empty());
        assert!(holder.slice(0..1).is_err());
    }

    #[test]
    fn shuffle_keeps_every_entry() {
        let mut holder = MetadataHolder::new();
        holder.extend((0..10).map(|i| entry(&[("id", i.to_string().as_str())])));
        let mut shuffler = RandomShuffler::seeded(9);
        holder.shuffle(&mut shuffler);

        let mut ids: Vec<usize> = holder
            .entries()
            .iter()
            .map(|e| e["id"].parse().unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }
}
