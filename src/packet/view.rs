//! Canonical packet views and view selections.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ShowersetError;

/// One of the four canonical reductions of a packet.
///
/// The declaration order is the canonical order used by ordered accessors
/// and by the on-disk `item_types` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// The packet itself, `(frames, height, width)`.
    Raw,
    /// Maximum over frames, `(height, width)`.
    Yx,
    /// Maximum over rows, `(frames, width)`.
    Gtux,
    /// Maximum over columns, `(frames, height)`.
    Gtuy,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [ViewKind::Raw, ViewKind::Yx, ViewKind::Gtux, ViewKind::Gtuy];

    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::Raw => "raw",
            ViewKind::Yx => "yx",
            ViewKind::Gtux => "gtux",
            ViewKind::Gtuy => "gtuy",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewKind {
    type Err = ShowersetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ViewKind::ALL
            .into_iter()
            .find(|view| view.name() == trimmed)
            .ok_or_else(|| ShowersetError::UnknownView(trimmed.to_string()))
    }
}

/// A non-empty set of selected views.
///
/// Fixed when a dataset is created. Iteration yields views in canonical order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SelectedViews(BTreeSet<ViewKind>);

impl SelectedViews {
    /// Creates a selection from the given views.
    ///
    /// # Errors
    /// Returns [`ShowersetError::EmptySelection`] if `views` is empty.
    pub fn new(views: impl IntoIterator<Item = ViewKind>) -> Result<Self, ShowersetError> {
        let set: BTreeSet<ViewKind> = views.into_iter().collect();
        if set.is_empty() {
            return Err(ShowersetError::EmptySelection);
        }
        Ok(Self(set))
    }

    /// Selection of all four views.
    pub fn all() -> Self {
        Self(ViewKind::ALL.into_iter().collect())
    }

    /// Creates a selection from `(view name, selected)` flags, as found in
    /// the `item_types` config section.
    ///
    /// # Errors
    /// See [`check_selected_views`](crate::validation::check_selected_views).
    pub fn from_flags<'a, I>(flags: I) -> Result<Self, ShowersetError>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let flags: Vec<(&str, bool)> = flags.into_iter().collect();
        crate::validation::check_selected_views(flags.iter().copied())?;

        let mut set = BTreeSet::new();
        for (name, selected) in flags {
            if selected {
                set.insert(name.parse::<ViewKind>()?);
            }
        }
        Self::new(set)
    }

    /// `(view, selected)` for each canonical view, in canonical order.
    pub fn flags(&self) -> [(ViewKind, bool); 4] {
        ViewKind::ALL.map(|view| (view, self.0.contains(&view)))
    }

    pub fn contains(&self, view: ViewKind) -> bool {
        self.0.contains(&view)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for parity with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_subset(&self, other: &SelectedViews) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = ViewKind> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for SelectedViews {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|view| view.name()).collect();
        f.write_str(&names.join(", "))
    }
}

impl<'a> IntoIterator for &'a SelectedViews {
    type Item = ViewKind;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, ViewKind>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names() {
        assert_eq!("gtux".parse::<ViewKind>().unwrap(), ViewKind::Gtux);
        assert!(matches!(
            "xy".parse::<ViewKind>(),
            Err(ShowersetError::UnknownView(name)) if name == "xy"
        ));
    }

    #[test]
    fn iterates_in_canonical_order() {
        let views = SelectedViews::new([ViewKind::Gtuy, ViewKind::Raw, ViewKind::Yx]).unwrap();
        let order: Vec<ViewKind> = views.iter().collect();
        assert_eq!(order, vec![ViewKind::Raw, ViewKind::Yx, ViewKind::Gtuy]);
        assert_eq!(views.to_string(), "raw, yx, gtuy");
    }

    #[test]
    fn empty_selection_is_rejected() {
        assert!(matches!(
            SelectedViews::new(Vec::<ViewKind>::new()),
            Err(ShowersetError::EmptySelection)
        ));
    }

    #[test]
    fn from_flags_keeps_true_entries() {
        let views = SelectedViews::from_flags([("raw", false), ("yx", true), ("gtux", true)])
            .expect("valid flags");
        assert_eq!(
            views.flags(),
            [
                (ViewKind::Raw, false),
                (ViewKind::Yx, true),
                (ViewKind::Gtux, true),
                (ViewKind::Gtuy, false),
            ]
        );
    }

    #[test]
    fn from_flags_rejects_all_false() {
        assert!(matches!(
            SelectedViews::from_flags([("raw", false), ("yx", false)]),
            Err(ShowersetError::EmptySelection)
        ));
    }
}
