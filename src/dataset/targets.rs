//! Classification targets and the holder that keeps them index-aligned.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::Serialize;

use super::shuffle::Shuffler;
use crate::error::ShowersetError;

/// Expected classification of an item.
///
/// Stored on disk as a length-2 one-hot vector over `(shower, noise)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassTarget {
    /// `[1, 0]`
    Shower,
    /// `[0, 1]`
    Noise,
}

impl ClassTarget {
    pub const ALL: [ClassTarget; 2] = [ClassTarget::Shower, ClassTarget::Noise];

    /// The one-hot vector for this target.
    pub const fn vector(&self) -> [u8; 2] {
        match self {
            ClassTarget::Shower => [1, 0],
            ClassTarget::Noise => [0, 1],
        }
    }

    /// Maps a stored vector back to a target.
    ///
    /// # Errors
    /// Returns [`ShowersetError::UnknownTarget`] for anything other than the
    /// two canonical vectors.
    pub fn from_vector(vector: &[i64]) -> Result<Self, ShowersetError> {
        match vector {
            [1, 0] => Ok(ClassTarget::Shower),
            [0, 1] => Ok(ClassTarget::Noise),
            other => Err(ShowersetError::UnknownTarget(other.to_vec())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClassTarget::Shower => "shower",
            ClassTarget::Noise => "noise",
        }
    }
}

impl fmt::Display for ClassTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassTarget {
    type Err = ShowersetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "shower" => Ok(ClassTarget::Shower),
            "noise" => Ok(ClassTarget::Noise),
            other => Err(ShowersetError::InvalidEvent {
                message: format!("unknown target '{}' (expected shower or noise)", other),
            }),
        }
    }
}

/// Index-addressable list of classification targets.
///
/// Reads hand out borrowed slices unless `copy_on_read` is set, in which
/// case every read returns an owned copy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetsHolder {
    classification: Vec<ClassTarget>,
    copy_on_read: bool,
}

impl TargetsHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_targets(targets: Vec<ClassTarget>) -> Self {
        Self {
            classification: targets,
            copy_on_read: false,
        }
    }

    pub fn copy_on_read(&self) -> bool {
        self.copy_on_read
    }

    pub fn set_copy_on_read(&mut self, copy_on_read: bool) {
        self.copy_on_read = copy_on_read;
    }

    pub fn len(&self) -> usize {
        self.classification.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classification.is_empty()
    }

    pub fn append(&mut self, target: ClassTarget) {
        self.classification.push(target);
    }

    pub fn extend(&mut self, targets: impl IntoIterator<Item = ClassTarget>) {
        self.classification.extend(targets);
    }

    /// Targets in `range`, borrowed or copied depending on `copy_on_read`.
    ///
    /// # Errors
    /// Returns [`ShowersetError::IndexOutOfRange`] if `range` exceeds the holder.
    pub fn get(&self, range: Range<usize>) -> Result<Cow<'_, [ClassTarget]>, ShowersetError> {
        let slice = self
            .classification
            .get(range.clone())
            .ok_or(ShowersetError::IndexOutOfRange {
                start: range.start,
                end: range.end,
                len: self.classification.len(),
            })?;

        if self.copy_on_read {
            Ok(Cow::Owned(slice.to_vec()))
        } else {
            Ok(Cow::Borrowed(slice))
        }
    }

    pub fn as_slice(&self) -> &[ClassTarget] {
        &self.classification
    }

    /// Shuffles the targets and restores the shuffler state afterwards, so
    /// the next collection shuffled with the same shuffler gets the same
    /// permutation.
    pub fn shuffle<S: Shuffler>(&mut self, shuffler: &mut S) {
        shuffler.shuffle(&mut self.classification);
        shuffler.reset_state();
    }

    /// Removes `range` and returns its targets; the holder keeps the rest in order.
    pub(crate) fn split_off_range(&mut self, range: Range<usize>) -> Vec<ClassTarget> {
        self.classification.drain(range).collect()
    }

    /// Number of targets per class, in [`ClassTarget::ALL`] order.
    pub fn class_counts(&self) -> [(ClassTarget, usize); 2] {
        ClassTarget::ALL.map(|class| {
            let count = self.classification.iter().filter(|&&t| t == class).count();
            (class, count)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RandomShuffler;

    #[test]
    fn vectors_roundtrip() {
        for target in ClassTarget::ALL {
            let v = target.vector().map(i64::from);
            assert_eq!(ClassTarget::from_vector(&v).unwrap(), target);
        }
        assert!(matches!(
            ClassTarget::from_vector(&[1, 1]),
            Err(ShowersetError::UnknownTarget(v)) if v == vec![1, 1]
        ));
    }

    #[test]
    fn get_borrows_by_default() {
        let mut holder = TargetsHolder::new();
        holder.extend([ClassTarget::Shower, ClassTarget::Noise, ClassTarget::Noise]);

        let slice = holder.get(1..3).unwrap();
        assert!(matches!(slice, Cow::Borrowed(_)));
        assert_eq!(&*slice, &[ClassTarget::Noise, ClassTarget::Noise]);
    }

    #[test]
    fn get_copies_when_requested() {
        let mut holder = TargetsHolder::from_targets(vec![ClassTarget::Shower]);
        holder.set_copy_on_read(true);
        assert!(matches!(holder.get(0..1).unwrap(), Cow::Owned(_)));
    }

    #[test]
    fn get_out_of_range_fails() {
        let holder = TargetsHolder::from_targets(vec![ClassTarget::Shower]);
        assert!(matches!(
            holder.get(0..2),
            Err(ShowersetError::IndexOutOfRange { len: 1, .. })
        ));
    }

    #[test]
    fn shuffle_resets_the_shuffler() {
        let mut holder =
            TargetsHolder::from_targets((0..40).map(|i| ClassTarget::ALL[i % 2]).collect());
        let mut indices: Vec<usize> = (0..40).collect();

        let mut shuffler = RandomShuffler::seeded(5);
        shuffler.keep_state();
        holder.shuffle(&mut shuffler);
        shuffler.shuffle(&mut indices);

        for (target, index) in holder.as_slice().iter().zip(&indices) {
            assert_eq!(*target, ClassTarget::ALL[index % 2]);
        }
    }

    #[test]
    fn class_counts_tally_each_class() {
        let holder = TargetsHolder::from_targets(vec![
            ClassTarget::Noise,
            ClassTarget::Shower,
            ClassTarget::Noise,
        ]);
        assert_eq!(
            holder.class_counts(),
            [(ClassTarget::Shower, 1), (ClassTarget::Noise, 2)]
        );
    }
}
