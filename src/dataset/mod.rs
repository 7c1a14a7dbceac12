//! The in-memory dataset and its index-aligned collections.
//!
//! - [`Dataset`]: per-view item arrays plus targets and metadata
//! - [`TargetsHolder`] / [`ClassTarget`]: classification targets
//! - [`MetadataHolder`] / [`MetaEntry`]: per-item attribute maps
//! - [`Shuffler`] / [`RandomShuffler`]: restorable permutations used to
//!   shuffle all collections identically

mod metadata;
mod model;
mod shuffle;
mod targets;

pub(crate) use metadata::empty_value_field;
pub use metadata::{MetaEntry, MetadataHolder};
pub use model::Dataset;
pub use shuffle::{RandomShuffler, Shuffler};
pub use targets::{ClassTarget, TargetsHolder};

