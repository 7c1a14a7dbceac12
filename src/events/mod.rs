//! Building datasets from event descriptors.
//!
//! An event is an attribute map naming a source file (`srcfile`) and,
//! depending on the transformer, the packet and frame it occurred at. The
//! [`EventPipeline`] pulls events lazily, extracts the source file's packets
//! with a [`PacketExtractor`], cuts windows with an [`EventTransformer`],
//! composes each window's metadata and assigns its target:
//!
//! ```text
//! events -> extractor -> transformer -> metadata composer -> target -> Dataset
//! ```

mod extract;
mod pipeline;
mod transform;

pub use extract::{NpyPacketExtractor, PacketExtractor};
pub use pipeline::{EventPipeline, MetadataComposer, PipelineItem, TargetAssignment};
pub use transform::{
    AllPacketsTransformer, DefaultTransformer, EventTransformer, GtuInPacketTransformer,
    PacketWindow, Transformer,
};

use std::path::Path;

use crate::dataset::MetaEntry;
use crate::error::ShowersetError;
use crate::io::read_metadata_tsv;

/// Attribute map describing one event.
pub type EventRecord = MetaEntry;

pub const SRCFILE_KEY: &str = "srcfile";
pub const PACKET_ID_KEY: &str = "packet_id";
pub const GTU_IN_PACKET_KEY: &str = "gtu_in_packet";
pub const START_GTU_KEY: &str = "start_gtu";
pub const END_GTU_KEY: &str = "end_gtu";

/// Reads events from a tab-separated file with a header row.
///
/// Empty cells are absent keys. Relative `srcfile` values are resolved
/// against the directory of the events file.
pub fn read_events_tsv(path: &Path) -> Result<Vec<EventRecord>, ShowersetError> {
    let mut events = read_metadata_tsv(path, None)?.rows;
    let base = path.parent().unwrap_or(Path::new(""));

    for event in &mut events {
        if let Some(srcfile) = event.get_mut(SRCFILE_KEY) {
            let src = Path::new(srcfile.as_str());
            if src.is_relative() {
                *srcfile = base.join(src).to_string_lossy().into_owned();
            }
        }
    }
    log::debug!("Read {} event(s) from {}", events.len(), path.display());
    Ok(events)
}
