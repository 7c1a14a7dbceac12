//! The lazy event pipeline: events, packets, windows, metadata and targets.

use std::collections::VecDeque;
use std::path::PathBuf;

use ndarray::Array3;

use super::extract::PacketExtractor;
use super::transform::{required_field, EventTransformer, PacketWindow};
use super::{EventRecord, END_GTU_KEY, PACKET_ID_KEY, SRCFILE_KEY, START_GTU_KEY};
use crate::dataset::{ClassTarget, Dataset, MetaEntry};
use crate::error::ShowersetError;
use crate::packet::Element;

/// Builds the metadata of each window from its event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataComposer {
    event_fields: Option<Vec<String>>,
}

impl MetadataComposer {
    /// Copies every event field.
    pub fn all_fields() -> Self {
        Self::default()
    }

    /// Copies only the listed event fields (when present).
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            event_fields: Some(fields.into_iter().map(Into::into).collect()),
        }
    }

    /// Event fields plus `packet_id`, `start_gtu` and `end_gtu` of the window.
    pub fn compose<T>(&self, event: &EventRecord, window: &PacketWindow<T>) -> MetaEntry {
        let mut meta: MetaEntry = match &self.event_fields {
            None => event.clone(),
            Some(fields) => fields
                .iter()
                .filter_map(|field| event.get(field).map(|value| (field.clone(), value.clone())))
                .collect(),
        };
        meta.insert(PACKET_ID_KEY.to_string(), window.packet_id.to_string());
        meta.insert(START_GTU_KEY.to_string(), window.start_gtu.to_string());
        meta.insert(END_GTU_KEY.to_string(), window.end_gtu.to_string());
        meta
    }
}

/// How each event's target is chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetAssignment {
    /// The same target for every event.
    Static(ClassTarget),
    /// A 0/1 event column: 1 is shower, 0 is noise.
    BinaryFromColumn(String),
}

impl TargetAssignment {
    pub fn assign(&self, event: &EventRecord) -> Result<ClassTarget, ShowersetError> {
        match self {
            TargetAssignment::Static(target) => Ok(*target),
            TargetAssignment::BinaryFromColumn(column) => {
                let raw = required_field(event, column)?;
                match raw.trim() {
                    "1" | "1.0" | "true" | "True" => Ok(ClassTarget::Shower),
                    "0" | "0.0" | "false" | "False" => Ok(ClassTarget::Noise),
                    other => Err(ShowersetError::InvalidEvent {
                        message: format!("{} = '{}' is not a 0/1 value", column, other),
                    }),
                }
            }
        }
    }
}

/// One dataset item produced by the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineItem<T> {
    pub packet: Array3<T>,
    pub target: ClassTarget,
    pub meta: MetaEntry,
}

/// Pulls events on demand and yields dataset items.
///
/// Each event names its source file in `srcfile`; the packets of the most
/// recent source file are kept, so consecutive events of one file extract it
/// once. An error is yielded in place of the failing event's items and
/// iteration may continue with the next event.
pub struct EventPipeline<T, I, X, R> {
    events: I,
    extractor: X,
    transformer: R,
    composer: MetadataComposer,
    targets: TargetAssignment,
    cache: Option<(PathBuf, Vec<Array3<T>>)>,
    pending: VecDeque<PipelineItem<T>>,
}

impl<T, I, X, R> EventPipeline<T, I, X, R>
where
    T: Element,
    I: Iterator<Item = EventRecord>,
    X: PacketExtractor<T>,
    R: EventTransformer,
{
    pub fn new<E>(
        events: E,
        extractor: X,
        transformer: R,
        composer: MetadataComposer,
        targets: TargetAssignment,
    ) -> Self
    where
        E: IntoIterator<IntoIter = I>,
    {
        Self {
            events: events.into_iter(),
            extractor,
            transformer,
            composer,
            targets,
            cache: None,
            pending: VecDeque::new(),
        }
    }

    fn process(&mut self, event: EventRecord) -> Result<(), ShowersetError> {
        let srcfile = PathBuf::from(required_field(&event, SRCFILE_KEY)?);
        let target = self.targets.assign(&event)?;

        let cached = matches!(&self.cache, Some((path, _)) if *path == srcfile);
        if !cached {
            self.cache = None;
            let packets = self.extractor.extract(&srcfile)?;
            self.cache = Some((srcfile, packets));
        }
        let packets = self
            .cache
            .as_ref()
            .map(|(_, packets)| packets.as_slice())
            .unwrap_or_default();

        let windows = self.transformer.windows(&event, packets)?;
        for window in windows {
            let meta = self.composer.compose(&event, &window);
            self.pending.push_back(PipelineItem {
                packet: window.data,
                target,
                meta,
            });
        }
        Ok(())
    }
}

impl<T, I, X, R> Iterator for EventPipeline<T, I, X, R>
where
    T: Element,
    I: Iterator<Item = EventRecord>,
    X: PacketExtractor<T>,
    R: EventTransformer,
{
    type Item = Result<PipelineItem<T>, ShowersetError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(Ok(item));
            }
            let event = self.events.next()?;
            if let Err(e) = self.process(event) {
                return Some(Err(e));
            }
        }
    }
}

impl<T: Element> Dataset<T> {
    /// Adds every item of `items` in order and returns how many were added.
    ///
    /// Stops at the first error; items added before it stay in the dataset.
    pub fn extend_from_pipeline<I>(&mut self, items: I) -> Result<usize, ShowersetError>
    where
        I: IntoIterator<Item = Result<PipelineItem<T>, ShowersetError>>,
    {
        let mut added = 0;
        for item in items {
            let item = item?;
            self.add_packet(item.packet.view(), item.target, item.meta)?;
            added += 1;
        }
        log::info!("Added {} item(s) to '{}'", added, self.name());
        Ok(added)
    }
}
