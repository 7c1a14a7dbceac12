//! Packet extractors: source file to list of `(frames, height, width)` packets.

use std::path::Path;

use ndarray::{Array3, Axis, Ix3};

use crate::error::ShowersetError;
use crate::io::read_array;
use crate::packet::Element;

/// Turns a source file into its packets.
///
/// Any `FnMut(&Path) -> Result<Vec<Array3<T>>, ShowersetError>` is an extractor.
pub trait PacketExtractor<T> {
    fn extract(&mut self, srcfile: &Path) -> Result<Vec<Array3<T>>, ShowersetError>;
}

impl<T, F> PacketExtractor<T> for F
where
    F: FnMut(&Path) -> Result<Vec<Array3<T>>, ShowersetError>,
{
    fn extract(&mut self, srcfile: &Path) -> Result<Vec<Array3<T>>, ShowersetError> {
        self(srcfile)
    }
}

/// Reads a `.npy` frame stream of shape `(total_frames, height, width)` and
/// cuts it into consecutive packets of `num_frames` frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NpyPacketExtractor {
    num_frames: usize,
}

impl NpyPacketExtractor {
    /// # Errors
    /// Returns [`ShowersetError::InvalidGeometry`] if `num_frames` is zero.
    pub fn new(num_frames: usize) -> Result<Self, ShowersetError> {
        if num_frames == 0 {
            return Err(ShowersetError::InvalidGeometry {
                message: "num_frames must be at least 1".into(),
            });
        }
        Ok(Self { num_frames })
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }
}

impl<T: Element> PacketExtractor<T> for NpyPacketExtractor {
    fn extract(&mut self, srcfile: &Path) -> Result<Vec<Array3<T>>, ShowersetError> {
        let stream = read_array::<T>(srcfile)?;
        let shape = stream.shape().to_vec();
        let stream = stream
            .into_dimensionality::<Ix3>()
            .map_err(|_| ShowersetError::PacketStream {
                path: srcfile.to_path_buf(),
                message: format!("expected a (frames, height, width) array, found shape {:?}", shape),
            })?;

        let total = stream.len_of(Axis(0));
        if total % self.num_frames != 0 {
            return Err(ShowersetError::PacketStream {
                path: srcfile.to_path_buf(),
                message: format!(
                    "{} frame(s) is not a multiple of {} frame(s) per packet",
                    total, self.num_frames
                ),
            });
        }

        let packets: Vec<Array3<T>> = stream
            .axis_chunks_iter(Axis(0), self.num_frames)
            .map(|chunk| chunk.to_owned())
            .collect();
        log::debug!("Cut {} into {} packet(s)", srcfile.display(), packets.len());
        Ok(packets)
    }
}
