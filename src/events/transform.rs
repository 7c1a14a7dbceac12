//! Event transformers: cut frame windows out of an event's packets.

use std::str::FromStr;

use ndarray::{s, Array3, Axis};

use super::{EventRecord, GTU_IN_PACKET_KEY, PACKET_ID_KEY};
use crate::error::ShowersetError;
use crate::packet::Element;

/// Frames `start_gtu..end_gtu` of packet `packet_id`.
#[derive(Clone, Debug, PartialEq)]
pub struct PacketWindow<T> {
    pub data: Array3<T>,
    pub packet_id: usize,
    pub start_gtu: usize,
    pub end_gtu: usize,
}

impl<T> PacketWindow<T> {
    pub fn num_frames(&self) -> usize {
        self.end_gtu - self.start_gtu
    }
}

/// Produces the windows one event contributes to a dataset.
pub trait EventTransformer {
    /// `packets` are all packets of the event's source file.
    fn windows<T: Element>(
        &self,
        event: &EventRecord,
        packets: &[Array3<T>],
    ) -> Result<Vec<PacketWindow<T>>, ShowersetError>;
}

/// One fixed frame range of one fixed packet per event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultTransformer {
    packet_id: usize,
    start_gtu: usize,
    stop_gtu: usize,
}

impl DefaultTransformer {
    /// # Errors
    /// Returns [`ShowersetError::InvalidGeometry`] if the range is empty.
    pub fn new(packet_id: usize, start_gtu: usize, stop_gtu: usize) -> Result<Self, ShowersetError> {
        check_range(start_gtu, stop_gtu)?;
        Ok(Self {
            packet_id,
            start_gtu,
            stop_gtu,
        })
    }
}

impl EventTransformer for DefaultTransformer {
    fn windows<T: Element>(
        &self,
        _event: &EventRecord,
        packets: &[Array3<T>],
    ) -> Result<Vec<PacketWindow<T>>, ShowersetError> {
        let window = cut(packets, self.packet_id, self.start_gtu as i64, self.stop_gtu as i64)?;
        Ok(vec![window])
    }
}

/// The same frame range of every packet of the source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllPacketsTransformer {
    start_gtu: usize,
    stop_gtu: usize,
}

impl AllPacketsTransformer {
    pub fn new(start_gtu: usize, stop_gtu: usize) -> Result<Self, ShowersetError> {
        check_range(start_gtu, stop_gtu)?;
        Ok(Self {
            start_gtu,
            stop_gtu,
        })
    }
}

impl EventTransformer for AllPacketsTransformer {
    fn windows<T: Element>(
        &self,
        _event: &EventRecord,
        packets: &[Array3<T>],
    ) -> Result<Vec<PacketWindow<T>>, ShowersetError> {
        (0..packets.len())
            .map(|id| cut(packets, id, self.start_gtu as i64, self.stop_gtu as i64))
            .collect()
    }
}

/// A window around the event's own frame.
///
/// Reads `packet_id` and `gtu_in_packet` from the event and takes frames
/// `gtu - num_gtu_before ..= gtu + num_gtu_after`. A window overrunning the
/// packet is slid back inside when `adjust_if_out_of_bounds` is set; a window
/// wider than the packet is always an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GtuInPacketTransformer {
    pub num_gtu_before: usize,
    pub num_gtu_after: usize,
    pub adjust_if_out_of_bounds: bool,
}

impl Default for GtuInPacketTransformer {
    fn default() -> Self {
        Self {
            num_gtu_before: 4,
            num_gtu_after: 15,
            adjust_if_out_of_bounds: true,
        }
    }
}

impl GtuInPacketTransformer {
    pub fn window_len(&self) -> usize {
        self.num_gtu_before + self.num_gtu_after + 1
    }

    /// Window bounds for an event at frame `gtu` of a packet with
    /// `num_frames` frames.
    ///
    /// # Errors
    /// Returns [`ShowersetError::WindowOutOfBounds`] with the unadjusted
    /// bounds if the window does not fit and cannot be slid into place.
    pub fn window_bounds(&self, gtu: usize, num_frames: usize) -> Result<(usize, usize), ShowersetError> {
        let start = gtu as i64 - self.num_gtu_before as i64;
        let stop = gtu as i64 + self.num_gtu_after as i64 + 1;
        let frames = num_frames as i64;

        if start >= 0 && stop <= frames {
            return Ok((start as usize, stop as usize));
        }
        if !self.adjust_if_out_of_bounds || stop - start > frames {
            return Err(ShowersetError::WindowOutOfBounds {
                start,
                stop,
                num_frames,
            });
        }

        let shift = if start < 0 { -start } else { frames - stop };
        Ok(((start + shift) as usize, (stop + shift) as usize))
    }
}

impl EventTransformer for GtuInPacketTransformer {
    fn windows<T: Element>(
        &self,
        event: &EventRecord,
        packets: &[Array3<T>],
    ) -> Result<Vec<PacketWindow<T>>, ShowersetError> {
        let packet_id: usize = parse_index(event, PACKET_ID_KEY)?;
        let gtu: usize = parse_index(event, GTU_IN_PACKET_KEY)?;
        let packet = packet_at(packets, packet_id)?;

        let num_frames = packet.len_of(Axis(0));
        if gtu >= num_frames {
            return Err(ShowersetError::InvalidEvent {
                message: format!(
                    "{} = {} is outside a packet of {} frame(s)",
                    GTU_IN_PACKET_KEY, gtu, num_frames
                ),
            });
        }

        let (start, stop) = self.window_bounds(gtu, num_frames)?;
        Ok(vec![cut(packets, packet_id, start as i64, stop as i64)?])
    }
}

/// Runtime choice between the transformers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transformer {
    Default(DefaultTransformer),
    AllPackets(AllPacketsTransformer),
    GtuInPacket(GtuInPacketTransformer),
}

impl EventTransformer for Transformer {
    fn windows<T: Element>(
        &self,
        event: &EventRecord,
        packets: &[Array3<T>],
    ) -> Result<Vec<PacketWindow<T>>, ShowersetError> {
        match self {
            Transformer::Default(t) => t.windows(event, packets),
            Transformer::AllPackets(t) => t.windows(event, packets),
            Transformer::GtuInPacket(t) => t.windows(event, packets),
        }
    }
}

fn check_range(start_gtu: usize, stop_gtu: usize) -> Result<(), ShowersetError> {
    if start_gtu < stop_gtu {
        Ok(())
    } else {
        Err(ShowersetError::InvalidGeometry {
            message: format!("empty frame range {}..{}", start_gtu, stop_gtu),
        })
    }
}

fn packet_at<T>(packets: &[Array3<T>], packet_id: usize) -> Result<&Array3<T>, ShowersetError> {
    packets.get(packet_id).ok_or_else(|| ShowersetError::InvalidEvent {
        message: format!(
            "packet {} requested but the source has {} packet(s)",
            packet_id,
            packets.len()
        ),
    })
}

fn cut<T: Element>(
    packets: &[Array3<T>],
    packet_id: usize,
    start: i64,
    stop: i64,
) -> Result<PacketWindow<T>, ShowersetError> {
    let packet = packet_at(packets, packet_id)?;
    let num_frames = packet.len_of(Axis(0));
    if start < 0 || stop > num_frames as i64 || start >= stop {
        return Err(ShowersetError::WindowOutOfBounds {
            start,
            stop,
            num_frames,
        });
    }

    let (start, stop) = (start as usize, stop as usize);
    Ok(PacketWindow {
        data: packet.slice(s![start..stop, .., ..]).to_owned(),
        packet_id,
        start_gtu: start,
        end_gtu: stop,
    })
}

/// Parses a non-negative integer event field. Integral floats such as `"2.0"`
/// are accepted.
pub(crate) fn parse_index(event: &EventRecord, key: &str) -> Result<usize, ShowersetError> {
    let raw = required_field(event, key)?;
    let raw = raw.trim();
    if let Ok(value) = usize::from_str(raw) {
        return Ok(value);
    }
    match f64::from_str(raw) {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 => Ok(value as usize),
        _ => Err(ShowersetError::InvalidEvent {
            message: format!("{} = '{}' is not a non-negative integer", key, raw),
        }),
    }
}

pub(crate) fn required_field<'a>(event: &'a EventRecord, key: &str) -> Result<&'a str, ShowersetError> {
    event
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| ShowersetError::InvalidEvent {
            message: format!("missing field '{}'", key),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn packets(count: usize, frames: usize) -> Vec<Array3<u8>> {
        (0..count)
            .map(|p| Array::from_shape_fn((frames, 1, 1), |(f, _, _)| (p * 100 + f) as u8))
            .collect()
    }

    fn event(pairs: &[(&str, &str)]) -> EventRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_cuts_fixed_range() {
        let t = DefaultTransformer::new(1, 2, 5).unwrap();
        let windows = t.windows(&event(&[]), &packets(2, 10)).unwrap();

        assert_eq!(windows.len(), 1);
        let w = &windows[0];
        assert_eq!((w.packet_id, w.start_gtu, w.end_gtu), (1, 2, 5));
        assert_eq!(w.data[[0, 0, 0]], 102);
        assert_eq!(w.num_frames(), 3);
    }

    #[test]
    fn default_rejects_range_beyond_packet() {
        let t = DefaultTransformer::new(0, 5, 12).unwrap();
        assert!(matches!(
            t.windows(&event(&[]), &packets(1, 10)),
            Err(ShowersetError::WindowOutOfBounds { start: 5, stop: 12, num_frames: 10 })
        ));
        assert!(DefaultTransformer::new(0, 3, 3).is_err());
    }

    #[test]
    fn missing_packet() {
        let t = DefaultTransformer::new(3, 0, 2).unwrap();
        assert!(matches!(
            t.windows(&event(&[]), &packets(2, 10)),
            Err(ShowersetError::InvalidEvent { .. })
        ));
    }

    #[test]
    fn all_packets_one_window_each() {
        let t = AllPacketsTransformer::new(0, 4).unwrap();
        let windows = t.windows(&event(&[]), &packets(3, 4)).unwrap();
        let ids: Vec<usize> = windows.iter().map(|w| w.packet_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(windows[2].data[[3, 0, 0]], 203);
    }

    #[test]
    fn gtu_window_slides_right_at_left_edge() {
        let t = GtuInPacketTransformer::default();
        let windows = t
            .windows(
                &event(&[("packet_id", "0"), ("gtu_in_packet", "2")]),
                &packets(1, 20),
            )
            .unwrap();

        let w = &windows[0];
        assert_eq!((w.start_gtu, w.end_gtu), (0, 20));
        assert_eq!(w.end_gtu - w.start_gtu, 4 + 15 + 1);
    }

    #[test]
    fn gtu_window_slides_left_at_right_edge() {
        let t = GtuInPacketTransformer::default();
        assert_eq!(t.window_bounds(28, 30).unwrap(), (10, 30));
    }

    #[test]
    fn gtu_window_at_exact_bounds_is_unchanged() {
        let t = GtuInPacketTransformer::default();
        assert_eq!(t.window_bounds(4, 40).unwrap(), (0, 20));
        assert_eq!(t.window_bounds(24, 40).unwrap(), (20, 40));
    }

    #[test]
    fn gtu_window_without_adjust_fails() {
        let t = GtuInPacketTransformer {
            adjust_if_out_of_bounds: false,
            ..Default::default()
        };
        assert!(matches!(
            t.window_bounds(2, 20),
            Err(ShowersetError::WindowOutOfBounds { start: -2, stop: 18, num_frames: 20 })
        ));
    }

    #[test]
    fn gtu_window_wider_than_packet_fails_even_with_adjust() {
        let t = GtuInPacketTransformer::default();
        assert!(matches!(
            t.window_bounds(5, 10),
            Err(ShowersetError::WindowOutOfBounds { .. })
        ));
    }

    #[test]
    fn gtu_fields_are_parsed() {
        let t = GtuInPacketTransformer::default();
        let ok = event(&[("packet_id", "0.0"), ("gtu_in_packet", " 10 ")]);
        assert_eq!(t.windows(&ok, &packets(1, 30)).unwrap()[0].start_gtu, 6);

        let missing = event(&[("packet_id", "0")]);
        assert!(matches!(
            t.windows(&missing, &packets(1, 30)),
            Err(ShowersetError::InvalidEvent { .. })
        ));

        let negative = event(&[("packet_id", "0"), ("gtu_in_packet", "-1")]);
        assert!(t.windows(&negative, &packets(1, 30)).is_err());

        let outside = event(&[("packet_id", "0"), ("gtu_in_packet", "30")]);
        assert!(t.windows(&outside, &packets(1, 30)).is_err());
    }
}
