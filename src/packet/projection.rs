//! Max-projections of a packet onto its canonical views.
//!
//! Every view except `raw` collapses one packet axis by taking the
//! elementwise maximum along it:
//!
//! | view   | collapsed axis | item shape          |
//! |--------|----------------|---------------------|
//! | `raw`  | none           | `(frames, h, w)`    |
//! | `yx`   | frames         | `(h, w)`            |
//! | `gtux` | height         | `(frames, w)`       |
//! | `gtuy` | width          | `(frames, h)`       |
//!
//! For float items a NaN anywhere in a lane makes that projected cell NaN.

use ndarray::{Array2, ArrayD, ArrayView3, Axis};

use super::element::Element;
use super::view::ViewKind;

/// Shape of a single item of `view` for packets of `packet_shape`.
pub fn item_shape(packet_shape: [usize; 3], view: ViewKind) -> Vec<usize> {
    let [frames, height, width] = packet_shape;
    match view {
        ViewKind::Raw => vec![frames, height, width],
        ViewKind::Yx => vec![height, width],
        ViewKind::Gtux => vec![frames, width],
        ViewKind::Gtuy => vec![frames, height],
    }
}

/// Projects `packet` onto `view`.
///
/// The result always has the shape reported by [`item_shape`] for the
/// packet's shape.
pub fn project<T: Element>(packet: ArrayView3<'_, T>, view: ViewKind) -> ArrayD<T> {
    match view {
        ViewKind::Raw => packet.to_owned().into_dyn(),
        ViewKind::Yx => max_along(packet, 0).into_dyn(),
        ViewKind::Gtux => max_along(packet, 1).into_dyn(),
        ViewKind::Gtuy => max_along(packet, 2).into_dyn(),
    }
}

fn max_along<T: Element>(packet: ArrayView3<'_, T>, axis: usize) -> Array2<T> {
    packet.map_axis(Axis(axis), |lane| {
        lane.iter().copied().reduce(max_propagating).unwrap_or_default()
    })
}

/// Larger of the two; a value unordered with itself (NaN) wins and sticks.
fn max_propagating<T: Element>(acc: T, value: T) -> T {
    let unordered = |x: &T| x.partial_cmp(x).is_none();
    if unordered(&acc) {
        acc
    } else if unordered(&value) || value > acc {
        value
    } else {
        acc
    }
}
