#![allow(dead_code)]

use std::fs;
use std::path::Path;

use ndarray::Array3;
use showerset::{ClassTarget, Dataset, MetaEntry, PacketTemplate, SelectedViews, ViewKind};

pub fn meta(pairs: &[(&str, &str)]) -> MetaEntry {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Packet of `shape` whose cell `(f, y, x)` holds `base + f*h*w + y*w + x`
/// (wrapping).
pub fn ramp_packet(shape: [usize; 3], base: u8) -> Array3<u8> {
    let [_, h, w] = shape;
    Array3::from_shape_fn((shape[0], shape[1], shape[2]), |(f, y, x)| {
        base.wrapping_add((f * h * w + y * w + x) as u8)
    })
}

/// Dataset of `num_items` ramp packets of shape `(5, 2, 2)` with
/// alternating targets and `srcfile`/`packet_id` metadata.
pub fn sample_dataset(name: &str, views: &[ViewKind], num_items: usize) -> Dataset<u8> {
    let template = PacketTemplate::single_cell(5, 2, 2).expect("template");
    let views = SelectedViews::new(views.iter().copied()).expect("views");
    let mut dataset = Dataset::new(name, template, views);

    for i in 0..num_items {
        let target = if i % 2 == 0 {
            ClassTarget::Shower
        } else {
            ClassTarget::Noise
        };
        let id = i.to_string();
        dataset
            .add_packet(
                ramp_packet([5, 2, 2], (i * 20) as u8).view(),
                target,
                meta(&[("srcfile", "run_0001.npy"), ("packet_id", &id)]),
            )
            .expect("add packet");
    }
    dataset
}

/// Writes a `(frames, h, w)` frame stream as `.npy`.
pub fn write_stream(path: &Path, frames: &Array3<u8>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    ndarray_npy::write_npy(path, frames).expect("write npy stream");
}
