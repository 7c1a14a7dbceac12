#![allow(dead_code)]

use ndarray::Array3;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use showerset::{
    ClassTarget, Dataset, MetaEntry, PacketTemplate, SelectedViews, ShowersetError, ViewKind,
};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_views() -> BoxedStrategy<SelectedViews> {
    prop::collection::btree_set(
        prop_oneof![
            Just(ViewKind::Raw),
            Just(ViewKind::Yx),
            Just(ViewKind::Gtux),
            Just(ViewKind::Gtuy),
        ],
        1..=4,
    )
    .prop_map(|views| SelectedViews::new(views).expect("non-empty selection"))
    .boxed()
}

pub fn arb_template() -> BoxedStrategy<PacketTemplate> {
    (1usize..=6, 1usize..=4, 1usize..=4)
        .prop_map(|(f, h, w)| PacketTemplate::single_cell(f, h, w).expect("positive geometry"))
        .boxed()
}

/// Metadata entries; values may be empty, which datasets refuse.
pub fn arb_meta() -> BoxedStrategy<MetaEntry> {
    prop::collection::btree_map(
        prop_oneof![Just("srcfile"), Just("theta"), Just("phi"), Just("note")]
            .prop_map(str::to_string),
        "[a-z0-9 ._-]{0,8}",
        0..=3,
    )
    .prop_map(|m| m.into_iter().collect())
    .boxed()
}

/// Datasets of up to `max_items` random packets over a random geometry
/// and view selection. Items whose metadata has an empty value are
/// rejected by the dataset and left out.
pub fn arb_dataset(max_items: usize) -> BoxedStrategy<Dataset<u8>> {
    (arb_template(), arb_views())
        .prop_flat_map(move |(template, views)| {
            let [f, h, w] = template.packet_shape();
            let item = (
                prop::collection::vec(any::<u8>(), f * h * w),
                any::<bool>(),
                arb_meta(),
            );
            (
                Just(template),
                Just(views),
                prop::collection::vec(item, 0..=max_items),
            )
        })
        .prop_map(|(template, views, items)| {
            let [f, h, w] = template.packet_shape();
            let mut dataset = Dataset::new("prop", template, views);
            for (cells, shower, meta) in items {
                let packet = Array3::from_shape_vec((f, h, w), cells).expect("packet cells");
                let target = if shower {
                    ClassTarget::Shower
                } else {
                    ClassTarget::Noise
                };
                let has_empty = meta.values().any(String::is_empty);
                match dataset.add_packet(packet.view(), target, meta) {
                    Ok(()) => assert!(!has_empty, "empty metadata value accepted"),
                    Err(ShowersetError::EmptyMetadataValue { .. }) if has_empty => {}
                    Err(e) => panic!("unexpected add_packet error: {}", e),
                }
            }
            dataset
        })
        .boxed()
}
