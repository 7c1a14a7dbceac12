//! Integration tests for merging, splitting and shuffling datasets.

use ndarray::Array3;
use showerset::{
    ClassTarget, Dataset, PacketTemplate, SelectedViews, Shuffler, ShowersetError, ViewKind,
};

mod common;

/// Applies a fixed permutation: position `i` receives the element at
/// `order[i]`. The state methods are no-ops.
struct FixedShuffler {
    order: Vec<usize>,
}

impl Shuffler for FixedShuffler {
    fn shuffle<T>(&mut self, items: &mut [T]) {
        assert_eq!(items.len(), self.order.len());
        let mut placed = vec![false; items.len()];
        for start in 0..items.len() {
            let mut pos = start;
            while !placed[pos] {
                placed[pos] = true;
                let from = self.order[pos];
                if from == start {
                    break;
                }
                items.swap(pos, from);
                pos = from;
            }
        }
    }

    fn keep_state(&mut self) {}

    fn reset_state(&mut self) {}
}

fn constant_dataset(name: &str, values: &[u8]) -> Dataset<u8> {
    let template = PacketTemplate::single_cell(3, 2, 2).expect("template");
    let views = SelectedViews::new([ViewKind::Yx, ViewKind::Gtux]).expect("views");
    let mut dataset = Dataset::new(name, template, views);
    for &value in values {
        let id = value.to_string();
        dataset
            .add_packet(
                Array3::from_elem((3, 2, 2), value).view(),
                ClassTarget::Noise,
                common::meta(&[("id", &id)]),
            )
            .expect("add packet");
    }
    dataset
}

fn yx_corners(dataset: &Dataset<u8>) -> Vec<u8> {
    let yx = dataset.view_items(ViewKind::Yx).expect("yx selected");
    (0..dataset.num_data()).map(|i| yx[[i, 0, 0]]).collect()
}

#[test]
fn fixed_shuffler_applies_its_permutation() {
    let mut items = vec!['a', 'b', 'c', 'd'];
    FixedShuffler {
        order: vec![2, 0, 3, 1],
    }
    .shuffle(&mut items);
    assert_eq!(items, vec!['c', 'a', 'd', 'b']);
}

#[test]
fn shuffle_keeps_items_and_metadata_aligned() {
    let mut dataset = constant_dataset("aligned", &[0, 1, 2]);
    let mut shuffler = FixedShuffler {
        order: vec![2, 0, 1],
    };
    dataset.shuffle(1, &mut shuffler);

    assert_eq!(yx_corners(&dataset), vec![2, 0, 1]);
    let gtux = dataset.view_items(ViewKind::Gtux).expect("gtux selected");
    let meta = dataset.get_metadata(..).expect("metadata");
    for i in 0..3 {
        assert_eq!(yx_corners(&dataset)[i].to_string(), meta[i]["id"]);
        assert_eq!(gtux[[i, 0, 0]].to_string(), meta[i]["id"]);
    }
}

#[test]
fn seeded_shuffles_are_reproducible_and_aligned() {
    let mut a = constant_dataset("a", &[0, 1, 2, 3, 4, 5, 6, 7]);
    let mut b = a.clone();
    a.shuffle_seeded(3, 42);
    b.shuffle_seeded(3, 42);
    assert_eq!(a, b);

    let meta = a.get_metadata(..).expect("metadata");
    for (i, value) in yx_corners(&a).into_iter().enumerate() {
        assert_eq!(value.to_string(), meta[i]["id"]);
    }
}

#[test]
fn merge_appends_in_order() {
    let mut a = constant_dataset("a", &[10, 20]);
    let b = constant_dataset("b", &[30, 40]);
    a.merge_with(&b).expect("merge");

    assert_eq!(yx_corners(&a), vec![10, 20, 30, 40]);
    assert_eq!(a.num_data(), 4);
    assert_eq!(a.get_metadata(3..).expect("metadata")[0]["id"], "40");
    assert_eq!(b.num_data(), 2);
}

#[test]
fn merge_requires_compatible_datasets() {
    let mut a = constant_dataset("a", &[1]);
    let template = PacketTemplate::single_cell(3, 2, 2).expect("template");
    let only_yx = Dataset::<u8>::new("b", template, SelectedViews::new([ViewKind::Yx]).expect("views"));

    assert!(!a.is_compatible_with(&only_yx));
    let before = a.clone();
    let err = a.merge_with(&only_yx).unwrap_err();
    assert!(matches!(err, ShowersetError::Incompatible { .. }));
    assert_eq!(a, before);
}

#[test]
fn split_moves_a_range_out() {
    let mut dataset = constant_dataset("full", &[0, 1, 2, 3, 4]);
    let part = dataset.split(1..3, "part").expect("split");

    assert_eq!(part.name(), "part");
    assert_eq!(yx_corners(&part), vec![1, 2]);
    assert_eq!(yx_corners(&dataset), vec![0, 3, 4]);
    assert_eq!(dataset.get_metadata(..).expect("metadata")[1]["id"], "3");
    assert!(dataset.check_invariants().is_ok());
    assert!(part.check_invariants().is_ok());

    let err = dataset.split(2..9, "too_far").unwrap_err();
    assert!(matches!(err, ShowersetError::IndexOutOfRange { .. }));
}

#[test]
fn split_ratio_takes_the_tail() {
    let mut dataset = constant_dataset("full", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let test = dataset.split_ratio(0.2, "test").expect("split");
    assert_eq!(yx_corners(&test), vec![8, 9]);
    assert_eq!(dataset.num_data(), 8);
}
