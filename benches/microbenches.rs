//! Criterion microbenches for showerset hot paths.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - view projections of a single packet
//! - adding packets to a dataset (projection plus append)
//! - shuffling a populated dataset
//! - saving and loading a dataset directory
//! - metadata TSV parsing (from_metadata_tsv_slice)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use ndarray::Array3;
use showerset::io::{from_metadata_tsv_slice, DatasetIo};
use showerset::packet::project;
use showerset::{ClassTarget, Dataset, MetaEntry, PacketTemplate, SelectedViews, ViewKind};

const PACKET_SHAPE: (usize, usize, usize) = (128, 48, 48);

const META_FIXTURE: &str = "srcfile\tpacket_id\tgtu_in_packet\ttheta\tphi
run_0001.npy\t0\t40\t0.51\t1.2
run_0001.npy\t1\t63\t0.12\t
run_0002.npy\t0\t12\t\t2.9
run_0002.npy\t3\t100\t0.88\t0.4
run_0003.npy\t2\t77\t0.33\t3.1
";

fn packet() -> Array3<u16> {
    Array3::from_shape_fn(PACKET_SHAPE, |(f, y, x)| ((f * 31 + y * 7 + x) % 4096) as u16)
}

fn template() -> PacketTemplate {
    PacketTemplate::new(16, 16, PACKET_SHAPE.2, PACKET_SHAPE.1, PACKET_SHAPE.0).unwrap()
}

/// Benchmark each view projection of one packet.
fn bench_projection(c: &mut Criterion) {
    let packet = packet();
    let mut group = c.benchmark_group("projection");
    group.throughput(Throughput::Elements(packet.len() as u64));

    for view in [ViewKind::Raw, ViewKind::Yx, ViewKind::Gtux, ViewKind::Gtuy] {
        group.bench_function(view.name(), |b| {
            b.iter(|| black_box(project(black_box(packet.view()), view)))
        });
    }

    group.finish();
}

/// Benchmark filling a dataset with all four views selected.
fn bench_add_packet(c: &mut Criterion) {
    let packet = packet();
    let mut group = c.benchmark_group("add_packet");
    group.throughput(Throughput::Elements(32));

    group.bench_function("32_packets_all_views", |b| {
        b.iter(|| {
            let mut ds = Dataset::<u16>::new("bench", template(), SelectedViews::all());
            for _ in 0..32 {
                ds.add_packet(packet.view(), ClassTarget::Shower, MetaEntry::new())
                    .unwrap();
            }
            black_box(ds)
        })
    });

    group.finish();
}

/// Benchmark shuffling the item arrays, targets and metadata together.
fn bench_shuffle(c: &mut Criterion) {
    let packet = packet();
    let views = SelectedViews::new([ViewKind::Yx, ViewKind::Gtux, ViewKind::Gtuy]).unwrap();
    let mut ds = Dataset::<u16>::new("bench", template(), views);
    for i in 0..256 {
        let meta = MetaEntry::from([("id".to_string(), i.to_string())]);
        ds.add_packet(packet.view(), ClassTarget::Noise, meta).unwrap();
    }

    let mut group = c.benchmark_group("shuffle");
    group.throughput(Throughput::Elements(ds.num_data() as u64));
    group.bench_function("256_items_3_views", |b| {
        b.iter(|| {
            let mut shuffled = ds.clone();
            shuffled.shuffle_seeded(1, black_box(7));
            black_box(shuffled)
        })
    });

    group.finish();
}

/// Benchmark a full save/load cycle through a temp directory.
fn bench_save_load(c: &mut Criterion) {
    let packet = packet();
    let views = SelectedViews::new([ViewKind::Yx, ViewKind::Gtux]).unwrap();
    let mut ds = Dataset::<u16>::new("bench", template(), views);
    for i in 0..64 {
        let meta = MetaEntry::from([("packet_id".to_string(), i.to_string())]);
        ds.add_packet(packet.view(), ClassTarget::Shower, meta).unwrap();
    }

    let temp = tempfile::tempdir().unwrap();
    let io = DatasetIo::new(Some(temp.path()), Some(temp.path())).unwrap();
    io.save_dataset(&ds, true).unwrap();

    let mut group = c.benchmark_group("dataset_io");
    group.throughput(Throughput::Elements(ds.num_data() as u64));
    group.bench_function("save_64_items", |b| {
        b.iter(|| black_box(io.save_dataset(black_box(&ds), true).unwrap()))
    });
    group.bench_function("load_64_items", |b| {
        b.iter(|| black_box(io.load_dataset::<u16>("bench", None).unwrap()))
    });

    group.finish();
}

/// Benchmark metadata TSV parsing.
fn bench_metadata_parse(c: &mut Criterion) {
    let bytes = META_FIXTURE.as_bytes();
    let mut group = c.benchmark_group("metadata_parse");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("from_metadata_tsv_slice", |b| {
        b.iter(|| {
            let table = from_metadata_tsv_slice(black_box(bytes), None).unwrap();
            black_box(table)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_projection,
    bench_add_packet,
    bench_shuffle,
    bench_save_load,
    bench_metadata_parse,
);
criterion_main!(benches);
