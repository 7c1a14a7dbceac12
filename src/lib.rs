//! Showerset: multi-view datasets of detector packets for shower/noise
//! classification.
//!
//! A packet is a `(frames, height, width)` block of detector frames. A
//! dataset stores, per item, the packet reduced to a chosen set of views
//! (the raw packet and its max-projections onto the `yx`, `gtux` and `gtuy`
//! planes), a classification target and a metadata map. Datasets are built
//! from event lists, merged, split, shuffled and persisted as a directory of
//! NumPy arrays, an INI config and a TSV metadata table.
//!
//! # Modules
//!
//! - [`packet`]: packet geometry, views, projections and element types
//! - [`dataset`]: the in-memory dataset with aligned targets and metadata
//! - [`io`]: on-disk persistence of datasets
//! - [`events`]: building datasets from event descriptors
//! - [`validation`]: structural dataset validation
//! - [`inspect`]: dataset summaries
//! - [`error`]: Error types for showerset operations

pub mod dataset;
pub mod error;
pub mod events;
pub mod inspect;
pub mod io;
pub mod packet;
pub mod validation;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

pub use dataset::{ClassTarget, Dataset, MetaEntry, RandomShuffler, Shuffler};
pub use error::ShowersetError;
pub use packet::{Dtype, Element, PacketTemplate, SelectedViews, ViewKind};

use events::{
    AllPacketsTransformer, DefaultTransformer, EventPipeline, GtuInPacketTransformer,
    MetadataComposer, NpyPacketExtractor, TargetAssignment, Transformer,
};
use io::DatasetIo;

/// Calls `$func::<T>(args..)` with `T` the element type named by `$dtype`.
macro_rules! with_dtype {
    ($dtype:expr, $func:ident($($arg:expr),* $(,)?)) => {
        match $dtype {
            Dtype::U8 => $func::<u8>($($arg),*),
            Dtype::U16 => $func::<u16>($($arg),*),
            Dtype::I32 => $func::<i32>($($arg),*),
            Dtype::I64 => $func::<i64>($($arg),*),
            Dtype::F32 => $func::<f32>($($arg),*),
            Dtype::F64 => $func::<f64>($($arg),*),
        }
    };
}

/// The showerset CLI application.
#[derive(Parser)]
#[command(name = "showerset")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print a summary of a stored dataset.
    Inspect(InspectArgs),
    /// Validate a stored dataset for errors and warnings.
    Validate(ValidateArgs),
    /// Append the items of one dataset to another.
    Merge(MergeArgs),
    /// Shuffle all items of a dataset.
    Shuffle(ShuffleArgs),
    /// Move a range of items into a new dataset.
    Split(SplitArgs),
    /// Build a dataset from an event list and .npy frame streams.
    Build(BuildArgs),
}

/// A stored dataset: directory plus name.
#[derive(clap::Args)]
struct DatasetRef {
    /// Directory holding the dataset files.
    dir: PathBuf,

    /// Dataset name (file name prefix).
    name: String,
}

/// Where a command writes its result.
#[derive(clap::Args)]
struct OutputTarget {
    /// Directory for the written dataset(s) (default: the input directory).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Replace existing files.
    #[arg(long)]
    overwrite: bool,
}

#[derive(clap::Args)]
struct InspectArgs {
    #[command(flatten)]
    dataset: DatasetRef,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(clap::Args)]
struct ValidateArgs {
    #[command(flatten)]
    dataset: DatasetRef,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(clap::Args)]
struct MergeArgs {
    #[command(flatten)]
    dataset: DatasetRef,

    /// Directory of the dataset to append.
    #[arg(long)]
    other_dir: PathBuf,

    /// Name of the dataset to append.
    #[arg(long)]
    other_name: String,

    /// Name of the merged dataset (default: the first dataset's name).
    #[arg(long)]
    output_name: Option<String>,

    #[command(flatten)]
    target: OutputTarget,
}

#[derive(clap::Args)]
struct ShuffleArgs {
    #[command(flatten)]
    dataset: DatasetRef,

    /// Number of shuffle rounds.
    #[arg(long, default_value_t = 1)]
    times: usize,

    /// Seed for a reproducible shuffle.
    #[arg(long, env = "SHOWERSET_SEED")]
    seed: Option<u64>,

    /// Name of the shuffled dataset (default: the input name).
    #[arg(long)]
    output_name: Option<String>,

    #[command(flatten)]
    target: OutputTarget,
}

#[derive(clap::Args)]
struct SplitArgs {
    #[command(flatten)]
    dataset: DatasetRef,

    /// First item of the range to move out.
    #[arg(long, conflicts_with = "fraction")]
    start: Option<usize>,

    /// End (exclusive) of the range to move out (default: the last item).
    #[arg(long, conflicts_with = "fraction")]
    end: Option<usize>,

    /// Move out the trailing fraction of the items instead of a range.
    #[arg(long)]
    fraction: Option<f64>,

    /// Name of the dataset holding the moved items.
    #[arg(long)]
    part_name: String,

    /// Name of the dataset holding the remaining items (default: the input name).
    #[arg(long)]
    rest_name: Option<String>,

    #[command(flatten)]
    target: OutputTarget,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Tab-separated event list with a `srcfile` column.
    #[arg(long)]
    events: PathBuf,

    /// Directory to write the dataset to.
    #[arg(long)]
    output_dir: PathBuf,

    /// Name of the new dataset.
    #[arg(long)]
    name: String,

    /// Frames per packet in the source streams.
    #[arg(long)]
    num_frames: usize,

    /// Frame height of the source streams.
    #[arg(long)]
    frame_height: usize,

    /// Frame width of the source streams.
    #[arg(long)]
    frame_width: usize,

    /// Elementary cell height (default: the frame height).
    #[arg(long)]
    ec_height: Option<usize>,

    /// Elementary cell width (default: the frame width).
    #[arg(long)]
    ec_width: Option<usize>,

    /// Views to store, comma-separated (raw, yx, gtux, gtuy).
    #[arg(long, value_delimiter = ',', default_value = "yx,gtux,gtuy")]
    views: Vec<String>,

    /// Element dtype of the source streams and the dataset.
    #[arg(long, default_value = "uint8")]
    dtype: String,

    /// Window selection ('gtu-in-packet', 'default' or 'all-packets').
    #[arg(long, default_value = "gtu-in-packet")]
    transformer: String,

    /// Packet index for the 'default' transformer.
    #[arg(long, default_value_t = 0)]
    packet_id: usize,

    /// First frame for the 'default' and 'all-packets' transformers.
    #[arg(long, default_value_t = 0)]
    start_gtu: usize,

    /// End frame (exclusive) for the 'default' and 'all-packets'
    /// transformers (default: the packet length).
    #[arg(long)]
    stop_gtu: Option<usize>,

    /// Frames before the event frame for 'gtu-in-packet'.
    #[arg(long, default_value_t = 4)]
    gtu_before: usize,

    /// Frames after the event frame for 'gtu-in-packet'.
    #[arg(long, default_value_t = 15)]
    gtu_after: usize,

    /// Fail instead of sliding windows that overrun the packet.
    #[arg(long)]
    no_adjust: bool,

    /// Target for every event ('shower' or 'noise').
    #[arg(long, conflicts_with = "target_column")]
    target: Option<String>,

    /// Event column holding 1 (shower) or 0 (noise).
    #[arg(long)]
    target_column: Option<String>,

    /// Event fields to copy into the metadata, comma-separated (default: all).
    #[arg(long, value_delimiter = ',')]
    event_fields: Option<Vec<String>>,

    /// Replace existing files.
    #[arg(long)]
    overwrite: bool,
}

/// Run the showerset CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ShowersetError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Inspect(args)) => run_inspect(args),
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Merge(args)) => run_merge(args),
        Some(Commands::Shuffle(args)) => run_shuffle(args),
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Build(args)) => run_build(args),
        None => {
            println!("showerset {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Multi-view packet datasets for shower/noise classification.");
            println!();
            println!("Run 'showerset --help' for usage information.");
            Ok(())
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Opens `dataset` for reading and `output_dir` (or the input directory)
/// for writing, and returns the stored dtype.
fn open_dataset(
    dataset: &DatasetRef,
    output_dir: Option<&Path>,
) -> Result<(DatasetIo, Dtype), ShowersetError> {
    let io = DatasetIo::new(
        Some(dataset.dir.as_path()),
        Some(output_dir.unwrap_or(dataset.dir.as_path())),
    )?;
    let dtype = io.load_attrs(&dataset.name)?.dtype;
    Ok((io, dtype))
}

fn print_json<S: serde::Serialize>(value: &S) -> Result<(), ShowersetError> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{}", json);
    Ok(())
}

fn check_output_format(output: &str) -> Result<(), ShowersetError> {
    match output {
        "text" | "json" => Ok(()),
        other => Err(ShowersetError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            other
        ))),
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_inspect(args: InspectArgs) -> Result<(), ShowersetError> {
    check_output_format(&args.output)?;
    let (io, dtype) = open_dataset(&args.dataset, None)?;
    with_dtype!(dtype, inspect_typed(&io, &args))
}

fn inspect_typed<T: Element>(io: &DatasetIo, args: &InspectArgs) -> Result<(), ShowersetError> {
    let dataset = io.load_dataset::<T>(&args.dataset.name, None)?;
    let report = inspect::inspect_dataset(&dataset, &inspect::InspectOptions::default());

    match args.output.as_str() {
        "json" => print_json(&report),
        _ => {
            print!("{}", report);
            Ok(())
        }
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), ShowersetError> {
    check_output_format(&args.output)?;
    let (io, dtype) = open_dataset(&args.dataset, None)?;
    with_dtype!(dtype, validate_typed(&io, &args))
}

fn validate_typed<T: Element>(io: &DatasetIo, args: &ValidateArgs) -> Result<(), ShowersetError> {
    let dataset = io.load_dataset::<T>(&args.dataset.name, None)?;
    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_dataset(&dataset, &opts);

    match args.output.as_str() {
        "json" => print_json(&serde_json::json!({
            "error_count": report.error_count(),
            "warning_count": report.warning_count(),
            "issues": report.issues,
        }))?,
        _ => print!("{}", report),
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(ShowersetError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

fn run_merge(args: MergeArgs) -> Result<(), ShowersetError> {
    let (io, dtype) = open_dataset(&args.dataset, args.target.output_dir.as_deref())?;
    with_dtype!(dtype, merge_typed(&io, &args))
}

fn merge_typed<T: Element>(io: &DatasetIo, args: &MergeArgs) -> Result<(), ShowersetError> {
    let mut dataset = io.load_dataset::<T>(&args.dataset.name, None)?;
    let other = DatasetIo::new(Some(args.other_dir.as_path()), None)?
        .load_dataset::<T>(&args.other_name, None)?;

    dataset.merge_with(&other)?;
    if let Some(name) = &args.output_name {
        dataset.set_name(name.as_str());
    }
    io.save_dataset(&dataset, args.target.overwrite)?;

    println!(
        "Merged {} item(s) into '{}' ({} total)",
        other.num_data(),
        dataset.name(),
        dataset.num_data()
    );
    Ok(())
}

fn run_shuffle(args: ShuffleArgs) -> Result<(), ShowersetError> {
    let (io, dtype) = open_dataset(&args.dataset, args.target.output_dir.as_deref())?;
    with_dtype!(dtype, shuffle_typed(&io, &args))
}

fn shuffle_typed<T: Element>(io: &DatasetIo, args: &ShuffleArgs) -> Result<(), ShowersetError> {
    let mut dataset = io.load_dataset::<T>(&args.dataset.name, None)?;
    let mut shuffler = RandomShuffler::new(args.seed);
    dataset.shuffle(args.times, &mut shuffler);

    if let Some(name) = &args.output_name {
        dataset.set_name(name.as_str());
    }
    io.save_dataset(&dataset, args.target.overwrite)?;

    println!(
        "Shuffled '{}' ({} item(s), {} round(s))",
        dataset.name(),
        dataset.num_data(),
        args.times
    );
    Ok(())
}

fn run_split(args: SplitArgs) -> Result<(), ShowersetError> {
    let (io, dtype) = open_dataset(&args.dataset, args.target.output_dir.as_deref())?;
    with_dtype!(dtype, split_typed(&io, &args))
}

fn split_typed<T: Element>(io: &DatasetIo, args: &SplitArgs) -> Result<(), ShowersetError> {
    let mut rest = io.load_dataset::<T>(&args.dataset.name, None)?;

    let part = match args.fraction {
        Some(fraction) => rest.split_ratio(fraction, args.part_name.as_str())?,
        None => {
            let start = args.start.unwrap_or(0);
            let end = args.end.unwrap_or(rest.num_data());
            rest.split(start..end, args.part_name.as_str())?
        }
    };
    if let Some(name) = &args.rest_name {
        rest.set_name(name.as_str());
    }

    io.save_dataset(&part, args.target.overwrite)?;
    io.save_dataset(&rest, args.target.overwrite)?;

    println!(
        "Split '{}' into '{}' ({} item(s)) and '{}' ({} item(s))",
        args.dataset.name,
        part.name(),
        part.num_data(),
        rest.name(),
        rest.num_data()
    );
    Ok(())
}

fn run_build(args: BuildArgs) -> Result<(), ShowersetError> {
    let dtype: Dtype = args.dtype.parse()?;
    let views = SelectedViews::new(
        args.views
            .iter()
            .map(|name| name.parse::<ViewKind>())
            .collect::<Result<Vec<_>, _>>()?,
    )?;

    let stop_gtu = args.stop_gtu.unwrap_or(args.num_frames);
    let (transformer, window_len) = match args.transformer.as_str() {
        "default" => (
            Transformer::Default(DefaultTransformer::new(args.packet_id, args.start_gtu, stop_gtu)?),
            stop_gtu - args.start_gtu,
        ),
        "all-packets" => (
            Transformer::AllPackets(AllPacketsTransformer::new(args.start_gtu, stop_gtu)?),
            stop_gtu - args.start_gtu,
        ),
        "gtu-in-packet" => {
            let t = GtuInPacketTransformer {
                num_gtu_before: args.gtu_before,
                num_gtu_after: args.gtu_after,
                adjust_if_out_of_bounds: !args.no_adjust,
            };
            (Transformer::GtuInPacket(t), t.window_len())
        }
        other => {
            return Err(ShowersetError::UnsupportedFormat(format!(
                "transformer '{}' (supported: gtu-in-packet, default, all-packets)",
                other
            )));
        }
    };

    let template = PacketTemplate::new(
        args.ec_width.unwrap_or(args.frame_width),
        args.ec_height.unwrap_or(args.frame_height),
        args.frame_width,
        args.frame_height,
        window_len,
    )?;

    let targets = match (&args.target, &args.target_column) {
        (_, Some(column)) => TargetAssignment::BinaryFromColumn(column.clone()),
        (Some(target), None) => TargetAssignment::Static(target.parse()?),
        (None, None) => {
            return Err(ShowersetError::InvalidEvent {
                message: "pass --target or --target-column".into(),
            });
        }
    };

    let composer = match &args.event_fields {
        Some(fields) => MetadataComposer::with_fields(fields.iter().cloned()),
        None => MetadataComposer::all_fields(),
    };

    let plan = BuildPlan {
        template,
        views,
        transformer,
        composer,
        targets,
    };
    with_dtype!(dtype, build_typed(&args, plan))
}

struct BuildPlan {
    template: PacketTemplate,
    views: SelectedViews,
    transformer: Transformer,
    composer: MetadataComposer,
    targets: TargetAssignment,
}

fn build_typed<T: Element>(args: &BuildArgs, plan: BuildPlan) -> Result<(), ShowersetError> {
    let events = events::read_events_tsv(&args.events)?;
    let extractor = NpyPacketExtractor::new(args.num_frames)?;

    let pipeline: EventPipeline<T, _, _, _> = EventPipeline::new(
        events,
        extractor,
        plan.transformer,
        plan.composer,
        plan.targets,
    );

    let mut dataset = Dataset::<T>::new(args.name.as_str(), plan.template, plan.views);
    dataset.extend_from_pipeline(pipeline)?;

    let io = DatasetIo::new(None, Some(args.output_dir.as_path()))?;
    io.save_dataset(&dataset, args.overwrite)?;

    println!(
        "Built '{}' with {} item(s) in {}",
        dataset.name(),
        dataset.num_data(),
        args.output_dir.display()
    );
    Ok(())
}
