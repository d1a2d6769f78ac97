mod common;
use std::env::{set_var, var};
use std::error::Error;
use std::path::PathBuf;

use chrono::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, trace};

use common::config::models::RadprocConfig;
use common::helpers::{format_keys, log_import_report};
use common::io::writers::prelude::get_sink;
use radproc::models::table::SummaryTable;
use radproc::modules::aggregation::{functions as aggregation, models::Aggregation};
use radproc::modules::classification::functions as classification;
use radproc::modules::classification::models::{ClassInterval, ClassificationOptions};
use radproc::modules::erosivity::functions as erosivity;
use radproc::modules::gauge::functions as gauge;
use radproc::modules::heavyrain::functions as heavyrain;
use radproc::store::{DatasetKey, FrameStore, MemoryStore};
use radproc::version::LONG_VERSION;
use radproc::RadprocError;

#[derive(Parser, Debug)]
#[command(
    version,
    long_version=LONG_VERSION,
    about="radproc - precipitation processing for RADOLAN and DWD rain gauge data",
    long_about="radproc imports DWD rain gauge files (MR90) into monthly HDF5 datasets and analyses
the stored precipitation: temporal aggregation, hydrological seasons, heavy rain
exceedances and rainfall erosivity (R-factor)."
)]
struct Args {
    #[arg(short, long, global = true, help = "Path to the configuration file (.yaml or .txt)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ErosivityMode {
    Annual,
    Monthly,
    WholeYears,
    Gauge,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import MR90 station files into monthly datasets
    Gauges {
        #[arg(help = "Folder with the station files")]
        folder: Option<PathBuf>,
        #[arg(help = "HDF5 store to write")]
        store: Option<PathBuf>,
        #[arg(short, long, help = "Number of worker threads")]
        threads: Option<usize>,
        #[arg(long, help = "Parse the files without writing the store")]
        dry_run: bool,
    },
    /// Summarize the station lines of the metadata files of a folder
    Metadata {
        folder: PathBuf,
    },
    /// Sum the monthly datasets of a range of years
    Resample {
        store: PathBuf,
        start: i32,
        #[arg(default_value_t = 0)]
        end: i32,
        #[arg(long, default_value = "years")]
        to: Aggregation,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Precipitation of the hydrological summer and winter half years
    Seasons {
        store: PathBuf,
        start: i32,
        #[arg(default_value_t = 0)]
        end: i32,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Intervals exceeding a threshold on a minimum area
    Heavyrain {
        store: PathBuf,
        start: i32,
        end: i32,
        #[arg(long, help = "Precipitation threshold [mm]")]
        threshold: Option<f32>,
        #[arg(long, help = "Number of cells to exceed")]
        min_area: Option<usize>,
        #[arg(long, help = "Year, May - October, November - April, January/December, Jan..Dec or a month list like 5,6,7")]
        season: Option<String>,
        #[arg(long, help = "Count the exceeding intervals per cell")]
        count: bool,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Rainfall erosivity (R-factor) and number of erosive rains
    Erosivity {
        store: PathBuf,
        start: i32,
        end: i32,
        #[arg(long)]
        max_nan_days: Option<f32>,
        #[arg(long, value_enum, default_value_t = ErosivityMode::Annual)]
        mode: ErosivityMode,
        #[arg(long, help = "Dataset spanning all years, required in gauge mode")]
        dataset: Option<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Depth and duration of the precipitation intervals per depth class
    Classify {
        store: PathBuf,
        start: i32,
        #[arg(default_value_t = 0)]
        end: i32,
        #[arg(long, value_delimiter = ',', default_values_t = vec![1u32, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12], help = "Months to classify, e.g. 5,6,7")]
        months: Vec<u32>,
        #[arg(long, default_value = "hours", help = "Interval length: hours or 5min")]
        interval: ClassInterval,
        #[arg(long, help = "Keep the 0 and NaN classes")]
        keep_nan: bool,
        #[arg(long, help = "Absolute values instead of percentages")]
        absolute: bool,
        #[arg(long, value_delimiter = ',', help = "Columns to classify, e.g. station ids")]
        columns: Vec<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List the datasets of a store
    Keys {
        store: PathBuf,
    },
}

fn run_gauges(
    config: &RadprocConfig,
    folder: Option<PathBuf>,
    store: Option<PathBuf>,
    threads: Option<usize>,
    dry_run: bool,
) -> Result<(), RadprocError> {
    let folder = config.gauge_folder(folder)?;
    let threads = config.threads(threads);

    let report = if dry_run {
        let mut store = MemoryStore::new();
        gauge::gauges_to_store(&folder, &mut store, threads)?
    } else {
        let path = config.store_path(store)?;
        info!("Writing gauge datasets to {}", path.display());
        let mut store = config.open_store(&path)?;
        gauge::gauges_to_store(&folder, store.as_mut(), threads)?
    };
    log_import_report(&report);
    Ok(())
}

fn run_erosivity(
    store: &dyn FrameStore,
    mode: ErosivityMode,
    dataset: Option<String>,
    start: i32,
    end: i32,
    max_nan_days: f32,
) -> Result<(SummaryTable, SummaryTable), RadprocError> {
    match mode {
        ErosivityMode::Annual => erosivity::annual_r_factor(store, start, end, max_nan_days),
        ErosivityMode::Monthly => erosivity::monthly_r_factor(store, start, end, max_nan_days),
        ErosivityMode::WholeYears => {
            erosivity::annual_r_factor_whole_years(store, start, end, max_nan_days)
        }
        ErosivityMode::Gauge => {
            let dataset: DatasetKey = dataset
                .ok_or("--dataset is required in gauge mode")?
                .parse()?;
            erosivity::annual_r_factor_gauge(store, &dataset, start, end, max_nan_days)
        }
    }
}

fn run(command: Command, config: &RadprocConfig) -> Result<(), RadprocError> {
    match command {
        Command::Gauges {
            folder,
            store,
            threads,
            dry_run,
        } => run_gauges(config, folder, store, threads, dry_run),
        Command::Metadata { folder } => {
            let summary = gauge::summarize_metadata_files(&folder)?;
            info!("Metadata summary written to {}", summary.display());
            Ok(())
        }
        Command::Resample {
            store,
            start,
            end,
            to,
            out,
        } => {
            let store = config.open_store(&store)?;
            let frame = aggregation::load_years_and_resample(store.as_ref(), start, end, to)?;
            let mut sink = get_sink(config.output(out).as_deref())?;
            sink.write_frame(&frame)?;
            sink.finish()
        }
        Command::Seasons {
            store,
            start,
            end,
            out,
        } => {
            let store = config.open_store(&store)?;
            let frame = aggregation::hydrological_seasons(store.as_ref(), start, end)?;
            let mut sink = get_sink(config.output(out).as_deref())?;
            sink.write_frame(&frame)?;
            sink.finish()
        }
        Command::Heavyrain {
            store,
            start,
            end,
            threshold,
            min_area,
            season,
            count,
            out,
        } => {
            let threshold = config.threshold(threshold)?;
            let min_area = config.min_area(min_area)?;
            let season = config.season(season)?;
            let store = config.open_store(&store)?;

            let frame = if count {
                heavyrain::count_heavy_rainfall_intervals(
                    store.as_ref(),
                    start,
                    end,
                    threshold,
                    min_area,
                    &season,
                )?
            } else {
                heavyrain::find_heavy_rainfalls(
                    store.as_ref(),
                    start,
                    end,
                    threshold,
                    min_area,
                    &season,
                )?
            };
            let mut sink = get_sink(config.output(out).as_deref())?;
            sink.write_frame(&frame)?;
            sink.finish()
        }
        Command::Erosivity {
            store,
            start,
            end,
            max_nan_days,
            mode,
            dataset,
            out,
        } => {
            let max_nan_days = config.max_nan_days(max_nan_days)?;
            let store = config.open_store(&store)?;
            let (r, n) = run_erosivity(store.as_ref(), mode, dataset, start, end, max_nan_days)?;
            let mut sink = get_sink(config.output(out).as_deref())?;
            sink.write_table(&r)?;
            sink.write_table(&n)?;
            sink.finish()
        }
        Command::Classify {
            store,
            start,
            end,
            months,
            interval,
            keep_nan,
            absolute,
            columns,
            out,
        } => {
            let options = ClassificationOptions {
                interval,
                dropna: !keep_nan,
                percentage: !absolute,
                selection: columns,
            };
            let store = config.open_store(&store)?;
            let result = classification::classification(store.as_ref(), start, end, &months, &options)?;
            let mut sink = get_sink(config.output(out).as_deref())?;
            for table in result.tables() {
                sink.write_table(table)?;
            }
            sink.finish()
        }
        Command::Keys { store } => {
            let store = config.open_store(&store)?;
            for line in format_keys(&store.keys()?) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

/// main function
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if var("RUST_LOG").is_err() {
        set_var("RUST_LOG", "info")
    }
    pretty_env_logger::init();

    let config = RadprocConfig::load(args.config.as_deref())?;
    trace!("{:?}", config);

    let start_time = Utc::now();
    let result = run(args.command, &config);

    let elapsed_time = Utc::now() - start_time;
    info!("Elapsed time: {} seconds", elapsed_time.num_seconds());

    result.map_err(|err| err.into())
}
