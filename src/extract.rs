use fcd_extract::config::Config;
use fcd_extract::observability::{get_subscriber, init_subscriber};
use fcd_extract::{Error, Extractor};
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::{error, info};

#[derive(Debug, StructOpt)]
#[structopt(name = "extract", about = "extract fcd rows inside a polygon")]
struct Opt {
    /// input file, archive or (with --multiple) folder of daily data
    #[structopt(long = "input-folder")]
    input_folder: PathBuf,
    /// geojson polygon file
    #[structopt(long = "polygon-path")]
    polygon_path: PathBuf,
    /// multiple-day run over every object in the input folder
    #[structopt(long)]
    multiple: bool,
    /// yaml config
    #[structopt(short, long, env = "FCD_CONFIG", default_value = "config/data_frame_config.yaml")]
    config: PathBuf,
    /// output folder, overrides the config
    #[structopt(short, long = "output-dir")]
    output_dir: Option<PathBuf>,
    /// lines per fragment, overrides the config
    #[structopt(long = "chunk-size")]
    chunk_size: Option<usize>,
    /// worker count, overrides the config
    #[structopt(short, long)]
    workers: Option<usize>,
    /// fail a file when any of its fragments fails
    #[structopt(long)]
    strict: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = get_subscriber("info".into());
    init_subscriber(subscriber)?;
    let opt = Opt::from_args();

    if !(opt.input_folder.exists() && opt.polygon_path.exists()) {
        error!(path = ?opt.input_folder, exists = opt.input_folder.exists(), "input folder");
        error!(path = ?opt.polygon_path, exists = opt.polygon_path.exists(), "polygon path");
        let missing = if opt.input_folder.exists() {
            opt.polygon_path
        } else {
            opt.input_folder
        };
        let e = Error::InvalidInputPath(missing);
        error!(error = %e, "input not valid or not found");
        return Err(e.into());
    }

    let mut config = Config::load(&opt.config)?;
    if let Some(output_dir) = opt.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(chunk_size) = opt.chunk_size.filter(|size| *size > 0) {
        config.chunk_size = chunk_size;
    }
    if let Some(workers) = opt.workers.filter(|workers| *workers > 0) {
        config.workers = Some(workers);
    }
    config.strict |= opt.strict;

    let extractor = Extractor::from_polygon_file(config, &opt.polygon_path)?;
    let report = extractor.extract(&opt.input_folder, opt.multiple)?;
    info!(
        completed = report.completed.len(),
        failed = report.failures.len(),
        failed_fragments = report.failed_fragments(),
        "extraction finished"
    );
    if !report.is_success() {
        return Err(format!(
            "{} object(s) failed, {} fragment(s) skipped",
            report.failures.len(),
            report.failed_fragments()
        )
        .into());
    }
    Ok(())
}
