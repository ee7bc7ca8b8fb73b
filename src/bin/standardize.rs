use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use eegstd::{
    layout_by_name, output_path, split_list, standardize_dataset, standardize_file_to, ConversionRequest,
    Montage, MontageKind, OutputFormat, Reference,
};

#[derive(Parser)]
#[command(name = "standardize", about = "Standardize EDF recordings: montage, reference, sampling rate")]
struct Args {
    /// EDF file, or dataset root directory
    input: PathBuf,

    /// Output file, or output directory in dataset mode
    output: PathBuf,

    /// Output channels, comma-separated (default: 19 10-20 electrodes, or 18 double-banana pairs)
    #[arg(short, long)]
    electrodes: Option<String>,

    /// Output sampling rate in Hz
    #[arg(short, long, default_value_t = 256.0)]
    fs: f32,

    /// Montage of the input recordings: mono | bipolar
    #[arg(short = 'm', long, default_value = "mono")]
    input_montage: MontageKind,

    /// Target reference: electrode name, Avg, or bipolar-dBanana
    #[arg(short = 'r', long = "ref", default_value = "Cz")]
    reference: Montage,

    /// Output format: edf | csv | csv.gzip | safetensors.gzip
    #[arg(short = 'o', long, default_value = "edf")]
    out_format: OutputFormat,

    /// Reference the monopolar inputs were recorded against, if known
    #[arg(long, default_value = "ref")]
    input_ref: Reference,

    /// Dataset layout in directory mode: generic | chbmit | siena | tuh | seizeit
    #[arg(long, default_value = "generic")]
    layout: String,

    /// Worker threads (default: one per core)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let request = ConversionRequest {
        electrodes: args.electrodes.as_deref().map(split_list),
        fs: args.fs,
        input_montage: args.input_montage,
        input_reference: args.input_ref,
        reference: args.reference,
        out_format: args.out_format,
    };
    request.validate().context("invalid configuration")?;

    if args.input.is_file() {
        let output = if args.output.is_dir() {
            let name = args.input.file_name().context("input has no file name")?;
            output_path(&args.output, Path::new(name), request.out_format)
        } else {
            args.output.clone()
        };
        let rec = standardize_file_to(&args.input, &output, &request)?;
        println!(
            "{} ch × {} samples @ {} Hz → {}",
            rec.signal.n_channels(),
            rec.signal.n_times(),
            rec.signal.sfreq,
            output.display()
        );
        return Ok(());
    }

    let layout = layout_by_name(&args.layout)?;
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("failed to configure worker threads")?;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        eprintln!("interrupted, finishing files in progress");
        flag.store(true, Ordering::SeqCst);
    })
    .context("failed to install Ctrl-C handler")?;

    let summary = standardize_dataset(&args.input, &args.output, &request, layout.as_ref(), &cancel)?;
    for (path, err) in &summary.failed {
        eprintln!("FAILED {}: {}", path.display(), err.cause());
    }
    println!(
        "{} succeeded, {} failed, {} cancelled → {}",
        summary.succeeded.len(),
        summary.failed.len(),
        summary.cancelled.len(),
        args.output.display()
    );
    if !summary.is_complete() {
        bail!("{} of {} recordings not converted", summary.total() - summary.succeeded.len(), summary.total());
    }
    Ok(())
}
