use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use eegstd::{layout_by_name, select_recordings, write_annotations, Selection};

#[derive(Parser)]
#[command(name = "annotations", about = "Convert a dataset's seizure annotations to a CSV table")]
struct Args {
    /// Dataset layout: chbmit | siena | tuh | seizeit | generic
    layout: String,

    /// Dataset root directory
    root: PathBuf,

    /// Output CSV
    output: PathBuf,

    /// Only convert the recordings of this subject
    #[arg(short, long, conflicts_with = "edf")]
    subject: Option<String>,

    /// Only convert this recording (path, or relative to the root)
    #[arg(short, long)]
    edf: Option<PathBuf>,

    /// Verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let selection = match (args.subject, args.edf) {
        (Some(subject), _) => Selection::Subject(subject),
        (None, Some(edf)) => Selection::File(edf),
        (None, None) => Selection::All,
    };
    let layout = layout_by_name(&args.layout)?;
    let entries = select_recordings(layout.as_ref(), &args.root, &selection)
        .with_context(|| format!("cannot list recordings under {}", args.root.display()))?;
    if entries.is_empty() {
        log::warn!("no recordings selected under {}", args.root.display());
    }

    let mut rows = Vec::new();
    let mut failed = 0usize;
    for entry in &entries {
        match layout.annotations(&args.root, entry) {
            Ok(r) => {
                log::info!("{}: {} events", entry.relative.display(), r.len());
                rows.extend(r);
            }
            Err(e) => {
                log::error!("{}: {e}", entry.path.display());
                failed += 1;
            }
        }
    }

    write_annotations(&args.output, &rows)?;
    println!("{} annotations from {} recordings → {}", rows.len(), entries.len() - failed, args.output.display());
    if failed > 0 {
        bail!("{failed} recordings could not be annotated");
    }
    Ok(())
}
