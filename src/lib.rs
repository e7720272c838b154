//! Expose modules for testing
pub mod cli;
pub mod domain;
pub mod engine;
pub mod export;
pub mod location;
pub mod trace_reader;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write as _};

use anyhow::Context;

use cli::Args;
use engine::Analyzer;

/// Runs one end-to-end analysis: reads the trace named by `args.input` (or
/// stdin), drives the [`engine::Analyzer`], and writes the four output
/// streams named by `args`. This is the library entry point `main.rs` calls
/// after parsing arguments and initializing logging.
pub fn run(args: Args) -> anyhow::Result<()> {
    let mut objects_out =
        BufWriter::new(File::create(&args.objects_out).with_context(|| {
            format!("failed to create {}", args.objects_out.display())
        })?);
    let mut last_use_out =
        BufWriter::new(File::create(&args.last_use_out).with_context(|| {
            format!("failed to create {}", args.last_use_out.display())
        })?);
    let mut unreachable_out =
        BufWriter::new(File::create(&args.unreachable_out).with_context(|| {
            format!("failed to create {}", args.unreachable_out.display())
        })?);
    let mut iid_updates_out =
        BufWriter::new(File::create(&args.iid_updates_out).with_context(|| {
            format!("failed to create {}", args.iid_updates_out.display())
        })?);

    let mut reader: Box<dyn BufRead> = if args.reads_stdin() {
        log::info!("reading trace from stdin");
        Box::new(BufReader::new(io::stdin()))
    } else {
        let path = args.input.as_ref().expect("reads_stdin() false implies Some(path)");
        log::info!("reading trace from {}", path.display());
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Box::new(BufReader::new(file))
    };

    let registry = trace_reader::read_init(&mut reader).context("reading init event")?;
    let mut analyzer = Analyzer::new(
        &registry,
        &mut objects_out,
        &mut last_use_out,
        &mut unreachable_out,
        &mut iid_updates_out,
    );
    trace_reader::ingest_events(reader, &mut analyzer, 2).context("ingesting trace")?;

    objects_out.flush().context("flushing objects stream")?;
    last_use_out.flush().context("flushing last-use stream")?;
    unreachable_out.flush().context("flushing unreachable stream")?;
    iid_updates_out.flush().context("flushing update-IID stream")?;

    log::info!("analysis complete");
    Ok(())
}
