//! CLI argument definitions (ambient, see SPEC_FULL.md §6.5)

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lifetrace",
    about = "Streaming last-use/unreachability analyzer for instrumented memory traces",
    after_help = "\
EXAMPLES:
    lifetrace --input trace.jsonl --objects-out objects.jsonl \\
              --last-use-out last_use.bin --unreachable-out unreachable.bin \\
              --iid-updates-out iid_updates.bin
    lifetrace < trace.jsonl --objects-out objects.jsonl \\
              --last-use-out last_use.bin --unreachable-out unreachable.bin \\
              --iid-updates-out iid_updates.bin"
)]
pub struct Args {
    /// Input trace file, line-delimited JSON. Reads stdin when omitted or `-`.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Per-object JSON stream output path (§6.2)
    #[arg(long, value_name = "FILE")]
    pub objects_out: PathBuf,

    /// Last-use binary stream output path (§6.3)
    #[arg(long, value_name = "FILE")]
    pub last_use_out: PathBuf,

    /// Unreachable binary stream output path (§6.3)
    #[arg(long, value_name = "FILE")]
    pub unreachable_out: PathBuf,

    /// Update-IID binary stream output path (§6.3)
    #[arg(long, value_name = "FILE")]
    pub iid_updates_out: PathBuf,

    /// Increase log verbosity: `-v` for info, `-vv` for debug
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// `true` when `--input` was omitted or given as `-` (read from stdin).
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        match &self.input {
            None => true,
            Some(path) => path.as_os_str() == "-",
        }
    }

    /// The log level implied by the verbosity flags, before `RUST_LOG` override.
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}
