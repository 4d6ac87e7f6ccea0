//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `jpws_core` linkage with deterministic output.
//! - Optionally summarize a snapshot file: record count and mirror name.
//!
//! Set `JPWS_LOG_DIR` to an absolute path to enable file logging.

use jpws_core::repo::snapshot_repo::load_snapshot_file;
use jpws_core::{init_logging, mirror_file_name, LogLevel};
use log::info;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("JPWS_LOG_DIR") {
        if let Err(err) = init_logging(LogLevel::default_for_build(), Path::new(&log_dir)) {
            eprintln!("logging disabled: {err}");
        }
    }

    println!("jpws_core ping={}", jpws_core::ping());
    println!("jpws_core version={}", jpws_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match load_snapshot_file(Path::new(&path)) {
        Ok(snapshot) => {
            info!(
                "event=cli_summary module=cli status=ok records={}",
                snapshot.records.len()
            );
            println!("records={}", snapshot.records.len());
            println!("mirror={}", mirror_file_name(&path));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("cannot read `{path}`: {err}");
            ExitCode::FAILURE
        }
    }
}
