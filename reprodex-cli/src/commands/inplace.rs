use std::path::Path;
use std::time::Instant;

use crate::progress::{DISK, GEAR, print_done, print_step};

pub fn execute(command: &str, file: &Path, args: &[String], quiet: bool) -> anyhow::Result<()> {
    let started = Instant::now();

    if !quiet {
        print_step(1, 2, GEAR, &format!("Running {command} on {}", file.display()));
    }
    let summary = reprodex::fix::fix_in_place(command, file, args)?;
    if !quiet {
        print_step(2, 2, DISK, &format!("Updated {}", file.display()));
        super::fix::print_summary(&summary);
        print_done(started.elapsed());
    }

    Ok(())
}
